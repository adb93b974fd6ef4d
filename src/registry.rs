//! Dataset/model registry.
//!
//! Maps dataset identifiers to a dataset and the source model assigned to
//! it. Insertion order is kept: it is the default order of datasets when a
//! caller does not name any.

use crate::data::Data1D;
use crate::error::{EstError, Result};
use crate::model::ModelRef;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a registered dataset: an integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DatasetId {
    Int(i64),
    Str(String),
}

impl fmt::Display for DatasetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetId::Int(i) => write!(f, "{}", i),
            DatasetId::Str(s) => f.write_str(s),
        }
    }
}

macro_rules! impl_int_id {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DatasetId {
                fn from(id: $t) -> Self {
                    DatasetId::Int(i64::from(id))
                }
            }
        )*
    };
}

impl_int_id!(i32, i64, u32);

macro_rules! impl_wide_id {
    ($($t:ty),*) => {
        $(
            impl TryFrom<$t> for DatasetId {
                type Error = EstError;

                fn try_from(id: $t) -> Result<Self> {
                    i64::try_from(id).map(DatasetId::Int).map_err(|_| {
                        EstError::ArgumentType(format!(
                            "data set id {} does not fit in a 64-bit signed integer",
                            id
                        ))
                    })
                }
            }
        )*
    };
}

impl_wide_id!(u64, usize);

impl From<&str> for DatasetId {
    fn from(id: &str) -> Self {
        DatasetId::Str(id.to_string())
    }
}

impl From<String> for DatasetId {
    fn from(id: String) -> Self {
        DatasetId::Str(id)
    }
}

impl From<&DatasetId> for DatasetId {
    fn from(id: &DatasetId) -> Self {
        id.clone()
    }
}

/// Join identifiers for messages: `1, 2, xx`.
pub fn join_ids(ids: &[DatasetId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

struct Entry {
    id: DatasetId,
    data: Data1D,
    model: Option<ModelRef>,
}

/// Registered datasets and their source models.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a dataset. Re-loading an id replaces its data and keeps both
    /// its position and its source model.
    pub fn load(&mut self, id: impl Into<DatasetId>, data: Data1D) {
        let id = id.into();
        match self.entries.iter_mut().find(|e| e.id == id) {
            Some(entry) => entry.data = data,
            None => self.entries.push(Entry {
                id,
                data,
                model: None,
            }),
        }
    }

    /// Assign the source model of a loaded dataset.
    pub fn set_source(&mut self, id: impl Into<DatasetId>, model: ModelRef) -> Result<()> {
        let id = id.into();
        let entry = self
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| missing_data(&id))?;
        entry.model = Some(model);
        Ok(())
    }

    /// Dataset and source model for `id`.
    pub fn lookup(&self, id: &DatasetId) -> Result<(&Data1D, &ModelRef)> {
        let entry = self.entry(id)?;
        let model = entry.model.as_ref().ok_or_else(|| {
            EstError::Identifier(format!(
                "source {} has not been set, consider using set_source() or set_model()",
                id
            ))
        })?;
        Ok((&entry.data, model))
    }

    pub fn data(&self, id: &DatasetId) -> Result<&Data1D> {
        Ok(&self.entry(id)?.data)
    }

    pub fn model(&self, id: &DatasetId) -> Option<&ModelRef> {
        self.entries
            .iter()
            .find(|e| &e.id == id)
            .and_then(|e| e.model.as_ref())
    }

    pub fn contains(&self, id: &DatasetId) -> bool {
        self.entries.iter().any(|e| &e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All dataset ids, in insertion order.
    pub fn ids(&self) -> Vec<DatasetId> {
        self.entries.iter().map(|e| e.id.clone()).collect()
    }

    /// Ids of datasets that have a source model, in insertion order.
    pub fn all_ids_with_model(&self) -> Vec<DatasetId> {
        self.entries
            .iter()
            .filter(|e| e.model.is_some())
            .map(|e| e.id.clone())
            .collect()
    }

    fn entry(&self, id: &DatasetId) -> Result<&Entry> {
        self.entries
            .iter()
            .find(|e| &e.id == id)
            .ok_or_else(|| missing_data(id))
    }
}

fn missing_data(id: &DatasetId) -> EstError {
    EstError::Identifier(format!("data set {} has not been set", id))
}
