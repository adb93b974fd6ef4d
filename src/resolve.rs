//! Argument resolution for the error-estimation entry points.
//!
//! Callers pass a mixed, order-free list of dataset identifiers and parameter
//! handles. Each element is classified into an [`ErrorArg`] when it is built,
//! and [`resolve`] turns the list into the ordered dataset ids and the
//! explicit parameter subset of one estimation call.

use crate::error::{EstError, Result};
use crate::parameters::{position_of, ParamRef, ParameterBinding};
use crate::registry::{join_ids, DatasetId, Registry};
use std::sync::Arc;

/// Message of the argument-type error.
pub const ARGUMENT_TYPE_MESSAGE: &str = "identifiers must be integers or strings";

/// One element of an error-estimation argument list.
#[derive(Clone)]
pub enum ErrorArg {
    /// A dataset identifier
    Id(DatasetId),
    /// A parameter handle
    Param(ParamRef),
    /// A collection of arguments. Never accepted in place of an identifier;
    /// kept as a variant so the mistake is reported instead of flattened.
    Collection(Vec<ErrorArg>),
}

impl std::fmt::Debug for ErrorArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorArg::Id(id) => f.debug_tuple("Id").field(id).finish(),
            ErrorArg::Param(p) => f.debug_tuple("Param").field(&p.fullname()).finish(),
            ErrorArg::Collection(items) => f.debug_tuple("Collection").field(items).finish(),
        }
    }
}

macro_rules! impl_id_arg {
    ($($t:ty),*) => {
        $(
            impl From<$t> for ErrorArg {
                fn from(id: $t) -> Self {
                    ErrorArg::Id(DatasetId::from(id))
                }
            }
        )*
    };
}

impl_id_arg!(i32, i64, u32, &str, String, DatasetId, &DatasetId);

impl From<ParamRef> for ErrorArg {
    fn from(param: ParamRef) -> Self {
        ErrorArg::Param(param)
    }
}

impl From<&ParamRef> for ErrorArg {
    fn from(param: &ParamRef) -> Self {
        ErrorArg::Param(Arc::clone(param))
    }
}

impl From<Arc<ParameterBinding>> for ErrorArg {
    fn from(param: Arc<ParameterBinding>) -> Self {
        ErrorArg::Param(param)
    }
}

impl From<&Arc<ParameterBinding>> for ErrorArg {
    fn from(param: &Arc<ParameterBinding>) -> Self {
        ErrorArg::Param(Arc::clone(param) as ParamRef)
    }
}

impl<T: Into<ErrorArg>> From<Vec<T>> for ErrorArg {
    fn from(items: Vec<T>) -> Self {
        ErrorArg::Collection(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ErrorArg>, const N: usize> From<[T; N]> for ErrorArg {
    fn from(items: [T; N]) -> Self {
        ErrorArg::Collection(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Clone + Into<ErrorArg>> From<&[T]> for ErrorArg {
    fn from(items: &[T]) -> Self {
        ErrorArg::Collection(items.iter().cloned().map(Into::into).collect())
    }
}

/// Build a `Vec<ErrorArg>` from a mixed list of ids and parameters.
///
/// ```
/// use errest_rs::{args, ErrorArg, Polynom1D};
///
/// let mdl = Polynom1D::new("mdl");
/// let list = args![1, "obs", mdl.c0()];
/// assert_eq!(list.len(), 3);
/// assert!(matches!(list[2], ErrorArg::Param(_)));
/// ```
#[macro_export]
macro_rules! args {
    () => {
        ::std::vec::Vec::<$crate::ErrorArg>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::ErrorArg::from($arg)),+]
    };
}

/// Outcome of argument resolution.
#[derive(Clone)]
pub struct ResolvedArgs {
    /// Dataset ids in caller order, or registry order when none were given
    pub ids: Vec<DatasetId>,
    /// Explicit parameters in request order, duplicates removed;
    /// empty means all thawed parameters
    pub params: Vec<ParamRef>,
}

/// Classify and validate an argument list.
///
/// Checks run in a fixed order and stop at the first failure: argument
/// types, then dataset identifiers, then each explicit parameter in request
/// order. Nothing is evaluated here.
pub fn resolve(registry: &Registry, args: &[ErrorArg]) -> Result<ResolvedArgs> {
    let mut ids = Vec::new();
    let mut params: Vec<ParamRef> = Vec::new();

    for arg in args {
        match arg {
            ErrorArg::Id(id) => ids.push(id.clone()),
            ErrorArg::Param(p) => {
                if position_of(&params, p).is_none() {
                    params.push(Arc::clone(p));
                }
            }
            ErrorArg::Collection(_) => {
                return Err(EstError::ArgumentType(ARGUMENT_TYPE_MESSAGE.to_string()))
            }
        }
    }

    let ids = resolve_ids(registry, ids)?;
    check_parameters(registry, &ids, &params)?;

    Ok(ResolvedArgs { ids, params })
}

fn resolve_ids(registry: &Registry, ids: Vec<DatasetId>) -> Result<Vec<DatasetId>> {
    if registry.is_empty() {
        return Err(EstError::Identifier("no data sets have been loaded".to_string()));
    }

    if ids.is_empty() {
        let ids = registry.all_ids_with_model();
        if ids.is_empty() {
            return Err(EstError::Identifier(
                "no source models have been set, consider using set_source() or set_model()"
                    .to_string(),
            ));
        }
        return Ok(ids);
    }

    for (i, id) in ids.iter().enumerate() {
        if ids[..i].contains(id) {
            return Err(EstError::Identifier(format!(
                "data set {} was given more than once",
                id
            )));
        }
        registry.lookup(id)?;
    }
    Ok(ids)
}

fn check_parameters(registry: &Registry, ids: &[DatasetId], params: &[ParamRef]) -> Result<()> {
    let mut owned: Vec<ParamRef> = Vec::new();
    for id in ids {
        let (_, model) = registry.lookup(id)?;
        owned.extend(model.parameters().iter().cloned());
    }

    for param in params {
        if param.is_frozen() {
            return Err(EstError::Parameter(format!(
                "parameter '{}' is frozen",
                param.fullname()
            )));
        }
        if position_of(&owned, param).is_none() {
            return Err(EstError::Parameter(format!(
                "parameter '{}' is not part of the fit to data set(s) {}",
                param.fullname(),
                join_ids(ids)
            )));
        }
    }
    Ok(())
}
