//! The joint statistic over several datasets.
//!
//! [`JointFitContext`] turns a set of dataset ids into one objective: a pure
//! function of the free-parameter vector that sums each dataset's statistic.
//! Frozen parameters are captured by value when the context is built, so
//! evaluating a trial vector never reads or writes the live bindings.

use crate::data::Data1D;
use crate::error::{EstError, Result};
use crate::model::ModelRef;
use crate::parameters::{position_of, Bounds, ParamRef, ParameterLike};
use crate::registry::{DatasetId, Registry};
use crate::stats::Statistic;
use ndarray::Array1;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy)]
enum ParamSlot {
    Free(usize),
    Fixed(f64),
}

struct Term<'a> {
    data: &'a Data1D,
    model: &'a ModelRef,
    slots: Vec<ParamSlot>,
}

impl Term<'_> {
    fn model_values(&self, x: &Array1<f64>) -> Result<Array1<f64>> {
        let pars: Vec<f64> = self
            .slots
            .iter()
            .map(|slot| match *slot {
                ParamSlot::Free(i) => x[i],
                ParamSlot::Fixed(v) => v,
            })
            .collect();
        self.model.calc(&pars, self.data.x())
    }
}

/// Joint objective over a fixed, ordered set of datasets.
pub struct JointFitContext<'a> {
    dataset_ids: Vec<DatasetId>,
    free_params: Vec<ParamRef>,
    terms: Vec<Term<'a>>,
    stat: Arc<dyn Statistic>,
    evaluations: AtomicUsize,
}

impl<'a> JointFitContext<'a> {
    /// Build the context for `ids`.
    ///
    /// Free parameters are the thawed parameters of the datasets' models,
    /// in discovery order: dataset order first, then each model's parameter
    /// order. A binding shared by several models gets one slot.
    pub fn build(registry: &'a Registry, ids: &[DatasetId], stat: Arc<dyn Statistic>) -> Result<Self> {
        let mut free_params: Vec<ParamRef> = Vec::new();
        let mut terms = Vec::with_capacity(ids.len());

        for id in ids {
            let (data, model) = registry.lookup(id)?;
            let slots = model
                .parameters()
                .iter()
                .map(|p| {
                    if p.is_frozen() {
                        return ParamSlot::Fixed(p.value());
                    }
                    match position_of(&free_params, p) {
                        Some(i) => ParamSlot::Free(i),
                        None => {
                            free_params.push(Arc::clone(p));
                            ParamSlot::Free(free_params.len() - 1)
                        }
                    }
                })
                .collect();
            terms.push(Term { data, model, slots });
        }

        Ok(Self {
            dataset_ids: ids.to_vec(),
            free_params,
            terms,
            stat,
            evaluations: AtomicUsize::new(0),
        })
    }

    /// Joint statistic at `x`, given in [`free_params`](Self::free_params) order.
    pub fn statistic(&self, x: &Array1<f64>) -> Result<f64> {
        self.check_len(x)?;
        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let mut total = 0.0;
        for term in &self.terms {
            total += self.stat.calc(term.data, &term.model_values(x)?)?;
        }
        Ok(total)
    }

    /// Each dataset's contribution at `x`, in dataset order.
    pub fn per_dataset(&self, x: &Array1<f64>) -> Result<Vec<f64>> {
        self.check_len(x)?;
        self.terms
            .iter()
            .map(|term| self.stat.calc(term.data, &term.model_values(x)?))
            .collect()
    }

    /// Current values of the free parameters.
    pub fn values(&self) -> Array1<f64> {
        self.free_params.iter().map(|p| p.value()).collect()
    }

    /// Hard limits of the free parameters.
    pub fn bounds(&self) -> Vec<Bounds> {
        self.free_params.iter().map(|p| p.bounds()).collect()
    }

    /// Write `x` into the free parameter bindings.
    pub fn apply(&self, x: &Array1<f64>) -> Result<()> {
        self.check_len(x)?;
        for (param, &value) in self.free_params.iter().zip(x.iter()) {
            param.set_value(value)?;
        }
        Ok(())
    }

    pub fn free_params(&self) -> &[ParamRef] {
        &self.free_params
    }

    /// Slot of `param` in the free vector.
    pub fn index_of(&self, param: &ParamRef) -> Option<usize> {
        position_of(&self.free_params, param)
    }

    pub fn dataset_ids(&self) -> &[DatasetId] {
        &self.dataset_ids
    }

    pub fn stat_name(&self) -> &str {
        self.stat.name()
    }

    /// Number of statistic evaluations so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Total number of data points across the datasets.
    pub fn numpoints(&self) -> usize {
        self.terms.iter().map(|t| t.data.npoints()).sum()
    }

    fn check_len(&self, x: &Array1<f64>) -> Result<()> {
        if x.len() != self.free_params.len() {
            return Err(EstError::DimensionMismatch(format!(
                "expected {} free parameter values, got {}",
                self.free_params.len(),
                x.len()
            )));
        }
        Ok(())
    }
}
