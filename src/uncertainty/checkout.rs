//! Scoped checkout of parameter bindings.

use crate::parameters::ParamRef;
use std::sync::Arc;

/// Snapshot of parameter values, restored when the guard is dropped.
///
/// Taken before any trial value is written, so every exit path of an
/// estimation call (success, numerical failure, or an error propagated with
/// `?`) leaves the bindings as they were.
pub struct ParameterCheckout {
    saved: Vec<(ParamRef, f64)>,
}

impl ParameterCheckout {
    pub fn new(params: &[ParamRef]) -> Self {
        Self {
            saved: params.iter().map(|p| (Arc::clone(p), p.value())).collect(),
        }
    }

    /// Saved value of each parameter, in checkout order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.saved.iter().map(|(_, v)| *v)
    }

    /// Write the saved values back now; the guard restores again on drop.
    pub fn restore(&self) {
        for (param, value) in &self.saved {
            if let Err(err) = param.set_value(*value) {
                log::warn!("could not restore {} to {}: {}", param.fullname(), value, err);
            }
        }
    }
}

impl Drop for ParameterCheckout {
    fn drop(&mut self) {
        self.restore();
    }
}
