//! Parameter bindings and the capability interface the estimator depends on.
//!
//! A [`ParameterBinding`] is a named, mutable numeric slot owned by a model.
//! Models hand out shared [`ParamRef`] handles, so the same binding can appear
//! in several models (a linked parameter). The error estimator only talks to
//! the [`ParameterLike`] trait and never to a concrete parameter type.

use crate::error::Result;
use crate::parameters::bounds::Bounds;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Capabilities a parameter must expose to take part in error estimation.
pub trait ParameterLike: Send + Sync {
    /// Full name, `owner.name`.
    fn fullname(&self) -> String;

    /// Current value.
    fn value(&self) -> f64;

    /// Set the current value; fails if the value is outside the hard limits.
    fn set_value(&self, value: f64) -> Result<()>;

    /// Whether the parameter is excluded from fitting and error estimation.
    fn is_frozen(&self) -> bool;

    /// Hard lower limit.
    fn min(&self) -> f64;

    /// Hard upper limit.
    fn max(&self) -> f64;

    /// Hard limits as [`Bounds`].
    fn bounds(&self) -> Bounds {
        Bounds {
            min: self.min(),
            max: self.max(),
        }
    }
}

/// Shared handle to a parameter.
pub type ParamRef = Arc<dyn ParameterLike>;

/// Identity comparison of two parameter handles.
///
/// Two handles are the same parameter when they point at the same binding,
/// regardless of their current values.
pub fn same_parameter(a: &ParamRef, b: &ParamRef) -> bool {
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

/// Position of `param` in `list`, by identity.
pub fn position_of(list: &[ParamRef], param: &ParamRef) -> Option<usize> {
    list.iter().position(|p| same_parameter(p, param))
}

/// Mutable state of a binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterState {
    /// Current value
    pub value: f64,

    /// Frozen parameters are not varied by the optimizer
    pub frozen: bool,

    /// Hard limits
    pub bounds: Bounds,
}

/// The data-only parameter implementation used by the bundled models.
pub struct ParameterBinding {
    owner: String,
    name: String,
    state: RwLock<ParameterState>,
}

impl ParameterBinding {
    /// Create a thawed, unbounded parameter.
    ///
    /// # Examples
    ///
    /// ```
    /// use errest_rs::parameters::{ParameterBinding, ParameterLike};
    ///
    /// let param = ParameterBinding::new("mdl", "c0", 10.0);
    /// assert_eq!(param.fullname(), "mdl.c0");
    /// assert_eq!(param.value(), 10.0);
    /// assert!(!param.is_frozen());
    /// ```
    pub fn new(owner: &str, name: &str, value: f64) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            state: RwLock::new(ParameterState {
                value,
                frozen: false,
                bounds: Bounds::default(),
            }),
        }
    }

    /// Create a parameter with hard limits; the value is clamped into them.
    pub fn with_bounds(owner: &str, name: &str, value: f64, min: f64, max: f64) -> Result<Self> {
        let bounds = Bounds::new(min, max)?;
        let param = Self::new(owner, name, bounds.clamp(value));
        param.write().bounds = bounds;
        Ok(param)
    }

    /// Builder-style frozen flag.
    pub fn frozen(self, frozen: bool) -> Self {
        self.write().frozen = frozen;
        self
    }

    /// Wrap the binding in a shared handle.
    pub fn into_ref(self) -> ParamRef {
        Arc::new(self)
    }

    /// Name of the owning model.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Short name, without the owner prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Freeze the parameter.
    pub fn freeze(&self) {
        self.write().frozen = true;
    }

    /// Thaw the parameter.
    pub fn thaw(&self) {
        self.write().frozen = false;
    }

    /// Replace the hard limits, clamping the current value into them.
    pub fn set_bounds(&self, min: f64, max: f64) -> Result<()> {
        let bounds = Bounds::new(min, max)?;
        let mut state = self.write();
        state.bounds = bounds;
        state.value = bounds.clamp(state.value);
        Ok(())
    }

    /// Copy of the current state.
    pub fn state(&self) -> ParameterState {
        self.read().clone()
    }

    fn read(&self) -> RwLockReadGuard<'_, ParameterState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, ParameterState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl ParameterLike for ParameterBinding {
    fn fullname(&self) -> String {
        format!("{}.{}", self.owner, self.name)
    }

    fn value(&self) -> f64 {
        self.read().value
    }

    fn set_value(&self, value: f64) -> Result<()> {
        let mut state = self.write();
        state.bounds.check(value)?;
        state.value = value;
        Ok(())
    }

    fn is_frozen(&self) -> bool {
        self.read().frozen
    }

    fn min(&self) -> f64 {
        self.read().bounds.min
    }

    fn max(&self) -> f64 {
        self.read().bounds.max
    }

    fn bounds(&self) -> Bounds {
        self.read().bounds
    }
}

impl fmt::Debug for ParameterBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("ParameterBinding")
            .field("fullname", &self.fullname())
            .field("value", &state.value)
            .field("frozen", &state.frozen)
            .field("min", &state.bounds.min)
            .field("max", &state.bounds.max)
            .finish()
    }
}
