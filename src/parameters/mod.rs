//! # Parameter System
//!
//! Parameters are shared, mutable numeric slots with identity. Models own
//! [`ParameterBinding`]s and expose them as [`ParamRef`] handles; a handle
//! placed in two models links the parameter between them.
//!
//! ## Core Components
//!
//! - [`ParameterLike`]: the narrow capability interface (value, frozen state,
//!   full name, hard limits) that the error estimator depends on
//! - [`ParameterBinding`]: the data-only implementation used by the bundled models
//! - [`Bounds`]: hard limits with validation and serde support
//!
//! ## Example Usage
//!
//! ```rust
//! use errest_rs::parameters::{same_parameter, ParameterBinding, ParameterLike};
//! use std::sync::Arc;
//!
//! let c0 = ParameterBinding::with_bounds("mdl", "c0", 1.0, 0.0, 100.0)
//!     .unwrap()
//!     .into_ref();
//! let linked = Arc::clone(&c0);
//!
//! linked.set_value(42.0).unwrap();
//! assert_eq!(c0.value(), 42.0);
//! assert!(same_parameter(&c0, &linked));
//! ```

pub mod bounds;
pub mod parameter;

// Re-export key types
pub use bounds::{Bounds, BoundsError};
pub use parameter::{
    position_of, same_parameter, ParamRef, ParameterBinding, ParameterLike, ParameterState,
};
