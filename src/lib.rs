//! # errest-rs
//!
//! `errest-rs` estimates parameter errors of fitted models, jointly over one
//! or more datasets.
//!
//! The library provides:
//! - Three error-estimation methods: covariance, confidence and projection
//! - An order-free argument list mixing dataset ids and parameters
//! - A joint fit statistic summed over the selected datasets
//! - A small set of 1-D models, statistics and a bounded Nelder-Mead optimizer
//!
//! ## Basic Usage
//!
//! ```
//! use errest_rs::{args, Const1D, Session};
//! use std::sync::Arc;
//!
//! let mut session = Session::new();
//! session.load_arrays(1, vec![1.0, 2.0, 3.0, 4.0], vec![4.0, 2.0, 1.0, 3.5]).unwrap();
//! let mdl = Arc::new(Const1D::new("mdl"));
//! session.set_source(1, mdl.clone()).unwrap();
//!
//! session.fit(&args![]).unwrap();
//! let result = session.proj(&args![1, mdl.c0()]).unwrap();
//! assert_eq!(result.parnames, vec!["mdl.c0"]);
//! assert!(result.parmins[0].unwrap() < 0.0);
//! assert!(result.parmaxes[0].unwrap() > 0.0);
//! ```

pub mod data;
pub mod error;
pub mod joint;
pub mod model;
pub mod models;
pub mod optimize;
pub mod parameters;
pub mod registry;
pub mod resolve;
pub mod session;
pub mod stats;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use data::Data1D;
pub use error::{EstError, Result};
pub use model::{add, Guess, Model, ModelRef, SumModel};
pub use models::{Const1D, Gauss1D, Polynom1D, Scale1D};
pub use optimize::{NelderMead, NelderMeadConfig, OptResult, Reoptimizer};
pub use parameters::{ParamRef, ParameterBinding, ParameterLike};
pub use registry::{DatasetId, Registry};
pub use resolve::ErrorArg;
pub use session::{FitResults, Session};
pub use stats::{StatKind, Statistic};
pub use uncertainty::{
    BoundStatus, DeltaStatPolicy, ErrorEstimationResult, ErrorEstimator, ErrorMethod,
    EstimatorConfig,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
