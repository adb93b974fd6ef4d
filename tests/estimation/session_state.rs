//! Tests for session state around an estimate
//!
//! Covers restoration of parameter values, result caching, fits, guesses
//! and the report formats.

use approx::assert_relative_eq;
use errest_rs::error::Result;
use errest_rs::optimize::{Objective, OptResult};
use errest_rs::parameters::Bounds;
use errest_rs::{
    add, args, Data1D, ErrorMethod, EstError, Gauss1D, Guess, ParameterLike, Reoptimizer,
    Scale1D, StatKind, Statistic,
};
use log::{Level, LevelFilter, Log, Metadata, Record};
use ndarray::Array1;
use std::sync::{Arc, Mutex, Once};

use crate::test_helpers::{const_session, poly_session, CONST_BEST, CONST_STAT, POLY_C0, POLY_C1};

/// chi2gehrels that fails whenever the model rises above 3.
struct Fragile;

impl Statistic for Fragile {
    fn name(&self) -> &str {
        "fragile"
    }

    fn calc(&self, data: &Data1D, model: &Array1<f64>) -> Result<f64> {
        if model.iter().any(|&m| m > 3.0) {
            return Err(EstError::FunctionEvaluation("model above 3".to_string()));
        }
        StatKind::Chi2Gehrels.calc(data, model)
    }
}

struct Broken;

impl Reoptimizer for Broken {
    fn name(&self) -> &str {
        "broken"
    }

    fn reoptimize(&self, _objective: &Objective<'_>, _start: &Array1<f64>, _bounds: &[Bounds]) -> Result<OptResult> {
        Err(EstError::FunctionEvaluation("optimizer failure".to_string()))
    }
}

#[test]
fn test_values_restored_after_failing_statistic() {
    let (mut session, mdl) = const_session();
    session.set_stat(Fragile);

    // the lower search succeeds and moves the parameter, the upper one fails
    let err = session.conf(&args![]).unwrap_err();
    assert!(matches!(err, EstError::FunctionEvaluation(_)));
    assert_eq!(mdl.c0().value(), CONST_BEST);
    assert!(session.get_conf_results().is_err());
}

#[test]
fn test_values_restored_after_failing_optimizer() {
    let (mut session, mdl) = poly_session();
    session.set_method(Broken);

    let err = session.proj(&args![1, 2, 3]).unwrap_err();
    assert_eq!(err.to_string(), "Function evaluation error: optimizer failure");
    assert_eq!(mdl.c0().value(), POLY_C0);
    assert_eq!(mdl.c1().value(), POLY_C1);

    // confidence never calls the optimizer
    assert!(session.conf(&args![1, 2, 3]).is_ok());
    assert_eq!(mdl.c1().value(), POLY_C1);
}

#[test]
fn test_repeated_calls_are_identical() {
    let (mut session, mdl) = poly_session();

    for method in ErrorMethod::ALL {
        let first = session.estimate_errors(method, &args![1, 2, 3]).unwrap().clone();
        let second = session.estimate_errors(method, &args![1, 2, 3]).unwrap().clone();
        assert_eq!(first.parvals, second.parvals);
        assert_eq!(first.parmins, second.parmins);
        assert_eq!(first.parmaxes, second.parmaxes);
        assert_eq!(first.statval, second.statval);
        assert_eq!(mdl.c0().value(), POLY_C0);
        assert_eq!(mdl.c1().value(), POLY_C1);
    }
}

#[test]
fn test_results_are_kept_per_method() {
    let (mut session, _) = const_session();
    for method in ErrorMethod::ALL {
        let err = session.get_results(method).unwrap_err();
        assert_eq!(err.to_string(), format!("{} has not been performed", method));
    }

    session.covar(&args![]).unwrap();
    assert_eq!(session.get_covar_results().unwrap().method, ErrorMethod::Covariance);
    assert!(session.get_conf_results().is_err());
    assert!(session.get_proj_results().is_err());

    // a failed call keeps the previous result
    assert!(session.covar(&args![9]).is_err());
    assert!(session.get_covar_results().is_ok());
}

#[test]
fn test_parallel_search_matches_serial() {
    let (mut session, _) = poly_session();
    let serial = session.proj(&args![1, 2, 3]).unwrap().clone();

    session.options_mut(ErrorMethod::Projection).parallel = true;
    let parallel = session.proj(&args![1, 2, 3]).unwrap().clone();
    assert_eq!(serial.parmins, parallel.parmins);
    assert_eq!(serial.parmaxes, parallel.parmaxes);
}

#[test]
fn test_fit_from_a_nearby_start() {
    let (mut session, mdl) = poly_session();
    mdl.c0().set_value(40.0).unwrap();
    mdl.c1().set_value(-1.5).unwrap();

    let fit = session.fit(&args![1, 2, 3]).unwrap().clone();
    assert!(fit.succeeded);
    assert_eq!(fit.parnames, vec!["mdl.c0", "mdl.c1"]);
    assert_eq!(fit.numpoints, 10);
    assert_eq!(fit.dof, 8);
    assert_relative_eq!(fit.statval, 3.3793679795414695, epsilon = 1e-6);
    assert_relative_eq!(mdl.c0().value(), POLY_C0, max_relative = 1e-3);
    assert_relative_eq!(mdl.c1().value(), POLY_C1, max_relative = 1e-3);
    assert_eq!(session.get_fit_results().unwrap().parvals, fit.parvals);
}

#[test]
fn test_fit_of_a_constant() {
    let (mut session, mdl) = const_session();
    mdl.c0().set_value(1.0).unwrap();
    let fit = session.fit(&args![]).unwrap();
    assert_relative_eq!(fit.statval, CONST_STAT, epsilon = 1e-8);
    assert_relative_eq!(mdl.c0().value(), CONST_BEST, max_relative = 1e-4);
    assert_eq!(fit.rstat, Some(fit.statval / 3.0));
}

/// Collects formatted log messages from every test thread.
struct Capture {
    messages: Mutex<Vec<String>>,
}

impl Log for Capture {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut messages) = self.messages.lock() {
                messages.push(record.args().to_string());
            }
        }
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture {
    messages: Mutex::new(Vec::new()),
};
static INIT: Once = Once::new();

fn captured() -> Vec<String> {
    INIT.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(LevelFilter::Info);
    });
    CAPTURE.messages.lock().unwrap().clone()
}

#[test]
fn test_guess_without_a_routine_is_logged() {
    captured();
    let (session, _) = const_session();

    let dummy = add(Arc::new(Scale1D::new("dummy")), Arc::new(Scale1D::new("dummy")));
    assert_eq!(dummy.name(), "(dummy + dummy)");
    assert_eq!(session.guess_model(1, &dummy).unwrap(), Guess::Unavailable);

    let messages = captured();
    assert!(messages
        .iter()
        .any(|m| m == "WARNING: No guess found for (dummy + dummy)"));
}

#[test]
fn test_guess_sets_starting_values() {
    let (session, mdl) = const_session();
    mdl.c0().set_value(100.0).unwrap();
    assert_eq!(session.guess(1).unwrap(), Guess::Applied);
    assert_relative_eq!(mdl.c0().value(), 2.625);

    let peak = Arc::new(Gauss1D::new("g"));
    let guess = session.guess_model(1, &(peak.clone() as errest_rs::ModelRef)).unwrap();
    assert_eq!(guess, Guess::Applied);
    assert_eq!(peak.ampl().value(), 4.0);
    assert_eq!(peak.pos().value(), 1.0);
}

#[test]
fn test_reports() {
    let (mut session, _) = poly_session();
    let result = session.conf(&args![3, 1]).unwrap();

    let text = result.to_string();
    assert!(text.contains("Datasets              = 3, 1"));
    assert!(text.contains("Confidence Method     = confidence"));
    assert!(text.contains("Statistic             = cstat"));
    assert!(text.contains("mdl.c0"));
    assert!(text.contains("mdl.c1"));

    let json: serde_json::Value = serde_json::from_str(&result.to_json().unwrap()).unwrap();
    assert_eq!(json["datasets"], serde_json::json!([3, 1]));
    assert_eq!(json["method"], "confidence");
    assert_eq!(json["parnames"][1], "mdl.c1");
    assert_eq!(json["upper_status"][0], "converged");
}
