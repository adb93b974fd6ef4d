//! Tests for a single free parameter under every method
//!
//! A constant fitted to four points under chi2gehrels has a parabolic
//! statistic, so all three methods give the same symmetric error.

use approx::assert_relative_eq;
use errest_rs::error::Result;
use errest_rs::parameters::Bounds;
use errest_rs::{
    args, BoundStatus, Data1D, DeltaStatPolicy, ErrorMethod, Model, ParamRef, ParameterLike,
    Session,
};
use ndarray::Array1;
use std::sync::{Arc, RwLock};

use crate::test_helpers::{const_session, CONST_BEST, CONST_ERROR, CONST_STAT, CONST_Y};

#[test]
fn test_every_method_matches_the_parabola() {
    let (mut session, mdl) = const_session();

    for method in ErrorMethod::ALL {
        let result = session.estimate_errors(method, &args![]).unwrap();
        assert_eq!(result.method, method);
        assert_eq!(result.parnames, vec!["mdl.c0"]);
        assert_relative_eq!(result.parvals[0], CONST_BEST);
        assert_relative_eq!(result.statval, CONST_STAT, epsilon = 1e-10);
        assert_eq!(result.statname, "chi2gehrels");
        assert_eq!(result.numpoints, 4);
        assert_relative_eq!(result.parmins[0].unwrap(), -CONST_ERROR, max_relative = 1e-4);
        assert_relative_eq!(result.parmaxes[0].unwrap(), CONST_ERROR, max_relative = 1e-4);
        assert_eq!(result.lower_status[0], BoundStatus::Converged);
        assert_eq!(result.upper_status[0], BoundStatus::Converged);
        assert_relative_eq!(result.percent, 68.26894921370858, epsilon = 1e-8);
        assert!(!result.new_minimum);
    }

    // the parameter is back at the best fit
    assert_eq!(mdl.c0().value(), CONST_BEST);
}

#[test]
fn test_named_parameter_matches_all_parameters() {
    let (mut session, mdl) = const_session();

    for method in ErrorMethod::ALL {
        let all = session.estimate_errors(method, &args![]).unwrap().clone();
        let named = session.estimate_errors(method, &args![mdl.c0()]).unwrap().clone();
        let with_id = session.estimate_errors(method, &args![mdl.c0(), 1]).unwrap().clone();

        for result in [&named, &with_id] {
            assert_eq!(result.parnames, all.parnames);
            assert_eq!(result.parmins, all.parmins);
            assert_eq!(result.parmaxes, all.parmaxes);
        }
    }
}

#[test]
fn test_covariance_matrix_is_reported() {
    let (mut session, _) = const_session();
    let result = session.covar(&args![]).unwrap();
    let covariance = result.covariance.as_ref().unwrap();
    assert_eq!(covariance.shape(), &[1, 1]);
    assert_relative_eq!(covariance[[0, 0]], CONST_ERROR * CONST_ERROR, max_relative = 1e-4);

    let result = session.conf(&args![]).unwrap();
    assert!(result.covariance.is_none());
}

#[test]
fn test_two_sigma_bounds() {
    let (mut session, _) = const_session();
    for method in ErrorMethod::ALL {
        session.options_mut(method).sigma = 2.0;
        let result = session.estimate_errors(method, &args![]).unwrap();
        assert_relative_eq!(result.parmaxes[0].unwrap(), 2.0 * CONST_ERROR, max_relative = 1e-4);
        assert_relative_eq!(result.percent, 95.44997361036416, epsilon = 1e-8);
    }
}

#[test]
fn test_delta_stat_policies() {
    let (mut session, _) = const_session();

    session.options_mut(ErrorMethod::Confidence).delta_stat = DeltaStatPolicy::Fixed(2.71);
    let result = session.conf(&args![]).unwrap();
    assert_relative_eq!(
        result.parmaxes[0].unwrap(),
        2.71_f64.sqrt() * CONST_ERROR,
        max_relative = 1e-4
    );

    session.options_mut(ErrorMethod::Covariance).delta_stat = DeltaStatPolicy::Coverage { dof: 1 };
    let result = session.covar(&args![]).unwrap();
    assert_relative_eq!(result.parmaxes[0].unwrap(), CONST_ERROR, max_relative = 1e-4);

    session.options_mut(ErrorMethod::Projection).delta_stat = DeltaStatPolicy::Fixed(-1.0);
    assert!(session.proj(&args![]).is_err());
}

#[test]
fn test_hard_limit_is_reported() {
    let (mut session, mdl) = const_session();
    mdl.c0().set_bounds(2.0, 100.0).unwrap();

    for method in [ErrorMethod::Confidence, ErrorMethod::Projection] {
        let result = session.estimate_errors(method, &args![]).unwrap();
        assert_eq!(result.parmins[0], None);
        assert_eq!(result.lower_status[0], BoundStatus::HardLimit);
        assert_relative_eq!(result.parmaxes[0].unwrap(), CONST_ERROR, max_relative = 1e-4);
    }
}

/// A parameter type that only implements the capability interface.
struct Level {
    value: RwLock<f64>,
}

impl ParameterLike for Level {
    fn fullname(&self) -> String {
        "flat.level".to_string()
    }

    fn value(&self) -> f64 {
        *self.value.read().unwrap()
    }

    fn set_value(&self, value: f64) -> Result<()> {
        *self.value.write().unwrap() = value;
        Ok(())
    }

    fn is_frozen(&self) -> bool {
        false
    }

    fn min(&self) -> f64 {
        Bounds::unbounded().min
    }

    fn max(&self) -> f64 {
        Bounds::unbounded().max
    }
}

struct Flat {
    parameters: Vec<ParamRef>,
}

impl Model for Flat {
    fn name(&self) -> &str {
        "flat"
    }

    fn parameters(&self) -> &[ParamRef] {
        &self.parameters
    }

    fn calc(&self, pars: &[f64], x: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(Array1::from_elem(x.len(), pars[0]))
    }
}

#[test]
fn test_custom_parameter_type() {
    let level: ParamRef = Arc::new(Level {
        value: RwLock::new(CONST_BEST),
    });
    let mut session = Session::new();
    let data = Data1D::new("flat", Array1::linspace(1.0, 4.0, 4), Array1::from(CONST_Y.to_vec())).unwrap();
    session.load_data("flat", data);
    session
        .set_source(
            "flat",
            Arc::new(Flat {
                parameters: vec![level.clone()],
            }),
        )
        .unwrap();

    for method in ErrorMethod::ALL {
        let result = session.estimate_errors(method, &args![&level]).unwrap();
        assert_eq!(result.parnames, vec!["flat.level"]);
        assert_relative_eq!(result.parmaxes[0].unwrap(), CONST_ERROR, max_relative = 1e-4);
    }
    assert_eq!(level.value(), CONST_BEST);
}
