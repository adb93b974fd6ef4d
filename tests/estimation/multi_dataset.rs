//! Tests for joint estimates over several datasets
//!
//! A straight line shared by three datasets under cstat. A fourth dataset
//! also uses the line but is never selected, so it must not change anything.

use approx::assert_relative_eq;
use errest_rs::{args, DatasetId, ErrorEstimationResult, ErrorMethod, ParameterLike, Session};

use crate::test_helpers::{poly_session, rel_close, POLY_C0, POLY_C1, POLY_STAT};

fn check_bounds(result: &ErrorEstimationResult, expected: [(f64, f64); 2], tol: f64) {
    assert_eq!(result.parnames, vec!["mdl.c0", "mdl.c1"]);
    for (i, (lo, hi)) in expected.iter().enumerate() {
        let got_lo = result.parmins[i].unwrap();
        let got_hi = result.parmaxes[i].unwrap();
        assert!(rel_close(got_lo, *lo, tol), "{}: lower {} vs {}", result.parnames[i], got_lo, lo);
        assert!(rel_close(got_hi, *hi, tol), "{}: upper {} vs {}", result.parnames[i], got_hi, hi);
    }
}

#[test]
fn test_joint_statistic() {
    let (session, _) = poly_session();
    let stat = session.calc_stat(&args![1, 2, 3]).unwrap();
    assert_relative_eq!(stat, POLY_STAT, epsilon = 1e-8);
}

#[test]
fn test_projection() {
    let (mut session, _) = poly_session();
    let result = session.proj(&args![1, 2, 3]).unwrap();

    assert_eq!(result.numpoints, 10);
    assert_eq!(result.statname, "cstat");
    assert_relative_eq!(result.statval, POLY_STAT, epsilon = 1e-8);
    assert_eq!(result.parvals, vec![POLY_C0, POLY_C1]);
    check_bounds(
        result,
        [(-2.8025869574, 2.8924743789), (-0.1982317938, 0.2105513589)],
        2e-3,
    );
    assert!(!result.new_minimum);
}

#[test]
fn test_confidence() {
    let (mut session, _) = poly_session();
    let result = session.conf(&args![1, 2, 3]).unwrap();
    check_bounds(
        result,
        [(-1.4407753054, 1.5603216057), (-0.0978855973, 0.1170904700)],
        1e-3,
    );
}

#[test]
fn test_covariance() {
    let (mut session, _) = poly_session();
    let result = session.covar(&args![1, 2, 3]).unwrap();
    check_bounds(result, [(-2.847067, 2.847067), (-0.2039262, 0.2039262)], 1e-4);

    let covariance = result.covariance.as_ref().unwrap();
    assert_eq!(covariance.shape(), &[2, 2]);
    assert_relative_eq!(covariance[[0, 1]], covariance[[1, 0]], max_relative = 1e-6);
    // intercept and slope are anti-correlated
    assert!(covariance[[0, 1]] < 0.0);
}

#[test]
fn test_projection_is_wider_than_confidence() {
    let (mut session, _) = poly_session();
    let conf = session.conf(&args![1, 2, 3]).unwrap().clone();
    let proj = session.proj(&args![1, 2, 3]).unwrap().clone();
    for i in 0..2 {
        assert!(proj.parmaxes[i].unwrap() > conf.parmaxes[i].unwrap());
        assert!(proj.parmins[i].unwrap() < conf.parmins[i].unwrap());
    }
}

#[test]
fn test_unselected_dataset_has_no_effect() {
    let (mut session, _) = poly_session();

    let mut reference = Session::new();
    reference.set_stat(errest_rs::StatKind::CStat);
    for id in 1..=3 {
        let data = session.get_data(id).unwrap().clone();
        reference.load_data(id, data);
        reference
            .set_source(id, session.get_source(id).unwrap().clone())
            .unwrap();
    }

    for method in ErrorMethod::ALL {
        let joint = session.estimate_errors(method, &args![1, 2, 3]).unwrap().clone();
        let alone = reference.estimate_errors(method, &args![]).unwrap().clone();
        assert_eq!(joint.parmins, alone.parmins);
        assert_eq!(joint.parmaxes, alone.parmaxes);
        assert_eq!(joint.numpoints, alone.numpoints);
    }
}

#[test]
fn test_single_parameter_of_a_joint_fit() {
    let (mut session, mdl) = poly_session();

    for method in ErrorMethod::ALL {
        let both = session.estimate_errors(method, &args![1, 2, 3]).unwrap().clone();
        let one = session
            .estimate_errors(method, &args![mdl.c1(), 1, 2, 3])
            .unwrap()
            .clone();
        assert_eq!(one.parnames, vec!["mdl.c1"]);
        assert_relative_eq!(one.parmins[0].unwrap(), both.parmins[1].unwrap(), max_relative = 1e-9);
        assert_relative_eq!(one.parmaxes[0].unwrap(), both.parmaxes[1].unwrap(), max_relative = 1e-9);
    }
}

#[test]
fn test_subset_of_datasets() {
    let (mut session, mdl) = poly_session();
    let result = session.covar(&args![2, 3]).unwrap();
    assert_eq!(result.datasets, vec![DatasetId::from(2), DatasetId::from(3)]);
    assert_eq!(result.numpoints, 6);
    assert_eq!(mdl.c0().value(), POLY_C0);
}
