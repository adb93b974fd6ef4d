//! Tests for argument resolution through the session entry points
//!
//! Every method shares the same resolver, so each case is checked against
//! covariance, confidence and projection.

use errest_rs::{args, Const1D, DatasetId, ErrorArg, ErrorMethod, EstError, Session};
use std::sync::Arc;

use crate::test_helpers::{const_session, poly_session};

const LIST_MESSAGE: &str = "identifiers must be integers or strings";

fn assert_argument_type(err: EstError) {
    assert!(matches!(err, EstError::ArgumentType(_)), "got {:?}", err);
    assert_eq!(err.to_string(), LIST_MESSAGE);
}

#[test]
fn test_list_arguments_are_rejected() {
    let (mut session, mdl) = poly_session();
    let cases: Vec<Vec<ErrorArg>> = vec![
        args![vec![1, 2]],
        args![vec!["a", "b"]],
        args![1, [2, 3]],
        args![mdl.c0(), vec![1]],
        args![vec![mdl.c0()]],
    ];

    for method in ErrorMethod::ALL {
        for case in &cases {
            let err = session.estimate_errors(method, case).unwrap_err();
            assert_argument_type(err);
        }
    }
}

#[test]
fn test_list_arguments_are_rejected_before_dataset_checks() {
    let mut session = Session::new();
    for method in ErrorMethod::ALL {
        assert_argument_type(session.estimate_errors(method, &args![vec![1]]).unwrap_err());
        assert_argument_type(session.estimate_errors(method, &args![vec!["x"]]).unwrap_err());
        // an unknown id listed first does not win over the list
        assert_argument_type(session.estimate_errors(method, &args![7, vec![1]]).unwrap_err());
    }
}

#[test]
fn test_frozen_parameter() {
    let (mut session, mdl) = poly_session();
    mdl.c1().freeze();

    for method in ErrorMethod::ALL {
        let err = session.estimate_errors(method, &args![1, mdl.c1()]).unwrap_err();
        assert!(matches!(err, EstError::Parameter(_)));
        assert_eq!(err.to_string(), "parameter 'mdl.c1' is frozen");
    }
}

#[test]
fn test_unknown_and_duplicate_ids() {
    let (mut session, mdl) = const_session();

    for method in ErrorMethod::ALL {
        let err = session.estimate_errors(method, &args![7]).unwrap_err();
        assert!(matches!(err, EstError::Identifier(_)));
        assert_eq!(err.to_string(), "data set 7 has not been set");

        let err = session.estimate_errors(method, &args![1, mdl.c0(), 1]).unwrap_err();
        assert_eq!(err.to_string(), "data set 1 was given more than once");
    }
}

#[test]
fn test_dataset_without_source() {
    let (mut session, _) = const_session();
    session
        .load_arrays("bare", vec![1.0, 2.0], vec![3.0, 4.0])
        .unwrap();

    let err = session.covar(&args!["bare"]).unwrap_err();
    assert!(matches!(err, EstError::Identifier(_)));
    assert_eq!(
        err.to_string(),
        "source bare has not been set, consider using set_source() or set_model()"
    );
}

#[test]
fn test_empty_sessions() {
    let mut session = Session::new();
    let err = session.conf(&args![]).unwrap_err();
    assert_eq!(err.to_string(), "no data sets have been loaded");

    session
        .load_arrays(1, vec![1.0, 2.0], vec![3.0, 4.0])
        .unwrap();
    let err = session.conf(&args![]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "no source models have been set, consider using set_source() or set_model()"
    );
}

#[test]
fn test_parameter_outside_the_fit() {
    let (mut session, _) = const_session();
    let other = Arc::new(Const1D::new("x"));
    session.load_arrays(2, vec![1.0], vec![2.0]).unwrap();
    session.set_source(2, other.clone()).unwrap();

    let err = session.proj(&args![1, other.c0()]).unwrap_err();
    assert!(matches!(err, EstError::Parameter(_)));
    assert_eq!(
        err.to_string(),
        "parameter 'x.c0' is not part of the fit to data set(s) 1"
    );
}

#[test]
fn test_dataset_order_is_preserved() {
    let (mut session, mdl) = poly_session();

    for method in ErrorMethod::ALL {
        let result = session.estimate_errors(method, &args![3, 1, 2]).unwrap();
        assert_eq!(
            result.datasets,
            vec![DatasetId::from(3), DatasetId::from(1), DatasetId::from(2)]
        );

        // parameters and ids may be interleaved
        let result = session
            .estimate_errors(method, &args![mdl.c0(), 2, 1, 3])
            .unwrap();
        assert_eq!(
            result.datasets,
            vec![DatasetId::from(2), DatasetId::from(1), DatasetId::from(3)]
        );
        assert_eq!(result.parnames, vec!["mdl.c0"]);
    }
}
