//! Tests for the iterative solvers on small, well-conditioned systems.

use std::sync::Arc;

use nalgebra::DMatrix;
use proxrust::prelude::*;

const TOL: f64 = 1e-6;

#[test]
fn test_conjugate_gradient_solves_spd_system() {
    // A = [[4, 1], [1, 3]], b = [1, 2]; exact solution (1/11, 7/11).
    let a = MatrixOperator::new(DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]));
    let rhs = rn(2).element([1.0, 2.0]).unwrap();
    let mut x = rn(2).zero();
    conjugate_gradient(&a, &mut x, &rhs, 10, None).unwrap();
    let want = rn(2).element([1.0 / 11.0, 7.0 / 11.0]).unwrap();
    assert!((x - want).norm() < TOL);
}

#[test]
fn test_conjugate_gradient_requires_matching_spaces() {
    let a = MatrixOperator::new(DMatrix::from_row_slice(3, 2, &[1.0; 6]));
    let mut x = rn(2).zero();
    let rhs = rn(3).zero();
    assert!(matches!(
        conjugate_gradient(&a, &mut x, &rhs, 5, None),
        Err(ProxError::DomainMismatch { .. })
    ));
}

#[test]
fn test_conjugate_gradient_normal_recovers_overdetermined() {
    // A is 3x2 with exact data rhs = A * (1, 2).
    let a = MatrixOperator::new(DMatrix::from_row_slice(
        3,
        2,
        &[1.0, 0.0, 0.0, 1.0, 1.0, 1.0],
    ));
    let truth = rn(2).element([1.0, 2.0]).unwrap();
    let rhs = a.apply(&truth).unwrap();
    let mut x = rn(2).zero();
    conjugate_gradient_normal(&a, &mut x, &rhs, 10, None).unwrap();
    assert!((x - truth).norm() < TOL);
}

#[test]
fn test_landweber_converges() {
    let a = MatrixOperator::new(DMatrix::from_row_slice(2, 2, &[2.0, 0.0, 0.0, 1.0]));
    let truth = rn(2).element([1.0, 1.0]).unwrap();
    let rhs = a.apply(&truth).unwrap();
    let mut x = rn(2).zero();
    // omega must stay below 2 / ||A||^2 = 0.5.
    landweber(&a, &mut x, &rhs, 300, 0.3, None).unwrap();
    assert!((x - truth).norm() < TOL);
}

#[test]
fn test_landweber_rejects_nonpositive_relaxation() {
    let a = MatrixOperator::new(DMatrix::identity(2, 2));
    let mut x = rn(2).zero();
    let rhs = rn(2).one();
    assert!(matches!(
        landweber(&a, &mut x, &rhs, 5, 0.0, None),
        Err(ProxError::InvalidParameter(_))
    ));
}

#[test]
fn test_gauss_newton_with_exp_zero_seq() {
    let a = MatrixOperator::new(DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 3.0]));
    let truth = rn(2).element([1.0, -1.0]).unwrap();
    let rhs = a.apply(&truth).unwrap();
    let mut x = rn(2).zero();
    let mut zero_seq = ExpZeroSeq::new(2.0).unwrap();
    gauss_newton(&a, &mut x, &rhs, 25, &mut zero_seq, None).unwrap();
    assert!((x - truth).norm() < 1e-4);
}

#[test]
fn test_callback_observes_every_iteration() {
    let a = MatrixOperator::new(DMatrix::identity(2, 2));
    let rhs = rn(2).one();
    let mut x = rn(2).zero();
    let mut count = 0;
    let mut observer = |_: &nalgebra::DVector<f64>| count += 1;
    landweber(&a, &mut x, &rhs, 7, 0.5, Some(&mut observer)).unwrap();
    assert_eq!(count, 7);
}

#[test]
fn test_solvers_compose_with_operator_combinators() {
    // Solve (A^T A + 0.1 I) x = b through the combinator-built operator.
    let a: OpHandle = Arc::new(MatrixOperator::new(DMatrix::from_row_slice(
        2,
        2,
        &[1.0, 2.0, 0.0, 1.0],
    )));
    let normal = OpComp::new(a.adjoint().unwrap(), a.clone()).unwrap();
    let ridge = OpLeftScalarMult::new(
        Arc::new(IdentityOperator::new(rn(2))) as OpHandle,
        0.1,
    );
    let system = OpSum::new(Arc::new(normal), Arc::new(ridge)).unwrap();
    let rhs = rn(2).element([1.0, 1.0]).unwrap();
    let mut x = rn(2).zero();
    conjugate_gradient(&system, &mut x, &rhs, 20, None).unwrap();
    // Residual check against the same operator.
    let residual = rhs - system.apply(&x).unwrap();
    assert!(residual.norm() < TOL);
}
