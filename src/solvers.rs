//! Simple iterative optimization schemes.
//!
//! Sequential consumers of the operator contract. All solvers update the
//! iterate in place, reuse temporaries through the buffered `apply_into`
//! path, and report progress through an optional per-iteration callback.

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::{ProxError, Result};
use crate::operator::{IdentityOperator, OpComp, OpHandle, OpLeftScalarMult, OpSum, Operator};
use crate::space::lincomb;

/// Per-iteration observer invoked with the current iterate.
pub type Callback<'a> = Option<&'a mut dyn FnMut(&DVector<f64>)>;

/// Landweber iteration for `A(x) = rhs`:
///
/// `x <- x - omega * (A'(x))^* (A(x) - rhs)`
///
/// `omega` must lie in `(0, 2 / ||A||^2)` for convergence; it is only checked
/// for positivity here.
pub fn landweber(
    op: &dyn Operator,
    x: &mut DVector<f64>,
    rhs: &DVector<f64>,
    niter: usize,
    omega: f64,
    mut callback: Callback<'_>,
) -> Result<()> {
    if omega <= 0.0 {
        return Err(ProxError::InvalidParameter(format!(
            "relaxation parameter must be positive, got {omega}"
        )));
    }
    op.domain().check_contains(x)?;
    op.range().check_contains(rhs)?;

    let mut tmp_ran = op.range().zero();
    let mut tmp_dom = op.domain().zero();
    for _ in 0..niter {
        op.apply_into(x, &mut tmp_ran)?;
        tmp_ran -= rhs;
        op.derivative(x)?.adjoint()?.apply_into(&tmp_ran, &mut tmp_dom)?;
        x.axpy(-omega, &tmp_dom, 1.0);

        if let Some(cb) = callback.as_deref_mut() {
            cb(x);
        }
    }
    Ok(())
}

/// Conjugate-gradient iteration for a linear, self-adjoint operator.
pub fn conjugate_gradient(
    op: &dyn Operator,
    x: &mut DVector<f64>,
    rhs: &DVector<f64>,
    niter: usize,
    mut callback: Callback<'_>,
) -> Result<()> {
    if op.domain() != op.range() {
        return Err(ProxError::domain_mismatch(op.domain(), op.range()));
    }
    op.domain().check_contains(x)?;

    let mut r = rhs - op.apply(x)?;
    let mut p = r.clone();
    let mut ap = op.domain().zero();
    let mut sqnorm_r_old = r.norm_squared();

    for _ in 0..niter {
        op.apply_into(&p, &mut ap)?;

        let alpha = sqnorm_r_old / p.dot(&ap);
        if alpha == 0.0 {
            // Residual is zero; the iterate already solves the system.
            return Ok(());
        }

        x.axpy(alpha, &p, 1.0);
        r.axpy(-alpha, &ap, 1.0);

        let sqnorm_r_new = r.norm_squared();
        let beta = sqnorm_r_new / sqnorm_r_old;
        sqnorm_r_old = sqnorm_r_new;

        p.axpy(1.0, &r, beta);

        if let Some(cb) = callback.as_deref_mut() {
            cb(x);
        }
    }
    Ok(())
}

/// Conjugate-gradient iteration on the normal equation `A^* A x = A^* rhs`
/// for a linear operator `A`.
pub fn conjugate_gradient_normal(
    op: &dyn Operator,
    x: &mut DVector<f64>,
    rhs: &DVector<f64>,
    niter: usize,
    mut callback: Callback<'_>,
) -> Result<()> {
    op.domain().check_contains(x)?;
    op.range().check_contains(rhs)?;

    let mut d = rhs - op.apply(x)?;
    let mut p = op.derivative(x)?.adjoint()?.apply(&d)?;
    let mut s = p.clone();
    let mut q = op.range().zero();
    let mut sqnorm_s_old = s.norm_squared();

    for _ in 0..niter {
        op.apply_into(&p, &mut q)?;
        let sqnorm_q = q.norm_squared();
        if sqnorm_q == 0.0 {
            return Ok(());
        }

        let a = sqnorm_s_old / sqnorm_q;
        x.axpy(a, &p, 1.0);
        d.axpy(-a, &q, 1.0);
        op.derivative(&p)?.adjoint()?.apply_into(&d, &mut s)?;

        let sqnorm_s_new = s.norm_squared();
        let b = sqnorm_s_new / sqnorm_s_old;
        sqnorm_s_old = sqnorm_s_new;

        p.axpy(1.0, &s, b);

        if let Some(cb) = callback.as_deref_mut() {
            cb(x);
        }
    }
    Ok(())
}

/// The exponential zero sequence `t_m = base^(-m-1)` as an explicit
/// generator object.
///
/// Passed by the caller to [`gauss_newton`] to control the per-step
/// regularization; any `Iterator<Item = f64>` works in its place.
#[derive(Debug, Clone)]
pub struct ExpZeroSeq {
    value: f64,
    base: f64,
}

impl ExpZeroSeq {
    /// Create the sequence for a base with absolute value larger than one.
    pub fn new(base: f64) -> Result<Self> {
        if base.abs() <= 1.0 {
            return Err(ProxError::InvalidParameter(format!(
                "zero-sequence base must have absolute value larger than one, got {base}"
            )));
        }
        Ok(ExpZeroSeq { value: 1.0, base })
    }
}

impl Iterator for ExpZeroSeq {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        self.value /= self.base;
        Some(self.value)
    }
}

/// Gauss-Newton iteration for `A(x) = rhs` with a differentiable operator.
///
/// Each step solves the regularized linearized normal equation
/// `(A'(x)^* A'(x) + t_m I) dx = u` with a few conjugate-gradient sweeps.
pub fn gauss_newton(
    op: &dyn Operator,
    x: &mut DVector<f64>,
    rhs: &DVector<f64>,
    niter: usize,
    zero_seq: &mut dyn Iterator<Item = f64>,
    mut callback: Callback<'_>,
) -> Result<()> {
    op.domain().check_contains(x)?;
    op.range().check_contains(rhs)?;

    let domain = op.domain();
    let x0 = x.clone();
    let mut dx = domain.zero();

    let mut tmp_dom = domain.zero();
    let mut u = domain.zero();
    let mut tmp_ran = op.range().zero();
    let mut v = op.range().zero();

    for _ in 0..niter {
        let tm = zero_seq.next().ok_or_else(|| {
            ProxError::InvalidParameter("zero sequence exhausted before the iteration finished".into())
        })?;
        let deriv = op.derivative(x)?;
        let deriv_adjoint = deriv.adjoint()?;

        // v = rhs - op(x) - deriv(x0 - x);  u = deriv^*(v)
        op.apply_into(x, &mut tmp_ran)?;
        lincomb(&mut v, 1.0, rhs, -1.0, &tmp_ran);
        lincomb(&mut tmp_dom, 1.0, &x0, -1.0, x);
        deriv.apply_into(&tmp_dom, &mut tmp_ran)?;
        v -= &tmp_ran;
        deriv_adjoint.apply_into(&v, &mut u)?;

        // Solve (deriv^* o deriv + tm * I) dx = u approximately.
        let normal = OpComp::new(deriv_adjoint.clone(), deriv.clone())?;
        let regularizer = OpLeftScalarMult::new(
            Arc::new(IdentityOperator::new(domain)) as OpHandle,
            tm,
        );
        let system = OpSum::new(Arc::new(normal), Arc::new(regularizer))?;
        conjugate_gradient(&system, &mut dx, &u, 3, None)?;

        // x = x0 + dx
        x.copy_from(&x0);
        *x += &dx;

        if let Some(cb) = callback.as_deref_mut() {
            cb(x);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exp_zero_seq_values() {
        let mut seq = ExpZeroSeq::new(2.0).unwrap();
        assert_eq!(seq.next(), Some(0.5));
        assert_eq!(seq.next(), Some(0.25));
        assert_eq!(seq.next(), Some(0.125));
    }

    #[test]
    fn test_exp_zero_seq_rejects_small_base() {
        assert!(ExpZeroSeq::new(1.0).is_err());
        assert!(ExpZeroSeq::new(-0.5).is_err());
    }
}
