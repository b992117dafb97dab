//! The operator contract.
//!
//! An operator is a map between two spaces. Functional gradients, proximal
//! operators, and solver inputs are all operators; the combinator algebra
//! composes them through the `OpHandle` shared handle.

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::{ProxError, Result};
use crate::space::Space;

/// A map `A : domain -> range` between real vector spaces.
///
/// Linear operators additionally expose an `adjoint`; differentiable
/// operators expose a `derivative` at a point, which is itself an operator.
pub trait Operator: Send + Sync {
    /// Domain of the operator.
    fn domain(&self) -> Space;

    /// Range of the operator.
    fn range(&self) -> Space;

    /// Whether the operator is linear.
    fn is_linear(&self) -> bool {
        false
    }

    /// Short name used in error messages.
    fn name(&self) -> &'static str {
        "operator"
    }

    /// Apply the operator to `x`.
    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>>;

    /// Apply the operator, writing the result into `out`.
    ///
    /// The default delegates to [`Operator::apply`]; implementations with
    /// reusable intermediates can override to avoid the allocation.
    fn apply_into(&self, x: &DVector<f64>, out: &mut DVector<f64>) -> Result<()> {
        let y = self.apply(x)?;
        self.range().check_contains(out)?;
        out.copy_from(&y);
        Ok(())
    }

    /// Adjoint of the operator. Defined for linear operators only.
    fn adjoint(&self) -> Result<OpHandle> {
        Err(ProxError::unsupported("adjoint", self.name()))
    }

    /// Derivative of the operator at `x`, as an operator.
    ///
    /// For a linear operator this is the operator itself, independent of `x`.
    fn derivative(&self, x: &DVector<f64>) -> Result<OpHandle>;
}

/// Shared handle to an operator.
pub type OpHandle = Arc<dyn Operator>;

/// A proximal factory: maps a positive step size to the proximal operator
/// `prox_{sigma * f}`.
///
/// Nonsmooth solvers consume factories rather than fixed operators so the
/// step size can vary per iteration.
pub type ProximalFactory = Arc<dyn Fn(f64) -> Result<OpHandle> + Send + Sync>;

/// Validate a proximal step size.
pub(crate) fn check_step(sigma: f64) -> Result<()> {
    if sigma > 0.0 {
        Ok(())
    } else {
        Err(ProxError::InvalidParameter(format!(
            "proximal step size must be positive, got {sigma}"
        )))
    }
}
