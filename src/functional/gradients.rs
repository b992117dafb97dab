//! Dedicated gradient operators for combinators whose gradients are not
//! plain compositions of stock operators.

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::{ProxError, Result};
use crate::functional::functional::Functional;
use crate::operator::{OpComp, OpHandle, Operator};
use crate::space::Space;

/// Gradient of `f(op(.))` by the chain rule via the adjoint of the
/// derivative: `x -> op'(x)^* (grad f)(op(x))`.
#[derive(Clone)]
pub struct CompositionGradient {
    func: Arc<Functional>,
    op: OpHandle,
}

impl CompositionGradient {
    pub(crate) fn new(func: Arc<Functional>, op: OpHandle) -> Self {
        CompositionGradient { func, op }
    }
}

impl Operator for CompositionGradient {
    fn domain(&self) -> Space {
        self.op.domain()
    }

    fn range(&self) -> Space {
        self.op.domain()
    }

    fn name(&self) -> &'static str {
        "CompositionGradient"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let inner = self.op.apply(x)?;
        let outer_grad = self.func.gradient()?.apply(&inner)?;
        self.op.derivative(x)?.adjoint()?.apply(&outer_grad)
    }

    fn derivative(&self, x: &DVector<f64>) -> Result<OpHandle> {
        // Only defined when the inner operator is linear; then the gradient
        // is op^* o (grad f) o op and the chain rule applies directly.
        if !self.op.is_linear() {
            return Err(ProxError::unsupported(
                "derivative",
                "CompositionGradient with a nonlinear inner operator",
            ));
        }
        let grad = self.func.gradient()?;
        let chain = OpComp::new(
            self.op.adjoint()?,
            Arc::new(OpComp::new(grad, self.op.clone())?),
        )?;
        chain.derivative(x)
    }
}

/// Gradient of `f(.) * g(.)` by the Leibniz rule:
/// `x -> g(x) (grad f)(x) + f(x) (grad g)(x)`.
#[derive(Clone)]
pub struct ProductGradient {
    left: Arc<Functional>,
    right: Arc<Functional>,
}

impl ProductGradient {
    pub(crate) fn new(left: Arc<Functional>, right: Arc<Functional>) -> Self {
        ProductGradient { left, right }
    }
}

impl Operator for ProductGradient {
    fn domain(&self) -> Space {
        self.left.domain()
    }

    fn range(&self) -> Space {
        self.left.domain()
    }

    fn name(&self) -> &'static str {
        "ProductGradient"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let left_grad = self.left.gradient()?.apply(x)?;
        let right_grad = self.right.gradient()?.apply(x)?;
        Ok(left_grad * self.right.call(x)? + right_grad * self.left.call(x)?)
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Err(ProxError::unsupported("derivative", self.name()))
    }
}

/// Gradient of `f(.) / g(.)` by the quotient rule:
/// `x -> (grad f)(x) / g(x) - f(x) (grad g)(x) / g(x)^2`.
#[derive(Clone)]
pub struct QuotientGradient {
    dividend: Arc<Functional>,
    divisor: Arc<Functional>,
}

impl QuotientGradient {
    pub(crate) fn new(dividend: Arc<Functional>, divisor: Arc<Functional>) -> Self {
        QuotientGradient { dividend, divisor }
    }
}

impl Operator for QuotientGradient {
    fn domain(&self) -> Space {
        self.dividend.domain()
    }

    fn range(&self) -> Space {
        self.dividend.domain()
    }

    fn name(&self) -> &'static str {
        "QuotientGradient"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        let dividend_x = self.dividend.call(x)?;
        let divisor_x = self.divisor.call(x)?;
        let dividend_grad = self.dividend.gradient()?.apply(x)?;
        let divisor_grad = self.divisor.gradient()?.apply(x)?;
        Ok(dividend_grad * (1.0 / divisor_x)
            + divisor_grad * (-dividend_x / (divisor_x * divisor_x)))
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Err(ProxError::unsupported("derivative", self.name()))
    }
}
