//! Leaf functionals built from user-supplied callables.
//!
//! `simple_functional` returns a builder collecting optional value, gradient,
//! and proximal callables for a functional and, independently, for its convex
//! conjugate. Any capability left out fails with "not implemented" on access;
//! the conjugate of the built functional swaps the two callable sets, so
//! conjugation is an involution by construction.

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::Result;
use crate::functional::functional::{FuncNode, Functional};
use crate::operator::{CallableOperator, OpHandle, ProximalFactory};
use crate::space::Space;

pub(crate) type ValueFn = Arc<dyn Fn(&DVector<f64>) -> f64 + Send + Sync>;

/// One side (primal or dual) of a leaf functional.
#[derive(Clone)]
pub(crate) struct LeafParts {
    pub(crate) value: Option<ValueFn>,
    pub(crate) gradient: Option<OpHandle>,
    pub(crate) proximal: Option<ProximalFactory>,
    pub(crate) grad_lipschitz: f64,
}

impl Default for LeafParts {
    fn default() -> Self {
        LeafParts {
            value: None,
            gradient: None,
            proximal: None,
            grad_lipschitz: f64::NAN,
        }
    }
}

/// Builder for a leaf functional.
///
/// ```
/// use proxrust::prelude::*;
///
/// let space = rn(3);
/// let func = simple_functional(space)
///     .value(|x| x.iter().map(|v| v * v).sum())
///     .gradient_fn(|x| Ok(x * 2.0))
///     .build();
/// let x = space.element([1.0, 2.0, 3.0]).unwrap();
/// assert_eq!(func.call(&x).unwrap(), 14.0);
/// ```
pub struct FunctionalBuilder {
    space: Space,
    linear: bool,
    primal: LeafParts,
    dual: LeafParts,
}

impl FunctionalBuilder {
    pub fn new(space: Space) -> Self {
        FunctionalBuilder {
            space,
            linear: false,
            primal: LeafParts::default(),
            dual: LeafParts::default(),
        }
    }

    /// Evaluation callable.
    pub fn value(mut self, f: impl Fn(&DVector<f64>) -> f64 + Send + Sync + 'static) -> Self {
        self.primal.value = Some(Arc::new(f));
        self
    }

    /// Gradient as a plain callable, wrapped into an operator.
    pub fn gradient_fn(
        mut self,
        f: impl Fn(&DVector<f64>) -> Result<DVector<f64>> + Send + Sync + 'static,
    ) -> Self {
        self.primal.gradient = Some(Arc::new(CallableOperator::new(self.space, self.space, f)));
        self
    }

    /// Gradient as an operator.
    pub fn gradient_op(mut self, op: OpHandle) -> Self {
        self.primal.gradient = Some(op);
        self
    }

    /// Proximal factory.
    pub fn proximal(mut self, factory: ProximalFactory) -> Self {
        self.primal.proximal = Some(factory);
        self
    }

    /// Lipschitz constant of the gradient.
    pub fn grad_lipschitz(mut self, value: f64) -> Self {
        self.primal.grad_lipschitz = value;
        self
    }

    /// Evaluation callable of the convex conjugate.
    pub fn conj_value(mut self, f: impl Fn(&DVector<f64>) -> f64 + Send + Sync + 'static) -> Self {
        self.dual.value = Some(Arc::new(f));
        self
    }

    /// Gradient callable of the convex conjugate.
    pub fn conj_gradient_fn(
        mut self,
        f: impl Fn(&DVector<f64>) -> Result<DVector<f64>> + Send + Sync + 'static,
    ) -> Self {
        self.dual.gradient = Some(Arc::new(CallableOperator::new(self.space, self.space, f)));
        self
    }

    /// Gradient operator of the convex conjugate.
    pub fn conj_gradient_op(mut self, op: OpHandle) -> Self {
        self.dual.gradient = Some(op);
        self
    }

    /// Proximal factory of the convex conjugate.
    pub fn conj_proximal(mut self, factory: ProximalFactory) -> Self {
        self.dual.proximal = Some(factory);
        self
    }

    /// Lipschitz constant of the conjugate's gradient.
    pub fn conj_grad_lipschitz(mut self, value: f64) -> Self {
        self.dual.grad_lipschitz = value;
        self
    }

    /// Mark the functional as linear.
    pub fn linear(mut self) -> Self {
        self.linear = true;
        self
    }

    /// Build the functional.
    pub fn build(self) -> Functional {
        let grad_lipschitz = self.primal.grad_lipschitz;
        Functional::from_parts(
            self.space,
            self.linear,
            grad_lipschitz,
            FuncNode::Simple {
                primal: self.primal,
                dual: self.dual,
            },
        )
    }
}

/// Start building a leaf functional on `space`.
pub fn simple_functional(space: Space) -> FunctionalBuilder {
    FunctionalBuilder::new(space)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProxError;
    use crate::space::rn;

    #[test]
    fn test_missing_capabilities_are_unsupported() {
        let space = rn(2);
        let func = simple_functional(space).value(|x| x.sum()).build();
        let x = space.one();
        assert_eq!(func.call(&x).unwrap(), 2.0);
        assert!(matches!(
            func.gradient(),
            Err(ProxError::UnsupportedOperation { .. })
        ));
        assert!(matches!(
            func.proximal(),
            Err(ProxError::UnsupportedOperation { .. })
        ));
    }

    #[test]
    fn test_conjugate_swaps_and_involutes() {
        let space = rn(2);
        let func = simple_functional(space)
            .value(|x| x.norm_squared())
            .conj_value(|x| x.norm_squared() / 4.0)
            .build();
        let x = space.element([2.0, 0.0]).unwrap();
        let conj = func.convex_conj().unwrap();
        assert_eq!(conj.call(&x).unwrap(), 1.0);
        let back = conj.convex_conj().unwrap();
        assert_eq!(back.call(&x).unwrap(), 4.0);
    }
}
