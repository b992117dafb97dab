//! Operator combinators: sum, composition, and scalar multiplication.
//!
//! These carry adjoints and derivatives through the usual identities so that
//! composite gradients assembled by the functional algebra remain full
//! operators.

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::{ProxError, Result};
use crate::operator::base::{OpHandle, Operator};
use crate::space::Space;

/// Pointwise sum of two operators: `x -> a(x) + b(x)`.
#[derive(Clone)]
pub struct OpSum {
    left: OpHandle,
    right: OpHandle,
}

impl OpSum {
    pub fn new(left: OpHandle, right: OpHandle) -> Result<Self> {
        if left.domain() != right.domain() {
            return Err(ProxError::domain_mismatch(left.domain(), right.domain()));
        }
        if left.range() != right.range() {
            return Err(ProxError::domain_mismatch(left.range(), right.range()));
        }
        Ok(OpSum { left, right })
    }
}

impl Operator for OpSum {
    fn domain(&self) -> Space {
        self.left.domain()
    }

    fn range(&self) -> Space {
        self.left.range()
    }

    fn is_linear(&self) -> bool {
        self.left.is_linear() && self.right.is_linear()
    }

    fn name(&self) -> &'static str {
        "OpSum"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        Ok(self.left.apply(x)? + self.right.apply(x)?)
    }

    fn adjoint(&self) -> Result<OpHandle> {
        let sum = OpSum::new(self.left.adjoint()?, self.right.adjoint()?)?;
        Ok(Arc::new(sum))
    }

    fn derivative(&self, x: &DVector<f64>) -> Result<OpHandle> {
        let sum = OpSum::new(self.left.derivative(x)?, self.right.derivative(x)?)?;
        Ok(Arc::new(sum))
    }
}

/// Composition of two operators: `x -> left(right(x))`.
#[derive(Clone)]
pub struct OpComp {
    left: OpHandle,
    right: OpHandle,
}

impl OpComp {
    pub fn new(left: OpHandle, right: OpHandle) -> Result<Self> {
        if right.range() != left.domain() {
            return Err(ProxError::domain_mismatch(left.domain(), right.range()));
        }
        Ok(OpComp { left, right })
    }
}

impl Operator for OpComp {
    fn domain(&self) -> Space {
        self.right.domain()
    }

    fn range(&self) -> Space {
        self.left.range()
    }

    fn is_linear(&self) -> bool {
        self.left.is_linear() && self.right.is_linear()
    }

    fn name(&self) -> &'static str {
        "OpComp"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.left.apply(&self.right.apply(x)?)
    }

    fn adjoint(&self) -> Result<OpHandle> {
        // (L o R)^* = R^* o L^*
        let comp = OpComp::new(self.right.adjoint()?, self.left.adjoint()?)?;
        Ok(Arc::new(comp))
    }

    fn derivative(&self, x: &DVector<f64>) -> Result<OpHandle> {
        // Chain rule: d(L o R)(x) = L'(R(x)) o R'(x).
        let inner = self.right.apply(x)?;
        let comp = OpComp::new(self.left.derivative(&inner)?, self.right.derivative(x)?)?;
        Ok(Arc::new(comp))
    }
}

/// Scalar multiplication of the result: `x -> s * op(x)`.
#[derive(Clone)]
pub struct OpLeftScalarMult {
    op: OpHandle,
    scalar: f64,
}

impl OpLeftScalarMult {
    pub fn new(op: OpHandle, scalar: f64) -> Self {
        OpLeftScalarMult { op, scalar }
    }
}

impl Operator for OpLeftScalarMult {
    fn domain(&self) -> Space {
        self.op.domain()
    }

    fn range(&self) -> Space {
        self.op.range()
    }

    fn is_linear(&self) -> bool {
        self.op.is_linear()
    }

    fn name(&self) -> &'static str {
        "OpLeftScalarMult"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        Ok(self.op.apply(x)? * self.scalar)
    }

    fn adjoint(&self) -> Result<OpHandle> {
        // Real scalars commute with the adjoint.
        Ok(Arc::new(OpLeftScalarMult::new(self.op.adjoint()?, self.scalar)))
    }

    fn derivative(&self, x: &DVector<f64>) -> Result<OpHandle> {
        Ok(Arc::new(OpLeftScalarMult::new(
            self.op.derivative(x)?,
            self.scalar,
        )))
    }
}

/// Scalar multiplication of the argument: `x -> op(s * x)`.
#[derive(Clone)]
pub struct OpRightScalarMult {
    op: OpHandle,
    scalar: f64,
}

impl OpRightScalarMult {
    pub fn new(op: OpHandle, scalar: f64) -> Self {
        OpRightScalarMult { op, scalar }
    }
}

impl Operator for OpRightScalarMult {
    fn domain(&self) -> Space {
        self.op.domain()
    }

    fn range(&self) -> Space {
        self.op.range()
    }

    fn is_linear(&self) -> bool {
        self.op.is_linear()
    }

    fn name(&self) -> &'static str {
        "OpRightScalarMult"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.op.apply(&(x * self.scalar))
    }

    fn adjoint(&self) -> Result<OpHandle> {
        // (A o sI)^* = s A^*
        Ok(Arc::new(OpLeftScalarMult::new(self.op.adjoint()?, self.scalar)))
    }

    fn derivative(&self, x: &DVector<f64>) -> Result<OpHandle> {
        // d/dx op(s x) = s * op'(s x)
        let deriv = self.op.derivative(&(x * self.scalar))?;
        Ok(Arc::new(OpLeftScalarMult::new(deriv, self.scalar)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::default_ops::{IdentityOperator, MatrixOperator, ScalingOperator};
    use crate::space::rn;
    use nalgebra::DMatrix;

    #[test]
    fn test_sum_applies_pointwise() {
        let space = rn(2);
        let id: OpHandle = Arc::new(IdentityOperator::new(space));
        let twice: OpHandle = Arc::new(ScalingOperator::new(space, 2.0));
        let sum = OpSum::new(id, twice).unwrap();
        let x = space.element([1.0, -1.0]).unwrap();
        assert_eq!(sum.apply(&x).unwrap(), space.element([3.0, -3.0]).unwrap());
        assert!(sum.is_linear());
    }

    #[test]
    fn test_sum_rejects_mismatched_spaces() {
        let id2: OpHandle = Arc::new(IdentityOperator::new(rn(2)));
        let id3: OpHandle = Arc::new(IdentityOperator::new(rn(3)));
        assert!(OpSum::new(id2, id3).is_err());
    }

    #[test]
    fn test_comp_chain_rule_linear() {
        let m = DMatrix::from_row_slice(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        let swap: OpHandle = Arc::new(MatrixOperator::new(m));
        let scale: OpHandle = Arc::new(ScalingOperator::new(rn(2), 3.0));
        let comp = OpComp::new(swap, scale).unwrap();
        let x = rn(2).element([1.0, 2.0]).unwrap();
        assert_eq!(comp.apply(&x).unwrap(), rn(2).element([6.0, 3.0]).unwrap());
        // Derivative of a linear composition acts like the composition itself.
        let deriv = comp.derivative(&x).unwrap();
        assert_eq!(deriv.apply(&x).unwrap(), comp.apply(&x).unwrap());
    }

    #[test]
    fn test_comp_adjoint_reverses() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let a: OpHandle = Arc::new(MatrixOperator::new(m));
        let s: OpHandle = Arc::new(ScalingOperator::new(rn(2), 2.0));
        let comp = OpComp::new(a.clone(), s).unwrap();
        let x = rn(2).element([1.0, 1.0]).unwrap();
        let y = rn(2).element([2.0, -1.0]).unwrap();
        let lhs = comp.apply(&x).unwrap().dot(&y);
        let rhs = x.dot(&comp.adjoint().unwrap().apply(&y).unwrap());
        assert!((lhs - rhs).abs() < 1e-12);
    }

    #[test]
    fn test_right_scalar_mult_scales_argument() {
        let m = DMatrix::from_row_slice(1, 2, &[1.0, 1.0]);
        let row: OpHandle = Arc::new(MatrixOperator::new(m));
        let op = OpRightScalarMult::new(row, 2.0);
        let x = rn(2).element([1.0, 3.0]).unwrap();
        assert_eq!(op.apply(&x).unwrap()[0], 8.0);
    }
}
