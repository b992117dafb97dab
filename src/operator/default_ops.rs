//! Stock operators used throughout the combinator algebra.
//!
//! These are the leaf operators that gradient formulas and proximal rules are
//! assembled from: identity, scaling, zero, constant, shift, diagonal, and
//! matrix operators, plus the inner-product operator pair backing
//! `Functional::derivative`.

use std::sync::Arc;

use nalgebra::{DMatrix, DVector};

use crate::error::{ProxError, Result};
use crate::operator::base::{OpHandle, Operator};
use crate::space::Space;

/// The identity map on a space.
#[derive(Debug, Clone)]
pub struct IdentityOperator {
    space: Space,
}

impl IdentityOperator {
    pub fn new(space: Space) -> Self {
        IdentityOperator { space }
    }
}

impl Operator for IdentityOperator {
    fn domain(&self) -> Space {
        self.space
    }

    fn range(&self) -> Space {
        self.space
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "IdentityOperator"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.space.check_contains(x)?;
        Ok(x.clone())
    }

    fn apply_into(&self, x: &DVector<f64>, out: &mut DVector<f64>) -> Result<()> {
        self.space.check_contains(x)?;
        out.copy_from(x);
        Ok(())
    }

    fn adjoint(&self) -> Result<OpHandle> {
        Ok(Arc::new(self.clone()))
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Ok(Arc::new(self.clone()))
    }
}

/// Multiplication by a fixed scalar: `x -> s * x`.
#[derive(Debug, Clone)]
pub struct ScalingOperator {
    space: Space,
    scalar: f64,
}

impl ScalingOperator {
    pub fn new(space: Space, scalar: f64) -> Self {
        ScalingOperator { space, scalar }
    }

    pub fn scalar(&self) -> f64 {
        self.scalar
    }
}

impl Operator for ScalingOperator {
    fn domain(&self) -> Space {
        self.space
    }

    fn range(&self) -> Space {
        self.space
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "ScalingOperator"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.space.check_contains(x)?;
        Ok(x * self.scalar)
    }

    fn adjoint(&self) -> Result<OpHandle> {
        // Self-adjoint on a real space.
        Ok(Arc::new(self.clone()))
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Ok(Arc::new(self.clone()))
    }
}

/// The zero map between two spaces.
#[derive(Debug, Clone)]
pub struct ZeroOperator {
    domain: Space,
    range: Space,
}

impl ZeroOperator {
    pub fn new(domain: Space, range: Space) -> Self {
        ZeroOperator { domain, range }
    }
}

impl Operator for ZeroOperator {
    fn domain(&self) -> Space {
        self.domain
    }

    fn range(&self) -> Space {
        self.range
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "ZeroOperator"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.domain.check_contains(x)?;
        Ok(self.range.zero())
    }

    fn adjoint(&self) -> Result<OpHandle> {
        Ok(Arc::new(ZeroOperator::new(self.range, self.domain)))
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Ok(Arc::new(self.clone()))
    }
}

/// The constant map `x -> value`.
#[derive(Debug, Clone)]
pub struct ConstantOperator {
    domain: Space,
    value: DVector<f64>,
}

impl ConstantOperator {
    pub fn new(domain: Space, value: DVector<f64>) -> Self {
        ConstantOperator { domain, value }
    }
}

impl Operator for ConstantOperator {
    fn domain(&self) -> Space {
        self.domain
    }

    fn range(&self) -> Space {
        Space::new(self.value.len())
    }

    fn name(&self) -> &'static str {
        "ConstantOperator"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.domain.check_contains(x)?;
        Ok(self.value.clone())
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Ok(Arc::new(ZeroOperator::new(self.domain, self.range())))
    }
}

/// Translation by a fixed element: `x -> x + offset`.
///
/// Affine, not linear; its derivative is the identity.
#[derive(Debug, Clone)]
pub struct ShiftOperator {
    space: Space,
    offset: DVector<f64>,
}

impl ShiftOperator {
    pub fn new(space: Space, offset: DVector<f64>) -> Result<Self> {
        space.check_contains(&offset)?;
        Ok(ShiftOperator { space, offset })
    }
}

impl Operator for ShiftOperator {
    fn domain(&self) -> Space {
        self.space
    }

    fn range(&self) -> Space {
        self.space
    }

    fn name(&self) -> &'static str {
        "ShiftOperator"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.space.check_contains(x)?;
        Ok(x + &self.offset)
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Ok(Arc::new(IdentityOperator::new(self.space)))
    }
}

/// Componentwise multiplication by a fixed vector: `x -> v .* x`.
#[derive(Debug, Clone)]
pub struct DiagOperator {
    space: Space,
    vector: DVector<f64>,
}

impl DiagOperator {
    pub fn new(vector: DVector<f64>) -> Self {
        let space = Space::new(vector.len());
        DiagOperator { space, vector }
    }
}

impl Operator for DiagOperator {
    fn domain(&self) -> Space {
        self.space
    }

    fn range(&self) -> Space {
        self.space
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "DiagOperator"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.space.check_contains(x)?;
        Ok(x.component_mul(&self.vector))
    }

    fn adjoint(&self) -> Result<OpHandle> {
        // Diagonal matrices are self-adjoint on a real space.
        Ok(Arc::new(self.clone()))
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Ok(Arc::new(self.clone()))
    }
}

/// A dense matrix acting as a linear operator.
#[derive(Debug, Clone)]
pub struct MatrixOperator {
    matrix: DMatrix<f64>,
}

impl MatrixOperator {
    pub fn new(matrix: DMatrix<f64>) -> Self {
        MatrixOperator { matrix }
    }
}

impl Operator for MatrixOperator {
    fn domain(&self) -> Space {
        Space::new(self.matrix.ncols())
    }

    fn range(&self) -> Space {
        Space::new(self.matrix.nrows())
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "MatrixOperator"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.domain().check_contains(x)?;
        Ok(&self.matrix * x)
    }

    fn apply_into(&self, x: &DVector<f64>, out: &mut DVector<f64>) -> Result<()> {
        self.domain().check_contains(x)?;
        self.range().check_contains(out)?;
        self.matrix.mul_to(x, out);
        Ok(())
    }

    fn adjoint(&self) -> Result<OpHandle> {
        Ok(Arc::new(MatrixOperator::new(self.matrix.transpose())))
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Ok(Arc::new(self.clone()))
    }
}

/// The inner-product functional `d -> <v, d>` as an `R^n -> R^1` operator.
///
/// This is the operator form of a functional's derivative at a point.
#[derive(Debug, Clone)]
pub struct InnerProductOperator {
    vector: DVector<f64>,
}

impl InnerProductOperator {
    pub fn new(vector: DVector<f64>) -> Self {
        InnerProductOperator { vector }
    }
}

impl Operator for InnerProductOperator {
    fn domain(&self) -> Space {
        Space::new(self.vector.len())
    }

    fn range(&self) -> Space {
        Space::new(1)
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "InnerProductOperator"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.domain().check_contains(x)?;
        Ok(DVector::from_element(1, self.vector.dot(x)))
    }

    fn adjoint(&self) -> Result<OpHandle> {
        Ok(Arc::new(ScalarMultOperator::new(self.vector.clone())))
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Ok(Arc::new(self.clone()))
    }
}

/// The embedding `[s] -> s * v` from `R^1` back into `R^n`.
///
/// Adjoint partner of [`InnerProductOperator`].
#[derive(Debug, Clone)]
pub struct ScalarMultOperator {
    vector: DVector<f64>,
}

impl ScalarMultOperator {
    pub fn new(vector: DVector<f64>) -> Self {
        ScalarMultOperator { vector }
    }
}

impl Operator for ScalarMultOperator {
    fn domain(&self) -> Space {
        Space::new(1)
    }

    fn range(&self) -> Space {
        Space::new(self.vector.len())
    }

    fn is_linear(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "ScalarMultOperator"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.domain().check_contains(x)?;
        Ok(&self.vector * x[0])
    }

    fn adjoint(&self) -> Result<OpHandle> {
        Ok(Arc::new(InnerProductOperator::new(self.vector.clone())))
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        Ok(Arc::new(self.clone()))
    }
}

/// An operator defined by a closure, for user-supplied callables.
///
/// Used by the leaf builder to wrap plain gradient functions and by the
/// default functionals for their proximal operators.
#[derive(Clone)]
pub struct CallableOperator {
    domain: Space,
    range: Space,
    linear: bool,
    call: Arc<dyn Fn(&DVector<f64>) -> Result<DVector<f64>> + Send + Sync>,
}

impl CallableOperator {
    pub fn new(
        domain: Space,
        range: Space,
        call: impl Fn(&DVector<f64>) -> Result<DVector<f64>> + Send + Sync + 'static,
    ) -> Self {
        CallableOperator {
            domain,
            range,
            linear: false,
            call: Arc::new(call),
        }
    }

    /// Mark the wrapped callable as linear.
    pub fn linear(mut self) -> Self {
        self.linear = true;
        self
    }
}

impl Operator for CallableOperator {
    fn domain(&self) -> Space {
        self.domain
    }

    fn range(&self) -> Space {
        self.range
    }

    fn is_linear(&self) -> bool {
        self.linear
    }

    fn name(&self) -> &'static str {
        "CallableOperator"
    }

    fn apply(&self, x: &DVector<f64>) -> Result<DVector<f64>> {
        self.domain.check_contains(x)?;
        (self.call)(x)
    }

    fn derivative(&self, _x: &DVector<f64>) -> Result<OpHandle> {
        if self.linear {
            Ok(Arc::new(self.clone()))
        } else {
            Err(ProxError::unsupported("derivative", self.name()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::rn;

    #[test]
    fn test_identity_roundtrip() {
        let space = rn(3);
        let id = IdentityOperator::new(space);
        let x = space.element([1.0, -2.0, 3.0]).unwrap();
        assert_eq!(id.apply(&x).unwrap(), x);
        assert!(id.is_linear());
    }

    #[test]
    fn test_scaling_adjoint_is_self() {
        let space = rn(2);
        let op = ScalingOperator::new(space, 3.0);
        let x = space.element([1.0, 2.0]).unwrap();
        let y = space.element([-1.0, 4.0]).unwrap();
        let lhs = op.apply(&x).unwrap().dot(&y);
        let rhs = x.dot(&op.adjoint().unwrap().apply(&y).unwrap());
        assert!((lhs - rhs).abs() < 1e-12);
    }

    #[test]
    fn test_matrix_adjoint_pairing() {
        let m = DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let op = MatrixOperator::new(m);
        let x = rn(3).element([1.0, 0.5, -1.0]).unwrap();
        let y = rn(2).element([2.0, -1.0]).unwrap();
        let lhs = op.apply(&x).unwrap().dot(&y);
        let rhs = x.dot(&op.adjoint().unwrap().apply(&y).unwrap());
        assert!((lhs - rhs).abs() < 1e-12);
    }

    #[test]
    fn test_inner_product_adjoint_pairing() {
        let space = rn(3);
        let v = space.element([1.0, 2.0, 3.0]).unwrap();
        let op = InnerProductOperator::new(v.clone());
        let x = space.element([0.5, -1.0, 2.0]).unwrap();
        let s = DVector::from_element(1, 4.0);
        let lhs = op.apply(&x).unwrap().dot(&s);
        let rhs = x.dot(&op.adjoint().unwrap().apply(&s).unwrap());
        assert!((lhs - rhs).abs() < 1e-12);
    }

    #[test]
    fn test_shift_derivative_is_identity() {
        let space = rn(2);
        let shift = ShiftOperator::new(space, space.one()).unwrap();
        let x = space.element([1.0, 2.0]).unwrap();
        assert_eq!(shift.apply(&x).unwrap(), space.element([2.0, 3.0]).unwrap());
        let deriv = shift.derivative(&x).unwrap();
        assert_eq!(deriv.apply(&x).unwrap(), x);
    }

    #[test]
    fn test_constant_operator_derivative_is_zero() {
        let space = rn(2);
        let c = ConstantOperator::new(space, space.one());
        let x = space.element([5.0, 6.0]).unwrap();
        assert_eq!(c.apply(&x).unwrap(), space.one());
        let deriv = c.derivative(&x).unwrap();
        assert_eq!(deriv.apply(&x).unwrap(), space.zero());
    }
}
