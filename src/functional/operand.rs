//! Operand dispatch and operator overloading for functionals.
//!
//! Algebraic expressions select a combinator by the kind of the second
//! operand, decided at the call site through the closed [`Operand`] sum type.
//! The infix `std::ops` implementations forward to the fallible `try_*`
//! dispatch methods and panic with the underlying error message; use the
//! `try_*` methods directly for explicit error handling.

use std::ops::{Add, Div, Mul, Neg, Sub};

use nalgebra::DVector;

use crate::error::{ProxError, Result};
use crate::functional::combinators::{
    composition, left_scalar_mult, right_scalar_mult, right_vector_mult, scalar_sum, sum,
};
use crate::functional::defaults::{constant_functional, zero_functional};
use crate::functional::functional::Functional;
use crate::operator::OpHandle;

/// The kinds of operand a functional can be combined with.
pub enum Operand {
    Scalar(f64),
    Vector(DVector<f64>),
    Operator(OpHandle),
    Functional(Functional),
}

impl Operand {
    fn kind(&self) -> &'static str {
        match self {
            Operand::Scalar(_) => "scalar",
            Operand::Vector(_) => "vector",
            Operand::Operator(_) => "operator",
            Operand::Functional(_) => "functional",
        }
    }
}

impl From<f64> for Operand {
    fn from(value: f64) -> Self {
        Operand::Scalar(value)
    }
}

impl From<DVector<f64>> for Operand {
    fn from(value: DVector<f64>) -> Self {
        Operand::Vector(value)
    }
}

impl From<&DVector<f64>> for Operand {
    fn from(value: &DVector<f64>) -> Self {
        Operand::Vector(value.clone())
    }
}

impl From<OpHandle> for Operand {
    fn from(value: OpHandle) -> Self {
        Operand::Operator(value)
    }
}

impl From<Functional> for Operand {
    fn from(value: Functional) -> Self {
        Operand::Functional(value)
    }
}

impl From<&Functional> for Operand {
    fn from(value: &Functional) -> Self {
        Operand::Functional(value.clone())
    }
}

impl Functional {
    /// Right multiplication `self * other`.
    ///
    /// - operator: composition `self(other(.))`
    /// - zero scalar: the constant functional with value `self(0)`
    /// - scalar, `self` linear: value scaling (cheaper than wrapping every
    ///   evaluation through a scaled argument)
    /// - scalar otherwise: argument scaling `self(s .)`
    /// - domain element: componentwise argument scaling `self(v .* .)`
    pub fn try_mul(&self, other: impl Into<Operand>) -> Result<Functional> {
        match other.into() {
            Operand::Operator(op) => composition(self, op),
            Operand::Scalar(s) => {
                if s == 0.0 {
                    let value = self.call(&self.domain().zero())?;
                    Ok(constant_functional(self.domain(), value))
                } else if self.is_linear() {
                    left_scalar_mult(self, s)
                } else {
                    right_scalar_mult(self, s)
                }
            }
            Operand::Vector(v) => {
                if self.domain().contains(&v) {
                    right_vector_mult(self, v)
                } else {
                    Err(ProxError::TypeMismatch(format!(
                        "vector of length {} is neither a scalar nor an element of {}",
                        v.len(),
                        self.domain()
                    )))
                }
            }
            other => Err(ProxError::TypeMismatch(format!(
                "cannot multiply a functional by a {}; use the product constructor for \
                 pointwise products",
                other.kind()
            ))),
        }
    }

    /// Left multiplication `scalar * self`: value scaling, with the zero
    /// scalar collapsing to the zero functional.
    pub fn try_rmul(&self, scalar: f64) -> Result<Functional> {
        if scalar == 0.0 {
            Ok(zero_functional(self.domain()))
        } else {
            left_scalar_mult(self, scalar)
        }
    }

    /// Addition `self + other` for a functional or scalar operand.
    ///
    /// Addition is commutative; right addition dispatches identically.
    pub fn try_add(&self, other: impl Into<Operand>) -> Result<Functional> {
        match other.into() {
            Operand::Scalar(c) => Ok(scalar_sum(self, c)),
            Operand::Functional(g) => sum(self, &g),
            other => Err(ProxError::TypeMismatch(format!(
                "cannot add a {} to a functional",
                other.kind()
            ))),
        }
    }

    /// Subtraction `self - other`, defined as `self + (-1) * other`.
    pub fn try_sub(&self, other: impl Into<Operand>) -> Result<Functional> {
        match other.into() {
            Operand::Scalar(c) => Ok(scalar_sum(self, -c)),
            Operand::Functional(g) => self.try_add(g.try_rmul(-1.0)?),
            other => Err(ProxError::TypeMismatch(format!(
                "cannot subtract a {} from a functional",
                other.kind()
            ))),
        }
    }
}

fn expect_ok<T>(result: Result<T>, op: &str) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("functional {op} failed: {err}"),
    }
}

// ============================================================================
// Operator overloading for Functional
// ============================================================================

impl Neg for Functional {
    type Output = Functional;

    fn neg(self) -> Functional {
        expect_ok(self.try_rmul(-1.0), "negation")
    }
}

impl Neg for &Functional {
    type Output = Functional;

    fn neg(self) -> Functional {
        expect_ok(self.try_rmul(-1.0), "negation")
    }
}

impl Add for Functional {
    type Output = Functional;

    fn add(self, rhs: Functional) -> Functional {
        expect_ok(self.try_add(rhs), "addition")
    }
}

impl Add for &Functional {
    type Output = Functional;

    fn add(self, rhs: &Functional) -> Functional {
        expect_ok(self.try_add(rhs), "addition")
    }
}

impl Add<&Functional> for Functional {
    type Output = Functional;

    fn add(self, rhs: &Functional) -> Functional {
        expect_ok(self.try_add(rhs), "addition")
    }
}

impl Add<Functional> for &Functional {
    type Output = Functional;

    fn add(self, rhs: Functional) -> Functional {
        expect_ok(self.try_add(rhs), "addition")
    }
}

impl Add<f64> for Functional {
    type Output = Functional;

    fn add(self, rhs: f64) -> Functional {
        expect_ok(self.try_add(rhs), "addition")
    }
}

impl Add<f64> for &Functional {
    type Output = Functional;

    fn add(self, rhs: f64) -> Functional {
        expect_ok(self.try_add(rhs), "addition")
    }
}

impl Add<Functional> for f64 {
    type Output = Functional;

    fn add(self, rhs: Functional) -> Functional {
        expect_ok(rhs.try_add(self), "addition")
    }
}

impl Add<&Functional> for f64 {
    type Output = Functional;

    fn add(self, rhs: &Functional) -> Functional {
        expect_ok(rhs.try_add(self), "addition")
    }
}

impl Sub for Functional {
    type Output = Functional;

    fn sub(self, rhs: Functional) -> Functional {
        expect_ok(self.try_sub(rhs), "subtraction")
    }
}

impl Sub for &Functional {
    type Output = Functional;

    fn sub(self, rhs: &Functional) -> Functional {
        expect_ok(self.try_sub(rhs), "subtraction")
    }
}

impl Sub<&Functional> for Functional {
    type Output = Functional;

    fn sub(self, rhs: &Functional) -> Functional {
        expect_ok(self.try_sub(rhs), "subtraction")
    }
}

impl Sub<Functional> for &Functional {
    type Output = Functional;

    fn sub(self, rhs: Functional) -> Functional {
        expect_ok(self.try_sub(rhs), "subtraction")
    }
}

impl Sub<f64> for Functional {
    type Output = Functional;

    fn sub(self, rhs: f64) -> Functional {
        expect_ok(self.try_sub(rhs), "subtraction")
    }
}

impl Sub<f64> for &Functional {
    type Output = Functional;

    fn sub(self, rhs: f64) -> Functional {
        expect_ok(self.try_sub(rhs), "subtraction")
    }
}

impl Sub<Functional> for f64 {
    type Output = Functional;

    fn sub(self, rhs: Functional) -> Functional {
        let negated = expect_ok(rhs.try_rmul(-1.0), "subtraction");
        expect_ok(negated.try_add(self), "subtraction")
    }
}

impl Mul<f64> for Functional {
    type Output = Functional;

    fn mul(self, rhs: f64) -> Functional {
        expect_ok(self.try_mul(rhs), "multiplication")
    }
}

impl Mul<f64> for &Functional {
    type Output = Functional;

    fn mul(self, rhs: f64) -> Functional {
        expect_ok(self.try_mul(rhs), "multiplication")
    }
}

impl Mul<Functional> for f64 {
    type Output = Functional;

    fn mul(self, rhs: Functional) -> Functional {
        expect_ok(rhs.try_rmul(self), "multiplication")
    }
}

impl Mul<&Functional> for f64 {
    type Output = Functional;

    fn mul(self, rhs: &Functional) -> Functional {
        expect_ok(rhs.try_rmul(self), "multiplication")
    }
}

impl Mul<DVector<f64>> for Functional {
    type Output = Functional;

    fn mul(self, rhs: DVector<f64>) -> Functional {
        expect_ok(self.try_mul(rhs), "multiplication")
    }
}

impl Mul<DVector<f64>> for &Functional {
    type Output = Functional;

    fn mul(self, rhs: DVector<f64>) -> Functional {
        expect_ok(self.try_mul(rhs), "multiplication")
    }
}

impl Mul<OpHandle> for Functional {
    type Output = Functional;

    fn mul(self, rhs: OpHandle) -> Functional {
        expect_ok(self.try_mul(rhs), "composition")
    }
}

impl Mul<OpHandle> for &Functional {
    type Output = Functional;

    fn mul(self, rhs: OpHandle) -> Functional {
        expect_ok(self.try_mul(rhs), "composition")
    }
}

impl Div<f64> for Functional {
    type Output = Functional;

    fn div(self, rhs: f64) -> Functional {
        expect_ok(self.try_mul(1.0 / rhs), "division")
    }
}

impl Div<f64> for &Functional {
    type Output = Functional;

    fn div(self, rhs: f64) -> Functional {
        expect_ok(self.try_mul(1.0 / rhs), "division")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::defaults::l2_norm_squared;
    use crate::functional::functional::FuncNode;
    use crate::space::rn;
    use crate::operator::{IdentityOperator, ScalingOperator};
    use std::sync::Arc;

    #[test]
    fn test_scalar_mul_dispatch() {
        let space = rn(2);
        let f = l2_norm_squared(space);
        // Nonlinear functional: right multiplication scales the argument.
        let scaled = f.try_mul(2.0).unwrap();
        assert!(matches!(scaled.node(), FuncNode::RightScalarMult { .. }));
        // Left multiplication scales the value.
        let scaled = f.try_rmul(2.0).unwrap();
        assert!(matches!(scaled.node(), FuncNode::LeftScalarMult { .. }));
    }

    #[test]
    fn test_zero_scalar_collapses() {
        let space = rn(2);
        let f = l2_norm_squared(space);
        let right = f.try_mul(0.0).unwrap();
        assert_eq!(right.constant_value(), Some(0.0));
        let left = f.try_rmul(0.0).unwrap();
        assert_eq!(left.constant_value(), Some(0.0));
        assert!(left.is_linear());
    }

    #[test]
    fn test_operator_operand_composes() {
        let space = rn(2);
        let f = l2_norm_squared(space);
        let op: OpHandle = Arc::new(ScalingOperator::new(space, 3.0));
        let comp = f.try_mul(op).unwrap();
        assert!(matches!(comp.node(), FuncNode::Composition { .. }));
        let x = space.element([1.0, 1.0]).unwrap();
        assert_eq!(comp.call(&x).unwrap(), 18.0);
    }

    #[test]
    fn test_functional_operand_is_type_mismatch_for_mul() {
        let space = rn(2);
        let f = l2_norm_squared(space);
        let g = l2_norm_squared(space);
        assert!(matches!(f.try_mul(&g), Err(ProxError::TypeMismatch(_))));
    }

    #[test]
    fn test_operator_operand_is_type_mismatch_for_add() {
        let space = rn(2);
        let f = l2_norm_squared(space);
        let op: OpHandle = Arc::new(IdentityOperator::new(space));
        assert!(matches!(f.try_add(op), Err(ProxError::TypeMismatch(_))));
    }

    #[test]
    fn test_subtraction_desugars() {
        let space = rn(2);
        let f = l2_norm_squared(space);
        let g = l2_norm_squared(space);
        let diff = &f - &g;
        let x = space.element([1.0, 2.0]).unwrap();
        assert_eq!(diff.call(&x).unwrap(), 0.0);
    }

    #[test]
    fn test_division_scales_argument() {
        let space = rn(2);
        let f = l2_norm_squared(space);
        let halved = &f / 2.0;
        let x = space.element([2.0, 2.0]).unwrap();
        // (f / 2)(x) == f(x / 2)
        assert_eq!(halved.call(&x).unwrap(), 2.0);
    }
}
