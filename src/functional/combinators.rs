//! Named constructors for the functional combinators.
//!
//! Every constructor validates its operands eagerly (domain identity,
//! parameter ranges) and derives the composite's structural metadata
//! (linearity, gradient-Lipschitz bound) by the combinator-specific rule.
//! The infix operators in [`crate::functional::operand`] dispatch to these.

use std::sync::{Arc, OnceLock};

use nalgebra::DVector;

use crate::error::{ProxError, Result};
use crate::functional::functional::{FuncNode, Functional};
use crate::operator::{OpHandle, Operator};

/// `scalar * f`, requiring a nonzero scalar.
///
/// The operand dispatch handles the zero-scalar case before this constructor
/// is reached; a zero scalar here is a usage error.
pub fn left_scalar_mult(func: &Functional, scalar: f64) -> Result<Functional> {
    check_nonzero_scalar(scalar)?;
    Ok(Functional::from_parts(
        func.domain(),
        func.is_linear(),
        scalar.abs() * func.grad_lipschitz(),
        FuncNode::LeftScalarMult {
            func: Arc::new(func.clone()),
            scalar,
        },
    ))
}

/// `f(scalar * .)`, requiring a nonzero scalar.
pub fn right_scalar_mult(func: &Functional, scalar: f64) -> Result<Functional> {
    check_nonzero_scalar(scalar)?;
    Ok(Functional::from_parts(
        func.domain(),
        func.is_linear(),
        scalar.abs() * func.grad_lipschitz(),
        FuncNode::RightScalarMult {
            func: Arc::new(func.clone()),
            scalar,
        },
    ))
}

/// `f(op(.))`, requiring the operator range to equal the functional domain.
pub fn composition(func: &Functional, op: OpHandle) -> Result<Functional> {
    if op.range() != func.domain() {
        return Err(ProxError::domain_mismatch(
            format!("operator range equal to the functional domain {}", func.domain()),
            op.range(),
        ));
    }
    Ok(Functional::from_parts(
        op.domain(),
        func.is_linear() && op.is_linear(),
        f64::NAN,
        FuncNode::Composition {
            func: Arc::new(func.clone()),
            op,
        },
    ))
}

/// `f(vector .* .)` for a vector in the domain of `f`.
pub fn right_vector_mult(func: &Functional, vector: DVector<f64>) -> Result<Functional> {
    func.domain().check_contains(&vector)?;
    Ok(Functional::from_parts(
        func.domain(),
        func.is_linear(),
        func.grad_lipschitz(),
        FuncNode::RightVectorMult {
            func: Arc::new(func.clone()),
            vector,
        },
    ))
}

/// `left + right`, requiring identical domains.
pub fn sum(left: &Functional, right: &Functional) -> Result<Functional> {
    if left.domain() != right.domain() {
        return Err(ProxError::domain_mismatch(left.domain(), right.domain()));
    }
    Ok(Functional::from_parts(
        left.domain(),
        left.is_linear() && right.is_linear(),
        left.grad_lipschitz() + right.grad_lipschitz(),
        FuncNode::Sum {
            left: Arc::new(left.clone()),
            right: Arc::new(right.clone()),
        },
    ))
}

/// `f + scalar`.
pub fn scalar_sum(func: &Functional, scalar: f64) -> Functional {
    Functional::from_parts(
        func.domain(),
        func.is_linear() && scalar == 0.0,
        func.grad_lipschitz(),
        FuncNode::ScalarSum {
            func: Arc::new(func.clone()),
            scalar,
        },
    )
}

/// `f(. - translation)` for a translation in the domain of `f`.
///
/// Translating a translation collapses into a single node with the summed
/// shift, so nesting stays bounded.
pub fn translation(func: &Functional, translation: DVector<f64>) -> Result<Functional> {
    func.domain().check_contains(&translation)?;
    let node = match func.node() {
        FuncNode::Translation {
            func: inner,
            translation: shift,
        } => FuncNode::Translation {
            func: inner.clone(),
            translation: shift + &translation,
        },
        _ => FuncNode::Translation {
            func: Arc::new(func.clone()),
            translation,
        },
    };
    Ok(Functional::from_parts(
        func.domain(),
        false,
        func.grad_lipschitz(),
        node,
    ))
}

/// The infimal convolution `x -> inf_y left(x - y) + right(y)`.
///
/// Direct evaluation has no closed form; the node exists for its convex
/// conjugate, which is the sum of the children's conjugates.
pub fn infimal_convolution(left: &Functional, right: &Functional) -> Result<Functional> {
    if left.domain() != right.domain() {
        return Err(ProxError::domain_mismatch(left.domain(), right.domain()));
    }
    Ok(Functional::from_parts(
        left.domain(),
        false,
        f64::NAN,
        FuncNode::InfimalConvolution {
            left: Arc::new(left.clone()),
            right: Arc::new(right.clone()),
        },
    ))
}

/// `f + quadratic_coeff * <., .> + <., linear_term> + constant`.
///
/// The Lipschitz bound adds the linear term's norm when one is supplied and
/// is otherwise inherited unchanged; the quadratic term's own contribution is
/// not counted (a documented approximation carried over from the reference
/// derivation).
pub fn quadratic_perturb(
    func: &Functional,
    quadratic_coeff: f64,
    linear_term: Option<DVector<f64>>,
    constant: f64,
) -> Result<Functional> {
    let has_linear_term = linear_term.is_some();
    let linear_term = match linear_term {
        Some(u) => {
            func.domain().check_contains(&u)?;
            u
        }
        None => func.domain().zero(),
    };
    let grad_lipschitz = if has_linear_term {
        func.grad_lipschitz() + linear_term.norm()
    } else {
        func.grad_lipschitz()
    };
    Ok(Functional::from_parts(
        func.domain(),
        func.is_linear() && quadratic_coeff == 0.0,
        grad_lipschitz,
        FuncNode::QuadraticPerturb {
            func: Arc::new(func.clone()),
            quadratic_coeff,
            linear_term,
            has_linear_term,
            constant,
        },
    ))
}

/// The pointwise product `x -> left(x) * right(x)`, requiring identical
/// domains.
pub fn product(left: &Functional, right: &Functional) -> Result<Functional> {
    if left.domain() != right.domain() {
        return Err(ProxError::domain_mismatch(left.domain(), right.domain()));
    }
    Ok(Functional::from_parts(
        left.domain(),
        false,
        f64::NAN,
        FuncNode::Product {
            left: Arc::new(left.clone()),
            right: Arc::new(right.clone()),
        },
    ))
}

/// The pointwise quotient `x -> dividend(x) / divisor(x)`, requiring
/// identical domains.
///
/// Evaluation at a root of the divisor follows IEEE division semantics.
pub fn quotient(dividend: &Functional, divisor: &Functional) -> Result<Functional> {
    if dividend.domain() != divisor.domain() {
        return Err(ProxError::domain_mismatch(
            dividend.domain(),
            divisor.domain(),
        ));
    }
    Ok(Functional::from_parts(
        dividend.domain(),
        false,
        f64::NAN,
        FuncNode::Quotient {
            dividend: Arc::new(dividend.clone()),
            divisor: Arc::new(divisor.clone()),
        },
    ))
}

/// The convex conjugate of `f` when no closed form is available.
///
/// Supports its own conjugate (which is `f` again) and a proximal derived
/// from `f`'s proximal via the Moreau identity; it cannot be evaluated.
pub fn default_convex_conjugate(func: &Functional) -> Functional {
    Functional::from_parts(
        func.domain(),
        func.is_linear(),
        f64::NAN,
        FuncNode::ConvexConjDefault {
            func: Arc::new(func.clone()),
        },
    )
}

/// The Bregman distance `x -> f(x) - f(point) - <s, x - point>` with `s` the
/// (sub)gradient of `f` at `point`.
///
/// The internal quadratic-perturbation representation is computed once, on
/// first access to call/gradient/proximal/convex_conj, and reused for the
/// functional's lifetime.
pub fn bregman_distance(
    func: &Functional,
    point: DVector<f64>,
    subgrad: Option<OpHandle>,
) -> Result<Functional> {
    func.domain().check_contains(&point)?;
    if let Some(op) = &subgrad {
        if op.domain() != func.domain() {
            return Err(ProxError::domain_mismatch(func.domain(), op.domain()));
        }
        if op.range() != func.domain() {
            return Err(ProxError::domain_mismatch(func.domain(), op.range()));
        }
    }
    Ok(Functional::from_parts(
        func.domain(),
        false,
        f64::NAN,
        FuncNode::Bregman {
            func: Arc::new(func.clone()),
            point,
            subgrad,
            cache: OnceLock::new(),
        },
    ))
}

fn check_nonzero_scalar(scalar: f64) -> Result<()> {
    if scalar == 0.0 {
        Err(ProxError::InvalidParameter(
            "scalar multiplication combinators require a nonzero scalar; zero is handled by the \
             operand dispatch"
                .into(),
        ))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functional::defaults::{constant_functional, l2_norm_squared};
    use crate::space::rn;

    #[test]
    fn test_translation_collapses() {
        let space = rn(2);
        let f = l2_norm_squared(space);
        let t1 = space.element([1.0, 0.0]).unwrap();
        let t2 = space.element([0.0, 2.0]).unwrap();
        let nested = f.translated(t1.clone()).unwrap().translated(t2.clone()).unwrap();
        match nested.node() {
            FuncNode::Translation { func, translation } => {
                assert_eq!(*translation, &t1 + &t2);
                assert!(matches!(func.node(), FuncNode::Simple { .. }));
            }
            _ => panic!("expected a collapsed translation node"),
        }
    }

    #[test]
    fn test_sum_domain_mismatch() {
        let f = l2_norm_squared(rn(2));
        let g = l2_norm_squared(rn(3));
        assert!(matches!(
            sum(&f, &g),
            Err(ProxError::DomainMismatch { .. })
        ));
    }

    #[test]
    fn test_zero_scalar_rejected_by_constructor() {
        let f = l2_norm_squared(rn(2));
        assert!(matches!(
            left_scalar_mult(&f, 0.0),
            Err(ProxError::InvalidParameter(_))
        ));
        assert!(matches!(
            right_scalar_mult(&f, 0.0),
            Err(ProxError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_bregman_initializes_exactly_once() {
        let space = rn(2);
        let f = l2_norm_squared(space);
        let point = space.one();
        let breg = f.bregman(point, None).unwrap();
        let x = space.element([0.5, -0.5]).unwrap();
        breg.call(&x).unwrap();
        let first = Arc::clone(&breg.bregman_core().unwrap().rep);
        breg.gradient().unwrap();
        breg.proximal().unwrap();
        let second = Arc::clone(&breg.bregman_core().unwrap().rep);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_bregman_rejects_foreign_point() {
        let f = l2_norm_squared(rn(2));
        assert!(bregman_distance(&f, rn(3).zero(), None).is_err());
    }

    #[test]
    fn test_quadratic_perturb_lipschitz_bound() {
        let space = rn(2);
        let mut f = l2_norm_squared(space);
        f.set_grad_lipschitz(2.0);
        let u = space.element([3.0, 4.0]).unwrap();
        // With a linear term the bound grows by its norm; without one the
        // quadratic term's own contribution is (knowingly) not counted.
        let with_u = quadratic_perturb(&f, 1.0, Some(u), 0.0).unwrap();
        assert!((with_u.grad_lipschitz() - 7.0).abs() < 1e-12);
        let without_u = quadratic_perturb(&f, 1.0, None, 0.0).unwrap();
        assert!((without_u.grad_lipschitz() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_constant_is_linear_only_at_zero() {
        assert!(constant_functional(rn(2), 0.0).is_linear());
        assert!(!constant_functional(rn(2), 3.0).is_linear());
    }
}
