//! Stock functionals: constants, indicators, and the standard norms.
//!
//! These are the primitive leaves the operand dispatch and the worked
//! examples build on. The norms are assembled with the leaf builder, with
//! closed-form proximal factories and explicit convex-conjugate descriptions
//! (the conjugate of a norm is the indicator of its dual-norm unit ball).

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::ProxError;
use crate::functional::functional::{FuncNode, Functional};
use crate::functional::leaf::simple_functional;
use crate::operator::base::check_step;
use crate::operator::{CallableOperator, OpHandle, ProximalFactory, ZeroOperator};
use crate::proximal::proximal_const_func;
use crate::space::Space;

/// The constant functional `x -> value`.
///
/// Linear only for the zero constant; its proximal is the identity for every
/// step size and its convex conjugate is [`indicator_zero`].
pub fn constant_functional(space: Space, value: f64) -> Functional {
    Functional::from_parts(
        space,
        value == 0.0,
        0.0,
        FuncNode::Constant { value },
    )
}

/// The zero functional `x -> 0`.
pub fn zero_functional(space: Space) -> Functional {
    constant_functional(space, 0.0)
}

/// The indicator of `{0}` plus an offset: `x -> offset` for `x == 0` and
/// `+inf` elsewhere.
///
/// Conjugate partner of the constant functional.
pub fn indicator_zero(space: Space, offset: f64) -> Functional {
    let project: ProximalFactory = Arc::new(move |sigma| {
        check_step(sigma)?;
        Ok(Arc::new(ZeroOperator::new(space, space)) as OpHandle)
    });
    simple_functional(space)
        .value(move |x| {
            if x.iter().all(|v| *v == 0.0) {
                offset
            } else {
                f64::INFINITY
            }
        })
        .proximal(project)
        .conj_value(move |_| -offset)
        .conj_gradient_op(Arc::new(ZeroOperator::new(space, space)))
        .conj_proximal(proximal_const_func(space))
        .conj_grad_lipschitz(0.0)
        .build()
}

/// The L1 norm `x -> sum_i |x_i|`.
///
/// Proximal: soft thresholding. Conjugate: indicator of the unit
/// infinity-norm ball, with box projection as its proximal.
pub fn l1_norm(space: Space) -> Functional {
    let prox: ProximalFactory = Arc::new(move |sigma| {
        check_step(sigma)?;
        Ok(Arc::new(CallableOperator::new(space, space, move |x| {
            Ok(x.map(|t| sign(t) * (t.abs() - sigma).max(0.0)))
        })) as OpHandle)
    });
    let box_project: ProximalFactory = Arc::new(move |sigma| {
        check_step(sigma)?;
        Ok(Arc::new(CallableOperator::new(space, space, |x| {
            Ok(x.map(|t| t.clamp(-1.0, 1.0)))
        })) as OpHandle)
    });
    simple_functional(space)
        .value(|x| x.iter().map(|v| v.abs()).sum())
        .gradient_fn(|x| Ok(x.map(sign)))
        .proximal(prox)
        .conj_value(|x| {
            if x.iter().all(|v| v.abs() <= 1.0) {
                0.0
            } else {
                f64::INFINITY
            }
        })
        .conj_proximal(box_project)
        .build()
}

/// The L2 norm `x -> ||x||_2`.
///
/// Proximal: block soft thresholding. Conjugate: indicator of the unit
/// 2-norm ball, with radial projection as its proximal.
pub fn l2_norm(space: Space) -> Functional {
    let prox: ProximalFactory = Arc::new(move |sigma| {
        check_step(sigma)?;
        Ok(Arc::new(CallableOperator::new(space, space, move |x| {
            let norm = x.norm();
            if norm <= sigma {
                Ok(DVector::zeros(x.len()))
            } else {
                Ok(x * (1.0 - sigma / norm))
            }
        })) as OpHandle)
    });
    let ball_project: ProximalFactory = Arc::new(move |sigma| {
        check_step(sigma)?;
        Ok(Arc::new(CallableOperator::new(space, space, |x| {
            Ok(x / x.norm().max(1.0))
        })) as OpHandle)
    });
    simple_functional(space)
        .value(|x| x.norm())
        .gradient_fn(|x| {
            let norm = x.norm();
            if norm == 0.0 {
                Err(ProxError::InvalidParameter(
                    "the gradient of the L2 norm is not defined at the origin".into(),
                ))
            } else {
                Ok(x / norm)
            }
        })
        .proximal(prox)
        .conj_value(|x| {
            if x.norm() <= 1.0 {
                0.0
            } else {
                f64::INFINITY
            }
        })
        .conj_proximal(ball_project)
        .build()
}

/// The squared L2 norm `x -> ||x||_2^2`.
///
/// Smooth with gradient `2 x` and gradient-Lipschitz constant 2; conjugate
/// `||.||^2 / 4`.
pub fn l2_norm_squared(space: Space) -> Functional {
    let prox: ProximalFactory = Arc::new(move |sigma| {
        check_step(sigma)?;
        Ok(Arc::new(
            CallableOperator::new(space, space, move |x| Ok(x / (1.0 + 2.0 * sigma))).linear(),
        ) as OpHandle)
    });
    let conj_prox: ProximalFactory = Arc::new(move |sigma| {
        check_step(sigma)?;
        Ok(Arc::new(
            CallableOperator::new(space, space, move |x| Ok(x / (1.0 + sigma / 2.0))).linear(),
        ) as OpHandle)
    });
    simple_functional(space)
        .value(|x| x.norm_squared())
        .gradient_fn(|x| Ok(x * 2.0))
        .grad_lipschitz(2.0)
        .proximal(prox)
        .conj_value(|x| x.norm_squared() / 4.0)
        .conj_gradient_fn(|x| Ok(x / 2.0))
        .conj_grad_lipschitz(0.5)
        .conj_proximal(conj_prox)
        .build()
}

fn sign(t: f64) -> f64 {
    if t > 0.0 {
        1.0
    } else if t < 0.0 {
        -1.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::rn;

    const TOL: f64 = 1e-12;

    #[test]
    fn test_constant_basics() {
        let space = rn(2);
        let c = constant_functional(space, 5.0);
        assert_eq!(c.call(&space.one()).unwrap(), 5.0);
        assert_eq!(c.grad_lipschitz(), 0.0);
        // The gradient is the zero operator.
        let g = c.gradient().unwrap().apply(&space.one()).unwrap();
        assert_eq!(g, space.zero());
        // The proximal is the identity for every step.
        let p = c.proximal().unwrap()(2.5).unwrap();
        assert_eq!(p.apply(&space.one()).unwrap(), space.one());
    }

    #[test]
    fn test_constant_conjugate_involutes() {
        let space = rn(2);
        let c = constant_functional(space, 3.0);
        let conj = c.convex_conj().unwrap();
        assert_eq!(conj.call(&space.zero()).unwrap(), -3.0);
        assert_eq!(conj.call(&space.one()).unwrap(), f64::INFINITY);
        let back = conj.convex_conj().unwrap();
        assert_eq!(back.call(&space.one()).unwrap(), 3.0);
    }

    #[test]
    fn test_l1_value_and_prox() {
        let space = rn(3);
        let l1 = l1_norm(space);
        let x = space.element([1.0, -2.0, 0.5]).unwrap();
        assert!((l1.call(&x).unwrap() - 3.5).abs() < TOL);
        let shrunk = l1.proximal().unwrap()(1.0).unwrap().apply(&x).unwrap();
        assert_eq!(shrunk, space.element([0.0, -1.0, 0.0]).unwrap());
    }

    #[test]
    fn test_l2_prox_block_threshold() {
        let space = rn(2);
        let l2 = l2_norm(space);
        let x = space.element([3.0, 4.0]).unwrap();
        let shrunk = l2.proximal().unwrap()(1.0).unwrap().apply(&x).unwrap();
        // ||x|| = 5, so the result is x scaled by (1 - 1/5).
        assert!((shrunk - &x * 0.8).norm() < TOL);
        let wiped = l2.proximal().unwrap()(6.0).unwrap().apply(&x).unwrap();
        assert_eq!(wiped, space.zero());
    }

    #[test]
    fn test_l2sq_gradient_and_lipschitz() {
        let space = rn(2);
        let f = l2_norm_squared(space);
        let x = space.element([1.0, -2.0]).unwrap();
        assert_eq!(f.gradient().unwrap().apply(&x).unwrap(), &x * 2.0);
        assert_eq!(f.grad_lipschitz(), 2.0);
        let conj = f.convex_conj().unwrap();
        assert_eq!(conj.call(&x).unwrap(), 1.25);
    }
}
