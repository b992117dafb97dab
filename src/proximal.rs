//! Proximal rule functions.
//!
//! Pure transformations taking a proximal factory (and parameters) and
//! returning the proximal factory of the transformed functional. The
//! combinator algebra delegates to these rules; the underlying identities are:
//!
//! - argument scaling:   `prox_{s f(a .)}(x) = (1/a) prox_{s a^2 f}(a x)`
//! - translation:        `prox_{s f(. - t)}(x) = t + prox_{s f}(x - t)`
//! - quadratic perturb:  with `c = 2 s a + 1`:
//!   `prox_{s (f + a ||.||^2 + <., u>)}(x) = prox_{(s/c) f}((x - s u) / c)`
//! - Moreau identity:    `prox_{s f*}(x) = x - s prox_{f / s}(x / s)`

use std::sync::Arc;

use nalgebra::DVector;

use crate::error::Result;
use crate::operator::base::check_step;
use crate::operator::{
    IdentityOperator, OpComp, OpHandle, OpLeftScalarMult, OpSum, Operator, ProximalFactory,
    ScalingOperator, ShiftOperator,
};
use crate::space::Space;

/// Proximal factory of `f(scalar * .)` given the factory of `f`.
///
/// The scalar must be nonzero; the combinator constructors reject zero before
/// delegating here.
pub fn proximal_arg_scaling(prox: ProximalFactory, scalar: f64) -> ProximalFactory {
    Arc::new(move |sigma| {
        check_step(sigma)?;
        let inner = prox(sigma * scalar * scalar)?;
        let space = inner.domain();
        let scaled_arg = OpComp::new(inner, Arc::new(ScalingOperator::new(space, scalar)))?;
        Ok(Arc::new(OpLeftScalarMult::new(
            Arc::new(scaled_arg),
            1.0 / scalar,
        )))
    })
}

/// Proximal factory of `f(. - translation)` given the factory of `f`.
pub fn proximal_translation(prox: ProximalFactory, translation: DVector<f64>) -> ProximalFactory {
    Arc::new(move |sigma| {
        check_step(sigma)?;
        let inner = prox(sigma)?;
        let space = inner.domain();
        let shift_out = ShiftOperator::new(space, translation.clone())?;
        let shift_in = ShiftOperator::new(space, -&translation)?;
        let shifted = OpComp::new(inner, Arc::new(shift_in))?;
        Ok(Arc::new(OpComp::new(Arc::new(shift_out), Arc::new(shifted))?))
    })
}

/// Proximal factory of `f + a <., .> + <., u>` given the factory of `f`.
///
/// Requires `a >= 0`; the quadratic-perturbation combinator rejects negative
/// coefficients before delegating here.
pub fn proximal_quadratic_perturbation(
    prox: ProximalFactory,
    a: f64,
    u: DVector<f64>,
) -> ProximalFactory {
    Arc::new(move |sigma| {
        check_step(sigma)?;
        let c = 2.0 * sigma * a + 1.0;
        let inner = prox(sigma / c)?;
        let space = inner.domain();
        let shift = ShiftOperator::new(space, &u * (-sigma))?;
        let contracted = OpComp::new(
            Arc::new(ScalingOperator::new(space, 1.0 / c)),
            Arc::new(shift),
        )?;
        Ok(Arc::new(OpComp::new(inner, Arc::new(contracted))?))
    })
}

/// Proximal factory of the convex conjugate `f*` via the Moreau identity,
/// given the factory of `f`.
pub fn proximal_convex_conj(prox: ProximalFactory) -> ProximalFactory {
    Arc::new(move |sigma| {
        check_step(sigma)?;
        let inner = prox(1.0 / sigma)?;
        let space = inner.domain();
        let rescaled = OpComp::new(inner, Arc::new(ScalingOperator::new(space, 1.0 / sigma)))?;
        let subtracted = OpLeftScalarMult::new(Arc::new(rescaled), -sigma);
        let identity: OpHandle = Arc::new(IdentityOperator::new(space));
        Ok(Arc::new(OpSum::new(identity, Arc::new(subtracted))?))
    })
}

/// Proximal factory of a constant functional: the identity for every step.
pub fn proximal_const_func(space: Space) -> ProximalFactory {
    Arc::new(move |sigma| -> Result<OpHandle> {
        check_step(sigma)?;
        Ok(Arc::new(IdentityOperator::new(space)))
    })
}
