//! The functional type and its derived-property propagation.
//!
//! A functional is a scalar-valued map on a real vector space. Composite
//! functionals form an immutable expression DAG over a closed variant set;
//! each variant implements the propagation rules that derive the value,
//! gradient, proximal factory, convex conjugate, and gradient-Lipschitz
//! bound of the composite from those of its children.

use std::fmt;
use std::sync::{Arc, OnceLock};

use nalgebra::DVector;

use crate::error::{ProxError, Result};
use crate::functional::combinators::{
    default_convex_conjugate, quadratic_perturb, scalar_sum, sum,
};
use crate::functional::defaults::indicator_zero;
use crate::functional::gradients::{CompositionGradient, ProductGradient, QuotientGradient};
use crate::functional::leaf::LeafParts;
use crate::operator::base::check_step;
use crate::operator::{
    ConstantOperator, DiagOperator, InnerProductOperator, OpComp, OpHandle, OpLeftScalarMult,
    OpSum, Operator, ProximalFactory, ScalingOperator, ShiftOperator, ZeroOperator,
};
use crate::proximal::{
    proximal_arg_scaling, proximal_const_func, proximal_convex_conj, proximal_quadratic_perturbation,
    proximal_translation,
};
use crate::space::Space;

/// State cached by a Bregman-distance node on first access.
#[derive(Clone)]
pub(crate) struct BregmanCore {
    /// Internal representation `f + <., -s> + (-f(y) + <s, y>)`.
    pub(crate) rep: Arc<Functional>,
    pub(crate) grad_lipschitz: f64,
}

/// Closed variant set of functional nodes.
///
/// Children are shared behind `Arc`; nodes never mutate their children. The
/// only mutable state in the whole tree is the Bregman lazy cache, guarded by
/// a one-time-initialization cell.
#[derive(Clone)]
pub(crate) enum FuncNode {
    /// `x -> value`
    Constant { value: f64 },
    /// Leaf built from user-supplied callables plus an independently supplied
    /// description of its convex conjugate.
    Simple {
        primal: LeafParts,
        dual: LeafParts,
    },
    /// `x -> scalar * f(x)`
    LeftScalarMult {
        func: Arc<Functional>,
        scalar: f64,
    },
    /// `x -> f(scalar * x)`
    RightScalarMult {
        func: Arc<Functional>,
        scalar: f64,
    },
    /// `x -> f(op(x))`
    Composition {
        func: Arc<Functional>,
        op: OpHandle,
    },
    /// `x -> f(vector .* x)`
    RightVectorMult {
        func: Arc<Functional>,
        vector: DVector<f64>,
    },
    /// `x -> left(x) + right(x)`
    Sum {
        left: Arc<Functional>,
        right: Arc<Functional>,
    },
    /// `x -> f(x) + scalar`
    ScalarSum {
        func: Arc<Functional>,
        scalar: f64,
    },
    /// `x -> f(x - translation)`
    Translation {
        func: Arc<Functional>,
        translation: DVector<f64>,
    },
    /// `x -> inf_y left(x - y) + right(y)`
    InfimalConvolution {
        left: Arc<Functional>,
        right: Arc<Functional>,
    },
    /// `x -> f(x) + a <x, x> + <x, u> + c`
    QuadraticPerturb {
        func: Arc<Functional>,
        quadratic_coeff: f64,
        linear_term: DVector<f64>,
        has_linear_term: bool,
        constant: f64,
    },
    /// `x -> left(x) * right(x)`
    Product {
        left: Arc<Functional>,
        right: Arc<Functional>,
    },
    /// `x -> dividend(x) / divisor(x)`
    Quotient {
        dividend: Arc<Functional>,
        divisor: Arc<Functional>,
    },
    /// The convex conjugate of `f` with no closed form; supports only its
    /// own conjugate (which is `f`) and a Moreau-derived proximal.
    ConvexConjDefault { func: Arc<Functional> },
    /// Bregman distance `x -> f(x) - f(y) - <s, x - y>` with `s` the
    /// (sub)gradient of `f` at `y`.
    Bregman {
        func: Arc<Functional>,
        point: DVector<f64>,
        subgrad: Option<OpHandle>,
        cache: OnceLock<BregmanCore>,
    },
}

/// A functional: a scalar-valued map from a real vector space.
///
/// Derived capabilities (`gradient`, `proximal`, `convex_conj`) are computed
/// on demand by recursion over the expression tree; a capability with no
/// definition for a node surfaces as [`ProxError::UnsupportedOperation`],
/// never as a default value.
#[derive(Clone)]
pub struct Functional {
    domain: Space,
    linear: bool,
    grad_lipschitz: f64,
    node: FuncNode,
}

impl Functional {
    pub(crate) fn from_parts(
        domain: Space,
        linear: bool,
        grad_lipschitz: f64,
        node: FuncNode,
    ) -> Self {
        Functional {
            domain,
            linear,
            grad_lipschitz,
            node,
        }
    }

    pub(crate) fn node(&self) -> &FuncNode {
        &self.node
    }

    /// Domain of the functional.
    pub fn domain(&self) -> Space {
        self.domain
    }

    /// Whether the functional is linear.
    pub fn is_linear(&self) -> bool {
        self.linear
    }

    /// The constant value if this is a constant functional.
    pub fn constant_value(&self) -> Option<f64> {
        match &self.node {
            FuncNode::Constant { value } => Some(*value),
            _ => None,
        }
    }

    /// Node name used in error messages and debug output.
    pub(crate) fn kind_name(&self) -> &'static str {
        match &self.node {
            FuncNode::Constant { .. } => "ConstantFunctional",
            FuncNode::Simple { .. } => "SimpleFunctional",
            FuncNode::LeftScalarMult { .. } => "LeftScalarMult",
            FuncNode::RightScalarMult { .. } => "RightScalarMult",
            FuncNode::Composition { .. } => "Composition",
            FuncNode::RightVectorMult { .. } => "RightVectorMult",
            FuncNode::Sum { .. } => "Sum",
            FuncNode::ScalarSum { .. } => "ScalarSum",
            FuncNode::Translation { .. } => "Translation",
            FuncNode::InfimalConvolution { .. } => "InfimalConvolution",
            FuncNode::QuadraticPerturb { .. } => "QuadraticPerturb",
            FuncNode::Product { .. } => "Product",
            FuncNode::Quotient { .. } => "Quotient",
            FuncNode::ConvexConjDefault { .. } => "ConvexConjugate",
            FuncNode::Bregman { .. } => "BregmanDistance",
        }
    }

    /// Lipschitz constant of the gradient (`NaN` when unknown).
    pub fn grad_lipschitz(&self) -> f64 {
        // A Bregman node learns its bound on initialization.
        if let FuncNode::Bregman { cache, .. } = &self.node {
            if let Some(core) = cache.get() {
                return core.grad_lipschitz;
            }
        }
        self.grad_lipschitz
    }

    /// Set the Lipschitz constant of the gradient.
    pub fn set_grad_lipschitz(&mut self, value: f64) {
        self.grad_lipschitz = value;
    }

    /// Evaluate the functional at `x`.
    pub fn call(&self, x: &DVector<f64>) -> Result<f64> {
        self.domain.check_contains(x)?;
        match &self.node {
            FuncNode::Constant { value } => Ok(*value),
            FuncNode::Simple { primal, .. } => match &primal.value {
                Some(value) => Ok(value(x)),
                None => Err(ProxError::unsupported("call", self.kind_name())),
            },
            FuncNode::LeftScalarMult { func, scalar } => Ok(scalar * func.call(x)?),
            FuncNode::RightScalarMult { func, scalar } => func.call(&(x * *scalar)),
            FuncNode::Composition { func, op } => func.call(&op.apply(x)?),
            FuncNode::RightVectorMult { func, vector } => func.call(&x.component_mul(vector)),
            FuncNode::Sum { left, right } => Ok(left.call(x)? + right.call(x)?),
            FuncNode::ScalarSum { func, scalar } => Ok(func.call(x)? + scalar),
            FuncNode::Translation { func, translation } => func.call(&(x - translation)),
            FuncNode::InfimalConvolution { .. } | FuncNode::ConvexConjDefault { .. } => {
                Err(ProxError::unsupported("call", self.kind_name()))
            }
            FuncNode::QuadraticPerturb {
                func,
                quadratic_coeff,
                linear_term,
                constant,
                ..
            } => Ok(func.call(x)? + quadratic_coeff * x.dot(x) + x.dot(linear_term) + constant),
            FuncNode::Product { left, right } => Ok(left.call(x)? * right.call(x)?),
            // Divisor roots follow IEEE division semantics; callers must
            // guard evaluation points where the divisor vanishes.
            FuncNode::Quotient { dividend, divisor } => Ok(dividend.call(x)? / divisor.call(x)?),
            FuncNode::Bregman { .. } => self.bregman_core()?.rep.call(x),
        }
    }

    /// Gradient operator of the functional.
    pub fn gradient(&self) -> Result<OpHandle> {
        match &self.node {
            FuncNode::Constant { .. } => {
                Ok(Arc::new(ZeroOperator::new(self.domain, self.domain)))
            }
            FuncNode::Simple { primal, .. } => primal
                .gradient
                .clone()
                .ok_or_else(|| ProxError::unsupported("gradient", self.kind_name())),
            FuncNode::LeftScalarMult { func, scalar } => {
                Ok(Arc::new(OpLeftScalarMult::new(func.gradient()?, *scalar)))
            }
            FuncNode::RightScalarMult { func, scalar } => {
                // Chain rule for a scalar argument: s * (grad f)(s x).
                let scaled_arg = OpComp::new(
                    func.gradient()?,
                    Arc::new(ScalingOperator::new(self.domain, *scalar)),
                )?;
                Ok(Arc::new(OpLeftScalarMult::new(Arc::new(scaled_arg), *scalar)))
            }
            FuncNode::Composition { func, op } => {
                Ok(Arc::new(CompositionGradient::new(func.clone(), op.clone())))
            }
            FuncNode::RightVectorMult { func, vector } => {
                let diag: OpHandle = Arc::new(DiagOperator::new(vector.clone()));
                let chain = OpComp::new(func.gradient()?, diag.clone())?;
                Ok(Arc::new(OpComp::new(diag, Arc::new(chain))?))
            }
            FuncNode::Sum { left, right } => {
                Ok(Arc::new(OpSum::new(left.gradient()?, right.gradient()?)?))
            }
            FuncNode::ScalarSum { func, .. } => func.gradient(),
            FuncNode::Translation { func, translation } => {
                let shift = ShiftOperator::new(self.domain, -translation)?;
                Ok(Arc::new(OpComp::new(func.gradient()?, Arc::new(shift))?))
            }
            FuncNode::QuadraticPerturb {
                func,
                quadratic_coeff,
                linear_term,
                ..
            } => {
                let quad = ScalingOperator::new(self.domain, 2.0 * quadratic_coeff);
                let smooth = OpSum::new(func.gradient()?, Arc::new(quad))?;
                let affine = OpSum::new(
                    Arc::new(smooth),
                    Arc::new(ConstantOperator::new(self.domain, linear_term.clone())),
                )?;
                Ok(Arc::new(affine))
            }
            FuncNode::Product { left, right } => {
                Ok(Arc::new(ProductGradient::new(left.clone(), right.clone())))
            }
            FuncNode::Quotient { dividend, divisor } => Ok(Arc::new(QuotientGradient::new(
                dividend.clone(),
                divisor.clone(),
            ))),
            FuncNode::InfimalConvolution { .. } | FuncNode::ConvexConjDefault { .. } => {
                Err(ProxError::unsupported("gradient", self.kind_name()))
            }
            FuncNode::Bregman { .. } => self.bregman_core()?.rep.gradient(),
        }
    }

    /// Proximal factory of the functional.
    pub fn proximal(&self) -> Result<ProximalFactory> {
        match &self.node {
            FuncNode::Constant { .. } => Ok(proximal_const_func(self.domain)),
            FuncNode::Simple { primal, .. } => primal
                .proximal
                .clone()
                .ok_or_else(|| ProxError::unsupported("proximal", self.kind_name())),
            FuncNode::LeftScalarMult { func, scalar } => {
                if *scalar < 0.0 {
                    return Err(ProxError::InvalidParameter(format!(
                        "proximal operator of a functional scaled with the negative value {scalar} \
                         is not well-defined"
                    )));
                }
                // Scaling the functional scales the step size.
                let inner = func.proximal()?;
                let scalar = *scalar;
                Ok(Arc::new(move |sigma| {
                    check_step(sigma)?;
                    inner(sigma * scalar)
                }))
            }
            FuncNode::RightScalarMult { func, scalar } => {
                Ok(proximal_arg_scaling(func.proximal()?, *scalar))
            }
            FuncNode::ScalarSum { func, .. } => func.proximal(),
            FuncNode::Translation { func, translation } => {
                Ok(proximal_translation(func.proximal()?, translation.clone()))
            }
            FuncNode::QuadraticPerturb {
                func,
                quadratic_coeff,
                linear_term,
                ..
            } => {
                if *quadratic_coeff < 0.0 {
                    return Err(ProxError::InvalidParameter(format!(
                        "quadratic coefficient must be non-negative for a proximal operator, \
                         got {quadratic_coeff}"
                    )));
                }
                Ok(proximal_quadratic_perturbation(
                    func.proximal()?,
                    *quadratic_coeff,
                    linear_term.clone(),
                ))
            }
            FuncNode::ConvexConjDefault { func } => Ok(proximal_convex_conj(func.proximal()?)),
            FuncNode::Bregman { .. } => self.bregman_core()?.rep.proximal(),
            FuncNode::Composition { .. }
            | FuncNode::RightVectorMult { .. }
            | FuncNode::Sum { .. }
            | FuncNode::InfimalConvolution { .. }
            | FuncNode::Product { .. }
            | FuncNode::Quotient { .. } => {
                Err(ProxError::unsupported("proximal", self.kind_name()))
            }
        }
    }

    /// Convex conjugate of the functional.
    ///
    /// Nodes with a closed-form conjugate build it from their children's
    /// conjugates; nodes without one return the default conjugate wrapper,
    /// which supports its own conjugate (the original functional) and a
    /// Moreau-derived proximal only.
    pub fn convex_conj(&self) -> Result<Functional> {
        match &self.node {
            FuncNode::Constant { value } => Ok(indicator_zero(self.domain, -value)),
            FuncNode::Simple { primal, dual } => Ok(Functional::from_parts(
                self.domain,
                self.linear,
                dual.grad_lipschitz,
                FuncNode::Simple {
                    primal: dual.clone(),
                    dual: primal.clone(),
                },
            )),
            FuncNode::LeftScalarMult { func, scalar } => {
                if *scalar <= 0.0 {
                    return Err(ProxError::InvalidParameter(format!(
                        "scaling with a nonpositive value has no convex conjugate, got {scalar}"
                    )));
                }
                // (s f)^* = s f^*(. / s)
                let conj = func.convex_conj()?;
                conj.try_mul(1.0 / scalar)?.try_rmul(*scalar)
            }
            FuncNode::RightScalarMult { func, scalar } => {
                // (f(s .))^* = f^*(. / s)
                func.convex_conj()?.try_mul(1.0 / scalar)
            }
            FuncNode::Composition { .. } => {
                Err(ProxError::unsupported("convex_conj", self.kind_name()))
            }
            FuncNode::RightVectorMult { func, vector } => {
                if vector.iter().any(|v| *v == 0.0) {
                    return Err(ProxError::InvalidParameter(
                        "convex conjugate of a vector-multiplied functional requires a vector \
                         with no zero components"
                            .into(),
                    ));
                }
                let inverse = vector.map(|v| 1.0 / v);
                func.convex_conj()?.try_mul(inverse)
            }
            FuncNode::ScalarSum { func, scalar } => {
                // (f + c)^* = f^* - c
                Ok(scalar_sum(&func.convex_conj()?, -scalar))
            }
            FuncNode::Translation { func, translation } => {
                // (f(. - t))^* = f^* + <., t>
                quadratic_perturb(&func.convex_conj()?, 0.0, Some(translation.clone()), 0.0)
            }
            FuncNode::InfimalConvolution { left, right } => {
                sum(&left.convex_conj()?, &right.convex_conj()?)
            }
            FuncNode::QuadraticPerturb {
                func,
                quadratic_coeff,
                linear_term,
                constant,
                ..
            } => {
                if *quadratic_coeff == 0.0 {
                    // (f + <., u> + c)^* = f^*(. - u) - c
                    let translated = func.convex_conj()?.translated(linear_term.clone())?;
                    Ok(scalar_sum(&translated, -constant))
                } else {
                    Ok(default_convex_conjugate(self))
                }
            }
            FuncNode::Sum { .. } | FuncNode::Product { .. } | FuncNode::Quotient { .. } => {
                Ok(default_convex_conjugate(self))
            }
            FuncNode::ConvexConjDefault { func } => Ok((**func).clone()),
            FuncNode::Bregman { .. } => self.bregman_core()?.rep.convex_conj(),
        }
    }

    /// Derivative of the functional at `x`: the operator `d -> <(grad f)(x), d>`.
    pub fn derivative(&self, x: &DVector<f64>) -> Result<OpHandle> {
        let grad = self.gradient()?.apply(x)?;
        Ok(Arc::new(InnerProductOperator::new(grad)))
    }

    /// The translated functional `f(. - shift)`.
    pub fn translated(&self, shift: DVector<f64>) -> Result<Functional> {
        crate::functional::combinators::translation(self, shift)
    }

    /// The Bregman distance functional of `self` from `point`.
    ///
    /// Uses the functional's own gradient as subgradient operator unless one
    /// is supplied.
    pub fn bregman(&self, point: DVector<f64>, subgrad: Option<OpHandle>) -> Result<Functional> {
        crate::functional::combinators::bregman_distance(self, point, subgrad)
    }

    /// Initialize (once) and return the Bregman internal representation.
    pub(crate) fn bregman_core(&self) -> Result<&BregmanCore> {
        let FuncNode::Bregman {
            func,
            point,
            subgrad,
            cache,
        } = &self.node
        else {
            return Err(ProxError::unsupported("bregman state", self.kind_name()));
        };
        if let Some(core) = cache.get() {
            return Ok(core);
        }
        let subgrad_op = match subgrad {
            Some(op) => op.clone(),
            None => func.gradient()?,
        };
        let subgrad_eval = subgrad_op.apply(point)?;
        let constant = -func.call(point)? + subgrad_eval.dot(point);
        let rep = quadratic_perturb(func.as_ref(), 0.0, Some(-&subgrad_eval), constant)?;
        let core = BregmanCore {
            rep: Arc::new(rep),
            grad_lipschitz: func.grad_lipschitz() + subgrad_eval.norm(),
        };
        Ok(cache.get_or_init(|| core))
    }
}

impl fmt::Debug for Functional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Functional")
            .field("kind", &self.kind_name())
            .field("domain", &self.domain)
            .field("linear", &self.linear)
            .finish()
    }
}
