//! # proxrust
//!
//! A Rust library for functional calculus in convex optimization.
//!
//! proxrust provides a composable algebra over **functionals** (scalar-valued
//! maps on a real vector space) as used in inverse-problem regularization.
//! Complex objectives are built from primitives with algebraic operators:
//! sums, scalar and vector multiplication, composition with operators,
//! translation, quadratic perturbation, products, quotients, and infimal
//! convolution. Every composite derives a correct gradient, proximal
//! factory, convex conjugate, and gradient-Lipschitz bound from its children,
//! with no calculus re-derived by hand.
//!
//! ## Quick Start
//!
//! ```
//! use proxrust::prelude::*;
//!
//! let space = rn(3);
//! let l1 = l1_norm(space);
//! let data_fit = l2_norm_squared(space)
//!     .translated(space.one())
//!     .unwrap();
//!
//! // Composite objective: ||x - 1||^2 + 0.5 * ||x||_1
//! let objective = &data_fit + &(0.5 * &l1);
//!
//! let x = space.element([1.0, -1.0, 2.0]).unwrap();
//! assert_eq!(objective.call(&x).unwrap(), 7.0);
//!
//! // Derived gradient-Lipschitz bounds add across sums.
//! let smooth = &data_fit + &l2_norm_squared(space);
//! assert_eq!(smooth.grad_lipschitz(), 4.0);
//! ```
//!
//! ## Propagation rules
//!
//! Each combinator carries the convex-analysis identity that makes its
//! derived properties correct functions of its children's properties:
//!
//! - **Chain rule** for compositions and argument scalings
//! - **Moreau identity** for proximals of convex conjugates
//! - **Translation/perturbation duality**: translating the primal linearly
//!   perturbs the conjugate, and vice versa
//! - **Lipschitz arithmetic**: bounds scale with |s| and add across sums
//!
//! Derived properties are computed on demand; a property with no definition
//! for a node (for example the value of an infimal convolution, or the
//! conjugate of a general composition) surfaces as an
//! [`UnsupportedOperation`](error::ProxError::UnsupportedOperation) error,
//! never as a silent default.
//!
//! ## Architecture
//!
//! - **Expression DAG** over a closed variant set with `Arc` sharing;
//!   nodes are immutable apart from the Bregman-distance lazy cache
//! - **Operand dispatch** through an explicit sum type at the call site
//! - **Operator layer** carrying adjoints and derivatives through
//!   compositions, used by the derived gradients
//! - **Iterative solvers** (Landweber, conjugate gradient, Gauss-Newton)
//!   consuming the operator contract

pub mod error;
pub mod functional;
pub mod operator;
pub mod proximal;
pub mod solvers;
pub mod space;

/// Prelude module for convenient imports.
///
/// ```
/// use proxrust::prelude::*;
/// ```
pub mod prelude {
    // Spaces and elements
    pub use crate::space::{lincomb, rn, Space};

    // Functionals
    pub use crate::functional::{
        bregman_distance, composition, constant_functional, default_convex_conjugate,
        indicator_zero, infimal_convolution, l1_norm, l2_norm, l2_norm_squared, left_scalar_mult,
        product, quadratic_perturb, quotient, right_scalar_mult, right_vector_mult, scalar_sum,
        simple_functional, sum, translation, zero_functional, Functional, FunctionalBuilder,
        Operand,
    };

    // Operators
    pub use crate::operator::{
        CallableOperator, ConstantOperator, DiagOperator, IdentityOperator, MatrixOperator,
        OpComp, OpHandle, OpLeftScalarMult, OpRightScalarMult, OpSum, Operator, ProximalFactory,
        ScalingOperator, ShiftOperator, ZeroOperator,
    };

    // Proximal rule functions
    pub use crate::proximal::{
        proximal_arg_scaling, proximal_const_func, proximal_convex_conj,
        proximal_quadratic_perturbation, proximal_translation,
    };

    // Solvers
    pub use crate::solvers::{
        conjugate_gradient, conjugate_gradient_normal, gauss_newton, landweber, ExpZeroSeq,
    };

    // Errors
    pub use crate::error::{ProxError, Result};
}

// Re-export main types at crate root
pub use error::{ProxError, Result};
pub use functional::Functional;
pub use operator::{OpHandle, Operator, ProximalFactory};
pub use space::{rn, Space};
