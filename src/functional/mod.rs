//! Functionals and their combinator algebra.
//!
//! This module provides:
//! - The [`Functional`] type with on-demand gradients, proximal factories,
//!   convex conjugates, and gradient-Lipschitz bounds
//! - Named constructors for every combinator, plus infix operators
//! - The leaf builder for user-defined primitives
//! - Stock functionals (constants, indicators, norms)

pub mod combinators;
pub mod defaults;
mod functional;
pub mod gradients;
pub mod leaf;
pub mod operand;

pub use combinators::{
    bregman_distance, composition, default_convex_conjugate, infimal_convolution,
    left_scalar_mult, product, quadratic_perturb, quotient, right_scalar_mult,
    right_vector_mult, scalar_sum, sum, translation,
};
pub use defaults::{constant_functional, indicator_zero, l1_norm, l2_norm, l2_norm_squared, zero_functional};
pub use functional::Functional;
pub use gradients::{CompositionGradient, ProductGradient, QuotientGradient};
pub use leaf::{simple_functional, FunctionalBuilder};
pub use operand::Operand;
