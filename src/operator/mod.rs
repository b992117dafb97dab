//! Operators between real vector spaces.
//!
//! This module provides:
//! - The [`Operator`] contract with application, adjoints, and derivatives
//! - Stock leaf operators (identity, scaling, zero, constant, shift,
//!   diagonal, matrix, inner product)
//! - Operator combinators (sum, composition, scalar multiplication)

pub mod base;
pub mod combinators;
pub mod default_ops;

pub use base::{OpHandle, Operator, ProximalFactory};
pub use combinators::{OpComp, OpLeftScalarMult, OpRightScalarMult, OpSum};
pub use default_ops::{
    CallableOperator, ConstantOperator, DiagOperator, IdentityOperator, InnerProductOperator,
    MatrixOperator, ScalarMultOperator, ScalingOperator, ShiftOperator, ZeroOperator,
};
