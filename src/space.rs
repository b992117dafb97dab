//! Real vector spaces and their elements.
//!
//! A `Space` is a lightweight descriptor of `R^n` used as the immutable
//! identity that functionals and operators are checked against. Elements are
//! `nalgebra::DVector<f64>`; the scalar field is fixed to the real numbers,
//! so field-membership and complex-coefficient checks are discharged by the
//! type system.

use std::fmt;

use nalgebra::DVector;

use crate::error::{ProxError, Result};

/// Descriptor of the real coordinate space `R^n`.
///
/// Spaces are identity-equal: two spaces are compatible exactly when their
/// dimensions agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Space {
    dim: usize,
}

impl Space {
    /// Create the space `R^dim`.
    pub fn new(dim: usize) -> Self {
        Space { dim }
    }

    /// Dimension of the space.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The zero element.
    pub fn zero(&self) -> DVector<f64> {
        DVector::zeros(self.dim)
    }

    /// The all-ones element.
    pub fn one(&self) -> DVector<f64> {
        DVector::from_element(self.dim, 1.0)
    }

    /// Build an element of this space from coordinates.
    ///
    /// Returns `DomainMismatch` if the coordinate count does not match.
    pub fn element(&self, coords: impl Into<Vec<f64>>) -> Result<DVector<f64>> {
        let coords = coords.into();
        if coords.len() != self.dim {
            return Err(ProxError::domain_mismatch(self, format!("R^{}", coords.len())));
        }
        Ok(DVector::from_vec(coords))
    }

    /// Membership test for a candidate element.
    pub fn contains(&self, x: &DVector<f64>) -> bool {
        x.len() == self.dim
    }

    /// Membership check returning a context-rich error.
    pub fn check_contains(&self, x: &DVector<f64>) -> Result<()> {
        if self.contains(x) {
            Ok(())
        } else {
            Err(ProxError::domain_mismatch(self, format!("element of R^{}", x.len())))
        }
    }
}

impl fmt::Display for Space {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R^{}", self.dim)
    }
}

/// Create the space `R^dim`.
pub fn rn(dim: usize) -> Space {
    Space::new(dim)
}

/// In-place linear combination: `out = a * x + b * y`.
///
/// The workhorse update used by the iterative solvers.
pub fn lincomb(out: &mut DVector<f64>, a: f64, x: &DVector<f64>, b: f64, y: &DVector<f64>) {
    out.zip_zip_apply(x, y, |o, xi, yi| *o = a * xi + b * yi);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_space_identity() {
        assert_eq!(rn(3), rn(3));
        assert_ne!(rn(3), rn(4));
    }

    #[test]
    fn test_membership() {
        let space = rn(2);
        assert!(space.contains(&space.zero()));
        assert!(!space.contains(&rn(3).zero()));
        assert!(space.element([1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn test_lincomb() {
        let space = rn(3);
        let x = space.element([1.0, 2.0, 3.0]).unwrap();
        let y = space.one();
        let mut out = space.zero();
        lincomb(&mut out, 2.0, &x, -1.0, &y);
        assert_eq!(out, space.element([1.0, 3.0, 5.0]).unwrap());
    }
}
