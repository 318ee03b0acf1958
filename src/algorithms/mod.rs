//! Core numerical algorithms: the Lanczos recurrence with a rolling basis
//! window, modified Gram-Schmidt re-orthogonalization, and Gaussian quadrature
//! extraction from the Lanczos tridiagonal.
//!
//! The pieces shared by these modules live here: the cyclic index window over
//! the basis buffer and the scale-aware residual threshold that decides early
//! termination.

pub mod lanczos;
pub mod orthogonalize;
pub mod quadrature;

use faer::traits::RealField;
use num_traits::Float;

/// Cyclic index triple over the `ncv`-column Lanczos basis buffer.
///
/// At every step of the recurrence three columns are live: the previous,
/// current and next Lanczos vectors, identified by positions into
/// `[0, ncv)`. After a step completes, the triple is rotated left and the
/// freed slot is re-aimed at `(j + 2) mod ncv`, so the buffer holds the most
/// recent `ncv` vectors without ever moving data.
///
/// The initial "previous" position points at column `ncv - 1`, a column whose
/// contribution is annihilated by the β\[0\] = 0 sentinel; there is no real
/// predecessor at step 0.
#[derive(Debug, Clone)]
pub struct RollingWindow {
    pos: [usize; 3],
    ncv: usize,
}

impl RollingWindow {
    /// Creates the window for a basis buffer of `ncv >= 2` columns.
    pub fn new(ncv: usize) -> Self {
        debug_assert!(ncv >= 2);
        Self {
            pos: [ncv - 1, 0, 1],
            ncv,
        }
    }

    /// Returns the (previous, current, next) column indices.
    #[inline]
    pub fn indices(&self) -> (usize, usize, usize) {
        (self.pos[0], self.pos[1], self.pos[2])
    }

    /// Advances past step `j`: left-rotates the triple and points the new
    /// "next" slot at column `(j + 2) mod ncv`.
    #[inline]
    pub fn advance(&mut self, j: usize) {
        self.pos.rotate_left(1);
        self.pos[2] = (j + 2) % self.ncv;
    }
}

/// The residual threshold below which the Krylov subspace is treated as
/// numerically invariant: `sqrt(n) * rtol`.
///
/// The `sqrt(n)` factor accounts for the componentwise accumulation of
/// roundoff in an n-dimensional inner product.
#[inline]
pub fn residual_threshold<T: RealField + Float>(n: usize, rtol: T) -> T {
    T::from_f64_impl((n as f64).sqrt()) * rtol
}
