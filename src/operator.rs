//! This module defines the core abstraction for symmetric linear operators.
//!
//! The Lanczos recurrence never inspects individual matrix entries; its only
//! fundamental operation is the matrix-vector product. The algorithm can
//! therefore be written against any object that can perform this action, known
//! as a "linear operator". This matrix-free approach lets the same recurrence
//! run against dense matrices, sparse matrices, or implicit operators that
//! compute the product without ever materializing a matrix.
//!
//! Unlike a plain `apply` that returns a freshly allocated vector, the
//! [`LinearOperator::matvec`] contract writes into a caller-supplied buffer.
//! The sampling driver calls it once per Lanczos step from a hot loop that
//! performs no heap allocation, so the product must land in pre-allocated
//! per-thread scratch.

use faer::linalg::matmul::matmul;
use faer::sparse::linalg::matmul::sparse_dense_matmul;
use faer::sparse::{SparseColMat, SparseColMatRef};
use faer::traits::RealField;
use faer::{Accum, Mat, MatMut, MatRef, Par};

/// Represents a symmetric linear operator through its matrix-vector product.
///
/// The recurrence treats `self` as a symmetric matrix A of order
/// `nrows() == ncols()`; symmetry is a numerical contract, not something the
/// trait can enforce. Violating it produces meaningless output but must not
/// cause memory unsafety.
///
/// Implementations must be safe to call concurrently from distinct threads
/// against distinct output buffers (hence the `Sync` supertrait); the sampling
/// driver issues one matvec at a time per worker.
pub trait LinearOperator<T: RealField>: Sync {
    /// Returns the number of rows of the operator.
    fn nrows(&self) -> usize;

    /// Returns the number of columns of the operator.
    fn ncols(&self) -> usize;

    /// Computes `out = A * rhs`.
    ///
    /// Both `rhs` and `out` are single-column matrices of length `nrows()`.
    /// Implementations must write every entry of `out` and must not read its
    /// prior contents.
    fn matvec(&self, rhs: MatRef<'_, T>, out: MatMut<'_, T>);
}

/// Implementation for `faer`'s immutable dense matrix view (`MatRef`).
/// This is the primary concrete implementation that the generic algorithm is
/// tested against.
impl<T: RealField> LinearOperator<T> for MatRef<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        (*self).nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        (*self).ncols()
    }

    #[inline]
    fn matvec(&self, rhs: MatRef<'_, T>, out: MatMut<'_, T>) {
        debug_assert_eq!((*self).ncols(), rhs.nrows());
        debug_assert_eq!((*self).nrows(), out.nrows());
        // Defer to faer's optimized matrix multiplication kernel. The product
        // replaces the contents of `out`, so stale scratch is never observed.
        matmul(out, Accum::Replace, *self, rhs, T::one(), Par::Seq);
    }
}

/// Implementation for `faer`'s owned dense matrix (`Mat`), delegating to the
/// `MatRef` implementation via a reference.
impl<T: RealField> LinearOperator<T> for Mat<T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.as_ref().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.as_ref().ncols()
    }

    #[inline]
    fn matvec(&self, rhs: MatRef<'_, T>, out: MatMut<'_, T>) {
        LinearOperator::matvec(&self.as_ref(), rhs, out);
    }
}

/// Implementation for `faer`'s sparse column-major matrix view.
/// Sparse operators are the common case for large-scale spectral sum
/// estimation, where A is too big to hold densely.
impl<T: RealField> LinearOperator<T> for SparseColMatRef<'_, usize, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.symbolic().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.symbolic().ncols()
    }

    #[inline]
    fn matvec(&self, rhs: MatRef<'_, T>, out: MatMut<'_, T>) {
        debug_assert_eq!((*self).ncols(), rhs.nrows());
        debug_assert_eq!((*self).nrows(), out.nrows());
        sparse_dense_matmul(out, Accum::Replace, *self, rhs, T::one(), Par::Seq);
    }
}

/// Implementation for `faer`'s owned sparse column-major matrix, delegating to
/// the view implementation via a reference.
impl<T: RealField> LinearOperator<T> for SparseColMat<usize, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.as_ref().nrows()
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.as_ref().ncols()
    }

    #[inline]
    fn matvec(&self, rhs: MatRef<'_, T>, out: MatMut<'_, T>) {
        LinearOperator::matvec(&self.as_ref(), rhs, out);
    }
}

// Unit tests to verify the correctness of the LinearOperator trait and its
// implementations.
#[cfg(test)]
mod tests {
    use super::*;
    use faer::mat;
    use faer::sparse::Triplet;

    #[test]
    fn test_dense_matvec() {
        let matrix: Mat<f64> = mat![[2.0, -1.0, 0.0], [-1.0, 2.0, -1.0], [0.0, -1.0, 2.0]];
        let vector: Mat<f64> = mat![[1.0], [2.0], [3.0]];

        let expected = &matrix * &vector;

        let mut out = Mat::<f64>::zeros(3, 1);
        // Fill the output with garbage first; matvec must overwrite it fully.
        out.as_mut()[(1, 0)] = f64::NAN;

        let operator: &dyn LinearOperator<f64> = &matrix;
        operator.matvec(vector.as_ref(), out.as_mut());

        assert_eq!(out, expected);
        assert_eq!(operator.nrows(), 3);
        assert_eq!(operator.ncols(), 3);
    }

    #[test]
    fn test_sparse_matvec_matches_dense() {
        let n = 5;
        let mut triplets = Vec::new();
        let mut dense = Mat::<f64>::zeros(n, n);
        for i in 0..n {
            let val = (i + 1) as f64;
            triplets.push(Triplet {
                row: i,
                col: i,
                val,
            });
            dense.as_mut()[(i, i)] = val;
        }
        // One symmetric off-diagonal pair.
        triplets.push(Triplet {
            row: 0,
            col: 4,
            val: 0.5,
        });
        triplets.push(Triplet {
            row: 4,
            col: 0,
            val: 0.5,
        });
        dense.as_mut()[(0, 4)] = 0.5;
        dense.as_mut()[(4, 0)] = 0.5;

        let sparse = SparseColMat::try_new_from_triplets(n, n, &triplets).unwrap();
        let vector = Mat::from_fn(n, 1, |i, _| (i as f64) - 2.0);

        let mut out_sparse = Mat::<f64>::zeros(n, 1);
        let mut out_dense = Mat::<f64>::zeros(n, 1);
        LinearOperator::matvec(&sparse, vector.as_ref(), out_sparse.as_mut());
        LinearOperator::matvec(&dense, vector.as_ref(), out_dense.as_mut());

        for i in 0..n {
            let a = out_sparse.as_ref()[(i, 0)];
            let b = out_dense.as_ref()[(i, 0)];
            assert!((a - b).abs() < 1e-14, "row {i}: {a} vs {b}");
        }
    }
}
