//! High-level, one-shot Lanczos tridiagonalization.
//!
//! This module provides a user-friendly entry point for factoring a single
//! probe: it validates inputs, allocates a full k-column basis and owned
//! coefficient buffers, and runs the recurrence once. It is the convenient
//! path for spectral experiments and tests; the Monte-Carlo driver in
//! [`crate::slq`] instead calls the zero-allocation kernel directly against
//! reusable per-thread scratch.

use crate::algorithms::lanczos::lanczos_recurrence;
use crate::algorithms::quadrature::lanczos_quadrature;
use crate::error::{SlqError, SlqErrorKind};
use crate::operator::LinearOperator;
use faer::traits::RealField;
use faer::{Mat, MatRef};
use num_traits::Float;

/// The result of a one-shot Lanczos factorization.
///
/// Holds the recurrence coefficients of the tridiagonal T = Qᵀ A Q, the
/// effective dimension reached before termination, and the generated basis.
#[derive(Debug, Clone)]
pub struct LanczosFactorization<T> {
    /// Diagonal entries of T; valid in `alpha[0..steps]`.
    pub alpha: Vec<T>,
    /// Subdiagonal entries of T, offset by one: valid in `beta[1..steps]`,
    /// with `beta[0] = 0` and `beta[steps]` holding the final residual norm.
    pub beta: Vec<T>,
    /// Effective tridiagonal dimension; less than the requested degree when
    /// the recurrence captured an invariant subspace early.
    pub steps: usize,
    basis: Mat<T>,
}

impl<T: RealField + Float> LanczosFactorization<T> {
    /// Returns the generated orthonormal basis, one column per step taken.
    pub fn basis(&self) -> MatRef<'_, T> {
        self.basis.as_ref().get(.., 0..self.steps)
    }

    /// Assembles the effective tridiagonal T as a dense matrix.
    pub fn tridiagonal(&self) -> Mat<T> {
        let mut t = Mat::<T>::zeros(self.steps, self.steps);
        for j in 0..self.steps {
            t.as_mut()[(j, j)] = self.alpha[j];
        }
        for j in 1..self.steps {
            t.as_mut()[(j - 1, j)] = self.beta[j];
            t.as_mut()[(j, j - 1)] = self.beta[j];
        }
        t
    }

    /// Computes the Gaussian quadrature rule (nodes, weights) of the
    /// effective tridiagonal.
    pub fn quadrature(&self) -> Result<(Vec<T>, Vec<T>), SlqError> {
        let mut nodes = vec![T::zero(); self.steps];
        let mut weights = vec![T::zero(); self.steps];
        lanczos_quadrature(
            &self.alpha[..self.steps],
            &self.beta[..self.steps],
            &mut nodes,
            &mut weights,
        )?;
        Ok((nodes, weights))
    }
}

/// Factors `a` over the Krylov subspace of the probe `q0` with a full
/// k-column basis.
///
/// The basis window spans all `k` requested steps (ncv = k), so the surviving
/// columns are the Lanczos vectors in natural order and `orth = k - 1` gives
/// full re-orthogonalization within the factorization.
///
/// # Arguments
/// * `a`: A symmetric linear operator.
/// * `q0`: The starting probe (n × 1). Copied; the original is not modified.
/// * `k`: The Krylov dimension to capture, at least 2.
/// * `rtol`: Relative residual tolerance for early termination.
/// * `orth`: Re-orthogonalization depth in `[0, k)`.
///
/// # Errors
/// Returns an error if the operator is not square, the probe length does not
/// match, or the parameters are inadmissible.
pub fn lanczos_tridiag<T, A>(
    a: &A,
    q0: MatRef<'_, T>,
    k: usize,
    rtol: T,
    orth: usize,
) -> Result<LanczosFactorization<T>, SlqError>
where
    T: RealField + Float,
    A: LinearOperator<T> + ?Sized,
{
    let n = a.nrows();
    if a.ncols() != n {
        return Err(SlqErrorKind::NonSquareOperator {
            rows: n,
            cols: a.ncols(),
        }
        .into());
    }
    if q0.nrows() != n || q0.ncols() != 1 {
        return Err(SlqErrorKind::DimensionMismatch {
            operator_cols: n,
            vector_rows: q0.nrows(),
        }
        .into());
    }
    if k < 2 {
        return Err(SlqErrorKind::InputError("`k` must be at least 2.".to_string()).into());
    }
    if orth >= k {
        return Err(
            SlqErrorKind::InputError("`orth` must be smaller than `k`.".to_string()).into(),
        );
    }
    if !(rtol >= T::zero()) {
        return Err(
            SlqErrorKind::InputError("`rtol` must be non-negative.".to_string()).into(),
        );
    }

    let mut q = q0.to_owned();
    let mut alpha = vec![T::zero(); k + 1];
    let mut beta = vec![T::zero(); k + 1];
    let mut basis = Mat::<T>::zeros(n, k);
    let mut resid = Mat::<T>::zeros(n, 1);

    let steps = lanczos_recurrence(
        a,
        q.as_mut(),
        k,
        rtol,
        orth,
        &mut alpha,
        &mut beta,
        basis.as_mut(),
        resid.as_mut(),
    );

    Ok(LanczosFactorization {
        alpha,
        beta,
        steps,
        basis,
    })
}
