//! Paige's A1 variant of the symmetric Lanczos recurrence with rolling basis
//! storage.
//!
//! This module implements the three-term recurrence that tridiagonalizes a
//! symmetric operator over the Krylov subspace of a starting probe. Only a
//! rolling window of `ncv` basis vectors is kept: without
//! re-orthogonalization just two prior columns are arithmetically needed, and
//! every extra column buys one level of partial re-orthogonalization at fixed
//! memory. Memory usage is O(n * ncv) regardless of the number of steps.
//!
//! The update order follows Paige's A1 variant: the Rayleigh quotient α is
//! taken against the partially updated residual rather than against A·q
//! directly, which gives better backward stability than algebraically
//! equivalent orderings.
//!
//! For a one-shot factorization with a full basis and owned outputs, prefer
//! [`crate::factor::lanczos_tridiag`]. This function is the zero-allocation
//! kernel the sampling driver runs per probe against pre-allocated scratch.

use super::orthogonalize::orth_vector;
use super::{RollingWindow, residual_threshold};
use crate::operator::LinearOperator;
use faer::prelude::{Reborrow, ReborrowMut};
use faer::traits::RealField;
use faer::{MatMut, unzip, zip};
use num_traits::Float;

/// Runs up to `k` steps of the Lanczos recurrence on `A` from the probe `q`.
///
/// # Arguments
/// * `a`: A symmetric linear operator of order n.
/// * `q`: The starting probe (n × 1). Normalized in place; the normalized
///   probe becomes column 0 of `basis`.
/// * `k`: The Krylov dimension to capture, at least 2.
/// * `rtol`: Relative residual tolerance; the effective early-termination
///   threshold is `sqrt(n) * rtol`.
/// * `orth`: Number of additional basis vectors to re-orthogonalize against,
///   in `[0, ncv)`.
/// * `alpha`, `beta`: Output buffers of length at least k + 1. `alpha[j]`
///   receives the j-th diagonal entry of T; `beta[j + 1]` the j-th
///   subdiagonal. `beta[0]` is the zero sentinel and is written by this
///   function. Entries past the step where the recurrence terminates keep
///   whatever values the caller stored there.
/// * `basis`: The rolling basis buffer, n × ncv column-major with
///   `2 <= ncv <= k` and `orth < ncv`.
/// * `resid`: Residual workspace (n × 1). On return it holds the final,
///   unnormalized residual vector; callers that want the unconverged
///   direction after early termination must copy it out before reusing the
///   scratch.
///
/// # Returns
/// The effective tridiagonal dimension: `k`, or `j* + 1 < k` if the residual
/// norm fell to `sqrt(n) * rtol` at step j*, meaning the computed subspace is
/// numerically A-invariant.
///
/// All failure modes are numerical. Preconditions are checked with debug
/// assertions only; NaN or Inf produced by the operator propagate quietly
/// into α and β. A zero-norm probe yields α = β = 0 and terminates at the
/// first step.
pub fn lanczos_recurrence<T, A>(
    a: &A,
    q: MatMut<'_, T>,
    k: usize,
    rtol: T,
    orth: usize,
    alpha: &mut [T],
    beta: &mut [T],
    basis: MatMut<'_, T>,
    resid: MatMut<'_, T>,
) -> usize
where
    T: RealField + Float,
    A: LinearOperator<T> + ?Sized,
{
    let mut q = q;
    let mut basis = basis;
    let mut resid = resid;

    let n = a.nrows();
    let ncv = basis.ncols();
    debug_assert_eq!(a.ncols(), n);
    debug_assert_eq!(q.nrows(), n);
    debug_assert_eq!(q.ncols(), 1);
    debug_assert_eq!(resid.nrows(), n);
    debug_assert_eq!(resid.ncols(), 1);
    debug_assert_eq!(basis.nrows(), n);
    debug_assert!(k >= 2);
    debug_assert!((2..=k).contains(&ncv));
    debug_assert!(orth < ncv);
    debug_assert!(alpha.len() > k);
    debug_assert!(beta.len() > k);
    debug_assert!(rtol >= T::zero());

    let threshold = residual_threshold(n, rtol);

    // Normalize the probe in place and load it as the first basis vector. A
    // zero probe stays zero and falls through to immediate termination below.
    let norm = q.rb().norm_l2();
    if norm > T::zero() {
        let inv = norm.recip();
        zip!(q.rb_mut()).for_each(|unzip!(x)| *x = *x * inv);
    }
    basis.rb_mut().col_mut(0).copy_from(q.rb().col(0));

    // The sentinel makes the j = 0 "previous" subtraction vanish.
    beta[0] = T::zero();

    let mut window = RollingWindow::new(ncv);
    for j in 0..k {
        let (prev, cur, next) = window.indices();

        // v = A q_c
        a.matvec(basis.rb().col(cur).as_mat(), resid.rb_mut());

        // v -= beta[j] q_p  (no-op at j = 0 via the sentinel)
        let b_prev = beta[j];
        zip!(resid.rb_mut().col_mut(0), basis.rb().col(prev))
            .for_each(|unzip!(y, x)| *y = *y - b_prev * *x);

        // alpha[j] = <q_c, v>, the Rayleigh quotient of the updated residual.
        let a_j = basis.rb().col(cur).transpose() * resid.rb().col(0);
        alpha[j] = a_j;

        // v -= alpha[j] q_c
        zip!(resid.rb_mut().col_mut(0), basis.rb().col(cur))
            .for_each(|unzip!(y, x)| *y = *y - a_j * *x);

        // Re-orthogonalize against the window, bounded by the number of
        // columns actually produced so far.
        if orth > 0 {
            orth_vector(
                resid.rb_mut().col_mut(0),
                basis.rb(),
                cur,
                Ord::min(orth, j),
                true,
            );
        }

        // Early-stop when the Krylov subspace is numerically A-invariant. The
        // final-step break also keeps the last basis column intact.
        let b_next = resid.rb().norm_l2();
        beta[j + 1] = b_next;
        if b_next <= threshold || j + 1 == k {
            return j + 1;
        }

        // Normalize the residual into the next window slot.
        let inv = b_next.recip();
        zip!(basis.rb_mut().col_mut(next), resid.rb().col(0))
            .for_each(|unzip!(y, x)| *y = *x * inv);

        window.advance(j);
    }

    k
}
