//! Gaussian quadrature extraction from the Lanczos tridiagonal.
//!
//! The eigendecomposition T = S Λ Sᵀ of the symmetric tridiagonal produced by
//! the recurrence yields a k-point Gaussian quadrature rule for the spectral
//! measure of A associated with the starting probe: the nodes are the
//! Rayleigh-Ritz values θ = diag(Λ), the weights are the squared first
//! components τᵢ = S[0, i]². For any smooth f,
//!
//! ```text
//!     <q, f(A) q> ≈ Σᵢ τᵢ f(θᵢ),
//! ```
//!
//! exact for polynomials of degree ≤ 2k − 1.
//!
//! The dense symmetric eigensolver is treated as a black box; faer's
//! self-adjoint eigendecomposition returns eigenvalues in ascending order,
//! which fixes the node ordering.

use crate::error::{SlqError, SlqErrorKind};
use faer::traits::RealField;
use faer::{Mat, Side};
use num_traits::Float;

/// Computes the quadrature nodes and weights of the k × k symmetric
/// tridiagonal T(α, β).
///
/// # Arguments
/// * `alpha`: The k diagonal entries of T.
/// * `beta`: The subdiagonal entries, offset by one: `beta[1..k]` holds the
///   k − 1 off-diagonal values and `beta[0]` is ignored (the recurrence's
///   zero sentinel).
/// * `nodes`, `weights`: Output slices of length k. Nodes are written in
///   ascending order; weights are non-negative and sum to 1 up to roundoff.
///
/// # Errors
/// Returns an error if the eigendecomposition of T fails to converge.
pub fn lanczos_quadrature<T: RealField + Float>(
    alpha: &[T],
    beta: &[T],
    nodes: &mut [T],
    weights: &mut [T],
) -> Result<(), SlqError> {
    let k = alpha.len();
    debug_assert!(k > 0);
    debug_assert_eq!(beta.len(), k);
    debug_assert_eq!(nodes.len(), k);
    debug_assert_eq!(weights.len(), k);

    // Assemble the dense tridiagonal. The eigensolver owns its workspace, so
    // the recurrence's zero-allocation discipline ends at this boundary, the
    // same place the per-call dense solver sits in classical SLQ codes.
    let mut t = Mat::<T>::zeros(k, k);
    for (j, &a) in alpha.iter().enumerate() {
        t.as_mut()[(j, j)] = a;
    }
    for (j, &b) in beta.iter().enumerate().skip(1) {
        t.as_mut()[(j - 1, j)] = b;
        t.as_mut()[(j, j - 1)] = b;
    }

    let evd = t
        .as_ref()
        .self_adjoint_eigen(Side::Lower)
        .map_err(|e| SlqError::from(SlqErrorKind::EvdError(e)))?;

    // Rayleigh-Ritz values, ascending.
    let theta = evd.S();
    // Squared first components of the orthonormal eigenvectors.
    let s = evd.U();
    for i in 0..k {
        nodes[i] = theta[i];
        let s0 = s[(0, i)];
        weights[i] = s0 * s0;
    }
    Ok(())
}
