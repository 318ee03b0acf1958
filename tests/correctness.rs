//! Integration test suite for the mathematical correctness of the stochastic
//! Lanczos quadrature pipeline.
//!
//! # Test Methodology
//!
//! The tests validate the pipeline against ground truths that can be computed
//! analytically. Diagonal matrices are the workhorse: any spectral sum of
//! diag(λ_1, ..., λ_n) is a closed-form expression in the λ_j, so the
//! Monte-Carlo estimator, the quadrature rule and the recurrence can each be
//! checked against exact values. Low-rank and identity operators exercise the
//! early-termination path, and a quadratically spread spectrum provides the
//! fast Ritz convergence needed to observe loss of orthogonality.

use anyhow::{Result, ensure};
use faer::sparse::{SparseColMat, Triplet};
use faer::{Mat, MatRef};
use rand::{Rng, SeedableRng, rngs::StdRng};
use std::sync::Mutex;
use stochastic_lanczos::{Isotropic, SlqParams, lanczos_tridiag, slq};

/// Creates the sparse diagonal matrix diag(1, 2, ..., n) together with its
/// eigenvalues.
fn create_diagonal_problem(n: usize) -> (SparseColMat<usize, f64>, Vec<f64>) {
    let mut triplets = Vec::with_capacity(n);
    let mut eigs = Vec::with_capacity(n);
    for i in 0..n {
        let val = (i + 1) as f64;
        triplets.push(Triplet {
            row: i,
            col: i,
            val,
        });
        eigs.push(val);
    }
    let a = SparseColMat::try_new_from_triplets(n, n, &triplets).unwrap();
    (a, eigs)
}

/// Creates a reproducible random probe.
fn random_probe(n: usize, seed: u64) -> Mat<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Mat::from_fn(n, 1, |_, _| rng.random::<f64>() - 0.5)
}

/// Symmetrizes a reproducible random matrix into a dense test operator.
fn random_symmetric(n: usize, seed: u64) -> Mat<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let g = Mat::from_fn(n, n, |_, _| rng.random::<f64>() - 0.5);
    let mut a = Mat::<f64>::zeros(n, n);
    for i in 0..n {
        for j in 0..n {
            a.as_mut()[(i, j)] = 0.5 * (g.as_ref()[(i, j)] + g.as_ref()[(j, i)]);
        }
    }
    a
}

/// Orthogonality loss ||Qᵀ Q - I||_F of a basis.
fn orthogonality_loss(basis: MatRef<'_, f64>) -> f64 {
    let k = basis.ncols();
    let identity = Mat::<f64>::identity(k, k);
    (&identity - basis.transpose() * basis).norm_l2()
}

// --- End-to-end scenarios ---

/// On the identity operator every probe spans an invariant subspace: the
/// recurrence terminates after one step, the single quadrature node is the
/// eigenvalue 1 with full weight, and the zero-padded tails carry no mass.
#[test]
fn test_identity_operator_collapses_to_single_node() -> Result<()> {
    let n = 64;
    let a = Mat::<f64>::identity(n, n);
    let params = SlqParams::<f64> {
        num_samples: 1,
        lanczos_degree: 20,
        lanczos_rtol: 0.0,
        orth: 19,
        ncv: 20,
        distribution: Isotropic::Rademacher,
        num_threads: 1,
        seed: 0,
    };

    let observed = Mutex::new(false);
    slq(&a, &params, |_i, q, _basis, nodes, weights| {
        // The probe was normalized in place.
        assert!((q.norm_l2() - 1.0).abs() < 1e-13);

        let total: f64 = weights.iter().sum();
        let mass_at_one: f64 = nodes
            .iter()
            .zip(weights.iter())
            .map(|(t, w)| t * w)
            .sum();
        assert!((total - 1.0).abs() < 1e-12, "sum of weights: {total}");
        assert!((mass_at_one - 1.0).abs() < 1e-12);
        // Tail nodes past the effective dimension stayed zeroed.
        assert!(nodes[1..].iter().all(|&t| t == 0.0));
        assert!(weights[1..].iter().all(|&w| w == 0.0));
        *observed.lock().unwrap() = true;
    })?;

    ensure!(observed.into_inner().unwrap(), "callback never ran");
    Ok(())
}

/// The log-determinant of diag(1..100) via the Girard-Hutchinson estimator:
/// (1/nv) Σ_p n Σ_i τᵢ log θᵢ must approach Σ_j log j.
#[test]
fn test_log_determinant_estimate_on_diagonal_spectrum() -> Result<()> {
    let n = 100;
    let (a, eigs) = create_diagonal_problem(n);
    let truth: f64 = eigs.iter().map(|l| l.ln()).sum();

    let params = SlqParams::<f64> {
        num_samples: 100,
        lanczos_degree: 30,
        lanczos_rtol: 1e-12,
        orth: 9,
        ncv: 10,
        distribution: Isotropic::Normal,
        num_threads: 4,
        seed: 42,
    };

    let samples = Mutex::new(vec![0.0f64; params.num_samples]);
    slq(&a, &params, |i, _q, _basis, nodes, weights| {
        let sample: f64 = nodes
            .iter()
            .zip(weights.iter())
            .filter(|(&t, _)| t > 0.0)
            .map(|(&t, &w)| w * t.ln())
            .sum::<f64>()
            * n as f64;
        samples.lock().unwrap()[i] = sample;
    })?;

    let samples = samples.into_inner().unwrap();
    let estimate: f64 = samples.iter().sum::<f64>() / samples.len() as f64;
    let rel_error = (estimate - truth).abs() / truth;
    ensure!(
        rel_error < 0.05,
        "log det estimate {estimate} vs truth {truth}: relative error {rel_error}"
    );
    Ok(())
}

/// A k-point rule integrates polynomials of degree up to 2k - 1 exactly:
/// <q, p(A) q> for a normalized probe must match Σ τᵢ p(θᵢ) to roundoff.
#[test]
fn test_quadrature_is_exact_for_low_degree_polynomials() -> Result<()> {
    let n = 40;
    let (a, eigs) = create_diagonal_problem(n);
    let q = random_probe(n, 7);
    let k = 5;

    let fact = lanczos_tridiag(&a, q.as_ref(), k, 0.0, k - 1)?;
    ensure!(fact.steps == k);
    let (nodes, weights) = fact.quadrature()?;

    // p of degree 3 <= 2k - 1.
    let p = |x: f64| x * x * x - 2.0 * x + 1.0;

    // Ground truth from the diagonal spectral decomposition: for diagonal A,
    // <q̂, p(A) q̂> = Σ_j p(λ_j) q̂_j².
    let norm = q.norm_l2();
    let direct: f64 = eigs
        .iter()
        .enumerate()
        .map(|(j, &l)| {
            let c = q.as_ref()[(j, 0)] / norm;
            p(l) * c * c
        })
        .sum();
    let quad: f64 = nodes
        .iter()
        .zip(weights.iter())
        .map(|(&t, &w)| w * p(t))
        .sum();

    let rel_error = (quad - direct).abs() / direct.abs().max(1.0);
    ensure!(
        rel_error < 1e-9,
        "polynomial moment mismatch: {quad} vs {direct}"
    );

    // Round-trip moments: f = 1 integrates to 1, f = x to α[0].
    let total: f64 = weights.iter().sum();
    let first: f64 = nodes
        .iter()
        .zip(weights.iter())
        .map(|(&t, &w)| t * w)
        .sum();
    ensure!((total - 1.0).abs() < 1e-12);
    ensure!((first - fact.alpha[0]).abs() < 1e-11);
    Ok(())
}

/// With k = n and full re-orthogonalization, Q T Qᵀ reconstructs A.
#[test]
fn test_full_factorization_reconstructs_operator() -> Result<()> {
    let n = 30;
    let a = random_symmetric(n, 3);
    let q = random_probe(n, 4);

    let fact = lanczos_tridiag(&a, q.as_ref(), n, 0.0, n - 1)?;
    ensure!(fact.steps == n, "expected a full factorization");

    let basis = fact.basis();
    let t = fact.tridiagonal();
    let reconstructed = basis * &t * basis.transpose();
    let defect = (&reconstructed - &a).norm_l2() / a.norm_l2();
    ensure!(defect < 1e-10, "reconstruction defect: {defect}");

    ensure!(orthogonality_loss(basis) < 1e-12);
    Ok(())
}

/// A probe inside the range of a rank-3 operator spans a 3-dimensional
/// invariant subspace: the recurrence must stop at step 3 with a residual
/// below the scale-aware threshold, and the quadrature must recover the
/// three active eigenvalues with the probe's squared coefficients as
/// weights.
#[test]
fn test_low_rank_operator_terminates_early() -> Result<()> {
    let n = 50;
    let rtol = 1e-10;

    // Three orthonormal directions from a Gram-Schmidt of random vectors.
    let mut rng = StdRng::seed_from_u64(11);
    let mut u = Mat::from_fn(n, 3, |_, _| rng.random::<f64>() - 0.5);
    for j in 0..3 {
        for jj in 0..j {
            let r = u.as_ref().col(jj).transpose() * u.as_ref().col(j);
            for i in 0..n {
                let prev = u.as_ref()[(i, jj)];
                u.as_mut()[(i, j)] -= r * prev;
            }
        }
        let norm = u.as_ref().col(j).norm_l2();
        for i in 0..n {
            u.as_mut()[(i, j)] /= norm;
        }
    }

    // A = 1 u₁u₁ᵀ + 2 u₂u₂ᵀ + 3 u₃u₃ᵀ.
    let lambda = [1.0, 2.0, 3.0];
    let mut a = Mat::<f64>::zeros(n, n);
    for (j, &l) in lambda.iter().enumerate() {
        for row in 0..n {
            for col in 0..n {
                a.as_mut()[(row, col)] += l * u.as_ref()[(row, j)] * u.as_ref()[(col, j)];
            }
        }
    }

    // A probe in the range of A.
    let coeffs = [0.5, 0.3, 0.2];
    let mut q = Mat::<f64>::zeros(n, 1);
    for (j, &c) in coeffs.iter().enumerate() {
        for i in 0..n {
            q.as_mut()[(i, 0)] += c * u.as_ref()[(i, j)];
        }
    }

    let fact = lanczos_tridiag(&a, q.as_ref(), 10, rtol, 9)?;
    ensure!(fact.steps == 3, "steps taken: {}", fact.steps);
    ensure!(fact.beta[3] <= (n as f64).sqrt() * rtol);
    // Tails past the termination step were never written.
    ensure!(fact.alpha[3..].iter().all(|&v| v == 0.0));
    ensure!(fact.beta[4..].iter().all(|&v| v == 0.0));

    let (nodes, weights) = fact.quadrature()?;
    let qnorm2: f64 = coeffs.iter().map(|c| c * c).sum();
    for j in 0..3 {
        ensure!((nodes[j] - lambda[j]).abs() < 1e-8);
        let expected = coeffs[j] * coeffs[j] / qnorm2;
        ensure!(
            (weights[j] - expected).abs() < 1e-8,
            "weight {j}: {} vs {expected}",
            weights[j]
        );
    }
    Ok(())
}

/// Deeper partial re-orthogonalization must reduce the orthogonality loss of
/// the basis, down to roundoff at full depth. A quadratically spread spectrum
/// makes extreme Ritz pairs converge early, which is what triggers the loss
/// in the raw recurrence.
#[test]
fn test_orthogonality_improves_with_reorthogonalization_depth() -> Result<()> {
    let n = 200;
    let k = 50;
    let mut triplets = Vec::with_capacity(n);
    for i in 0..n {
        let val = ((i + 1) * (i + 1)) as f64;
        triplets.push(Triplet {
            row: i,
            col: i,
            val,
        });
    }
    let a = SparseColMat::<usize, f64>::try_new_from_triplets(n, n, &triplets).unwrap();
    let q = random_probe(n, 21);

    let mut losses = Vec::new();
    for orth in [0usize, 1, 5, k - 1] {
        let fact = lanczos_tridiag(&a, q.as_ref(), k, 0.0, orth)?;
        ensure!(fact.steps == k);
        losses.push(orthogonality_loss(fact.basis()));
    }

    // The raw recurrence must have lost orthogonality for the ladder to be
    // meaningful, and full-window depth must restore it to roundoff.
    ensure!(losses[0] > 1e-8, "no orthogonality loss at orth = 0");
    ensure!(
        *losses.last().unwrap() < 1e-10,
        "full re-orthogonalization loss: {}",
        losses.last().unwrap()
    );
    for pair in losses.windows(2) {
        ensure!(
            pair[1] <= pair[0] * 1.5 + 1e-12,
            "orthogonality loss did not decrease: {:?}",
            losses
        );
    }
    Ok(())
}
