//! The stochastic Lanczos quadrature sampling driver.
//!
//! This module composes the probe generator, the Lanczos recurrence and the
//! quadrature extractor into a thread-parallel Monte-Carlo loop. Each probe
//! yields a Gaussian quadrature rule (θ, τ) for the spectral measure of A
//! seen from that probe; the user callback folds those rules into whatever
//! estimator it is building (trace of a matrix function, log-determinant,
//! Schatten norms, ...). The driver takes no position on the estimator: it
//! delivers per-probe data and owns only threading and scratch lifetimes.

use crate::algorithms::lanczos::lanczos_recurrence;
use crate::algorithms::quadrature::lanczos_quadrature;
use crate::error::{SlqError, SlqErrorKind};
use crate::operator::LinearOperator;
use crate::random::{Isotropic, fill_isotropic, probe_substream};
use faer::traits::RealField;
use faer::{Mat, MatRef};
use num_traits::Float;
use rand_distr::{Distribution, StandardNormal};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Sampling and recurrence parameters for one [`slq`] invocation.
///
/// The defaults mirror common SLQ practice: a degree-20 Krylov expansion,
/// Rademacher probes, no partial re-orthogonalization, and a zero residual
/// tolerance (the recurrence still terminates on exactly invariant
/// subspaces).
#[derive(Debug, Clone)]
pub struct SlqParams<T> {
    /// Number of Monte-Carlo probe vectors to sample.
    pub num_samples: usize,
    /// Krylov dimension k of the per-probe Lanczos expansion, at least 2.
    pub lanczos_degree: usize,
    /// Relative residual tolerance; the early-termination threshold is
    /// `sqrt(n) * lanczos_rtol`.
    pub lanczos_rtol: T,
    /// Number of additional basis vectors to re-orthogonalize against, in
    /// `[0, ncv)`.
    pub orth: usize,
    /// Number of Lanczos vectors kept in memory per worker, in
    /// `[2, lanczos_degree]`.
    pub ncv: usize,
    /// Distribution of the isotropic probes.
    pub distribution: Isotropic,
    /// Worker pool size. Zero delegates to the runtime's default level of
    /// parallelism.
    pub num_threads: usize,
    /// Master seed for the per-probe RNG sub-streams.
    pub seed: u64,
}

impl<T: RealField + Float> Default for SlqParams<T> {
    fn default() -> Self {
        Self {
            num_samples: 32,
            lanczos_degree: 20,
            lanczos_rtol: T::zero(),
            orth: 0,
            ncv: 20,
            distribution: Isotropic::Rademacher,
            num_threads: 0,
            seed: 0,
        }
    }
}

impl<T: RealField + Float> SlqParams<T> {
    /// Checks the admissibility of the parameter set before any work starts.
    pub fn validate(&self) -> Result<(), SlqError> {
        if self.num_samples == 0 {
            return Err(SlqErrorKind::InputError(
                "`num_samples` must be positive.".to_string(),
            )
            .into());
        }
        if self.lanczos_degree < 2 {
            return Err(SlqErrorKind::InputError(
                "`lanczos_degree` must be at least 2.".to_string(),
            )
            .into());
        }
        if !(self.lanczos_rtol >= T::zero()) {
            return Err(SlqErrorKind::InputError(
                "`lanczos_rtol` must be non-negative.".to_string(),
            )
            .into());
        }
        if self.ncv < 2 || self.ncv > self.lanczos_degree {
            return Err(SlqErrorKind::InputError(
                "`ncv` must lie in [2, lanczos_degree].".to_string(),
            )
            .into());
        }
        if self.orth >= self.ncv {
            return Err(SlqErrorKind::InputError(
                "`orth` must be smaller than `ncv`.".to_string(),
            )
            .into());
        }
        Ok(())
    }
}

/// Runs the stochastic Lanczos quadrature sampling loop over `a`.
///
/// For each probe index `i` in `0..params.num_samples`, the driver draws an
/// isotropic probe from sub-stream `(seed, i)`, runs the Lanczos recurrence,
/// extracts the quadrature rule of the effective tridiagonal, and invokes
///
/// ```text
///     f(i, q, basis, nodes, weights)
/// ```
///
/// where `q` is the normalized probe (n × 1), `basis` the rolling Lanczos
/// window (n × ncv), and `nodes`/`weights` have length `lanczos_degree` with
/// zeros past the effective dimension when the recurrence terminated early.
///
/// Probe indices are handed to a fixed pool of workers in dynamic chunks of
/// `max(1, floor(sqrt(num_samples / num_threads)))`; each worker allocates
/// its scratch once and reuses it across its probes, so the per-probe hot
/// path performs no heap allocation. The callback runs concurrently from
/// multiple threads and owns its synchronization; the order of callback
/// invocations across probe indices is unspecified, but the numerical
/// content delivered for a given `(seed, i)` is deterministic.
///
/// # Errors
/// Returns an error on inadmissible parameters, a non-square operator, pool
/// construction failure, or a quadrature eigendecomposition failure. After a
/// failure, workers finish their current chunk without starting new ones;
/// already-delivered callback invocations are not undone.
pub fn slq<T, A, F>(a: &A, params: &SlqParams<T>, f: F) -> Result<(), SlqError>
where
    T: RealField + Float,
    StandardNormal: Distribution<T>,
    A: LinearOperator<T> + ?Sized,
    F: Fn(usize, MatRef<'_, T>, MatRef<'_, T>, &[T], &[T]) + Sync,
{
    let n = a.nrows();
    if a.ncols() != n {
        return Err(SlqErrorKind::NonSquareOperator {
            rows: n,
            cols: a.ncols(),
        }
        .into());
    }
    params.validate()?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(params.num_threads)
        .build()
        .map_err(SlqErrorKind::from)?;
    let num_threads = pool.current_num_threads();

    let nv = params.num_samples;
    let k = params.lanczos_degree;
    // Square-root-of-share chunking balances load without excessive
    // synchronization when matvec cost varies across probes.
    let chunk = Ord::max(1, ((nv / Ord::max(1, num_threads)) as f64).sqrt() as usize);

    log::debug!(
        "slq: sampling {} probes of order {} with {} workers (degree {}, ncv {}, chunk {})",
        nv,
        n,
        num_threads,
        k,
        params.ncv,
        chunk
    );

    let cursor = AtomicUsize::new(0);
    let abort = AtomicBool::new(false);

    let worker = |_ctx: rayon::BroadcastContext<'_>| -> Result<(), SlqError> {
        // Per-worker scratch, allocated once and reused across probes.
        let mut probe = Mat::<T>::zeros(n, 1);
        let mut resid = Mat::<T>::zeros(n, 1);
        let mut basis = Mat::<T>::zeros(n, params.ncv);
        let mut alpha = vec![T::zero(); k + 1];
        let mut beta = vec![T::zero(); k + 1];
        let mut nodes = vec![T::zero(); k];
        let mut weights = vec![T::zero(); k];

        loop {
            if abort.load(Ordering::Relaxed) {
                return Ok(());
            }
            let start = cursor.fetch_add(chunk, Ordering::Relaxed);
            if start >= nv {
                return Ok(());
            }
            let end = Ord::min(start + chunk, nv);

            for i in start..end {
                alpha.fill(T::zero());
                beta.fill(T::zero());
                nodes.fill(T::zero());
                weights.fill(T::zero());

                let mut rng = probe_substream(params.seed, i as u64);
                fill_isotropic(&mut rng, params.distribution, probe.as_mut());

                let steps = lanczos_recurrence(
                    a,
                    probe.as_mut(),
                    k,
                    params.lanczos_rtol,
                    params.orth,
                    &mut alpha,
                    &mut beta,
                    basis.as_mut(),
                    resid.as_mut(),
                );

                if let Err(err) = lanczos_quadrature(
                    &alpha[..steps],
                    &beta[..steps],
                    &mut nodes[..steps],
                    &mut weights[..steps],
                ) {
                    abort.store(true, Ordering::Relaxed);
                    return Err(err);
                }

                f(i, probe.as_ref(), basis.as_ref(), &nodes, &weights);
            }
        }
    };

    let results = pool.broadcast(worker);
    for result in results {
        result?;
    }
    Ok(())
}
