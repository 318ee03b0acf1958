//! Experiment Runner for Thread Scalability Analysis.
//!
//! This executable measures the wall-clock time of one full SLQ sampling pass
//! across a range of worker-pool sizes, together with the peak resident set
//! size of the process. The Monte-Carlo loop is embarrassingly parallel, so
//! time should fall close to linearly until memory bandwidth or the dynamic
//! chunking overhead dominates. Memory should grow only with the per-thread
//! scratch (one n x ncv basis window per worker), not with the sample count.

use anyhow::Result;
use clap::Parser;
use faer::sparse::{SparseColMat, Triplet};
use serde::Serialize;
use statrs::statistics::{Data, Distribution, Median};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use stochastic_lanczos::{SlqParams, slq};

/// Command-line arguments for the scalability analysis runner.
#[derive(Parser, Debug)]
#[clap(
    name = "scalability-runner",
    about = "Measures SLQ sampling wall-clock time and memory across thread counts."
)]
struct ScalabilityArgs {
    /// Dimension of the test matrix.
    #[clap(long, default_value_t = 5000)]
    n: usize,
    /// Krylov dimension of the per-probe Lanczos expansion.
    #[clap(long, default_value_t = 40)]
    k: usize,
    /// Number of Lanczos vectors kept per worker.
    #[clap(long, default_value_t = 10)]
    ncv: usize,
    /// Number of probe vectors per run.
    #[clap(long, default_value_t = 256)]
    nv: usize,
    /// Worker-pool sizes to test.
    #[clap(long, value_delimiter = ',', default_value = "1,2,4,8")]
    threads: Vec<usize>,
    /// Timed repetitions per pool size.
    #[clap(long, default_value_t = 3)]
    reps: usize,
    /// Master seed for the probe sub-streams.
    #[clap(long, default_value_t = 0)]
    seed: u64,
    /// Path to the output CSV file where results will be written.
    #[clap(long, value_name = "PATH")]
    output: PathBuf,
}

/// A single row of the output CSV.
#[derive(Debug, Serialize)]
struct ScalabilityResult {
    /// Worker-pool size for this run.
    num_threads: usize,
    /// Median wall-clock time over the repetitions, in seconds.
    median_secs: f64,
    /// Mean wall-clock time over the repetitions, in seconds.
    mean_secs: f64,
    /// Peak resident set size observed so far, in kilobytes.
    peak_rss_kb: u64,
}

/// Reads the peak resident set size (VmPeak) from /proc/self/status.
///
/// Returns 0 when the value cannot be read or the platform is not Linux.
#[cfg(target_os = "linux")]
fn peak_rss_kb() -> u64 {
    let status = match std::fs::read_to_string("/proc/self/status") {
        Ok(content) => content,
        Err(_) => return 0,
    };
    status
        .lines()
        .find(|line| line.starts_with("VmPeak:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|value| value.parse().ok())
        .unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
fn peak_rss_kb() -> u64 {
    0
}

/// Creates a sparse symmetric tridiagonal test matrix: a discrete Laplacian
/// shifted to keep the spectrum positive. Three entries per row keeps the
/// matvec cheap enough that scheduling overhead is visible.
fn create_laplacian_problem(n: usize) -> SparseColMat<usize, f64> {
    let mut triplets = Vec::with_capacity(3 * n);
    for i in 0..n {
        triplets.push(Triplet {
            row: i,
            col: i,
            val: 2.5,
        });
        if i + 1 < n {
            triplets.push(Triplet {
                row: i,
                col: i + 1,
                val: -1.0,
            });
            triplets.push(Triplet {
                row: i + 1,
                col: i,
                val: -1.0,
            });
        }
    }
    SparseColMat::try_new_from_triplets(n, n, &triplets)
        .expect("Failed to construct sparse Laplacian matrix.")
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;
    let args = ScalabilityArgs::parse();
    log::info!(
        "Starting scalability analysis: n = {}, nv = {}, threads {:?}",
        args.n,
        args.nv,
        args.threads
    );

    let a = create_laplacian_problem(args.n);
    let mut writer = csv::Writer::from_path(&args.output)?;

    for &num_threads in &args.threads {
        let params = SlqParams::<f64> {
            num_samples: args.nv,
            lanczos_degree: args.k,
            lanczos_rtol: 0.0,
            ncv: args.ncv,
            num_threads,
            seed: args.seed,
            ..SlqParams::default()
        };

        let mut times = Vec::with_capacity(args.reps);
        for rep in 0..args.reps {
            // A trivial reduction keeps the callback from being optimized out.
            let checksum = AtomicU64::new(0);
            let start = Instant::now();
            slq(&a, &params, |_i, _q, _basis, _nodes, weights| {
                checksum.fetch_add(weights.len() as u64, Ordering::Relaxed);
            })?;
            let elapsed = start.elapsed().as_secs_f64();
            times.push(elapsed);
            log::info!(
                "threads = {}, rep = {}: {:.3}s ({} rules)",
                num_threads,
                rep,
                elapsed,
                checksum.into_inner()
            );
        }

        let data = Data::new(times);
        writer.serialize(ScalabilityResult {
            num_threads,
            median_secs: data.median(),
            mean_secs: data.mean().unwrap_or(f64::NAN),
            peak_rss_kb: peak_rss_kb(),
        })?;
    }

    writer.flush()?;
    log::info!("Scalability analysis complete. Results saved to {:?}.", &args.output);
    Ok(())
}
