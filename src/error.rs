//! This module defines the custom error types for the library.
//!
//! All error conditions that can surface at the crate boundary are centralized
//! in a single enum behind the public [`SlqError`] type. The numerical core
//! itself has no exceptional control flow: loss of orthogonality, early
//! termination and NaN propagation are numerical outcomes, not errors. What
//! can fail is parameter validation before any work starts, the dense
//! tridiagonal eigendecomposition, and thread-pool construction.
//!
//! Using the [`thiserror`] crate allows us to create idiomatic error types with
//! minimal boilerplate. Note that [`faer::linalg::evd::EvdError`] does not
//! implement the standard [`std::error::Error`] trait, so we wrap it manually
//! to provide a compatible error type.
use thiserror::Error;

/// Represents all possible errors that can occur while setting up or running a
/// stochastic Lanczos quadrature computation.
#[derive(Error, Debug)]
#[error(transparent)]
pub struct SlqError(#[from] SlqErrorKind);

/// Private enum containing the distinct kinds of errors.
/// This separation allows for a clean `Display` implementation via
/// [`thiserror`] while handling non-standard error types manually.
#[derive(Error, Debug)]
pub(crate) enum SlqErrorKind {
    /// Indicates that an invalid sampling or recurrence parameter was provided.
    #[error("Invalid input parameter: {0}")]
    InputError(String),

    /// Indicates that the dimensions of the operator and the input vector are
    /// incompatible for a matrix-vector product.
    #[error(
        "Dimension mismatch: operator has {operator_cols} columns but vector has {vector_rows} rows."
    )]
    DimensionMismatch {
        operator_cols: usize,
        vector_rows: usize,
    },

    /// The Lanczos process is only defined for square (symmetric) operators.
    #[error("Operator is not square: {rows} rows by {cols} columns.")]
    NonSquareOperator { rows: usize, cols: usize },

    /// Wraps an error originating from [`faer`]'s eigendecomposition module,
    /// raised when the quadrature rule cannot be extracted from T_k.
    #[error("A numerical error occurred during the eigendecomposition of T_k: {0:?}")]
    EvdError(faer::linalg::evd::EvdError),

    /// Wraps a failure to construct the sampling worker pool.
    #[error("Failed to build the sampling thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
