//! # Stochastic Lanczos Quadrature Library

//! A library for estimating spectral sums tr(f(A)) of large symmetric linear
//! operators via stochastic Lanczos quadrature. This crate provides the core
//! algorithms (Lanczos tridiagonalization with a rolling basis window, Gaussian
//! quadrature extraction) and the parallel Monte-Carlo sampling driver.

// Declare the modules that form the public API of the crate.
pub mod algorithms;
pub mod error;
pub mod factor;
pub mod operator;
pub mod random;
pub mod slq;

// Re-export key types to the top level of the crate for easier access.
pub use error::SlqError;
pub use factor::{LanczosFactorization, lanczos_tridiag};
pub use operator::LinearOperator;
pub use random::Isotropic;
pub use slq::{SlqParams, slq};
