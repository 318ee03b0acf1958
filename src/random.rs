//! Isotropic probe vector generation.
//!
//! The Monte-Carlo estimator draws random probe vectors whose distribution is
//! invariant under orthogonal transformations, so that E\[q qᵀ\] is a multiple
//! of the identity. Three standard choices are provided: Rademacher (±1
//! entries), standard normal entries, and the uniform distribution on the
//! sphere (a normalized Gaussian draw).
//!
//! ## Sub-stream scheme
//!
//! Each probe is filled from its own deterministic RNG sub-stream, derived
//! from the master seed and the probe index by a SplitMix64-style mixing
//! constant. Probe `i` therefore receives the same entries no matter which
//! worker thread picks it up, how many workers exist, or how the dynamic
//! scheduler interleaves chunks. Two runs with the same seed produce
//! bit-identical probes.

use faer::MatMut;
use faer::prelude::{Reborrow, ReborrowMut};
use faer::traits::RealField;
use num_traits::Float;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};

/// The isotropic distributions the probe generator can sample from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Isotropic {
    /// Each entry is ±1 with equal probability.
    #[default]
    Rademacher,
    /// Each entry is an independent standard normal sample.
    Normal,
    /// A standard normal draw rescaled to unit Euclidean norm.
    Sphere,
}

/// Weyl-sequence increment of SplitMix64; spreads consecutive probe indices
/// far apart in seed space before `StdRng` expands them.
const SUBSTREAM_GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;

/// Returns the RNG sub-stream for one probe.
///
/// The stream depends only on `(seed, index)`, which is what makes the
/// sampling driver's output independent of thread scheduling.
#[inline]
pub fn probe_substream(seed: u64, index: u64) -> StdRng {
    StdRng::seed_from_u64(seed ^ index.wrapping_add(1).wrapping_mul(SUBSTREAM_GAMMA))
}

/// Fills a column vector with samples from the chosen isotropic distribution.
///
/// For [`Isotropic::Sphere`], a zero-norm Gaussian draw (possible only in
/// exotic floating-point corner cases) is left unnormalized rather than
/// dividing by zero.
pub fn fill_isotropic<T, R>(rng: &mut R, dist: Isotropic, out: MatMut<'_, T>)
where
    T: RealField + Float,
    R: Rng + ?Sized,
    StandardNormal: Distribution<T>,
{
    let mut out = out;
    let n = out.nrows();
    debug_assert_eq!(out.ncols(), 1);

    match dist {
        Isotropic::Rademacher => {
            for i in 0..n {
                out.rb_mut()[(i, 0)] = if rng.random::<bool>() {
                    T::one()
                } else {
                    -T::one()
                };
            }
        }
        Isotropic::Normal => {
            for i in 0..n {
                out.rb_mut()[(i, 0)] = rng.sample(StandardNormal);
            }
        }
        Isotropic::Sphere => {
            for i in 0..n {
                out.rb_mut()[(i, 0)] = rng.sample(StandardNormal);
            }
            let norm = out.rb().norm_l2();
            if norm > T::zero() {
                let inv = norm.recip();
                for i in 0..n {
                    let v = out.rb()[(i, 0)];
                    out.rb_mut()[(i, 0)] = v * inv;
                }
            }
        }
    }
}
