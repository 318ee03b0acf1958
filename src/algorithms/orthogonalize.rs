//! Modified Gram-Schmidt re-orthogonalization against the rolling basis
//! window.
//!
//! Without corrective measures, the three-term Lanczos recurrence loses
//! orthogonality among its basis vectors once Ritz pairs begin to converge.
//! Re-projecting the newest vector against a bounded window of its
//! predecessors curbs this loss at a cost of O(depth * n) per step, a
//! tunable middle ground between the raw recurrence and full
//! re-orthogonalization against all prior vectors.

use faer::prelude::{Reborrow, ReborrowMut};
use faer::traits::RealField;
use faer::{ColMut, MatRef, unzip, zip};
use num_traits::Float;

/// Removes from `v` its components along the `depth` most recently produced
/// basis columns, walking the rolling window backwards from the column before
/// `current`.
///
/// Column `current` itself is excluded: it is the vector whose projection the
/// recurrence has just subtracted. The window wraps modulo the buffer width,
/// with positive-remainder semantics. When `twice` is set the sweep runs a
/// second time, the classical "twice is enough" remedy for the cancellation
/// a single modified Gram-Schmidt pass leaves behind.
///
/// Callers must ensure the `depth` columns behind `current` actually hold
/// basis vectors; the recurrence guarantees this by clamping `depth` to the
/// number of steps taken so far. No allocations are performed.
pub fn orth_vector<T: RealField + Float>(
    v: ColMut<'_, T>,
    basis: MatRef<'_, T>,
    current: usize,
    depth: usize,
    twice: bool,
) {
    let mut v = v;
    let ncv = basis.ncols();
    debug_assert!(current < ncv);
    debug_assert!(depth < ncv);
    debug_assert_eq!(basis.nrows(), v.nrows());

    let passes = if twice { 2 } else { 1 };
    for _ in 0..passes {
        // Reverse-chronological: the column written most recently first.
        for i in 1..=depth {
            let col = (current + ncv - i) % ncv;
            let u = basis.col(col);
            let r = u.transpose() * v.rb();
            zip!(v.rb_mut(), u).for_each(|unzip!(y, x)| *y = *y - r * *x);
        }
    }
}
