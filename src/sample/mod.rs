//! Sampling machinery: weighted reservoirs over chromosome positions,
//! Vitter's Algorithm D for index subsets, and alias-table samplers for
//! mutation types and inserted bases.

mod reservoir;
mod types;
mod vitter;

pub use reservoir::{ChunkReservoirSampler, LocationSampler, ReservoirSampler};
pub use types::{InsertionSampler, MutationInfo, MutationTypeSampler};
pub use vitter::{vitter_d, ALPHA, N2N_THRESHOLD};

use rand::Rng;

/// Uniform draw in `[0, 1)` with a strict upper bound: the raw 64-bit word
/// is shifted down to the 53-bit mantissa before division, so 1.0 itself can
/// never be produced.
#[inline]
pub fn uniform01<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    (rng.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
}
