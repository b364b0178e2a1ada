//! Position-dependent mutation rates: piecewise-constant gamma regions over
//! variant coordinates combined with per-nucleotide base rates.

mod mutation_rates;
mod regions;

pub use mutation_rates::MutationRates;
pub use regions::{GammaRegion, RegionRates};
