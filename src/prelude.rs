//! Commonly used imports for convenience.
//!
//! # Example
//!
//! ```
//! use phylevo::prelude::*;
//!
//! let genome = RefGenome::from_seqs(vec![b"ACGTACGT".to_vec()]);
//! let set = VarSet::new(genome, 2);
//! assert_eq!(set.variant(0).chrom(0).size(), 8);
//! ```

pub use crate::errors::{EvolveError, Result};
pub use crate::evolve::{
    evolve_var_set, EvolutionParams, EvolveOutcome, EvolveStatus, MutationSampler,
    PhyloEvolver, PhyloTree,
};
pub use crate::genome::{Mutation, RefChrom, RefGenome, VarChrom, VarGenome, VarSet};
pub use crate::rates::{MutationRates, RegionRates};
pub use crate::sample::{ChunkReservoirSampler, MutationTypeSampler, ReservoirSampler};
