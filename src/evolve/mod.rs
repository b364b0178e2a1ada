//! The evolution engine: model parameters, the per-chromosome mutation
//! sampler, and the phylogeny walker that forks variant states down a tree.

mod model;
mod phylo;
mod sampler;

pub use model::EvolutionParams;
pub use phylo::{
    evolve_var_set, match_labels, ChromEvolution, EvolveOutcome, EvolveStatus, PhyloEvolver,
    PhyloTree,
};
pub use sampler::MutationSampler;
