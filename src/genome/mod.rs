//! Genome representations: immutable reference chromosomes and the sparse,
//! mutation-list variant chromosomes evolved from them.

mod mutation;
mod reference;
mod variant;

pub use mutation::Mutation;
pub use reference::{base_index, RefChrom, RefGenome, BASES};
pub use variant::{VarChrom, VarGenome, VarSet};
