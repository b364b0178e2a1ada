use rand::Rng;
use rand_distr::weighted::WeightedAliasIndex;
use rand_distr::Distribution;

use crate::errors::{EvolveError, Result};
use crate::genome::{base_index, BASES};

/// Outcome of a mutation-type draw. `length == 0` means a substitution to
/// `base`; `> 0` an insertion of that many bases; `< 0` a deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationInfo {
    pub base: u8,
    pub length: isize,
}

impl MutationInfo {
    /// Decode a sampled outcome index: the first four categories are
    /// substitution targets, everything after maps through `mut_lengths`.
    fn from_index(ind: usize, mut_lengths: &[isize]) -> Self {
        if ind < 4 {
            Self {
                base: BASES[ind],
                length: 0,
            }
        } else {
            Self {
                base: 0,
                length: mut_lengths[ind],
            }
        }
    }
}

/// Samples a mutation type conditional on the starting nucleotide, using one
/// Walker alias table per base.
///
/// Each table row holds the outcome weights
/// `[sub to T, sub to C, sub to A, sub to G, ins classes..., del classes...]`
/// for that starting base; the self-substitution entry is zeroed before the
/// table is built, since mutating into itself does not count.
#[derive(Debug, Clone)]
pub struct MutationTypeSampler {
    samplers: Vec<WeightedAliasIndex<f64>>,
    mut_lengths: Vec<isize>,
}

impl MutationTypeSampler {
    /// Build from four outcome-weight rows and the shared index-to-length
    /// map (`0` four times, then insertion lengths, then negated deletion
    /// lengths).
    pub fn new(probs: &[Vec<f64>], mut_lengths: Vec<isize>) -> Result<Self> {
        if probs.len() != 4 {
            return Err(EvolveError::InvalidModel(format!(
                "need 4 outcome rows, got {}",
                probs.len()
            )));
        }
        let mut samplers = Vec::with_capacity(4);
        for (i, row) in probs.iter().enumerate() {
            if row.len() != mut_lengths.len() {
                return Err(EvolveError::InvalidModel(format!(
                    "outcome row {i} has {} entries, expected {}",
                    row.len(),
                    mut_lengths.len()
                )));
            }
            if row.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(EvolveError::InvalidModel(format!(
                    "outcome row {i} has a negative or non-finite weight"
                )));
            }
            let mut row = row.clone();
            row[i] = 0.0;
            let table = WeightedAliasIndex::new(row)
                .map_err(|e| EvolveError::InvalidModel(format!("outcome row {i}: {e}")))?;
            samplers.push(table);
        }
        Ok(Self {
            samplers,
            mut_lengths,
        })
    }

    /// Draw a mutation type given the starting base `c`.
    pub fn sample<R: Rng + ?Sized>(&self, c: u8, rng: &mut R) -> MutationInfo {
        let i = base_index(c);
        debug_assert!(i < 4, "cannot mutate from non-TCAG base {}", c as char);
        let ind = self.samplers[i].sample(rng);
        MutationInfo::from_index(ind, &self.mut_lengths)
    }
}

/// Draws inserted-base strings, one independent nucleotide per position,
/// from a supplied discrete distribution over T, C, A, G.
#[derive(Debug, Clone)]
pub struct InsertionSampler {
    table: WeightedAliasIndex<f64>,
}

impl InsertionSampler {
    /// Build from nucleotide weights ordered T, C, A, G (typically the
    /// stationary frequencies).
    pub fn new(pi_tcag: [f64; 4]) -> Result<Self> {
        if pi_tcag.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EvolveError::InvalidModel(
                "insertion frequencies must be non-negative and finite".to_string(),
            ));
        }
        let table = WeightedAliasIndex::new(pi_tcag.to_vec())
            .map_err(|e| EvolveError::InvalidModel(format!("insertion frequencies: {e}")))?;
        Ok(Self { table })
    }

    /// Fill `out` with `len` freshly drawn bases.
    pub fn fill<R: Rng + ?Sized>(&self, out: &mut Vec<u8>, len: usize, rng: &mut R) {
        out.clear();
        out.reserve(len);
        for _ in 0..len {
            out.push(BASES[self.table.sample(rng)]);
        }
    }
}
