use crate::errors::{EvolveError, Result};
use crate::genome::{VarChrom, BASES};
use crate::rates::RegionRates;

/// Per-site mutation rates: a per-nucleotide base rate combined with the
/// gamma-region multipliers.
///
/// The base rates live in a 256-slot table indexed by the raw byte, with
/// everything outside `TCAG` (notably `N`) fixed at zero so those positions
/// are never chosen. The variant chromosome is passed in at query time
/// rather than stored, so rate state forks with the per-node region state
/// and nothing holds a back-reference.
#[derive(Debug, Clone)]
pub struct MutationRates {
    nt_rates: [f64; 256],
    pub regions: RegionRates,
}

impl MutationRates {
    /// Build from per-base total rates `q_tcag` (ordered T, C, A, G) and a
    /// gamma partition.
    pub fn new(q_tcag: [f64; 4], regions: RegionRates) -> Result<Self> {
        for (i, &q) in q_tcag.iter().enumerate() {
            if !q.is_finite() || q < 0.0 {
                return Err(EvolveError::InvalidModel(format!(
                    "rate {q} for base {} is negative or non-finite",
                    BASES[i] as char
                )));
            }
        }
        let mut nt_rates = [0.0f64; 256];
        for (i, &b) in BASES.iter().enumerate() {
            nt_rates[b as usize] = q_tcag[i];
        }
        Ok(Self { nt_rates, regions })
    }

    /// Base rate for a single nucleotide byte (no gamma).
    #[inline]
    pub fn nt_rate(&self, b: u8) -> f64 {
        self.nt_rates[b as usize]
    }

    /// Summed base rate for a run of nucleotides (no gamma).
    pub fn raw_rate(&self, seq: &[u8]) -> f64 {
        seq.iter().map(|&b| self.nt_rates[b as usize]).sum()
    }

    /// Overall mutation rate at variant position `p`.
    #[inline]
    pub fn rate_at(&self, vc: &VarChrom, p: usize) -> f64 {
        self.nt_rates[vc.char_at_fast(p) as usize] * self.regions.gamma_at(p)
    }

    /// Change in total rate from substituting `new_base` at `p`.
    pub fn sub_delta(&self, vc: &VarChrom, p: usize, new_base: u8) -> f64 {
        let old = self.nt_rates[vc.char_at_fast(p) as usize];
        let new = self.nt_rates[new_base as usize];
        self.regions.gamma_at(p) * (new - old)
    }

    /// Change in total rate from inserting `bases` at `p`.
    pub fn ins_delta(&self, p: usize, bases: &[u8]) -> f64 {
        self.regions.gamma_at(p) * self.raw_rate(bases)
    }

    /// Change in total rate from deleting `size` variant positions at `p`
    /// (always non-positive).
    pub fn del_delta(&self, vc: &VarChrom, p: usize, size: usize) -> f64 {
        if size == 0 {
            return 0.0;
        }
        -self.range_rate(vc, p, p + size - 1)
    }

    /// Summed rate over variant positions `[start, end]`, gamma included.
    pub fn range_rate(&self, vc: &VarChrom, start: usize, end: usize) -> f64 {
        let len = end - start + 1;
        let mut seq = Vec::with_capacity(len);
        let mut hint = vc.mutation_count();
        vc.substring(&mut seq, start, len, &mut hint)
            .expect("range is within the chromosome");
        let weights = self.regions.range_weights(start, end);
        debug_assert_eq!(seq.len(), weights.len());
        seq.iter()
            .zip(weights.iter())
            .map(|(&b, &w)| self.nt_rates[b as usize] * w)
            .sum()
    }

    /// Total mutation rate of the chromosome, or of `[start, end]` when
    /// `ranged` is set.
    ///
    /// With no mutations the reference is walked directly, accumulating per
    /// region; otherwise the walk threads a mutation cursor and a gamma
    /// cursor forward together.
    pub fn total_rate(&self, vc: &VarChrom, start: usize, end: usize, ranged: bool) -> f64 {
        if vc.size() == 0 {
            return 0.0;
        }
        let (start, end) = if ranged { (start, end) } else { (0, vc.size() - 1) };
        if end < start {
            return 0.0;
        }
        debug_assert_eq!(
            self.regions.end(),
            vc.size() - 1,
            "gamma partition out of sync with chromosome size"
        );

        let muts = vc.mutations();
        if muts.is_empty() {
            let bases = vc.ref_chrom().bases();
            let regions = self.regions.regions();
            let mut out = 0.0;
            let mut i = start;
            let mut gam_i = self.regions.region_index(start);
            while i <= end {
                let region = &regions[gam_i];
                let mut tmp = 0.0;
                while i <= region.end && i <= end {
                    tmp += self.nt_rates[bases[i] as usize];
                    i += 1;
                }
                out += tmp * region.gamma;
                gam_i += 1;
            }
            return out;
        }

        let n = muts.len();
        let regions = self.regions.regions();
        let mut gam_i = self.regions.region_index(start);
        let mut out = 0.0;
        let mut mut_i = vc.mut_index_at(start);
        for pos in start..=end {
            if pos > regions[gam_i].end {
                gam_i += 1;
            }
            if mut_i == n && muts[0].var_pos <= pos {
                mut_i = 0;
            }
            if mut_i != n {
                while mut_i + 1 < n && muts[mut_i + 1].var_pos <= pos {
                    mut_i += 1;
                }
            }
            let b = if mut_i == n {
                vc.ref_chrom().base(pos)
            } else {
                vc.char_with(pos, mut_i)
            };
            out += self.nt_rates[b as usize] * regions[gam_i].gamma;
        }
        out
    }
}
