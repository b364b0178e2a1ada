use rand::Rng;

use crate::errors::Result;
use crate::evolve::EvolutionParams;
use crate::genome::VarChrom;
use crate::rates::{MutationRates, RegionRates};
use crate::sample::{InsertionSampler, LocationSampler, MutationTypeSampler};

/// Draws one mutation at a time and applies it to a variant chromosome:
/// position via the weighted reservoir, type via the alias tables, inserted
/// bases via the nucleotide sampler. Each draw returns the resulting change
/// in the chromosome's total mutation rate so callers can maintain it
/// incrementally.
#[derive(Debug, Clone)]
pub struct MutationSampler {
    pub rates: MutationRates,
    location: LocationSampler,
    types: MutationTypeSampler,
    insert: InsertionSampler,
    ins_buf: Vec<u8>,
}

impl MutationSampler {
    pub fn new(
        rates: MutationRates,
        location: LocationSampler,
        types: MutationTypeSampler,
        insert: InsertionSampler,
    ) -> Self {
        Self {
            rates,
            location,
            types,
            insert,
            ins_buf: Vec::new(),
        }
    }

    /// Build the full sampler stack from model parameters and a gamma
    /// matrix (rows of `(end, gamma)`, last end equal to `chrom_size`).
    pub fn from_params(
        params: &EvolutionParams,
        gamma_rows: &[(usize, f64)],
        chrom_size: usize,
    ) -> Result<Self> {
        params.validate()?;
        let regions = RegionRates::from_rows(gamma_rows, chrom_size)?;
        let rates = MutationRates::new(params.q_tcag(), regions)?;
        let (probs, mut_lengths) = params.probs_and_lengths();
        let types = MutationTypeSampler::new(&probs, mut_lengths)?;
        let insert = InsertionSampler::new(params.pi_tcag)?;
        Ok(Self::new(
            rates,
            LocationSampler::with_chunk(params.chunk_size),
            types,
            insert,
        ))
    }

    /// Total mutation rate of `vc`, or of `[start, end]` when `ranged`.
    pub fn total_rate(&self, vc: &VarChrom, start: usize, end: usize, ranged: bool) -> f64 {
        self.rates.total_rate(vc, start, end, ranged)
    }

    /// Swap this sampler's gamma-region state with `regions`. Region
    /// boundaries track each variant chromosome's coordinates, so the tree
    /// evolver keeps one region partition per node and swaps it in around
    /// every branch.
    pub fn swap_regions(&mut self, regions: &mut RegionRates) {
        std::mem::swap(&mut self.rates.regions, regions);
    }

    /// Draw and apply one mutation anywhere on the chromosome; returns the
    /// change in total rate.
    pub fn mutate<R: Rng + ?Sized>(&mut self, vc: &mut VarChrom, rng: &mut R) -> f64 {
        debug_assert!(vc.size() > 0, "cannot mutate an empty chromosome");
        let end = vc.size() - 1;
        let pos = self.location.sample(&self.rates, vc, 0, end, rng);
        let c = vc.char_at_fast(pos);
        let m = self.types.sample(c, rng);

        if m.length == 0 {
            let delta = self.rates.sub_delta(vc, pos, m.base);
            vc.apply_substitution(m.base, pos)
                .expect("sampled position is in range");
            delta
        } else if m.length > 0 {
            let len = m.length as usize;
            InsertionSampler::fill(&self.insert, &mut self.ins_buf, len, rng);
            let delta = self.rates.ins_delta(pos, &self.ins_buf);
            vc.apply_insertion(&self.ins_buf, pos)
                .expect("sampled position is in range");
            self.rates.regions.update(pos, m.length);
            self.location.resize(vc.size());
            delta
        } else {
            // Clamp so the deletion cannot pass the end of the chromosome,
            // then measure its true extent (it may swallow insertions).
            let del_size = m.length.unsigned_abs().min(vc.size() - pos);
            let extent = vc.deletion_extent(pos, del_size);
            let delta = self.rates.del_delta(vc, pos, extent);
            vc.apply_deletion(del_size, pos)
                .expect("sampled position is in range");
            self.rates.regions.update(pos, -(extent as isize));
            self.location.resize(vc.size());
            delta
        }
    }

    /// Ranged variant: sample only in `[start, end]` and keep `end` in sync
    /// across indels. When `end` drops below `start` the subrange is empty
    /// and the caller must stop.
    pub fn mutate_in_range<R: Rng + ?Sized>(
        &mut self,
        vc: &mut VarChrom,
        rng: &mut R,
        start: usize,
        end: &mut i64,
    ) -> f64 {
        debug_assert!(*end >= start as i64, "empty subrange");
        let pos = self
            .location
            .sample(&self.rates, vc, start, *end as usize, rng);
        let c = vc.char_at_fast(pos);
        let m = self.types.sample(c, rng);

        if m.length == 0 {
            let delta = self.rates.sub_delta(vc, pos, m.base);
            vc.apply_substitution(m.base, pos)
                .expect("sampled position is in range");
            delta
        } else if m.length > 0 {
            let len = m.length as usize;
            InsertionSampler::fill(&self.insert, &mut self.ins_buf, len, rng);
            let delta = self.rates.ins_delta(pos, &self.ins_buf);
            vc.apply_insertion(&self.ins_buf, pos)
                .expect("sampled position is in range");
            self.rates.regions.update(pos, m.length);
            self.location.resize(vc.size());
            *end += m.length as i64;
            delta
        } else {
            // Deletions may not cross the subrange's upper bound: cap the
            // budget at the reference-bearing positions left in range, so
            // the extent (which swallows inserted runs for free) stops at
            // `end`.
            let cap = vc.ref_positions_in(pos, *end as usize);
            let del_size = m.length.unsigned_abs().min(cap);
            if del_size == 0 {
                return 0.0;
            }
            let extent = vc.deletion_extent(pos, del_size);
            let delta = self.rates.del_delta(vc, pos, extent);
            vc.apply_deletion(del_size, pos)
                .expect("sampled position is in range");
            self.rates.regions.update(pos, -(extent as isize));
            self.location.resize(vc.size());
            *end -= extent as i64;
            delta
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::RefChrom;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;
    use std::sync::Arc;

    fn params() -> EvolutionParams {
        EvolutionParams {
            pi_tcag: [0.25; 4],
            alpha_1: 1.0,
            alpha_2: 1.0,
            beta: 1.0,
            xi: 0.3,
            psi: 1.0,
            rel_insertion_rates: vec![1.0, 1.0],
            rel_deletion_rates: vec![1.0, 1.0],
            chunk_size: 0,
        }
    }

    fn setup(bases: &[u8]) -> (VarChrom, MutationSampler) {
        let vc = VarChrom::new(Arc::new(RefChrom::new("chr1", bases.to_vec())));
        let sampler =
            MutationSampler::from_params(&params(), &[(bases.len(), 1.0)], bases.len())
                .unwrap();
        (vc, sampler)
    }

    #[test]
    fn test_rate_delta_bookkeeping_over_many_draws() {
        let bases: Vec<u8> = (0..200).map(|i| b"TCAG"[i % 4]).collect();
        let (mut vc, mut sampler) = setup(&bases);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);

        let mut rate = sampler.total_rate(&vc, 0, 0, false);
        for step in 0..300 {
            if vc.size() == 0 {
                break;
            }
            rate += sampler.mutate(&mut vc, &mut rng);
            let actual = sampler.total_rate(&vc, 0, 0, false);
            let denom = actual.abs().max(1.0);
            assert!(
                ((rate - actual) / denom).abs() < 1e-9,
                "rate drift at step {step}: tracked {rate}, actual {actual}"
            );
        }
    }

    #[test]
    fn test_regions_track_size() {
        let bases: Vec<u8> = (0..100).map(|i| b"TCAG"[i % 4]).collect();
        let (mut vc, mut sampler) = setup(&bases);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        for _ in 0..200 {
            if vc.size() == 0 {
                break;
            }
            sampler.mutate(&mut vc, &mut rng);
            if vc.size() > 0 {
                assert_eq!(sampler.rates.regions.end(), vc.size() - 1);
            }
        }
    }

    #[test]
    fn test_mutate_in_range_respects_bounds() {
        let bases: Vec<u8> = (0..120).map(|i| b"TCAG"[i % 4]).collect();
        let (mut vc, mut sampler) = setup(&bases);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(11);

        let start = 40usize;
        let mut end: i64 = 79;
        let before_prefix = vc.get_seq_start(start);
        for _ in 0..100 {
            if end < start as i64 || vc.size() == 0 {
                break;
            }
            sampler.mutate_in_range(&mut vc, &mut rng, start, &mut end);
        }
        // Nothing before the subrange may change.
        assert_eq!(vc.get_seq_start(start), before_prefix);
        // The tracked end stays consistent with the size changes.
        let net: i64 = vc.size() as i64 - bases.len() as i64;
        assert_eq!(end, 79 + net);
    }

    #[test]
    fn test_substitution_only_model_keeps_size() {
        let bases: Vec<u8> = (0..80).map(|i| b"TCAG"[i % 4]).collect();
        let vc_params = EvolutionParams::tn93([0.25; 4], 1.0, 1.0, 1.0);
        let mut sampler =
            MutationSampler::from_params(&vc_params, &[(80, 1.0)], 80).unwrap();
        let mut vc = VarChrom::new(Arc::new(RefChrom::new("chr1", bases)));
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(3);
        for _ in 0..100 {
            sampler.mutate(&mut vc, &mut rng);
        }
        assert_eq!(vc.size(), 80);
        assert!(vc.mutations().iter().all(|m| m.size_modifier == 0));
    }
}
