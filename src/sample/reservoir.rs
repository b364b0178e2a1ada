use rand::Rng;

use crate::genome::VarChrom;
use crate::rates::MutationRates;
use crate::sample::{uniform01, vitter_d};

/// Weighted reservoir sampling (algorithm A-Res) over the positions of a
/// variant chromosome: each position gets key `u^(1/w)` and the largest key
/// wins. Zero-weight positions are skipped.
#[derive(Debug, Clone, Default)]
pub struct ReservoirSampler;

impl ReservoirSampler {
    pub fn new() -> Self {
        Self
    }

    /// Sample one position from `[start, end]` with probability proportional
    /// to `rates.rate_at`. Returns `start` if every weight is zero; callers
    /// guard on a positive total rate.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        rates: &MutationRates,
        vc: &VarChrom,
        start: usize,
        end: usize,
        rng: &mut R,
    ) -> usize {
        let mut best_key = f64::NEG_INFINITY;
        let mut best_pos = start;
        for p in start..=end {
            let w = rates.rate_at(vc, p);
            if w <= 0.0 {
                continue;
            }
            let key = uniform01(rng).powf(1.0 / w);
            if key > best_key {
                best_key = key;
                best_pos = p;
            }
        }
        best_pos
    }
}

/// Chunked weighted reservoir: for large chromosomes, first draw
/// `chunk_size` position indices without replacement (Vitter's Algorithm D),
/// then run A-Res over that subset only.
///
/// The index buffer is reused across draws; `resize` re-caps it after
/// indels so the effective chunk is `min(range, chunk_size)`.
#[derive(Debug, Clone)]
pub struct ChunkReservoirSampler {
    chunk_size: usize,
    inds: Vec<usize>,
}

impl ChunkReservoirSampler {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size,
            inds: Vec::with_capacity(chunk_size),
        }
    }

    /// Configured chunk size.
    #[inline]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Re-cap the working buffer to `min(n, chunk_size)` entries.
    pub fn resize(&mut self, n: usize) {
        let m = self.chunk_size.min(n);
        self.inds.resize(m, 0);
    }

    /// Sample one position from `[start, end]`, weighted by `rates.rate_at`,
    /// over a uniformly drawn chunk of the range.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        rates: &MutationRates,
        vc: &VarChrom,
        start: usize,
        end: usize,
        rng: &mut R,
    ) -> usize {
        let range = end - start + 1;
        if self.chunk_size == 0 || range <= self.chunk_size {
            return ReservoirSampler.sample(rates, vc, start, end, rng);
        }
        self.resize(range);
        vitter_d(&mut self.inds, range, rng);

        let mut best_key = f64::NEG_INFINITY;
        let mut best_pos = start;
        for &i in &self.inds {
            let p = start + i;
            let w = rates.rate_at(vc, p);
            if w <= 0.0 {
                continue;
            }
            let key = uniform01(rng).powf(1.0 / w);
            if key > best_key {
                best_key = key;
                best_pos = p;
            }
        }
        best_pos
    }
}

/// Location-sampling strategy for a mutation sampler: exhaustive A-Res for
/// ordinary chromosomes, chunked for large ones.
#[derive(Debug, Clone)]
pub enum LocationSampler {
    Full(ReservoirSampler),
    Chunked(ChunkReservoirSampler),
}

impl LocationSampler {
    /// Pick the strategy for a configured chunk size (0 means exhaustive).
    pub fn with_chunk(chunk_size: usize) -> Self {
        if chunk_size == 0 {
            Self::Full(ReservoirSampler)
        } else {
            Self::Chunked(ChunkReservoirSampler::new(chunk_size))
        }
    }

    /// Sample one position from `[start, end]`.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        rates: &MutationRates,
        vc: &VarChrom,
        start: usize,
        end: usize,
        rng: &mut R,
    ) -> usize {
        match self {
            Self::Full(s) => s.sample(rates, vc, start, end, rng),
            Self::Chunked(s) => s.sample(rates, vc, start, end, rng),
        }
    }

    /// Re-cap chunk buffers after an indel; a no-op for the exhaustive
    /// strategy.
    pub fn resize(&mut self, n: usize) {
        if let Self::Chunked(s) = self {
            s.resize(n);
        }
    }
}
