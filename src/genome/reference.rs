use std::fmt;
use std::sync::Arc;

use rand::seq::SliceRandom;
use rand::Rng;

/// The four nucleotides in the order used by rate vectors (`q_tcag`).
pub const BASES: [u8; 4] = *b"TCAG";

/// Map a nucleotide byte to its index in [`BASES`], or 4 for anything else
/// (including `N`). Indexing by `u8` keeps the lookup branch-free.
pub const fn base_index(b: u8) -> usize {
    match b {
        b'T' => 0,
        b'C' => 1,
        b'A' => 2,
        b'G' => 3,
        _ => 4,
    }
}

/// One immutable reference chromosome (or scaffold).
///
/// Bases are ASCII over `{T,C,A,G,N}`; the FASTA loader has already
/// uppercased soft-masked runs and replaced unknown characters with `N`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefChrom {
    name: String,
    bases: Vec<u8>,
}

impl RefChrom {
    /// Create a reference chromosome from a name and raw bases.
    pub fn new(name: impl Into<String>, bases: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bases,
        }
    }

    /// Chromosome name as given in the source FASTA.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw base slice.
    #[inline]
    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// Length in bases.
    #[inline]
    pub fn size(&self) -> usize {
        self.bases.len()
    }

    /// Base at `pos`. Panics if out of bounds; reference positions are
    /// computed from variant coordinates that are validated upstream.
    #[inline]
    pub fn base(&self, pos: usize) -> u8 {
        self.bases[pos]
    }

    /// Base at `pos`, or `None` if out of bounds.
    #[inline]
    pub fn get(&self, pos: usize) -> Option<u8> {
        self.bases.get(pos).copied()
    }
}

impl fmt::Display for RefChrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bases))
    }
}

/// An ordered reference genome: named chromosomes plus a cached total size.
///
/// Chromosomes are held behind `Arc` so that variant chromosomes can share
/// read-only views without lifetime plumbing; the genome remains the logical
/// owner and must outlive no one.
#[derive(Debug, Clone, Default)]
pub struct RefGenome {
    chroms: Vec<Arc<RefChrom>>,
    total_size: usize,
    merged: bool,
    /// Original chromosome names, preserved when `merge` collapses them.
    old_names: Vec<String>,
}

impl RefGenome {
    /// Build a genome from owned chromosomes.
    pub fn new(chroms: Vec<RefChrom>) -> Self {
        let chroms: Vec<Arc<RefChrom>> = chroms.into_iter().map(Arc::new).collect();
        let total_size = chroms.iter().map(|c| c.size()).sum();
        Self {
            chroms,
            total_size,
            merged: false,
            old_names: Vec::new(),
        }
    }

    /// Build a genome from bare sequences, naming them `seq0`, `seq1`, ...
    pub fn from_seqs(seqs: Vec<Vec<u8>>) -> Self {
        let chroms = seqs
            .into_iter()
            .enumerate()
            .map(|(i, bases)| RefChrom::new(format!("seq{i}"), bases))
            .collect();
        Self::new(chroms)
    }

    /// Number of chromosomes.
    #[inline]
    pub fn len(&self) -> usize {
        self.chroms.len()
    }

    /// True if the genome holds no chromosomes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chroms.is_empty()
    }

    /// Total bases across all chromosomes.
    #[inline]
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// Whether `merge` has collapsed the chromosomes.
    #[inline]
    pub fn merged(&self) -> bool {
        self.merged
    }

    /// Names preserved from before a `merge`.
    #[inline]
    pub fn old_names(&self) -> &[String] {
        &self.old_names
    }

    /// Shared handle to the chromosome at `idx`.
    #[inline]
    pub fn chrom(&self, idx: usize) -> &Arc<RefChrom> {
        &self.chroms[idx]
    }

    /// Iterate over chromosome handles.
    pub fn chroms(&self) -> impl Iterator<Item = &Arc<RefChrom>> {
        self.chroms.iter()
    }

    /// Per-chromosome sizes, in order.
    pub fn chrom_sizes(&self) -> Vec<usize> {
        self.chroms.iter().map(|c| c.size()).collect()
    }

    /// Shuffle the chromosomes with the injected RNG, then concatenate them
    /// end-to-end into a single chromosome named `"MERGE"`, recording the
    /// original names in concatenation order.
    pub fn merge<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        if self.chroms.is_empty() {
            self.merged = true;
            return;
        }
        self.chroms.shuffle(rng);
        self.old_names = self.chroms.iter().map(|c| c.name().to_string()).collect();
        let mut bases = Vec::with_capacity(self.total_size);
        for chrom in &self.chroms {
            bases.extend_from_slice(chrom.bases());
        }
        self.chroms = vec![Arc::new(RefChrom::new("MERGE", bases))];
        self.merged = true;
    }

    /// Keep only chromosomes of at least `min_size` bases.
    pub fn filter_min_size(&mut self, min_size: usize) {
        self.chroms.retain(|c| c.size() >= min_size);
        self.total_size = self.chroms.iter().map(|c| c.size()).sum();
    }

    /// Keep the largest chromosomes until at least `prop` of the total size
    /// is retained. `prop` is clamped to `[0, 1]`.
    pub fn filter_proportion(&mut self, prop: f64) {
        let prop = prop.clamp(0.0, 1.0);
        let target = (self.total_size as f64 * prop).ceil() as usize;

        let mut order: Vec<usize> = (0..self.chroms.len()).collect();
        order.sort_by_key(|&i| std::cmp::Reverse(self.chroms[i].size()));

        let mut kept = vec![false; self.chroms.len()];
        let mut acc = 0usize;
        for i in order {
            if acc >= target {
                break;
            }
            kept[i] = true;
            acc += self.chroms[i].size();
        }

        let mut idx = 0;
        self.chroms.retain(|_| {
            let keep = kept[idx];
            idx += 1;
            keep
        });
        self.total_size = self.chroms.iter().map(|c| c.size()).sum();
    }
}
