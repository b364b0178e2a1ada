use std::collections::VecDeque;
use std::sync::Arc;

use crate::errors::{EvolveError, Result};
use crate::genome::{Mutation, RefChrom, RefGenome};

/// One variant chromosome: a reference chromosome plus an ordered, sparse
/// list of mutations, representing a single haplotype.
///
/// The mutation deque is kept sorted by `var_pos` (non-decreasing; a deletion
/// may share its position with the mutation that follows it, since deletions
/// occupy no variant position). `cur_size` always equals
/// `ref.size() + Σ size_modifier`.
#[derive(Debug, Clone)]
pub struct VarChrom {
    ref_chrom: Arc<RefChrom>,
    mutations: VecDeque<Mutation>,
    cur_size: usize,
}

impl VarChrom {
    /// Create an unmutated variant of `ref_chrom`.
    pub fn new(ref_chrom: Arc<RefChrom>) -> Self {
        let cur_size = ref_chrom.size();
        Self {
            ref_chrom,
            mutations: VecDeque::new(),
            cur_size,
        }
    }

    /// Current chromosome size in bases.
    #[inline]
    pub fn size(&self) -> usize {
        self.cur_size
    }

    /// The shared reference chromosome this variant is built on.
    #[inline]
    pub fn ref_chrom(&self) -> &Arc<RefChrom> {
        &self.ref_chrom
    }

    /// The ordered mutation list.
    #[inline]
    pub fn mutations(&self) -> &VecDeque<Mutation> {
        &self.mutations
    }

    /// Number of mutations.
    #[inline]
    pub fn mutation_count(&self) -> usize {
        self.mutations.len()
    }

    /// Index of the last mutation with `var_pos <= p`, or a sentinel equal to
    /// the mutation count if no such mutation exists.
    pub fn mut_index_at(&self, p: usize) -> usize {
        let mut lo = 0usize;
        let mut hi = self.mutations.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.mutations[mid].var_pos <= p {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        if lo == 0 {
            self.mutations.len()
        } else {
            lo - 1
        }
    }

    /// Base at variant position `p`.
    pub fn char_at(&self, p: usize) -> Result<u8> {
        if p >= self.cur_size {
            return Err(EvolveError::OutOfRange {
                pos: p,
                size: self.cur_size,
            });
        }
        Ok(self.char_at_fast(p))
    }

    /// Base at `p` without the bounds check, for hot paths where `p` is
    /// valid by construction.
    #[inline]
    pub(crate) fn char_at_fast(&self, p: usize) -> u8 {
        debug_assert!(p < self.cur_size);
        let i = self.mut_index_at(p);
        if i == self.mutations.len() {
            self.ref_chrom.base(p)
        } else {
            self.char_with(p, i)
        }
    }

    /// Base at `p` given that `mutations[mut_i]` is the last mutation with
    /// `var_pos <= p`.
    pub(crate) fn char_with(&self, p: usize, mut_i: usize) -> u8 {
        let m = &self.mutations[mut_i];
        let o = p - m.var_pos;
        if m.size_modifier == 0 {
            if o == 0 {
                m.bases[0]
            } else {
                self.ref_chrom.base(m.ref_pos + o)
            }
        } else if m.size_modifier > 0 {
            let k = m.size_modifier as usize;
            if o < k {
                m.bases[o]
            } else {
                self.ref_chrom.base(m.ref_pos + (o - k))
            }
        } else {
            self.ref_chrom.base(m.ref_pos + m.size_modifier.unsigned_abs() + o)
        }
    }

    /// Write `len` bases starting at variant position `start` into `out`,
    /// advancing `hint_mut_idx` as a forward cursor into the mutation list.
    ///
    /// The cursor is re-anchored by binary search whenever it does not point
    /// at or before `start`, so monotonically increasing scans stay O(1)
    /// amortized per base.
    pub fn substring(
        &self,
        out: &mut Vec<u8>,
        start: usize,
        len: usize,
        hint_mut_idx: &mut usize,
    ) -> Result<()> {
        out.clear();
        if len == 0 {
            return Ok(());
        }
        let end = start + len - 1;
        if end >= self.cur_size {
            return Err(EvolveError::OutOfRange {
                pos: end,
                size: self.cur_size,
            });
        }
        out.reserve(len);

        if self.mutations.is_empty() {
            out.extend_from_slice(&self.ref_chrom.bases()[start..=end]);
            return Ok(());
        }

        let nmut = self.mutations.len();
        let mut mut_i = *hint_mut_idx;
        if mut_i >= nmut || self.mutations[mut_i].var_pos > start {
            mut_i = self.mut_index_at(start);
        }

        let mut p = start;
        if mut_i == nmut {
            // Everything before the first mutation comes from the reference.
            let stop = self.mutations[0].var_pos.min(end + 1);
            out.extend_from_slice(&self.ref_chrom.bases()[p..stop]);
            p = stop;
            mut_i = 0;
        }
        while p <= end {
            while mut_i + 1 < nmut && self.mutations[mut_i + 1].var_pos <= p {
                mut_i += 1;
            }
            out.push(self.char_with(p, mut_i));
            p += 1;
        }
        *hint_mut_idx = mut_i;
        Ok(())
    }

    /// The full variant sequence.
    pub fn get_seq_full(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.cur_size);
        let mut hint = self.mutations.len();
        // Size bounds are internal, so this cannot fail.
        self.substring(&mut out, 0, self.cur_size, &mut hint)
            .expect("full-sequence bounds are internal");
        out
    }

    /// The first `len` bases (clipped to the current size).
    pub fn get_seq_start(&self, len: usize) -> Vec<u8> {
        let len = len.min(self.cur_size);
        let mut out = Vec::with_capacity(len);
        let mut hint = self.mutations.len();
        self.substring(&mut out, 0, len, &mut hint)
            .expect("clipped bounds are internal");
        out
    }

    /// Re-sync `var_pos` of all mutations at or after `from_idx` by `delta`.
    fn calc_positions(&mut self, from_idx: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        for m in self.mutations.iter_mut().skip(from_idx) {
            m.var_pos = (m.var_pos as isize + delta) as usize;
        }
    }

    /// Substitute `base` at variant position `p`.
    ///
    /// A substitution that lands on an existing substitution or inside an
    /// insertion run edits the stored bases in place; anywhere else a new
    /// mutation is added.
    pub fn apply_substitution(&mut self, base: u8, p: usize) -> Result<()> {
        if p >= self.cur_size {
            return Err(EvolveError::OutOfRange {
                pos: p,
                size: self.cur_size,
            });
        }
        let i = self.mut_index_at(p);
        if i == self.mutations.len() {
            self.mutations
                .push_front(Mutation::substitution(base, p, p));
            self.debug_check();
            return Ok(());
        }

        let m = &self.mutations[i];
        let o = p - m.var_pos;
        if m.size_modifier == 0 {
            if o == 0 {
                self.mutations[i].bases[0] = base;
            } else {
                let ref_pos = m.ref_pos + o;
                self.mutations
                    .insert(i + 1, Mutation::substitution(base, ref_pos, p));
            }
        } else if m.size_modifier > 0 {
            let k = m.size_modifier as usize;
            if o < k {
                self.mutations[i].bases[o] = base;
            } else {
                let ref_pos = m.ref_pos + (o - k);
                self.mutations
                    .insert(i + 1, Mutation::substitution(base, ref_pos, p));
            }
        } else {
            let ref_pos = m.ref_pos + m.size_modifier.unsigned_abs() + o;
            self.mutations
                .insert(i + 1, Mutation::substitution(base, ref_pos, p));
        }
        self.debug_check();
        Ok(())
    }

    /// Insert `bases` so that they occupy variant positions
    /// `[p, p + bases.len() - 1]`. `p == size()` appends at the end.
    ///
    /// An insertion landing inside (or immediately at either edge of) an
    /// existing insertion's run is spliced into that run; an insertion at an
    /// existing substitution's position stays a separate mutation.
    pub fn apply_insertion(&mut self, bases: &[u8], p: usize) -> Result<()> {
        if p > self.cur_size {
            return Err(EvolveError::OutOfRange {
                pos: p,
                size: self.cur_size,
            });
        }
        let k = bases.len();
        if k == 0 {
            return Ok(());
        }
        let delta = k as isize;
        let i = self.mut_index_at(p);

        if i == self.mutations.len() {
            // Before the first mutation (or no mutations): raw reference
            // coordinates apply.
            self.mutations
                .push_front(Mutation::insertion(bases.to_vec(), p, p));
            self.calc_positions(1, delta);
        } else {
            let m = &self.mutations[i];
            let o = p - m.var_pos;
            if m.size_modifier > 0 && o <= m.size_modifier as usize {
                // Splice into the existing run (o == 0 prepends, o == k0
                // appends).
                let mutation = &mut self.mutations[i];
                let tail = mutation.bases.split_off(o);
                mutation.bases.extend_from_slice(bases);
                mutation.bases.extend_from_slice(&tail);
                mutation.size_modifier += delta;
                self.calc_positions(i + 1, delta);
            } else {
                let (slot, ref_pos) = if m.size_modifier == 0 {
                    if o == 0 {
                        // Separate mutation ordered before the substitution,
                        // which then shifts right.
                        (i, m.ref_pos)
                    } else {
                        (i + 1, m.ref_pos + o)
                    }
                } else if m.size_modifier > 0 {
                    let k0 = m.size_modifier as usize;
                    (i + 1, m.ref_pos + (o - k0))
                } else if o == 0 {
                    // Insertion at a deletion's resume point goes before the
                    // deletion, which then shifts right.
                    (i, m.ref_pos)
                } else {
                    (i + 1, m.ref_pos + m.size_modifier.unsigned_abs() + o)
                };
                self.mutations
                    .insert(slot, Mutation::insertion(bases.to_vec(), ref_pos, p));
                self.calc_positions(slot + 1, delta);
            }
        }
        self.cur_size += k;
        self.debug_check();
        Ok(())
    }

    /// Number of variant positions a deletion of `size` at `p` would remove.
    ///
    /// The walk consumes a budget of `size` non-inserted positions; inserted
    /// characters encountered along the way are swallowed for free, and the
    /// walk clamps at the end of the chromosome. The extent can therefore
    /// exceed `size`.
    pub fn deletion_extent(&self, p: usize, size: usize) -> usize {
        let (extent, _, _) = self.deletion_walk(p, size);
        extent
    }

    /// Count the positions in `[start, end]` that carry a reference base
    /// (i.e. are not inserted characters). Bounds a ranged deletion so its
    /// extent cannot cross the range's upper end.
    pub(crate) fn ref_positions_in(&self, start: usize, end: usize) -> usize {
        if start >= self.cur_size {
            return 0;
        }
        let n = self.mutations.len();
        let mut gov = self.mut_index_at(start);
        let mut count = 0usize;
        for q in start..=end.min(self.cur_size.saturating_sub(1)) {
            if gov == n {
                if n > 0 && self.mutations[0].var_pos <= q {
                    gov = 0;
                }
            }
            if gov != n {
                while gov + 1 < n && self.mutations[gov + 1].var_pos <= q {
                    gov += 1;
                }
            }
            let inserted = gov != n && {
                let m = &self.mutations[gov];
                m.size_modifier > 0 && (q - m.var_pos) < m.size_modifier as usize
            };
            if !inserted {
                count += 1;
            }
        }
        count
    }

    /// Walk a prospective deletion: returns (variant positions removed,
    /// reference bases removed, reference position of the first removed
    /// reference base).
    fn deletion_walk(&self, p: usize, size: usize) -> (usize, usize, Option<usize>) {
        if p >= self.cur_size || size == 0 {
            return (0, 0, None);
        }
        let n = self.mutations.len();
        let mut gov = self.mut_index_at(p);
        let mut q = p;
        let mut remaining = size;
        let mut extent = 0usize;
        let mut ref_count = 0usize;
        let mut first_ref = None;

        while q < self.cur_size && remaining > 0 {
            if gov == n {
                if n > 0 && self.mutations[0].var_pos <= q {
                    gov = 0;
                }
            }
            if gov != n {
                while gov + 1 < n && self.mutations[gov + 1].var_pos <= q {
                    gov += 1;
                }
            }
            let ref_p = if gov == n {
                Some(q)
            } else {
                let m = &self.mutations[gov];
                let o = q - m.var_pos;
                if m.size_modifier > 0 && o < m.size_modifier as usize {
                    None // an inserted character, removed for free
                } else if m.size_modifier > 0 {
                    Some(m.ref_pos + (o - m.size_modifier as usize))
                } else if m.size_modifier < 0 {
                    Some(m.ref_pos + m.size_modifier.unsigned_abs() + o)
                } else {
                    Some(m.ref_pos + o)
                }
            };
            if let Some(r) = ref_p {
                ref_count += 1;
                remaining -= 1;
                if first_ref.is_none() {
                    first_ref = Some(r);
                }
            }
            extent += 1;
            q += 1;
        }
        (extent, ref_count, first_ref)
    }

    /// Delete `size` reference-bearing positions starting at variant
    /// position `p`. The deletion may legally extend past the end of the
    /// chromosome, in which case it is clipped.
    ///
    /// Covered substitutions are removed; covered insertions are swallowed
    /// (tail-truncated when the deletion starts inside their run); adjacent
    /// or covered deletions are merged into the single resulting deletion.
    pub fn apply_deletion(&mut self, size: usize, p: usize) -> Result<()> {
        if p > self.cur_size {
            return Err(EvolveError::OutOfRange {
                pos: p,
                size: self.cur_size,
            });
        }
        if size == 0 || p == self.cur_size {
            return Ok(());
        }
        let (extent, ref_count, first_ref) = self.deletion_walk(p, size);
        if extent == 0 {
            return Ok(());
        }
        let del_end = p + extent - 1;
        let mut ref_removed = ref_count;
        let mut ref_start = first_ref;

        // Truncate the tail of an insertion the deletion starts inside of.
        let gov = self.mut_index_at(p);
        if gov != self.mutations.len() {
            let m = &self.mutations[gov];
            if m.size_modifier > 0 && m.var_pos < p && p <= m.end_var_pos() {
                let keep = p - m.var_pos;
                let mutation = &mut self.mutations[gov];
                mutation.bases.truncate(keep);
                mutation.size_modifier = keep as isize;
            }
        }

        // Mutations whose var_pos falls inside the removed span are dropped;
        // deletions among them (and one adjacent after) merge their spans.
        let a = self.first_index_at_or_after(p);
        let mut b = a;
        while b < self.mutations.len() && self.mutations[b].var_pos <= del_end {
            let m = &self.mutations[b];
            if m.size_modifier < 0 {
                ref_removed += m.size_modifier.unsigned_abs();
                ref_start = Some(match ref_start {
                    Some(r) => r.min(m.ref_pos),
                    None => m.ref_pos,
                });
            }
            b += 1;
        }
        if b < self.mutations.len() {
            let m = &self.mutations[b];
            if m.size_modifier < 0 && m.var_pos == del_end + 1 {
                ref_removed += m.size_modifier.unsigned_abs();
                ref_start = Some(match ref_start {
                    Some(r) => r.min(m.ref_pos),
                    None => m.ref_pos,
                });
                b += 1;
            }
        }
        self.mutations.drain(a..b);

        if ref_removed > 0 {
            let start = ref_start.expect("a removed reference base has a position");
            self.mutations
                .insert(a, Mutation::deletion(ref_removed, start, p));
            self.calc_positions(a + 1, -(extent as isize));
        } else {
            self.calc_positions(a, -(extent as isize));
        }
        self.cur_size -= extent;
        self.debug_check();
        Ok(())
    }

    /// First mutation index with `var_pos >= p`.
    fn first_index_at_or_after(&self, p: usize) -> usize {
        let mut lo = 0usize;
        let mut hi = self.mutations.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.mutations[mid].var_pos < p {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Fold another variant of the same reference chromosome into this one.
    ///
    /// The two mutation lists must be disjoint: all of `other`'s mutations
    /// strictly before or strictly after this one's on the reference axis.
    /// Used when independently evolved subranges are stitched back together.
    pub fn merge_from(&mut self, other: &VarChrom) -> Result<()> {
        if other.mutations.is_empty() {
            return Ok(());
        }
        if self.mutations.is_empty() {
            self.mutations = other.mutations.clone();
            self.cur_size = other.cur_size;
            return Ok(());
        }

        let diff = other.cur_size as isize - self.ref_chrom.size() as isize;
        let other_first = other.mutations.front().expect("non-empty");
        let other_last = other.mutations.back().expect("non-empty");
        let self_first = self.mutations.front().expect("non-empty");
        let self_last = self.mutations.back().expect("non-empty");

        if other_last.is_before(self_first) {
            self.calc_positions(0, diff);
            for m in other.mutations.iter().rev() {
                self.mutations.push_front(m.clone());
            }
        } else if other_first.is_after(self_last) {
            let shift = self.cur_size as isize - self.ref_chrom.size() as isize;
            for m in other.mutations.iter() {
                let mut m = m.clone();
                m.var_pos = (m.var_pos as isize + shift) as usize;
                self.mutations.push_back(m);
            }
        } else {
            return Err(EvolveError::InvalidInput(
                "overlapping mutation lists; merge variants sequentially from \
                 the front or back"
                    .to_string(),
            ));
        }
        self.cur_size = (self.cur_size as isize + diff) as usize;
        self.debug_check();
        Ok(())
    }

    #[cfg(debug_assertions)]
    fn debug_check(&self) {
        let sum: isize = self.mutations.iter().map(|m| m.size_modifier).sum();
        debug_assert_eq!(
            self.cur_size as isize,
            self.ref_chrom.size() as isize + sum,
            "cur_size out of sync with size modifiers"
        );
        for w in 0..self.mutations.len().saturating_sub(1) {
            let m1 = &self.mutations[w];
            let m2 = &self.mutations[w + 1];
            debug_assert!(
                m1.var_pos < m2.var_pos || (m1.is_deletion() && m1.var_pos == m2.var_pos),
                "mutation order violated at index {w}"
            );
            debug_assert!(
                m1.end_var_pos() < m2.var_pos || m1.is_deletion(),
                "variant spans overlap at index {w}"
            );
        }
    }

    #[cfg(not(debug_assertions))]
    #[inline]
    fn debug_check(&self) {}
}

/// One named variant haploid genome: a variant chromosome per reference
/// chromosome.
#[derive(Debug, Clone)]
pub struct VarGenome {
    pub name: String,
    chroms: Vec<VarChrom>,
}

impl VarGenome {
    /// Create an unmutated variant genome over `reference`.
    pub fn new(name: impl Into<String>, reference: &RefGenome) -> Self {
        let chroms = reference
            .chroms()
            .map(|c| VarChrom::new(Arc::clone(c)))
            .collect();
        Self {
            name: name.into(),
            chroms,
        }
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

    /// The variant chromosome at `idx`.
    #[inline]
    pub fn chrom(&self, idx: usize) -> &VarChrom {
        &self.chroms[idx]
    }

    /// Mutable access to the variant chromosome at `idx`.
    #[inline]
    pub fn chrom_mut(&mut self, idx: usize) -> &mut VarChrom {
        &mut self.chroms[idx]
    }

    /// Iterate over the variant chromosomes.
    pub fn chroms(&self) -> impl Iterator<Item = &VarChrom> {
        self.chroms.iter()
    }
}

/// A reference genome together with the variant genomes evolved from it.
#[derive(Debug, Clone)]
pub struct VarSet {
    reference: RefGenome,
    variants: Vec<VarGenome>,
}

impl VarSet {
    /// Create `n_vars` unmutated variants named `var0`, `var1`, ...
    pub fn new(reference: RefGenome, n_vars: usize) -> Self {
        let variants = (0..n_vars)
            .map(|i| VarGenome::new(format!("var{i}"), &reference))
            .collect();
        Self {
            reference,
            variants,
        }
    }

    /// Create variants with the given names.
    pub fn with_names(reference: RefGenome, names: &[String]) -> Self {
        let variants = names
            .iter()
            .map(|n| VarGenome::new(n.clone(), &reference))
            .collect();
        Self {
            reference,
            variants,
        }
    }

    /// The shared reference genome.
    #[inline]
    pub fn reference(&self) -> &RefGenome {
        &self.reference
    }

    /// Number of variant genomes.
    #[inline]
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// True if the set holds no variants.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// The variant genome at `idx`.
    #[inline]
    pub fn variant(&self, idx: usize) -> &VarGenome {
        &self.variants[idx]
    }

    /// Mutable access to the variant genome at `idx`.
    #[inline]
    pub fn variant_mut(&mut self, idx: usize) -> &mut VarGenome {
        &mut self.variants[idx]
    }

    /// Iterate over the variant genomes.
    pub fn variants(&self) -> impl Iterator<Item = &VarGenome> {
        self.variants.iter()
    }

    /// Mutable iteration over the variant genomes.
    pub fn variants_mut(&mut self) -> impl Iterator<Item = &mut VarGenome> {
        self.variants.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chrom(bases: &[u8]) -> Arc<RefChrom> {
        Arc::new(RefChrom::new("chr1", bases.to_vec()))
    }

    fn seq(vc: &VarChrom) -> String {
        String::from_utf8(vc.get_seq_full()).unwrap()
    }

    #[test]
    fn test_empty_variant_matches_reference() {
        let vc = VarChrom::new(chrom(b"ACGTACGT"));
        assert_eq!(vc.size(), 8);
        assert_eq!(seq(&vc), "ACGTACGT");
        assert_eq!(vc.char_at(3).unwrap(), b'T');
        assert!(vc.char_at(8).is_err());
    }

    #[test]
    fn test_mut_index_at_sentinel() {
        let vc = VarChrom::new(chrom(b"ACGT"));
        assert_eq!(vc.mut_index_at(0), 0); // empty deque: sentinel == len == 0
    }

    #[test]
    fn test_substitutions() {
        let mut vc = VarChrom::new(chrom(b"ACGTACGT"));
        vc.apply_substitution(b'G', 0).unwrap();
        vc.apply_substitution(b'A', 3).unwrap();
        assert_eq!(seq(&vc), "GCGAACGT");
        assert_eq!(vc.size(), 8);
        assert_eq!(vc.mutation_count(), 2);
        assert!(vc.mutations().iter().all(|m| m.size_modifier == 0));
    }

    #[test]
    fn test_substitution_overwrites_in_place() {
        let mut vc = VarChrom::new(chrom(b"ACGT"));
        vc.apply_substitution(b'G', 1).unwrap();
        vc.apply_substitution(b'T', 1).unwrap();
        assert_eq!(vc.mutation_count(), 1);
        assert_eq!(seq(&vc), "ATGT");
    }

    #[test]
    fn test_insertion_shifts_positions() {
        let mut vc = VarChrom::new(chrom(b"AAAA"));
        vc.apply_insertion(b"CC", 2).unwrap();
        assert_eq!(seq(&vc), "AACCAA");
        assert_eq!(vc.size(), 6);
        let m = &vc.mutations()[0];
        assert_eq!(m.var_pos, 2);
        assert_eq!(m.size_modifier, 2);
        assert_eq!(m.bases, b"CC");
    }

    #[test]
    fn test_insertion_at_end_appends() {
        let mut vc = VarChrom::new(chrom(b"AC"));
        vc.apply_insertion(b"GT", 2).unwrap();
        assert_eq!(seq(&vc), "ACGT");
        assert!(vc.apply_insertion(b"A", 5).is_err());
    }

    #[test]
    fn test_insertion_into_existing_run_splices() {
        let mut vc = VarChrom::new(chrom(b"AAAA"));
        vc.apply_insertion(b"CC", 2).unwrap();
        vc.apply_insertion(b"GG", 3).unwrap(); // inside the CC run
        assert_eq!(vc.mutation_count(), 1);
        assert_eq!(seq(&vc), "AACGGCAA");
        assert_eq!(vc.size(), 8);
    }

    #[test]
    fn test_insertion_at_substitution_stays_separate() {
        let mut vc = VarChrom::new(chrom(b"ACGT"));
        vc.apply_substitution(b'T', 1).unwrap();
        vc.apply_insertion(b"GG", 1).unwrap();
        assert_eq!(vc.mutation_count(), 2);
        assert_eq!(seq(&vc), "AGGTGT");
        let muts = vc.mutations();
        assert!(muts[0].is_insertion());
        assert!(muts[1].is_substitution());
        assert_eq!(muts[1].var_pos, 3);
    }

    #[test]
    fn test_substitution_inside_insertion_edits_run() {
        let mut vc = VarChrom::new(chrom(b"AAAA"));
        vc.apply_insertion(b"CC", 2).unwrap();
        vc.apply_substitution(b'G', 3).unwrap();
        assert_eq!(vc.mutation_count(), 1);
        assert_eq!(seq(&vc), "AACGAA");
    }

    #[test]
    fn test_plain_deletion() {
        let mut vc = VarChrom::new(chrom(b"ACGTACGT"));
        vc.apply_deletion(3, 2).unwrap();
        assert_eq!(seq(&vc), "ACCGT");
        assert_eq!(vc.size(), 5);
        let m = &vc.mutations()[0];
        assert_eq!(m.size_modifier, -3);
        assert_eq!(m.ref_pos, 2);
        assert_eq!(m.var_pos, 2);
    }

    #[test]
    fn test_deletion_clips_at_end() {
        let mut vc = VarChrom::new(chrom(b"ACGT"));
        vc.apply_deletion(10, 2).unwrap();
        assert_eq!(seq(&vc), "AC");
        assert_eq!(vc.size(), 2);
        assert_eq!(vc.mutations()[0].size_modifier, -2);
    }

    #[test]
    fn test_deletion_blowup_swallows_sub_and_insertion() {
        let mut vc = VarChrom::new(chrom(b"ACGTACGT"));
        vc.apply_substitution(b'T', 2).unwrap();
        vc.apply_insertion(b"GG", 5).unwrap();
        assert_eq!(seq(&vc), "ACTTAGGCGT");
        vc.apply_deletion(5, 1).unwrap();
        assert_eq!(vc.size(), 3);
        assert_eq!(seq(&vc), "AGT");
        assert_eq!(vc.mutation_count(), 1);
        let m = &vc.mutations()[0];
        assert!(m.is_deletion());
        assert_eq!(m.size_modifier, -5);
    }

    #[test]
    fn test_deletion_truncates_insertion_tail() {
        let mut vc = VarChrom::new(chrom(b"ACGTACGT"));
        vc.apply_substitution(b'T', 2).unwrap();
        vc.apply_insertion(b"GG", 5).unwrap();
        // Starts inside the GG run, so only its tail goes.
        vc.apply_deletion(2, 6).unwrap();
        assert_eq!(seq(&vc), "ACTTAGT");
        assert_eq!(vc.size(), 7);
        assert_eq!(vc.mutation_count(), 3);
    }

    #[test]
    fn test_adjacent_deletions_merge() {
        let mut vc = VarChrom::new(chrom(b"ACGTACGT"));
        vc.apply_deletion(2, 3).unwrap(); // removes ref [3,4]
        assert_eq!(seq(&vc), "ACGCGT");
        vc.apply_deletion(2, 2).unwrap(); // removes ref [2] and merges forward
        assert_eq!(seq(&vc), "ACGT");
        assert_eq!(vc.mutation_count(), 1);
        let m = &vc.mutations()[0];
        assert_eq!(m.size_modifier, -4);
        assert_eq!(m.ref_pos, 2);
    }

    #[test]
    fn test_size_tracks_modifiers() {
        let mut vc = VarChrom::new(chrom(b"ACGTACGTACGT"));
        vc.apply_insertion(b"AAA", 4).unwrap();
        vc.apply_deletion(2, 9).unwrap();
        vc.apply_substitution(b'C', 0).unwrap();
        let sum: isize = vc.mutations().iter().map(|m| m.size_modifier).sum();
        assert_eq!(vc.size() as isize, 12 + sum);
    }

    #[test]
    fn test_substring_with_cursor() {
        let mut vc = VarChrom::new(chrom(b"ACGTACGT"));
        vc.apply_substitution(b'T', 2).unwrap();
        vc.apply_insertion(b"GG", 5).unwrap();
        let full = vc.get_seq_full();

        let mut hint = vc.mutation_count();
        let mut out = Vec::new();
        for start in 0..vc.size() {
            let len = (vc.size() - start).min(3);
            vc.substring(&mut out, start, len, &mut hint).unwrap();
            assert_eq!(out, &full[start..start + len], "chunk at {start}");
        }
    }

    #[test]
    fn test_char_at_agrees_with_full_sequence() {
        let mut vc = VarChrom::new(chrom(b"TCAGTCAGTCAG"));
        vc.apply_substitution(b'A', 1).unwrap();
        vc.apply_insertion(b"TT", 6).unwrap();
        vc.apply_deletion(2, 10).unwrap();
        let full = vc.get_seq_full();
        for p in 0..vc.size() {
            assert_eq!(vc.char_at(p).unwrap(), full[p], "position {p}");
        }
    }

    #[test]
    fn test_merge_from_disjoint_after() {
        let r = chrom(b"ACGTACGT");
        let mut left = VarChrom::new(Arc::clone(&r));
        left.apply_substitution(b'T', 1).unwrap();
        let mut right = VarChrom::new(Arc::clone(&r));
        right.apply_insertion(b"GG", 6).unwrap();

        let mut merged = left.clone();
        merged.merge_from(&right).unwrap();

        let mut seq_applied = VarChrom::new(r);
        seq_applied.apply_substitution(b'T', 1).unwrap();
        seq_applied.apply_insertion(b"GG", 6).unwrap();

        assert_eq!(merged.size(), seq_applied.size());
        assert_eq!(seq(&merged), seq(&seq_applied));
    }

    #[test]
    fn test_merge_from_overlap_fails() {
        let r = chrom(b"ACGTACGT");
        let mut a = VarChrom::new(Arc::clone(&r));
        a.apply_substitution(b'T', 3).unwrap();
        let mut b = VarChrom::new(r);
        b.apply_substitution(b'C', 3).unwrap();
        assert!(a.merge_from(&b).is_err());
    }

    #[test]
    fn test_var_genome_and_set() {
        let genome = RefGenome::from_seqs(vec![b"ACGT".to_vec(), b"TTTT".to_vec()]);
        let set = VarSet::new(genome, 3);
        assert_eq!(set.len(), 3);
        assert_eq!(set.variant(0).name, "var0");
        assert_eq!(set.variant(2).len(), 2);
        assert_eq!(set.variant(1).chrom(1).size(), 4);
    }
}
