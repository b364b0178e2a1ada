use serde::{Deserialize, Serialize};

/// One mutation event: a substitution, insertion, or deletion anchored at a
/// reference position with a corresponding variant position.
///
/// `size_modifier` is 0 for a substitution, `+k` for an insertion of `k`
/// bases, and `-k` for a deletion of `k` reference bases. `bases` holds the
/// replacement base for a substitution, the inserted run for an insertion,
/// and is empty for a deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mutation {
    pub size_modifier: isize,
    pub ref_pos: usize,
    pub var_pos: usize,
    pub bases: Vec<u8>,
}

impl Mutation {
    /// A single-base substitution.
    pub fn substitution(base: u8, ref_pos: usize, var_pos: usize) -> Self {
        Self {
            size_modifier: 0,
            ref_pos,
            var_pos,
            bases: vec![base],
        }
    }

    /// An insertion of `bases` occupying `[var_pos, var_pos + len - 1]` on
    /// the variant axis.
    pub fn insertion(bases: Vec<u8>, ref_pos: usize, var_pos: usize) -> Self {
        let size_modifier = bases.len() as isize;
        Self {
            size_modifier,
            ref_pos,
            var_pos,
            bases,
        }
    }

    /// A deletion of `size` reference bases starting at `ref_pos`.
    pub fn deletion(size: usize, ref_pos: usize, var_pos: usize) -> Self {
        Self {
            size_modifier: -(size as isize),
            ref_pos,
            var_pos,
            bases: Vec::new(),
        }
    }

    /// True for a substitution.
    #[inline]
    pub fn is_substitution(&self) -> bool {
        self.size_modifier == 0
    }

    /// True for an insertion.
    #[inline]
    pub fn is_insertion(&self) -> bool {
        self.size_modifier > 0
    }

    /// True for a deletion.
    #[inline]
    pub fn is_deletion(&self) -> bool {
        self.size_modifier < 0
    }

    /// Last reference position covered by this mutation. Deletions cover
    /// `[ref_pos, ref_pos + |size_modifier| - 1]`; substitutions cover their
    /// single base; insertions cover no reference base and report `ref_pos`.
    #[inline]
    pub fn end_ref_pos(&self) -> usize {
        if self.size_modifier < 0 {
            self.ref_pos + self.size_modifier.unsigned_abs() - 1
        } else {
            self.ref_pos
        }
    }

    /// Last variant position covered. Insertions span their run; deletions
    /// occupy no variant position and report `var_pos`.
    #[inline]
    pub fn end_var_pos(&self) -> usize {
        if self.size_modifier > 0 {
            self.var_pos + self.size_modifier as usize - 1
        } else {
            self.var_pos
        }
    }

    /// True if this mutation's reference span lies entirely before `other`'s.
    /// Neither this nor [`Self::is_after`] holds when the spans overlap; the
    /// pair is used to decide whether two variant chromosomes can be merged.
    pub fn is_before(&self, other: &Mutation) -> bool {
        self.end_ref_pos() < other.ref_pos
    }

    /// True if this mutation's reference span lies entirely after `other`'s.
    pub fn is_after(&self, other: &Mutation) -> bool {
        self.ref_pos > other.end_ref_pos()
    }
}
