use crate::errors::{EvolveError, Result};
use crate::genome::VarSet;

/// One pre-parsed VCF-style record: a reference allele at a position on one
/// chromosome, plus one haplotype allele per variant in the set.
#[derive(Debug, Clone)]
pub struct HapRecord {
    pub chrom_idx: usize,
    pub ref_pos: usize,
    pub ref_bases: Vec<u8>,
    /// One allele per variant genome; equal to `ref_bases` where a variant
    /// carries the reference.
    pub haplotypes: Vec<Vec<u8>>,
}

/// Apply one haplotype allele to a variant chromosome as primitive
/// mutations.
///
/// An allele at least as long as the reference run becomes substitutions
/// over the shared prefix plus an insertion of the excess after it; a
/// shorter allele keeps its prefix and deletes the remaining reference
/// bases (the usual anchored-VCF shapes reduce to a single insertion or a
/// single deletion at `ref_pos + 1`).
///
/// Records must be applied in position order, before any other mutations,
/// so reference and variant coordinates still coincide.
fn apply_allele(
    vc: &mut crate::genome::VarChrom,
    ref_pos: usize,
    ref_bases: &[u8],
    hap: &[u8],
) -> Result<()> {
    if hap == ref_bases {
        return Ok(());
    }
    let shared = ref_bases.len().min(hap.len());
    for i in 0..shared {
        if hap[i] != ref_bases[i] {
            vc.apply_substitution(hap[i], ref_pos + i)?;
        }
    }
    if hap.len() >= ref_bases.len() {
        let excess = &hap[shared..];
        if !excess.is_empty() {
            vc.apply_insertion(excess, ref_pos + shared)?;
        }
    } else {
        vc.apply_deletion(ref_bases.len() - hap.len(), ref_pos + shared)?;
    }
    Ok(())
}

/// Materialize haplotype records into a variant set's mutation lists.
///
/// Records must be sorted by `(chrom_idx, ref_pos)` and non-overlapping;
/// deletions shift later coordinates, so each record's `ref_pos` is
/// translated by the running size change of its chromosome.
pub fn apply_hap_records(var_set: &mut VarSet, records: &[HapRecord]) -> Result<()> {
    let n_vars = var_set.len();
    let n_chroms = var_set.reference().len();
    // Per (variant, chromosome) running shift between reference and variant
    // coordinates.
    let mut shifts = vec![vec![0i64; n_chroms]; n_vars];

    let mut last_key = None;
    for rec in records {
        if rec.chrom_idx >= n_chroms {
            return Err(EvolveError::InvalidInput(format!(
                "record chromosome index {} out of range ({n_chroms} chromosomes)",
                rec.chrom_idx
            )));
        }
        if rec.haplotypes.len() != n_vars {
            return Err(EvolveError::InvalidInput(format!(
                "record at {}:{} has {} haplotypes for {n_vars} variants",
                rec.chrom_idx,
                rec.ref_pos,
                rec.haplotypes.len()
            )));
        }
        let key = (rec.chrom_idx, rec.ref_pos);
        if let Some(last) = last_key {
            if key <= last {
                return Err(EvolveError::InvalidInput(
                    "haplotype records must be sorted by chromosome and position"
                        .to_string(),
                ));
            }
        }
        last_key = Some(key);

        for (v, hap) in rec.haplotypes.iter().enumerate() {
            let shift = shifts[v][rec.chrom_idx];
            let var_pos = (rec.ref_pos as i64 + shift) as usize;
            let vc = var_set.variant_mut(v).chrom_mut(rec.chrom_idx);
            let before = vc.size() as i64;
            apply_allele(vc, var_pos, &rec.ref_bases, hap)?;
            shifts[v][rec.chrom_idx] += vc.size() as i64 - before;
        }
    }
    Ok(())
}
