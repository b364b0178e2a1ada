//! File-format collaborators: FASTA ingestion and output (plain, gzip, and
//! FAI-indexed) and conversion of haplotype records into variant mutations.

mod fasta;
mod vcf;

pub use fasta::{
    read_fai, read_fasta, read_fasta_indexed, write_fasta_genome, write_fasta_variant,
    FaiEntry,
};
pub use vcf::{apply_hap_records, HapRecord};
