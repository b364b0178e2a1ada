use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;

use crate::errors::{EvolveError, Result};
use crate::genome::{RefChrom, RefGenome, VarGenome};

/// Read granularity for FAI-indexed slices.
const INDEXED_CHUNK: usize = 4 << 20; // 4 MiB

/// Normalize a raw FASTA byte: uppercase (stripping soft masking) and map
/// anything outside `TCAGN` to `N`.
#[inline]
fn normalize(b: u8) -> u8 {
    match b.to_ascii_uppercase() {
        c @ (b'T' | b'C' | b'A' | b'G' | b'N') => c,
        _ => b'N',
    }
}

fn is_gzip(path: &Path) -> bool {
    path.extension().is_some_and(|e| e == "gz")
}

fn open_reader(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| EvolveError::io(path, e))?;
    if is_gzip(path) {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Read a line-wrapped FASTA file (plain or gzip, by extension) into a
/// reference genome. With `cut_names`, headers are cut at the first
/// whitespace.
pub fn read_fasta(path: impl AsRef<Path>, cut_names: bool) -> Result<RefGenome> {
    let path = path.as_ref();
    let reader = open_reader(path)?;

    let mut chroms: Vec<RefChrom> = Vec::new();
    let mut name: Option<String> = None;
    let mut bases: Vec<u8> = Vec::new();

    for line in reader.lines() {
        let line = line.map_err(|e| EvolveError::io(path, e))?;
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if let Some(header) = line.strip_prefix('>') {
            if let Some(prev) = name.take() {
                chroms.push(RefChrom::new(prev, std::mem::take(&mut bases)));
            }
            let header = header.trim();
            let cut = if cut_names {
                header.split_whitespace().next().unwrap_or(header)
            } else {
                header
            };
            name = Some(cut.to_string());
        } else {
            if name.is_none() {
                return Err(EvolveError::parse(
                    path,
                    "sequence data before the first '>' header",
                ));
            }
            bases.extend(line.bytes().map(normalize));
        }
    }
    if let Some(prev) = name {
        chroms.push(RefChrom::new(prev, bases));
    }
    if chroms.is_empty() {
        return Err(EvolveError::parse(path, "no sequences found"));
    }
    Ok(RefGenome::new(chroms))
}

/// One `.fai` index entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaiEntry {
    pub name: String,
    pub length: usize,
    pub offset: u64,
    pub line_bases: usize,
    pub line_width: usize,
}

/// Parse a `.fai` index file.
pub fn read_fai(path: impl AsRef<Path>) -> Result<Vec<FaiEntry>> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| EvolveError::io(path, e))?;
    let mut entries = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| EvolveError::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 5 {
            return Err(EvolveError::parse(
                path,
                format!("line {}: expected 5 tab-separated fields", lineno + 1),
            ));
        }
        let parse = |s: &str, what: &str| -> Result<usize> {
            s.parse().map_err(|_| {
                EvolveError::parse(path, format!("line {}: bad {what} '{s}'", lineno + 1))
            })
        };
        entries.push(FaiEntry {
            name: fields[0].to_string(),
            length: parse(fields[1], "length")?,
            offset: parse(fields[2], "offset")? as u64,
            line_bases: parse(fields[3], "line bases")?,
            line_width: parse(fields[4], "line width")?,
        });
    }
    if entries.is_empty() {
        return Err(EvolveError::parse(path, "empty index"));
    }
    Ok(entries)
}

/// Random-access read of an uncompressed FASTA through its `.fai` index.
///
/// Each chromosome's on-disk slice spans `length + length / line_bases + 1`
/// bytes (sequence plus one newline per wrapped line); reads are chunked at
/// 4 MiB and newlines are stripped on the fly.
pub fn read_fasta_indexed(
    fasta_path: impl AsRef<Path>,
    fai_path: impl AsRef<Path>,
) -> Result<RefGenome> {
    let fasta_path = fasta_path.as_ref();
    let entries = read_fai(fai_path)?;
    let mut file = File::open(fasta_path).map_err(|e| EvolveError::io(fasta_path, e))?;

    let mut chroms = Vec::with_capacity(entries.len());
    for entry in entries {
        if entry.line_bases == 0 {
            return Err(EvolveError::parse(
                fasta_path,
                format!("index entry '{}' has zero line length", entry.name),
            ));
        }
        file.seek(SeekFrom::Start(entry.offset))
            .map_err(|e| EvolveError::io(fasta_path, e))?;

        let mut to_read = entry.length + entry.length / entry.line_bases + 1;
        let mut bases = Vec::with_capacity(entry.length);
        let mut buf = vec![0u8; INDEXED_CHUNK.min(to_read)];
        while to_read > 0 && bases.len() < entry.length {
            let want = INDEXED_CHUNK.min(to_read);
            let got = file
                .read(&mut buf[..want])
                .map_err(|e| EvolveError::io(fasta_path, e))?;
            if got == 0 {
                break;
            }
            for &b in &buf[..got] {
                if b != b'\n' && b != b'\r' {
                    bases.push(normalize(b));
                }
            }
            to_read -= got;
        }
        bases.truncate(entry.length);
        if bases.len() != entry.length {
            return Err(EvolveError::parse(
                fasta_path,
                format!(
                    "'{}': read {} bases, index claims {}",
                    entry.name,
                    bases.len(),
                    entry.length
                ),
            ));
        }
        chroms.push(RefChrom::new(entry.name, bases));
    }
    Ok(RefGenome::new(chroms))
}

fn open_writer(path: &Path, gzip: bool) -> Result<Box<dyn Write>> {
    let file = File::create(path).map_err(|e| EvolveError::io(path, e))?;
    if gzip {
        Ok(Box::new(BufWriter::new(GzEncoder::new(
            file,
            Compression::default(),
        ))))
    } else {
        Ok(Box::new(BufWriter::new(file)))
    }
}

fn write_wrapped(
    out: &mut dyn Write,
    path: &Path,
    name: &str,
    bases: &[u8],
    width: usize,
) -> Result<()> {
    let width = width.max(1);
    writeln!(out, ">{name}").map_err(|e| EvolveError::io(path, e))?;
    for chunk in bases.chunks(width) {
        out.write_all(chunk).map_err(|e| EvolveError::io(path, e))?;
        out.write_all(b"\n").map_err(|e| EvolveError::io(path, e))?;
    }
    Ok(())
}

/// Write a reference genome as FASTA wrapped at `width`, gzip-compressed if
/// requested.
pub fn write_fasta_genome(
    genome: &RefGenome,
    path: impl AsRef<Path>,
    width: usize,
    gzip: bool,
) -> Result<()> {
    let path = path.as_ref();
    let mut out = open_writer(path, gzip)?;
    for chrom in genome.chroms() {
        write_wrapped(&mut *out, path, chrom.name(), chrom.bases(), width)?;
    }
    out.flush().map_err(|e| EvolveError::io(path, e))
}

/// Write one variant genome as FASTA, materializing each chromosome's full
/// sequence.
pub fn write_fasta_variant(
    variant: &VarGenome,
    path: impl AsRef<Path>,
    width: usize,
    gzip: bool,
) -> Result<()> {
    let path = path.as_ref();
    let mut out = open_writer(path, gzip)?;
    for vc in variant.chroms() {
        let bases = vc.get_seq_full();
        write_wrapped(&mut *out, path, vc.ref_chrom().name(), &bases, width)?;
    }
    out.flush().map_err(|e| EvolveError::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genome::VarSet;
    use std::io::Write as _;

    #[test]
    fn test_read_fasta_basic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.fa");
        let mut f = File::create(&path).unwrap();
        writeln!(f, ">chr1 some description").unwrap();
        writeln!(f, "ACGTac").unwrap();
        writeln!(f, "gtNN").unwrap();
        writeln!(f, ">chr2").unwrap();
        writeln!(f, "TTTT").unwrap();
        drop(f);

        let genome = read_fasta(&path, true).unwrap();
        assert_eq!(genome.len(), 2);
        assert_eq!(genome.chrom(0).name(), "chr1");
        assert_eq!(genome.chrom(0).bases(), b"ACGTACGTNN");
        assert_eq!(genome.chrom(1).bases(), b"TTTT");

        let uncut = read_fasta(&path, false).unwrap();
        assert_eq!(uncut.chrom(0).name(), "chr1 some description");
    }

    #[test]
    fn test_read_fasta_normalizes_unknown_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ref.fa");
        let mut f = File::create(&path).unwrap();
        writeln!(f, ">c").unwrap();
        writeln!(f, "AXRG").unwrap();
        drop(f);
        let genome = read_fasta(&path, true).unwrap();
        assert_eq!(genome.chrom(0).bases(), b"ANNG");
    }

    #[test]
    fn test_read_fasta_rejects_headerless_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.fa");
        std::fs::write(&path, "ACGT\n").unwrap();
        assert!(read_fasta(&path, true).is_err());
    }

    #[test]
    fn test_fasta_roundtrip_plain_and_gzip() {
        let dir = tempfile::tempdir().unwrap();
        let genome = RefGenome::new(vec![
            RefChrom::new("chr1", b"ACGTACGTACGT".to_vec()),
            RefChrom::new("chr2", b"TTTTT".to_vec()),
        ]);

        let plain = dir.path().join("out.fa");
        write_fasta_genome(&genome, &plain, 5, false).unwrap();
        let back = read_fasta(&plain, true).unwrap();
        assert_eq!(back.chrom(0).bases(), genome.chrom(0).bases());
        assert_eq!(back.chrom(1).bases(), genome.chrom(1).bases());

        let gz = dir.path().join("out.fa.gz");
        write_fasta_genome(&genome, &gz, 5, true).unwrap();
        let back = read_fasta(&gz, true).unwrap();
        assert_eq!(back.chrom(0).bases(), genome.chrom(0).bases());
    }

    #[test]
    fn test_indexed_read_matches_plain() {
        let dir = tempfile::tempdir().unwrap();
        let fasta = dir.path().join("ref.fa");
        // 10-base lines, 11-byte rows.
        let chr1: String = "ACGTACGTAC".repeat(3);
        let chr2 = "TTTTCCCC".to_string();
        let mut f = File::create(&fasta).unwrap();
        write!(f, ">chr1\n").unwrap();
        for line in chr1.as_bytes().chunks(10) {
            f.write_all(line).unwrap();
            f.write_all(b"\n").unwrap();
        }
        write!(f, ">chr2\n{chr2}\n").unwrap();
        drop(f);

        let fai = dir.path().join("ref.fa.fai");
        // name, length, offset, line_bases, line_width
        let chr1_offset = 6; // after ">chr1\n"
        let chr2_offset = chr1_offset + 30 + 3 + 6; // 3 wrapped lines + ">chr2\n"
        std::fs::write(
            &fai,
            format!("chr1\t30\t{chr1_offset}\t10\t11\nchr2\t8\t{chr2_offset}\t8\t9\n"),
        )
        .unwrap();

        let genome = read_fasta_indexed(&fasta, &fai).unwrap();
        assert_eq!(genome.len(), 2);
        assert_eq!(genome.chrom(0).bases(), chr1.as_bytes());
        assert_eq!(genome.chrom(1).bases(), chr2.as_bytes());
    }

    #[test]
    fn test_write_variant_fasta() {
        let dir = tempfile::tempdir().unwrap();
        let genome = RefGenome::new(vec![RefChrom::new("chr1", b"ACGTACGT".to_vec())]);
        let mut set = VarSet::new(genome, 1);
        set.variant_mut(0)
            .chrom_mut(0)
            .apply_substitution(b'G', 0)
            .unwrap();

        let path = dir.path().join("var.fa");
        write_fasta_variant(set.variant(0), &path, 80, false).unwrap();
        let back = read_fasta(&path, true).unwrap();
        assert_eq!(back.chrom(0).bases(), b"GCGTACGT");
    }
}
