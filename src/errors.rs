use std::path::PathBuf;
use thiserror::Error;

/// Error type for constructing and running sequence-evolution machinery.
///
/// Constructors validate their inputs eagerly and fail with one of the
/// `Invalid*` variants; the per-mutation hot path never allocates errors.
#[derive(Debug, Error)]
pub enum EvolveError {
    /// Generic misuse of an operation (e.g. merging overlapping variants).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Model parameters are negative, non-finite, or inconsistent.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// A gamma-region matrix does not partition the chromosome.
    #[error("invalid gamma regions: {0}")]
    InvalidGamma(String),

    /// A position past the current chromosome bounds.
    #[error("position {pos} out of range (size = {size})")]
    OutOfRange { pos: usize, size: usize },

    /// A deletion still exceeds the chromosome after clamping.
    #[error("deletion of {size} at position {pos} exceeds chromosome of size {chrom_size}")]
    SizeLimitExceeded {
        pos: usize,
        size: usize,
        chrom_size: usize,
    },

    /// A phylogeny tip label has no matching variant slot.
    #[error("tip label '{0}' not found in phylogeny")]
    LabelMismatch(String),

    /// Cooperative cancellation; partial results are intact.
    #[error("evolution interrupted; variants are partially evolved in place")]
    Interrupted,

    /// I/O failure in a file-format collaborator.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file-format collaborator could not parse its input.
    #[error("parse error in {path}: {msg}")]
    Parse { path: PathBuf, msg: String },
}

impl EvolveError {
    /// Wrap an `io::Error` with the path it occurred on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Build a parse error for the given path.
    pub fn parse(path: impl Into<PathBuf>, msg: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            msg: msg.into(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, EvolveError>;
