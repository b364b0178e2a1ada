use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{EvolveError, Result};

fn default_psi() -> f64 {
    1.0
}

/// Model parameters for phylogenetic sequence evolution.
///
/// Substitutions follow a TN93 rate matrix over T, C, A, G: transitions
/// within pyrimidines scale with `alpha_1`, within purines with `alpha_2`,
/// transversions with `beta`, all weighted by the stationary frequencies
/// `pi_tcag`. Indels enter through `xi` (overall indel rate, folded into the
/// matrix diagonal) and `psi` (additional indel scaling), split across
/// per-length classes by the normalized relative-rate vectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionParams {
    pub pi_tcag: [f64; 4],
    pub alpha_1: f64,
    pub alpha_2: f64,
    pub beta: f64,
    pub xi: f64,
    #[serde(default = "default_psi")]
    pub psi: f64,
    pub rel_insertion_rates: Vec<f64>,
    pub rel_deletion_rates: Vec<f64>,
    /// Reservoir chunk size; 0 samples the whole chromosome exhaustively.
    #[serde(default)]
    pub chunk_size: usize,
}

impl EvolutionParams {
    /// Substitution-only TN93 parameters (no indels).
    pub fn tn93(pi_tcag: [f64; 4], alpha_1: f64, alpha_2: f64, beta: f64) -> Self {
        Self {
            pi_tcag,
            alpha_1,
            alpha_2,
            beta,
            xi: 0.0,
            psi: 1.0,
            rel_insertion_rates: Vec::new(),
            rel_deletion_rates: Vec::new(),
            chunk_size: 0,
        }
    }

    /// Jukes-Cantor-style uniform substitution rates plus optional indels.
    pub fn uniform(mu: f64, xi: f64) -> Self {
        Self {
            pi_tcag: [0.25; 4],
            alpha_1: mu,
            alpha_2: mu,
            beta: mu,
            xi,
            psi: 1.0,
            rel_insertion_rates: if xi > 0.0 { vec![1.0] } else { Vec::new() },
            rel_deletion_rates: if xi > 0.0 { vec![1.0] } else { Vec::new() },
            chunk_size: 0,
        }
    }

    /// Validate all parameters; every constructor path calls this before
    /// building samplers.
    pub fn validate(&self) -> Result<()> {
        let check = |name: &str, v: f64| -> Result<()> {
            if !v.is_finite() || v < 0.0 {
                return Err(EvolveError::InvalidModel(format!(
                    "{name} = {v} is negative or non-finite"
                )));
            }
            Ok(())
        };
        for (i, &p) in self.pi_tcag.iter().enumerate() {
            check(&format!("pi_tcag[{i}]"), p)?;
        }
        let pi_sum: f64 = self.pi_tcag.iter().sum();
        if (pi_sum - 1.0).abs() > 1e-6 {
            return Err(EvolveError::InvalidModel(format!(
                "pi_tcag sums to {pi_sum}, expected 1"
            )));
        }
        check("alpha_1", self.alpha_1)?;
        check("alpha_2", self.alpha_2)?;
        check("beta", self.beta)?;
        check("xi", self.xi)?;
        check("psi", self.psi)?;
        for (name, rates) in [
            ("rel_insertion_rates", &self.rel_insertion_rates),
            ("rel_deletion_rates", &self.rel_deletion_rates),
        ] {
            for (i, &r) in rates.iter().enumerate() {
                check(&format!("{name}[{i}]"), r)?;
            }
        }
        if self.xi * self.psi > 0.0
            && self.rel_insertion_rates.is_empty()
            && self.rel_deletion_rates.is_empty()
        {
            return Err(EvolveError::InvalidModel(
                "indel rate is positive but no length classes are given".to_string(),
            ));
        }
        Ok(())
    }

    /// The TN93 rate matrix over T, C, A, G. Off-diagonal entries are the
    /// substitution rates; the diagonal is minus the total leave-rate of the
    /// row's base, indels included.
    pub fn tn93_matrix(&self) -> [[f64; 4]; 4] {
        let pi = self.pi_tcag;
        let mut q = [[0.0f64; 4]; 4];
        for i in 0..4 {
            for j in 0..4 {
                if i == j {
                    continue;
                }
                let scalar = match (i, j) {
                    (0, 1) | (1, 0) => self.alpha_1, // T <-> C
                    (2, 3) | (3, 2) => self.alpha_2, // A <-> G
                    _ => self.beta,
                };
                q[i][j] = scalar * pi[j];
            }
        }
        let indel = self.xi * self.psi;
        for (i, row) in q.iter_mut().enumerate() {
            let leave: f64 = row.iter().sum();
            row[i] = -(leave + indel);
        }
        q
    }

    /// Per-base outcome-weight rows and the index-to-length map consumed by
    /// the type sampler: four substitution targets, then insertion length
    /// classes, then deletion length classes.
    pub fn probs_and_lengths(&self) -> (Vec<Vec<f64>>, Vec<isize>) {
        let q = self.tn93_matrix();
        let indel = 0.5 * self.xi * self.psi;

        let norm = |v: &[f64]| -> Vec<f64> {
            let sum: f64 = v.iter().sum();
            if sum > 0.0 {
                v.iter().map(|r| r / sum).collect()
            } else {
                vec![0.0; v.len()]
            }
        };
        let ins = norm(&self.rel_insertion_rates);
        let del = norm(&self.rel_deletion_rates);

        let mut mut_lengths = vec![0isize; 4];
        mut_lengths.extend((1..=ins.len()).map(|u| u as isize));
        mut_lengths.extend((1..=del.len()).map(|u| -(u as isize)));

        let mut probs = Vec::with_capacity(4);
        for (i, row) in q.iter().enumerate() {
            let mut out = Vec::with_capacity(mut_lengths.len());
            for (j, &r) in row.iter().enumerate() {
                out.push(if i == j { 0.0 } else { r });
            }
            out.extend(ins.iter().map(|r| indel * r));
            out.extend(del.iter().map(|r| indel * r));
            probs.push(out);
        }
        (probs, mut_lengths)
    }

    /// Total leave-rate per starting base (T, C, A, G), used as the
    /// per-nucleotide weights for location sampling.
    pub fn q_tcag(&self) -> [f64; 4] {
        let (probs, _) = self.probs_and_lengths();
        let mut q = [0.0f64; 4];
        for (i, row) in probs.iter().enumerate() {
            q[i] = row.iter().sum();
        }
        q
    }

    /// Load parameters from a JSON document.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| EvolveError::io(path, e))?;
        let params: Self = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| EvolveError::parse(path, e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Write parameters as a JSON document.
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| EvolveError::io(path, e))?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)
            .map_err(|e| EvolveError::parse(path, e.to_string()))
    }
}
