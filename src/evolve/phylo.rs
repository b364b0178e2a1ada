use std::sync::Arc;

use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp1};
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::errors::{EvolveError, Result};
use crate::evolve::{EvolutionParams, MutationSampler};
use crate::genome::{RefChrom, RefGenome, VarChrom, VarSet};
use crate::rates::RegionRates;

/// A phylogeny as an edge list: `(parent, child)` node indices (0-based,
/// parents listed before their own outgoing edges are used), branch lengths
/// in expected substitutions, and tip labels for nodes `0..n_tips`.
#[derive(Debug, Clone)]
pub struct PhyloTree {
    edges: Vec<(usize, usize)>,
    branch_lens: Vec<f64>,
    tip_labels: Vec<String>,
}

impl PhyloTree {
    pub fn new(
        edges: Vec<(usize, usize)>,
        branch_lens: Vec<f64>,
        tip_labels: Vec<String>,
    ) -> Result<Self> {
        if edges.is_empty() {
            return Err(EvolveError::InvalidInput("tree has no edges".to_string()));
        }
        if branch_lens.len() != edges.len() {
            return Err(EvolveError::InvalidInput(format!(
                "{} branch lengths for {} edges",
                branch_lens.len(),
                edges.len()
            )));
        }
        if branch_lens.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err(EvolveError::InvalidInput(
                "branch lengths must be non-negative and finite".to_string(),
            ));
        }
        if tip_labels.is_empty() {
            return Err(EvolveError::InvalidInput("tree has no tips".to_string()));
        }
        let tree = Self {
            edges,
            branch_lens,
            tip_labels,
        };
        tree.root()?; // a rootless edge list is malformed
        Ok(tree)
    }

    /// Number of tips (nodes `0..n_tips` are tips).
    #[inline]
    pub fn n_tips(&self) -> usize {
        self.tip_labels.len()
    }

    /// Total number of nodes referenced by the edge list.
    pub fn n_nodes(&self) -> usize {
        self.edges
            .iter()
            .map(|&(p, c)| p.max(c))
            .max()
            .map_or(0, |m| m + 1)
    }

    /// The edge list.
    #[inline]
    pub fn edges(&self) -> &[(usize, usize)] {
        &self.edges
    }

    /// Branch lengths, aligned to the edge list.
    #[inline]
    pub fn branch_lens(&self) -> &[f64] {
        &self.branch_lens
    }

    /// Tip labels, aligned to node indices `0..n_tips`.
    #[inline]
    pub fn tip_labels(&self) -> &[String] {
        &self.tip_labels
    }

    /// The root: the unique node that appears as a parent but never as a
    /// child.
    pub fn root(&self) -> Result<usize> {
        let n = self.n_nodes();
        let mut is_child = vec![false; n];
        let mut is_parent = vec![false; n];
        for &(p, c) in &self.edges {
            is_child[c] = true;
            is_parent[p] = true;
        }
        (0..n)
            .find(|&i| is_parent[i] && !is_child[i])
            .ok_or_else(|| EvolveError::InvalidInput("tree has no root".to_string()))
    }
}

/// Map each requested label to its tip index in the phylogeny. Fails with
/// `LabelMismatch` on the first label that has no match.
pub fn match_labels(ordered: &[String], tip_labels: &[String]) -> Result<Vec<usize>> {
    ordered
        .iter()
        .map(|label| {
            tip_labels
                .iter()
                .position(|t| t == label)
                .ok_or_else(|| EvolveError::LabelMismatch(label.clone()))
        })
        .collect()
}

/// How an evolution run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvolveStatus {
    Complete,
    /// The caller's abort predicate fired; every applied mutation is fully
    /// applied and the finished tips are intact.
    Interrupted,
}

/// Result of evolving one chromosome down the tree: the tip states in
/// variant-slot order, the number of mutations per edge, and the status.
#[derive(Debug)]
pub struct ChromEvolution {
    pub tips: Vec<VarChrom>,
    pub n_muts: Vec<usize>,
    pub status: EvolveStatus,
}

/// Full outcome of evolving a variant set.
#[derive(Debug)]
pub struct EvolveOutcome {
    pub var_set: VarSet,
    /// Mutation counts per chromosome, per edge.
    pub n_muts: Vec<Vec<usize>>,
    pub status: EvolveStatus,
}

/// Per-node working state while walking the tree: the variant chromosome,
/// its gamma-region partition (boundaries track this node's coordinates),
/// and the subrange end for recombination mode.
#[derive(Debug, Clone)]
struct NodeState {
    vc: VarChrom,
    regions: RegionRates,
    end: i64,
}

/// Walks a phylogeny's edges, forking variant-chromosome states at internal
/// nodes and advancing each branch by its length with a mutation sampler.
#[derive(Debug, Clone)]
pub struct PhyloEvolver {
    tree: PhyloTree,
    /// Variant slot -> tip node index.
    spp_order: Vec<usize>,
}

impl PhyloEvolver {
    /// Build an evolver whose variant slots follow `ordered_tip_labels`.
    pub fn new(tree: PhyloTree, ordered_tip_labels: &[String]) -> Result<Self> {
        if ordered_tip_labels.len() != tree.n_tips() {
            return Err(EvolveError::InvalidInput(format!(
                "{} ordered labels for {} tips",
                ordered_tip_labels.len(),
                tree.n_tips()
            )));
        }
        let spp_order = match_labels(ordered_tip_labels, tree.tip_labels())?;
        Ok(Self { tree, spp_order })
    }

    #[inline]
    pub fn tree(&self) -> &PhyloTree {
        &self.tree
    }

    /// Evolve one chromosome down the whole tree.
    ///
    /// `sampler` must have been built with this chromosome's gamma
    /// partition. `range` restricts evolution to `[start, end]` so disjoint
    /// subranges can run in parallel (recombination mode). The abort
    /// predicate is checked before every branch.
    pub fn evolve_chrom<R, F>(
        &self,
        mut sampler: MutationSampler,
        ref_chrom: &Arc<RefChrom>,
        rng: &mut R,
        should_abort: &F,
        range: Option<(usize, usize)>,
    ) -> Result<ChromEvolution>
    where
        R: Rng + ?Sized,
        F: Fn() -> bool,
    {
        let n_nodes = self.tree.n_nodes();
        let n_tips = self.tree.n_tips();
        let root = self.tree.root()?;

        let (ranged, start) = match range {
            Some((s, _)) => (true, s),
            None => (false, 0),
        };
        let end0 = match range {
            Some((_, e)) => e as i64,
            None => ref_chrom.size() as i64 - 1,
        };

        let mut regions0 = RegionRates::uniform(0);
        sampler.swap_regions(&mut regions0);
        let root_state = NodeState {
            vc: VarChrom::new(Arc::clone(ref_chrom)),
            regions: regions0,
            end: end0,
        };

        let mut states: Vec<Option<NodeState>> = (0..n_nodes).map(|_| None).collect();
        states[root] = Some(root_state);

        let mut remaining_children = vec![0usize; n_nodes];
        for &(p, _) in self.tree.edges() {
            remaining_children[p] += 1;
        }

        let mut n_muts = vec![0usize; self.tree.edges().len()];
        let mut status = EvolveStatus::Complete;

        for (e, &(parent, child)) in self.tree.edges().iter().enumerate() {
            if should_abort() {
                status = EvolveStatus::Interrupted;
                break;
            }
            if states[parent].is_none() {
                return Err(EvolveError::InvalidInput(format!(
                    "edge {e} uses node {parent} before any edge reaches it"
                )));
            }
            remaining_children[parent] -= 1;
            // The last outgoing edge can consume the parent state instead of
            // cloning it, bounding peak memory to the walk's depth.
            let mut state = if remaining_children[parent] == 0 {
                states[parent].take().expect("checked above")
            } else {
                states[parent].as_ref().expect("checked above").clone()
            };

            let count = Self::evolve_branch(
                &mut sampler,
                &mut state,
                self.tree.branch_lens()[e],
                rng,
                ranged,
                start,
            );
            trace!(edge = e, parent, child, mutations = count, "branch evolved");
            n_muts[e] = count;
            states[child] = Some(state);
        }

        // Tips land in variant-slot order; unreached tips (after an
        // interrupt) stay unmutated.
        let tips = self
            .spp_order
            .iter()
            .map(|&tip| {
                debug_assert!(tip < n_tips);
                states[tip]
                    .take()
                    .map(|s| s.vc)
                    .unwrap_or_else(|| VarChrom::new(Arc::clone(ref_chrom)))
            })
            .collect();

        Ok(ChromEvolution {
            tips,
            n_muts,
            status,
        })
    }

    /// Advance one branch: an exponential race against the total mutation
    /// rate, consuming branch length per event until it runs out.
    fn evolve_branch<R: Rng + ?Sized>(
        sampler: &mut MutationSampler,
        state: &mut NodeState,
        b_len: f64,
        rng: &mut R,
        ranged: bool,
        start: usize,
    ) -> usize {
        sampler.swap_regions(&mut state.regions);
        let mut count = 0usize;
        let mut remaining = b_len;
        let mut rate = if ranged {
            if state.end >= start as i64 && state.vc.size() > 0 {
                sampler.total_rate(&state.vc, start, state.end as usize, true)
            } else {
                0.0
            }
        } else {
            sampler.total_rate(&state.vc, 0, 0, false)
        };

        loop {
            if state.vc.size() == 0 || rate <= 0.0 {
                break;
            }
            if ranged && state.end < start as i64 {
                break;
            }
            let wait: f64 = Exp1.sample(rng);
            remaining -= wait / rate;
            if remaining <= 0.0 {
                break;
            }
            let delta = if ranged {
                sampler.mutate_in_range(&mut state.vc, rng, start, &mut state.end)
            } else {
                sampler.mutate(&mut state.vc, rng)
            };
            rate += delta;
            count += 1;
        }
        sampler.swap_regions(&mut state.regions);
        count
    }
}

/// Evolve a full variant set: one worker per chromosome, each with its own
/// sampler and a PRNG seeded deterministically from `seed` by chromosome
/// index. `gamma_rows` holds one `(end, gamma)` matrix per chromosome.
///
/// On interruption a warning is logged and the partially evolved variants
/// are returned with `EvolveStatus::Interrupted`.
pub fn evolve_var_set<F>(
    reference: RefGenome,
    params: &EvolutionParams,
    gamma_rows: &[Vec<(usize, f64)>],
    tree: &PhyloTree,
    ordered_tip_labels: &[String],
    seed: u64,
    should_abort: F,
) -> Result<EvolveOutcome>
where
    F: Fn() -> bool + Sync,
{
    params.validate()?;
    if gamma_rows.len() != reference.len() {
        return Err(EvolveError::InvalidInput(format!(
            "{} gamma matrices for {} chromosomes",
            gamma_rows.len(),
            reference.len()
        )));
    }
    let evolver = PhyloEvolver::new(tree.clone(), ordered_tip_labels)?;

    // Seeds are drawn up front so results do not depend on worker
    // scheduling.
    let mut master = Xoshiro256PlusPlus::seed_from_u64(seed);
    let seeds: Vec<u64> = (0..reference.len()).map(|_| master.random()).collect();

    let results: Result<Vec<ChromEvolution>> = (0..reference.len())
        .into_par_iter()
        .map(|i| {
            let chrom = reference.chrom(i);
            debug!(chrom = i, size = chrom.size(), "evolving chromosome");
            let sampler = MutationSampler::from_params(params, &gamma_rows[i], chrom.size())?;
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(seeds[i]);
            evolver.evolve_chrom(sampler, chrom, &mut rng, &should_abort, None)
        })
        .collect();
    let results = results?;

    let mut status = EvolveStatus::Complete;
    let mut n_muts = Vec::with_capacity(results.len());
    let mut var_set = VarSet::with_names(reference, ordered_tip_labels);
    for (chrom_idx, chrom_result) in results.into_iter().enumerate() {
        if chrom_result.status == EvolveStatus::Interrupted {
            status = EvolveStatus::Interrupted;
        }
        n_muts.push(chrom_result.n_muts);
        for (slot, vc) in chrom_result.tips.into_iter().enumerate() {
            *var_set.variant_mut(slot).chrom_mut(chrom_idx) = vc;
        }
    }
    if status == EvolveStatus::Interrupted {
        warn!("evolution interrupted; changes are in place and variants are partially evolved");
    }
    Ok(EvolveOutcome {
        var_set,
        n_muts,
        status,
    })
}
