//! particle::group — decay groups: every chain from one top to one final state.
//!
//! Purpose
//! -------
//! Collect the [`DecayChain`]s an amplitude sums over and expose the shared
//! top particle, the final state, and the deduplicated resonance list.
//!
//! Key behaviors
//! -------------
//! - [`DecayGroup::new`] validates that all chains agree on top and finals.
//! - [`DecayGroup::topology_structure`] keeps one representative per
//!   distinct topology, optionally in standard naming.
//! - [`DecayGroup::chains_map`] maps each standard topology onto every
//!   member chain of that shape.
//!
//! Invariants & assumptions
//! ------------------------
//! - Top and finals are compared by full identity (name and index).
//! - Resonances keep first-seen order across chains.
use crate::particle::{
    chain::{DecayChain, TopologyMap},
    errors::{TopologyError, TopologyResult},
    graph::{ParticleGraph, ParticleId},
};

#[derive(Debug, Clone)]
pub struct DecayGroup {
    chains: Vec<DecayChain>,
    top: ParticleId,
    outs: Vec<ParticleId>,
    resonances: Vec<ParticleId>,
}

impl DecayGroup {
    /// Group `chains` after checking they share top and final state.
    ///
    /// Errors
    /// ------
    /// - [`TopologyError::EmptyGroup`] for no chains.
    /// - [`TopologyError::MismatchedTop`] / [`TopologyError::MismatchedFinals`]
    ///   if any chain disagrees with the first.
    pub fn new(chains: Vec<DecayChain>) -> TopologyResult<Self> {
        let Some(first) = chains.first() else {
            return Err(TopologyError::EmptyGroup);
        };
        for chain in &chains[1..] {
            if chain.top_key() != first.top_key() {
                return Err(TopologyError::MismatchedTop {
                    expected: first.top_key().to_string(),
                    found: chain.top_key().to_string(),
                });
            }
            if chain.out_keys() != first.out_keys() {
                let names = |c: &DecayChain| -> Vec<String> {
                    c.out_keys().iter().map(|k| k.to_string()).collect()
                };
                return Err(TopologyError::MismatchedFinals {
                    expected: names(first),
                    found: names(chain),
                });
            }
        }
        let top = first.top();
        let outs = first.outs().to_vec();
        let mut resonances: Vec<ParticleId> = Vec::new();
        for chain in &chains {
            for &r in chain.inner() {
                if !resonances.contains(&r) {
                    resonances.push(r);
                }
            }
        }
        Ok(Self { chains, top, outs, resonances })
    }

    /// Every registered chain rooted at `top`.
    pub fn from_top(graph: &ParticleGraph, top: ParticleId) -> TopologyResult<Self> {
        let chains = graph
            .chain_decay(top)?
            .into_iter()
            .map(|decays| DecayChain::new(graph, decays))
            .collect::<TopologyResult<Vec<_>>>()?;
        Self::new(chains)
    }

    /// Every binary topology from `top` to `finals`.
    pub fn from_particles(
        graph: &mut ParticleGraph, top: ParticleId, finals: &[ParticleId],
    ) -> TopologyResult<Self> {
        Self::new(DecayChain::from_particles(graph, top, finals)?)
    }

    pub fn top(&self) -> ParticleId {
        self.top
    }

    pub fn outs(&self) -> &[ParticleId] {
        &self.outs
    }

    pub fn resonances(&self) -> &[ParticleId] {
        &self.resonances
    }

    pub fn chains(&self) -> &[DecayChain] {
        &self.chains
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecayChain> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// One chain per distinct topology, in first-seen order.
    ///
    /// With `standard`, each representative is replaced by its
    /// [`DecayChain::standard_topology`].
    pub fn topology_structure(
        &self, graph: &mut ParticleGraph, identical: bool, standard: bool,
    ) -> TopologyResult<Vec<DecayChain>> {
        let mut reps: Vec<&DecayChain> = Vec::new();
        for chain in &self.chains {
            if !reps.iter().any(|r| r.topology_same(chain, identical)) {
                reps.push(chain);
            }
        }
        if !standard {
            return Ok(reps.into_iter().cloned().collect());
        }
        reps.into_iter().map(|c| c.standard_topology(graph)).collect()
    }

    /// For each standard topology, `(chain index, map)` for every member
    /// chain of that shape.
    pub fn chains_map(
        &self, graph: &mut ParticleGraph,
    ) -> TopologyResult<Vec<Vec<(usize, TopologyMap)>>> {
        let structure = self.topology_structure(graph, false, true)?;
        let mut out = Vec::with_capacity(structure.len());
        for standard in &structure {
            let mut members = Vec::new();
            for (i, chain) in self.chains.iter().enumerate() {
                if standard.topology_same(chain, false) {
                    members.push((i, standard.topology_map(chain)?));
                }
            }
            out.push(members);
        }
        Ok(out)
    }
}

impl<'a> IntoIterator for &'a DecayGroup {
    type Item = &'a DecayChain;
    type IntoIter = std::slice::Iter<'a, DecayChain>;

    fn into_iter(self) -> Self::IntoIter {
        self.chains.iter()
    }
}

impl ParticleGraph {
    /// [`DecayGroup`] of every registered chain rooted at `top`.
    pub fn decay_group(&self, top: ParticleId) -> TopologyResult<DecayGroup> {
        DecayGroup::from_top(self, top)
    }
}
