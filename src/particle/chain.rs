//! particle::chain — validated decay chains and their canonical forms.
//!
//! Purpose
//! -------
//! A [`DecayChain`] is a set of decays forming exactly one tree. It is
//! validated once at construction and carries its canonical forms as plain
//! fields: the sorted table (every member particle mapped to the sorted
//! final particles beneath it) and the two topology fingerprints derived
//! from it.
//!
//! Key behaviors
//! -------------
//! - [`DecayChain::new`] splits particles into core-only (top), core and
//!   daughter (inner), and daughter-only (finals), rejects anything that is
//!   not a single tree, and resolves the sorted table bottom-up until a
//!   fixed point.
//! - [`DecayChain::topology_id`] / [`DecayChain::topology_same`] compare
//!   chains by shape, either on particle names (`identical = true`) or on
//!   full identities.
//! - [`DecayChain::topology_map`] builds the particle and decay bijection
//!   between two chains of the same shape.
//! - [`DecayChain::standard_topology`] renames inner particles after their
//!   descendants, e.g. `(B, C)`, giving a label-free representative.
//!
//! Invariants & assumptions
//! ------------------------
//! - `sorted_table()[top]` equals the sorted finals.
//! - Chain equality and hashing use the sorted set of decay identities, not
//!   the order in which decays were supplied.
//!
//! Conventions
//! -----------
//! - `inner` and `outs` are sorted by particle key.
//!
//! Testing notes
//! -------------
//! - Unit tests cover validation failures, the sorted table of a
//!   three-level chain, relabeling equivalence, and topology maps.
//! - Generation and reconstruction live in `particle::topology`.
use crate::particle::{
    errors::{TopologyError, TopologyResult},
    graph::{DecayId, DecayKey, ParticleGraph, ParticleId, ParticleKey},
};
use std::collections::{BTreeMap, BTreeSet};
use std::hash::{Hash, Hasher};

/// Every member particle mapped to the sorted final particles below it.
pub type SortedTable = BTreeMap<ParticleKey, Vec<ParticleKey>>;

/// Canonical shape fingerprint of a chain.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TopologyId {
    Names(Vec<Vec<String>>),
    Keys(Vec<Vec<ParticleKey>>),
}

/// Particle and decay correspondence between two chains of equal shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyMap {
    pub particles: BTreeMap<ParticleId, ParticleId>,
    pub decays: BTreeMap<DecayId, DecayId>,
}

#[derive(Debug, Clone)]
pub struct DecayChain {
    decays: Vec<DecayId>,
    decay_keys: Vec<DecayKey>,
    identity: Vec<DecayKey>,
    top: ParticleId,
    top_key: ParticleKey,
    inner: Vec<ParticleId>,
    outs: Vec<ParticleId>,
    members: BTreeMap<ParticleKey, ParticleId>,
    table: SortedTable,
    id_names: Vec<Vec<String>>,
    id_keys: Vec<Vec<ParticleKey>>,
}

impl DecayChain {
    /// Validate `decays` as a single tree and precompute its canonical forms.
    ///
    /// Errors
    /// ------
    /// - [`TopologyError::EmptyChain`] for an empty list.
    /// - [`TopologyError::UnknownId`] for a foreign decay handle.
    /// - [`TopologyError::ParticleDecaysTwice`] /
    ///   [`TopologyError::ParticleProducedTwice`] when a particle is the core
    ///   or a daughter of more than one decay.
    /// - [`TopologyError::NoTopParticle`] /
    ///   [`TopologyError::MultipleTopParticles`] unless exactly one particle
    ///   is a core but never a daughter.
    /// - [`TopologyError::UnresolvedChain`] if bottom-up resolution stalls.
    pub fn new(graph: &ParticleGraph, decays: Vec<DecayId>) -> TopologyResult<Self> {
        if decays.is_empty() {
            return Err(TopologyError::EmptyChain);
        }
        let mut members: BTreeMap<ParticleKey, ParticleId> = BTreeMap::new();
        let mut cores: BTreeSet<ParticleKey> = BTreeSet::new();
        let mut produced: BTreeSet<ParticleKey> = BTreeSet::new();
        let mut decay_keys = Vec::with_capacity(decays.len());
        for &d in &decays {
            if d.index() >= graph.n_decays() {
                return Err(TopologyError::UnknownId { kind: "decay", index: d.index() });
            }
            let decay = graph.decay(d);
            let core_key = graph.key(decay.core()).clone();
            if !cores.insert(core_key.clone()) {
                return Err(TopologyError::ParticleDecaysTwice { name: core_key.to_string() });
            }
            members.insert(core_key, decay.core());
            for &o in decay.outs() {
                let key = graph.key(o).clone();
                if !produced.insert(key.clone()) {
                    return Err(TopologyError::ParticleProducedTwice { name: key.to_string() });
                }
                members.insert(key, o);
            }
            decay_keys.push(decay.key().clone());
        }

        let tops: Vec<&ParticleKey> = cores.difference(&produced).collect();
        let top_key = match tops.as_slice() {
            [] => return Err(TopologyError::NoTopParticle),
            [only] => (*only).clone(),
            many => {
                return Err(TopologyError::MultipleTopParticles {
                    tops: many.iter().map(|k| k.to_string()).collect(),
                });
            }
        };
        let inner_keys: Vec<&ParticleKey> = cores.intersection(&produced).collect();
        let out_keys: Vec<&ParticleKey> = produced.difference(&cores).collect();

        let table = resolve_sorted_table(&decay_keys, &top_key, &out_keys)?;

        let top = members[&top_key];
        let inner = inner_keys.iter().map(|k| members[*k]).collect();
        let outs = out_keys.iter().map(|k| members[*k]).collect();

        let mut id_keys: Vec<Vec<ParticleKey>> = table.values().cloned().collect();
        id_keys.sort();
        let mut id_names: Vec<Vec<String>> = table
            .values()
            .map(|v| v.iter().map(|k| k.name.clone()).collect())
            .collect();
        id_names.sort();

        let mut identity = decay_keys.clone();
        identity.sort();

        Ok(Self {
            decays,
            decay_keys,
            identity,
            top,
            top_key,
            inner,
            outs,
            members,
            table,
            id_names,
            id_keys,
        })
    }

    pub fn decays(&self) -> &[DecayId] {
        &self.decays
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DecayId> {
        self.decays.iter()
    }

    pub fn len(&self) -> usize {
        self.decays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decays.is_empty()
    }

    pub fn top(&self) -> ParticleId {
        self.top
    }

    /// Intermediate particles (resonances), sorted by key.
    pub fn inner(&self) -> &[ParticleId] {
        &self.inner
    }

    /// Final particles, sorted by key.
    pub fn outs(&self) -> &[ParticleId] {
        &self.outs
    }

    pub fn top_key(&self) -> &ParticleKey {
        &self.top_key
    }

    /// Final-particle keys, sorted.
    pub fn out_keys(&self) -> &[ParticleKey] {
        &self.table[&self.top_key]
    }

    pub fn decay_keys(&self) -> &[DecayKey] {
        &self.decay_keys
    }

    pub fn sorted_table(&self) -> &SortedTable {
        &self.table
    }

    /// Handle of a member particle by key.
    pub fn member(&self, key: &ParticleKey) -> Option<ParticleId> {
        self.members.get(key).copied()
    }

    /// Shape fingerprint, on names (`identical = true`) or full identities.
    pub fn topology_id(&self, identical: bool) -> TopologyId {
        if identical {
            TopologyId::Names(self.id_names.clone())
        } else {
            TopologyId::Keys(self.id_keys.clone())
        }
    }

    pub fn topology_same(&self, other: &DecayChain, identical: bool) -> bool {
        if identical { self.id_names == other.id_names } else { self.id_keys == other.id_keys }
    }

    /// Particle and decay bijection onto `other`.
    ///
    /// Particles are matched by equal descendant lists; each decay is then
    /// matched by its image identity.
    ///
    /// Errors
    /// ------
    /// - [`TopologyError::NoMappingFound`] if the chains differ in shape
    ///   (full identities) or some decay has no image in `other`.
    pub fn topology_map(&self, other: &DecayChain) -> TopologyResult<TopologyMap> {
        if !self.topology_same(other, false) {
            return Err(TopologyError::NoMappingFound {
                reason: "chains are not topology-same".to_string(),
            });
        }
        let mut key_map: BTreeMap<&ParticleKey, &ParticleKey> = BTreeMap::new();
        let mut map = TopologyMap::default();
        for (key, below) in &self.table {
            let Some((other_key, _)) = other.table.iter().find(|(_, v)| *v == below) else {
                return Err(TopologyError::NoMappingFound {
                    reason: format!("no particle in the other chain matches '{key}'"),
                });
            };
            key_map.insert(key, other_key);
            map.particles.insert(self.members[key], other.members[other_key]);
        }
        for (i, dk) in self.decay_keys.iter().enumerate() {
            let image = DecayKey::new(
                key_map[&dk.core].clone(),
                dk.outs.iter().map(|o| key_map[o].clone()).collect(),
            );
            let Some(j) = other.decay_keys.iter().position(|k| *k == image) else {
                return Err(TopologyError::NoMappingFound {
                    reason: format!("no decay in the other chain matches '{dk}'"),
                });
            };
            map.decays.insert(self.decays[i], other.decays[j]);
        }
        Ok(map)
    }

    /// Same shape with every inner particle renamed after its descendants.
    ///
    /// An inner particle above `B` and `C` becomes `(B, C)`; top and finals
    /// keep their identity. The new decays are stored detached in `graph`.
    pub fn standard_topology(&self, graph: &mut ParticleGraph) -> TopologyResult<DecayChain> {
        let mut rename: BTreeMap<ParticleId, ParticleId> = BTreeMap::new();
        for (key, below) in &self.table {
            let p = self.members[key];
            if !self.inner.contains(&p) {
                continue;
            }
            let mut parts: Vec<String> = below.iter().map(|k| k.to_string()).collect();
            parts.sort();
            let id = graph.intern_particle(ParticleKey::new(format!("({})", parts.join(", "))));
            rename.insert(p, id);
        }
        let mut decays = Vec::with_capacity(self.decays.len());
        for &d in &self.decays {
            let decay = graph.decay(d);
            let core = rename.get(&decay.core()).copied().unwrap_or(decay.core());
            let outs: Vec<ParticleId> =
                decay.outs().iter().map(|o| rename.get(o).copied().unwrap_or(*o)).collect();
            decays.push(graph.add_detached_decay(core, &outs)?);
        }
        DecayChain::new(graph, decays)
    }
}

impl PartialEq for DecayChain {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for DecayChain {}

impl Hash for DecayChain {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl<'a> IntoIterator for &'a DecayChain {
    type Item = &'a DecayId;
    type IntoIter = std::slice::Iter<'a, DecayId>;

    fn into_iter(self) -> Self::IntoIter {
        self.decays.iter()
    }
}

// ---- Helper methods ----

/// Bottom-up fixed point: finals map to themselves, a decay resolves once
/// all its daughters are resolved.
fn resolve_sorted_table(
    decay_keys: &[DecayKey], top: &ParticleKey, outs: &[&ParticleKey],
) -> TopologyResult<SortedTable> {
    let mut table: SortedTable = outs.iter().map(|k| ((*k).clone(), vec![(*k).clone()])).collect();
    let mut pending: Vec<&DecayKey> = decay_keys.iter().collect();
    while !pending.is_empty() {
        let before = pending.len();
        pending.retain(|dk| {
            if !dk.outs.iter().all(|o| table.contains_key(o)) {
                return true;
            }
            let mut below: Vec<ParticleKey> =
                dk.outs.iter().flat_map(|o| table[o].iter().cloned()).collect();
            below.sort();
            table.insert(dk.core.clone(), below);
            false
        });
        if pending.len() == before {
            return Err(TopologyError::UnresolvedChain { pending: before });
        }
    }
    table.insert(top.clone(), outs.iter().map(|k| (*k).clone()).collect());
    Ok(table)
}
