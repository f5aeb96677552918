//! particle::topology — reconstruction and enumeration of decay-chain shapes.
//!
//! Purpose
//! -------
//! Build [`DecayChain`]s from shape descriptions instead of explicit decay
//! lists: either from a sorted table (the inverse of
//! [`DecayChain::sorted_table`]) or by enumerating every rooted binary tree
//! over a list of final particles.
//!
//! Key behaviors
//! -------------
//! - [`DecayChain::from_sorted_table`] consumes table entries by increasing
//!   descendant count. For each entry it searches the currently unconsumed
//!   nodes for a combination, of width 2 up to all of them, whose
//!   descendants concatenate to the entry's list, emits that decay and puts
//!   the entry back as a new node.
//! - [`DecayChain::from_particles`] grows shapes by inserting each further
//!   final particle onto every edge of every shape built so far. Shapes are
//!   plain immutable trees; each insertion returns new trees. For `n` finals
//!   this yields `(2n-3)!!` shapes: 1, 3, 15, 105 for `n` = 2..5.
//!
//! Invariants & assumptions
//! ------------------------
//! - Generated internal particles are named `chain{i}_node_{k}`, where `i`
//!   is the shape index and `k` the insertion step that created the node.
//!   The node directly under the top is replaced by the top itself.
//! - All decays built here are stored detached, so they never show up in
//!   [`ParticleGraph::chain_decay`].
//!
//! Testing notes
//! -------------
//! - Unit tests pin the three-final scenario, the enumeration counts, the
//!   sorted-table round trip, and the reconstruction failure.
use crate::particle::{
    chain::{DecayChain, SortedTable},
    errors::{TopologyError, TopologyResult},
    graph::{DecayId, ParticleGraph, ParticleId, ParticleKey},
};
use std::collections::BTreeMap;

/// Rooted binary tree over final-particle positions.
#[derive(Debug, Clone, PartialEq)]
enum Shape {
    Leaf(usize),
    Node { label: usize, left: Box<Shape>, right: Box<Shape> },
}

impl DecayChain {
    /// Rebuild a chain from its sorted table.
    ///
    /// Missing particles are interned into `graph` with default quantum
    /// numbers; decays are stored detached.
    ///
    /// Errors
    /// ------
    /// - [`TopologyError::ReconstructionFailed`] when no combination of
    ///   unconsumed nodes reproduces some entry.
    /// - Any validation error of [`DecayChain::new`] on the result.
    pub fn from_sorted_table(
        graph: &mut ParticleGraph, table: &SortedTable,
    ) -> TopologyResult<DecayChain> {
        let mut layers: BTreeMap<usize, Vec<(&ParticleKey, &Vec<ParticleKey>)>> = BTreeMap::new();
        for (key, below) in table {
            layers.entry(below.len()).or_default().push((key, below));
        }
        let mut base: Vec<(ParticleKey, Vec<ParticleKey>)> = layers
            .get(&1)
            .map(|l| l.iter().map(|(k, v)| ((*k).clone(), (*v).clone())).collect())
            .unwrap_or_default();

        let mut decays = Vec::new();
        for (_, entries) in layers.range(2..) {
            for &(key, below) in entries {
                let mut target = below.clone();
                target.sort();
                let found = search_grouping(&base, &target).ok_or_else(|| {
                    TopologyError::ReconstructionFailed { particle: key.to_string() }
                })?;
                let core = graph.intern_particle(key.clone());
                let outs: Vec<ParticleId> =
                    found.iter().map(|&i| graph.intern_particle(base[i].0.clone())).collect();
                decays.push(graph.add_detached_decay(core, &outs)?);
                for &i in found.iter().rev() {
                    base.remove(i);
                }
                base.push((key.clone(), below.clone()));
            }
        }
        DecayChain::new(graph, decays)
    }

    /// Every rooted binary decay topology from `top` to `finals`.
    ///
    /// Errors
    /// ------
    /// - [`TopologyError::TooFewFinals`] for fewer than two finals.
    /// - [`TopologyError::UnknownId`] for foreign handles.
    pub fn from_particles(
        graph: &mut ParticleGraph, top: ParticleId, finals: &[ParticleId],
    ) -> TopologyResult<Vec<DecayChain>> {
        if finals.len() < 2 {
            return Err(TopologyError::TooFewFinals { found: finals.len() });
        }
        let mut shapes = vec![Shape::Leaf(0)];
        for step in 1..finals.len() {
            shapes = shapes.iter().flat_map(|s| insert_everywhere(s, step, step - 1)).collect();
        }
        log::debug!("enumerated {} topologies for {} final particles", shapes.len(), finals.len());

        let mut chains = Vec::with_capacity(shapes.len());
        for (i, shape) in shapes.iter().enumerate() {
            let head = format!("chain{i}_");
            let mut decays = Vec::new();
            emit_decays(graph, shape, top, finals, &head, &mut decays)?;
            chains.push(DecayChain::new(graph, decays)?);
        }
        Ok(chains)
    }
}

// ---- Helper methods ----

/// Insert leaf `leaf` on every edge of `shape`, the edge above the root
/// first, then the left subtree, then the right subtree.
fn insert_everywhere(shape: &Shape, leaf: usize, label: usize) -> Vec<Shape> {
    let mut out = vec![Shape::Node {
        label,
        left: Box::new(shape.clone()),
        right: Box::new(Shape::Leaf(leaf)),
    }];
    if let Shape::Node { label: own, left, right } = shape {
        for new_left in insert_everywhere(left, leaf, label) {
            out.push(Shape::Node { label: *own, left: Box::new(new_left), right: right.clone() });
        }
        for new_right in insert_everywhere(right, leaf, label) {
            out.push(Shape::Node { label: *own, left: left.clone(), right: Box::new(new_right) });
        }
    }
    out
}

fn node_particle(
    graph: &mut ParticleGraph, shape: &Shape, finals: &[ParticleId], head: &str,
) -> ParticleId {
    match shape {
        Shape::Leaf(i) => finals[*i],
        Shape::Node { label, .. } => {
            graph.intern_particle(ParticleKey::new(format!("{head}node_{label}")))
        }
    }
}

fn emit_decays(
    graph: &mut ParticleGraph, shape: &Shape, core: ParticleId, finals: &[ParticleId], head: &str,
    decays: &mut Vec<DecayId>,
) -> TopologyResult<()> {
    let Shape::Node { left, right, .. } = shape else {
        return Ok(());
    };
    let left_id = node_particle(graph, left, finals, head);
    let right_id = node_particle(graph, right, finals, head);
    decays.push(graph.add_detached_decay(core, &[left_id, right_id])?);
    emit_decays(graph, left, left_id, finals, head, decays)?;
    emit_decays(graph, right, right_id, finals, head, decays)
}

/// First combination of `base` entries (by width, then lexicographic
/// index order) whose descendants concatenate to `target`.
fn search_grouping(
    base: &[(ParticleKey, Vec<ParticleKey>)], target: &[ParticleKey],
) -> Option<Vec<usize>> {
    let n = base.len();
    for width in 2..=n {
        let mut idx: Vec<usize> = (0..width).collect();
        loop {
            let size: usize = idx.iter().map(|&i| base[i].1.len()).sum();
            if size == target.len() {
                let mut merged: Vec<ParticleKey> =
                    idx.iter().flat_map(|&i| base[i].1.iter().cloned()).collect();
                merged.sort();
                if merged == target {
                    return Some(idx);
                }
            }
            if !next_combination(&mut idx, n) {
                break;
            }
        }
    }
    None
}

fn next_combination(idx: &mut [usize], n: usize) -> bool {
    let k = idx.len();
    for i in (0..k).rev() {
        if idx[i] < n - k + i {
            idx[i] += 1;
            for j in i + 1..k {
                idx[j] = idx[j - 1] + 1;
            }
            return true;
        }
    }
    false
}
