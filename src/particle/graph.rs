//! particle::graph — arena of particles and decays with adjacency bookkeeping.
//!
//! Purpose
//! -------
//! Own every particle and decay record of an analysis in one arena and hand
//! out stable integer handles ([`ParticleId`], [`DecayId`]). Particles and
//! decays never point at each other directly; adjacency is stored as lists
//! of handles on the particle records.
//!
//! Key behaviors
//! -------------
//! - [`ParticleGraph::add_particle`] registers a particle by identity
//!   `(name, index)` and rejects duplicates; [`ParticleGraph::intern_particle`]
//!   returns an existing handle or inserts a default particle.
//! - [`ParticleGraph::add_decay`] registers a two-body decay, appending it to
//!   the core's `decays` and each daughter's `creators`. It is idempotent by
//!   decay identity `(core, sorted daughters)`.
//! - [`ParticleGraph::add_detached_decay`] stores a decay record (any
//!   multiplicity ≥ 2) without touching adjacency. Reconstructed and
//!   generated chains use it so they do not feed back into
//!   [`ParticleGraph::chain_decay`].
//! - Every two-body decay gets a [`SpinCoupling`] at creation. Couplings are
//!   shared between decays with identical quantum numbers.
//! - [`ParticleGraph::chain_decay`] expands the registered decays below a
//!   particle into every complete decay chain (recursive cross product).
//!
//! Invariants & assumptions
//! ------------------------
//! - Handles are only valid for the graph that issued them. Accessors index
//!   directly and panic on a foreign handle; mutating entry points validate
//!   handles and return [`TopologyError::UnknownId`].
//! - A decay's identity ignores daughter order; the stored daughter order is
//!   the one given on first creation and is the `(B, C)` order used by its
//!   spin coupling.
//! - When the same identity is added again with different options
//!   (`p_break`, `curve_style`), the first registration wins.
//!
//! Conventions
//! -----------
//! - Particle defaults: `J = 0`, `P = -1`, helicities `-J..=J`.
//! - Keys print as `name` or `name:index`; decays print as `A->B+C`.
//!
//! Testing notes
//! -------------
//! - Unit tests cover key parsing and ordering, duplicate handling,
//!   idempotent decay registration, coupling sharing, and the
//!   cross-product expansion of `chain_decay`.
use crate::coupling::ls::SpinCoupling;
use crate::particle::{
    errors::{TopologyError, TopologyResult},
    spin::{Parity, Spin},
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Particle identity: name plus disambiguation index (default 0).
///
/// Ordering is lexicographic on `(name, index)`, so keys can be used in
/// sorted containers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleKey {
    pub name: String,
    pub index: u32,
}

impl ParticleKey {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), index: 0 }
    }

    pub fn with_index(name: impl Into<String>, index: u32) -> Self {
        Self { name: name.into(), index }
    }

    /// Parse `"name"` or `"name:index"`.
    ///
    /// A suffix after the last `:` that is not a non-negative integer is
    /// kept as part of the name.
    pub fn parse(text: &str) -> Self {
        if let Some((name, idx)) = text.rsplit_once(':') {
            if let Ok(index) = idx.parse::<u32>() {
                return Self::with_index(name, index);
            }
        }
        Self::new(text)
    }
}

impl From<&str> for ParticleKey {
    fn from(text: &str) -> Self {
        ParticleKey::parse(text)
    }
}

impl fmt::Display for ParticleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.index == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.name, self.index)
        }
    }
}

/// Handle of a particle inside a [`ParticleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ParticleId(pub(crate) usize);

impl ParticleId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Handle of a decay inside a [`ParticleGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecayId(pub(crate) usize);

impl DecayId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A particle record. Built with the `with_*` methods, then handed to
/// [`ParticleGraph::add_particle`].
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    key: ParticleKey,
    j: Spin,
    parity: Parity,
    spins: Vec<Spin>,
    mass: Option<f64>,
    width: Option<f64>,
    decays: Vec<DecayId>,
    creators: Vec<DecayId>,
}

impl Particle {
    pub fn new(key: impl Into<ParticleKey>) -> Self {
        Self {
            key: key.into(),
            j: Spin::ZERO,
            parity: Parity::Minus,
            spins: Spin::ZERO.projections(),
            mass: None,
            width: None,
            decays: Vec::new(),
            creators: Vec::new(),
        }
    }

    /// Set the total spin and reset the helicity set to `-J..=J`.
    ///
    /// # Errors
    /// - [`TopologyError::InvalidSpin`] for negative `j`.
    pub fn with_spin(mut self, j: Spin) -> TopologyResult<Self> {
        if j < Spin::ZERO {
            return Err(TopologyError::InvalidSpin { value: j.value() });
        }
        self.j = j;
        self.spins = j.projections();
        Ok(self)
    }

    pub fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Restrict the allowed helicities (e.g. massless particles).
    pub fn with_helicities(mut self, spins: Vec<Spin>) -> Self {
        self.spins = spins;
        self
    }

    pub fn with_mass(mut self, mass: f64) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn with_width(mut self, width: f64) -> Self {
        self.width = Some(width);
        self
    }

    pub fn key(&self) -> &ParticleKey {
        &self.key
    }

    pub fn name(&self) -> &str {
        &self.key.name
    }

    pub fn j(&self) -> Spin {
        self.j
    }

    pub fn parity(&self) -> Parity {
        self.parity
    }

    pub fn helicities(&self) -> &[Spin] {
        &self.spins
    }

    pub fn mass(&self) -> Option<f64> {
        self.mass
    }

    pub fn width(&self) -> Option<f64> {
        self.width
    }

    /// Registered decays in which this particle is the core.
    pub fn decays(&self) -> &[DecayId] {
        &self.decays
    }

    /// Registered decays in which this particle is a daughter.
    pub fn creators(&self) -> &[DecayId] {
        &self.creators
    }
}

/// Decay identity: core key plus the sorted daughter keys.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DecayKey {
    pub core: ParticleKey,
    pub outs: Vec<ParticleKey>,
}

impl DecayKey {
    pub fn new(core: ParticleKey, mut outs: Vec<ParticleKey>) -> Self {
        outs.sort();
        Self { core, outs }
    }
}

impl fmt::Display for DecayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outs: Vec<String> = self.outs.iter().map(|k| k.to_string()).collect();
        write!(f, "{}->{}", self.core, outs.join("+"))
    }
}

/// Per-decay options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DecayOptions {
    /// Allow parity violation when enumerating LS couplings.
    pub p_break: bool,
    /// Plot style tag, carried through untouched.
    pub curve_style: Option<String>,
}

/// A decay record `core -> outs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Decay {
    key: DecayKey,
    core: ParticleId,
    outs: Vec<ParticleId>,
    p_break: bool,
    curve_style: Option<String>,
    registered: bool,
    coupling: Option<Arc<SpinCoupling>>,
}

impl Decay {
    pub fn key(&self) -> &DecayKey {
        &self.key
    }

    pub fn core(&self) -> ParticleId {
        self.core
    }

    /// Daughters in creation order.
    pub fn outs(&self) -> &[ParticleId] {
        &self.outs
    }

    pub fn p_break(&self) -> bool {
        self.p_break
    }

    pub fn curve_style(&self) -> Option<&str> {
        self.curve_style.as_deref()
    }

    /// `true` once the decay has been added to the adjacency lists.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Spin coupling of a two-body decay; `None` for multi-body records.
    pub fn coupling(&self) -> Option<&SpinCoupling> {
        self.coupling.as_deref()
    }
}

type CouplingKey = (Spin, Spin, Spin, Parity, Parity, Parity, bool);

/// Arena of particles and decays.
#[derive(Debug, Clone, Default)]
pub struct ParticleGraph {
    particles: Vec<Particle>,
    decays: Vec<Decay>,
    particle_index: HashMap<ParticleKey, ParticleId>,
    decay_index: HashMap<DecayKey, DecayId>,
    couplings: HashMap<CouplingKey, Arc<SpinCoupling>>,
}

impl ParticleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ---- Particles ----

    /// Register a particle.
    ///
    /// # Errors
    /// - [`TopologyError::InvalidParticleName`] for an empty name.
    /// - [`TopologyError::DuplicateParticle`] if the identity is taken.
    pub fn add_particle(&mut self, mut particle: Particle) -> TopologyResult<ParticleId> {
        if particle.key.name.is_empty() {
            return Err(TopologyError::InvalidParticleName { name: particle.key.to_string() });
        }
        if self.particle_index.contains_key(&particle.key) {
            return Err(TopologyError::DuplicateParticle { name: particle.key.to_string() });
        }
        particle.decays.clear();
        particle.creators.clear();
        let id = ParticleId(self.particles.len());
        self.particle_index.insert(particle.key.clone(), id);
        self.particles.push(particle);
        Ok(id)
    }

    /// Existing handle for `key`, or a freshly inserted default particle.
    pub fn intern_particle(&mut self, key: ParticleKey) -> ParticleId {
        if let Some(&id) = self.particle_index.get(&key) {
            return id;
        }
        let id = ParticleId(self.particles.len());
        self.particle_index.insert(key.clone(), id);
        self.particles.push(Particle::new(key));
        id
    }

    pub fn particle_id(&self, key: &ParticleKey) -> Option<ParticleId> {
        self.particle_index.get(key).copied()
    }

    /// # Panics
    /// If `id` was issued by another graph.
    pub fn particle(&self, id: ParticleId) -> &Particle {
        &self.particles[id.0]
    }

    pub fn key(&self, id: ParticleId) -> &ParticleKey {
        &self.particles[id.0].key
    }

    pub fn particles(&self) -> impl Iterator<Item = (ParticleId, &Particle)> {
        self.particles.iter().enumerate().map(|(i, p)| (ParticleId(i), p))
    }

    pub fn n_particles(&self) -> usize {
        self.particles.len()
    }

    // ---- Decays ----

    /// # Panics
    /// If `id` was issued by another graph.
    pub fn decay(&self, id: DecayId) -> &Decay {
        &self.decays[id.0]
    }

    pub fn decay_id(&self, key: &DecayKey) -> Option<DecayId> {
        self.decay_index.get(key).copied()
    }

    pub fn decays(&self) -> impl Iterator<Item = (DecayId, &Decay)> {
        self.decays.iter().enumerate().map(|(i, d)| (DecayId(i), d))
    }

    pub fn n_decays(&self) -> usize {
        self.decays.len()
    }

    /// Register the two-body decay `core -> outs` with default options.
    pub fn add_decay(&mut self, core: ParticleId, outs: &[ParticleId]) -> TopologyResult<DecayId> {
        self.add_decay_with(core, outs, DecayOptions::default())
    }

    /// Register the two-body decay `core -> outs`.
    ///
    /// Adding an identity that already exists returns the existing handle;
    /// if that record was detached it is registered now, once.
    ///
    /// # Errors
    /// - [`TopologyError::UnknownId`] for foreign handles.
    /// - [`TopologyError::NotTwoBody`] unless exactly two daughters are given.
    pub fn add_decay_with(
        &mut self, core: ParticleId, outs: &[ParticleId], opts: DecayOptions,
    ) -> TopologyResult<DecayId> {
        self.check_particle(core)?;
        if outs.len() != 2 {
            return Err(TopologyError::NotTwoBody {
                core: self.key(core).to_string(),
                found: outs.len(),
            });
        }
        let id = self.insert_decay(core, outs, opts)?;
        if !self.decays[id.0].registered {
            self.register(id);
        }
        Ok(id)
    }

    /// Store `core -> outs` without touching adjacency lists.
    ///
    /// # Errors
    /// - [`TopologyError::UnknownId`] for foreign handles.
    /// - [`TopologyError::TooFewDaughters`] for fewer than two daughters.
    pub fn add_detached_decay(
        &mut self, core: ParticleId, outs: &[ParticleId],
    ) -> TopologyResult<DecayId> {
        self.check_particle(core)?;
        if outs.len() < 2 {
            return Err(TopologyError::TooFewDaughters {
                core: self.key(core).to_string(),
                found: outs.len(),
            });
        }
        self.insert_decay(core, outs, DecayOptions::default())
    }

    /// Every complete decay chain rooted at `particle`.
    ///
    /// For each registered decay of `particle`, the chains of its daughters
    /// are combined by cartesian product; daughters without decays add no
    /// continuation. The result grows multiplicatively with depth and width.
    ///
    /// # Errors
    /// - [`TopologyError::UnknownId`] for a foreign handle.
    /// - [`TopologyError::CyclicDecay`] if registered decays form a cycle.
    pub fn chain_decay(&self, particle: ParticleId) -> TopologyResult<Vec<Vec<DecayId>>> {
        self.check_particle(particle)?;
        let mut path = Vec::new();
        self.chain_decay_inner(particle, &mut path)
    }

    /// Human-readable form of a decay, e.g. `A->B+C` in creation order.
    pub fn describe_decay(&self, id: DecayId) -> String {
        let decay = &self.decays[id.0];
        let outs: Vec<String> = decay.outs.iter().map(|&o| self.key(o).to_string()).collect();
        format!("{}->{}", self.key(decay.core), outs.join("+"))
    }

    // ---- Helper methods ----

    fn check_particle(&self, id: ParticleId) -> TopologyResult<()> {
        if id.0 >= self.particles.len() {
            return Err(TopologyError::UnknownId { kind: "particle", index: id.0 });
        }
        Ok(())
    }

    fn insert_decay(
        &mut self, core: ParticleId, outs: &[ParticleId], opts: DecayOptions,
    ) -> TopologyResult<DecayId> {
        for &o in outs {
            self.check_particle(o)?;
        }
        let key = DecayKey::new(
            self.key(core).clone(),
            outs.iter().map(|&o| self.key(o).clone()).collect(),
        );
        if let Some(&id) = self.decay_index.get(&key) {
            return Ok(id);
        }
        let coupling = match outs {
            [b, c] => Some(self.coupling_for(core, *b, *c, opts.p_break)),
            _ => None,
        };
        let id = DecayId(self.decays.len());
        self.decay_index.insert(key.clone(), id);
        self.decays.push(Decay {
            key,
            core,
            outs: outs.to_vec(),
            p_break: opts.p_break,
            curve_style: opts.curve_style,
            registered: false,
            coupling,
        });
        Ok(id)
    }

    fn register(&mut self, id: DecayId) {
        let core = self.decays[id.0].core;
        self.particles[core.0].decays.push(id);
        let mut outs = self.decays[id.0].outs.clone();
        outs.sort();
        outs.dedup();
        for o in outs {
            self.particles[o.0].creators.push(id);
        }
        self.decays[id.0].registered = true;
    }

    fn coupling_for(
        &mut self, core: ParticleId, b: ParticleId, c: ParticleId, p_break: bool,
    ) -> Arc<SpinCoupling> {
        let (pa, pb, pc) = (&self.particles[core.0], &self.particles[b.0], &self.particles[c.0]);
        let key = (pa.j, pb.j, pc.j, pa.parity, pb.parity, pc.parity, p_break);
        self.couplings
            .entry(key)
            .or_insert_with(|| {
                Arc::new(SpinCoupling::new(
                    key.0,
                    key.1,
                    key.2,
                    Some(key.3),
                    Some(key.4),
                    Some(key.5),
                    key.6,
                ))
            })
            .clone()
    }

    fn chain_decay_inner(
        &self, particle: ParticleId, path: &mut Vec<ParticleId>,
    ) -> TopologyResult<Vec<Vec<DecayId>>> {
        if path.contains(&particle) {
            return Err(TopologyError::CyclicDecay { name: self.key(particle).to_string() });
        }
        path.push(particle);
        let mut out = Vec::new();
        for &d in &self.particles[particle.0].decays {
            let mut parts: Vec<Vec<Vec<DecayId>>> = vec![vec![vec![d]]];
            for &o in &self.decays[d.0].outs {
                let sub = self.chain_decay_inner(o, path)?;
                if !sub.is_empty() {
                    parts.push(sub);
                }
            }
            out.extend(cross_combine(&parts));
        }
        path.pop();
        Ok(out)
    }
}

/// Cartesian product of lists of partial chains, concatenating one entry
/// from each list (first list varies slowest).
fn cross_combine(parts: &[Vec<Vec<DecayId>>]) -> Vec<Vec<DecayId>> {
    let Some((head, tail)) = parts.split_first() else {
        return Vec::new();
    };
    let rest = cross_combine(tail);
    let mut out = Vec::new();
    for h in head {
        if rest.is_empty() {
            out.push(h.clone());
            continue;
        }
        for r in &rest {
            let mut chain = h.clone();
            chain.extend_from_slice(r);
            out.push(chain);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Key parsing, display and ordering.
    // - Duplicate particle rejection and interning.
    // - Idempotent decay registration and adjacency lists.
    // - Spin-coupling sharing between decays with equal quantum numbers.
    // - Cross-product expansion in `chain_decay`.
    //
    // They intentionally DO NOT cover:
    // - Chain validation and canonical forms (see `particle::chain`).
    // -------------------------------------------------------------------------

    fn add(graph: &mut ParticleGraph, name: &str) -> ParticleId {
        graph.add_particle(Particle::new(name)).expect("particle should be new")
    }

    #[test]
    // Purpose
    // -------
    // Check key parsing, display and ordering.
    //
    // Given
    // -----
    // - "R:1", "R", "a:b" and keys ordered by (name, index).
    //
    // Expect
    // ------
    // - Index suffix parsed only when numeric; display round-trips.
    fn particle_key_parses_and_orders() {
        let r1 = ParticleKey::parse("R:1");
        let r0 = ParticleKey::parse("R");
        let odd = ParticleKey::parse("a:b");

        assert_eq!(r1, ParticleKey::with_index("R", 1));
        assert_eq!(odd, ParticleKey::new("a:b"));
        assert_eq!(r1.to_string(), "R:1");
        assert_eq!(r0.to_string(), "R");
        assert!(r0 < r1);
        assert!(ParticleKey::new("A") < ParticleKey::new("B"));
    }

    #[test]
    // Purpose
    // -------
    // Ensure duplicates are rejected and interning reuses records.
    //
    // Given
    // -----
    // - A graph holding particle "A".
    //
    // Expect
    // ------
    // - Adding "A" again fails; interning "A" returns the same handle;
    //   interning "B" creates a default particle (J = 0, P = -).
    fn duplicate_particles_are_rejected_and_interning_reuses() {
        // Arrange
        let mut graph = ParticleGraph::new();
        let a = add(&mut graph, "A");

        // Act
        let dup = graph.add_particle(Particle::new("A"));
        let a_again = graph.intern_particle(ParticleKey::new("A"));
        let b = graph.intern_particle(ParticleKey::new("B"));

        // Assert
        assert!(matches!(dup, Err(TopologyError::DuplicateParticle { .. })));
        assert_eq!(a, a_again);
        assert_eq!(graph.particle(b).j(), Spin::ZERO);
        assert_eq!(graph.particle(b).parity(), Parity::Minus);
        assert_eq!(graph.n_particles(), 2);
    }

    #[test]
    // Purpose
    // -------
    // Verify idempotent registration by (core, sorted daughters).
    //
    // Given
    // -----
    // - A -> B + C added twice, the second time with daughters swapped.
    //
    // Expect
    // ------
    // - One decay record; adjacency lists hold it exactly once.
    fn add_decay_is_idempotent() {
        // Arrange
        let mut graph = ParticleGraph::new();
        let (a, b, c) = (add(&mut graph, "A"), add(&mut graph, "B"), add(&mut graph, "C"));

        // Act
        let d1 = graph.add_decay(a, &[b, c]).expect("valid decay");
        let d2 = graph.add_decay(a, &[c, b]).expect("valid decay");

        // Assert
        assert_eq!(d1, d2);
        assert_eq!(graph.n_decays(), 1);
        assert_eq!(graph.particle(a).decays(), &[d1]);
        assert_eq!(graph.particle(b).creators(), &[d1]);
        assert_eq!(graph.particle(c).creators(), &[d1]);
        assert_eq!(graph.describe_decay(d1), "A->B+C");
        assert_eq!(graph.decay(d1).key().to_string(), "A->B+C");
    }

    #[test]
    // Purpose
    // -------
    // Check that detached decays stay out of adjacency until registered.
    //
    // Given
    // -----
    // - A detached A -> B + C, later registered through `add_decay`.
    //
    // Expect
    // ------
    // - No adjacency before; exactly one entry after; same handle.
    fn detached_decay_registers_once_on_add() {
        // Arrange
        let mut graph = ParticleGraph::new();
        let (a, b, c) = (add(&mut graph, "A"), add(&mut graph, "B"), add(&mut graph, "C"));

        // Act
        let detached = graph.add_detached_decay(a, &[b, c]).expect("valid decay");
        let before = graph.particle(a).decays().len();
        let registered = graph.add_decay(a, &[b, c]).expect("valid decay");

        // Assert
        assert_eq!(before, 0);
        assert_eq!(detached, registered);
        assert!(graph.decay(registered).is_registered());
        assert_eq!(graph.particle(a).decays(), &[registered]);
    }

    #[test]
    // Purpose
    // -------
    // Reject malformed decays.
    //
    // Given
    // -----
    // - A three-body registered decay and a one-body detached decay.
    //
    // Expect
    // ------
    // - NotTwoBody and TooFewDaughters.
    fn malformed_decays_are_rejected() {
        let mut graph = ParticleGraph::new();
        let (a, b, c) = (add(&mut graph, "A"), add(&mut graph, "B"), add(&mut graph, "C"));
        let d = add(&mut graph, "D");

        assert!(matches!(graph.add_decay(a, &[b, c, d]), Err(TopologyError::NotTwoBody { .. })));
        assert!(matches!(
            graph.add_detached_decay(a, &[b]),
            Err(TopologyError::TooFewDaughters { .. })
        ));
        assert!(matches!(
            graph.add_decay(ParticleId(99), &[b, c]),
            Err(TopologyError::UnknownId { .. })
        ));
    }

    #[test]
    // Purpose
    // -------
    // Verify that couplings are computed per decay and shared by quantum
    // numbers.
    //
    // Given
    // -----
    // - A(1,-) -> B(0,-) + C(0,-) and X(1,-) -> B + C.
    //
    // Expect
    // ------
    // - Both couplings equal (L=1, S=0) and point at the same allocation.
    fn spin_couplings_are_shared_by_quantum_numbers() {
        // Arrange
        let mut graph = ParticleGraph::new();
        let one = Spin::ONE;
        let a = graph.add_particle(Particle::new("A").with_spin(one).unwrap()).unwrap();
        let x = graph.add_particle(Particle::new("X").with_spin(one).unwrap()).unwrap();
        let (b, c) = (add(&mut graph, "B"), add(&mut graph, "C"));

        // Act
        let d1 = graph.add_decay(a, &[b, c]).unwrap();
        let d2 = graph.add_decay(x, &[b, c]).unwrap();

        // Assert
        let c1 = graph.decay(d1).coupling().expect("two-body decay has a coupling");
        let c2 = graph.decay(d2).coupling().expect("two-body decay has a coupling");
        assert_eq!(c1.l_list(), vec![1]);
        assert!(std::ptr::eq(c1, c2));
    }

    #[test]
    // Purpose
    // -------
    // Check the cross-product expansion of registered decays.
    //
    // Given
    // -----
    // - A -> R + D with R -> B + C or R -> B + E (two decays of R),
    //   and A -> S + B with S having no decays.
    //
    // Expect
    // ------
    // - Three chains: [A->R+D, R->B+C], [A->R+D, R->B+E], [A->S+B].
    fn chain_decay_expands_cartesian_products() {
        // Arrange
        let mut graph = ParticleGraph::new();
        let names = ["A", "R", "S", "B", "C", "D", "E"];
        let ids: Vec<ParticleId> = names.iter().map(|n| add(&mut graph, n)).collect();
        let (a, r, s, b, c, d, e) = (ids[0], ids[1], ids[2], ids[3], ids[4], ids[5], ids[6]);
        let a_rd = graph.add_decay(a, &[r, d]).unwrap();
        let a_sb = graph.add_decay(a, &[s, b]).unwrap();
        let r_bc = graph.add_decay(r, &[b, c]).unwrap();
        let r_be = graph.add_decay(r, &[b, e]).unwrap();

        // Act
        let chains = graph.chain_decay(a).expect("acyclic graph");

        // Assert
        assert_eq!(chains, vec![vec![a_rd, r_bc], vec![a_rd, r_be], vec![a_sb]]);
    }

    #[test]
    // Purpose
    // -------
    // Detect cycles among registered decays.
    //
    // Given
    // -----
    // - A -> B + C and B -> A + C.
    //
    // Expect
    // ------
    // - CyclicDecay instead of unbounded recursion.
    fn chain_decay_reports_cycles() {
        let mut graph = ParticleGraph::new();
        let (a, b, c) = (add(&mut graph, "A"), add(&mut graph, "B"), add(&mut graph, "C"));
        graph.add_decay(a, &[b, c]).unwrap();
        graph.add_decay(b, &[a, c]).unwrap();

        assert!(matches!(graph.chain_decay(a), Err(TopologyError::CyclicDecay { .. })));
    }
}
