//! particle — particle graph and decay-chain topology algebra.
//!
//! Purpose
//! -------
//! Model particles and their decays as an arena-backed graph, extract decay
//! chains from it, and compare, relabel, reconstruct and enumerate chain
//! topologies. This is the structural layer amplitude code is built on.
//!
//! Key behaviors
//! -------------
//! - [`graph::ParticleGraph`] owns every [`graph::Particle`] and
//!   [`graph::Decay`]; handles ([`graph::ParticleId`], [`graph::DecayId`])
//!   replace mutual references between particles and decays.
//! - [`chain::DecayChain`] validates a tree of decays and precomputes its
//!   sorted table and topology fingerprints.
//! - `topology` adds reconstruction from sorted tables and enumeration of all
//!   binary topologies for a final state.
//! - [`group::DecayGroup`] bundles chains sharing top and final state.
//!
//! Invariants & assumptions
//! ------------------------
//! - Particle identity is `(name, index)`; decay identity is
//!   `(core, sorted daughters)`. Both are value keys, independent of handles.
//! - Registered decays are two-body and carry a shared
//!   [`crate::coupling::SpinCoupling`]; detached decays (reconstructed or
//!   generated) may have any number of daughters and never appear in
//!   adjacency lists.
//! - Construction errors are reported as [`errors::TopologyError`] and never
//!   yield a partially built chain or group.
//!
//! Conventions
//! -----------
//! - Final-particle lists (`outs`) are ordered by particle key.
//! - Spins are stored doubled ([`spin::Spin`]) so half-integers stay exact.
//!
//! Downstream usage
//! ----------------
//! - Amplitude implementations iterate a [`group::DecayGroup`], read each
//!   decay's coupling and use [`group::DecayGroup::chains_map`] to share
//!   parameters across chains of the same shape.
//!
//! Testing notes
//! -------------
//! - Each submodule carries unit tests; `tests/` exercises the path from
//!   topology enumeration to a weighted fit.

pub mod chain;
pub mod errors;
pub mod graph;
pub mod group;
pub mod spin;
pub mod topology;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::chain::{DecayChain, SortedTable, TopologyId, TopologyMap};
pub use self::errors::{TopologyError, TopologyResult};
pub use self::graph::{
    Decay, DecayId, DecayKey, DecayOptions, Particle, ParticleGraph, ParticleId, ParticleKey,
};
pub use self::group::DecayGroup;
pub use self::spin::{Parity, Spin};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::chain::DecayChain;
    pub use super::graph::{Particle, ParticleGraph, ParticleId};
    pub use super::group::DecayGroup;
    pub use super::spin::{Parity, Spin};
}
