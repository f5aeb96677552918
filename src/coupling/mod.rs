//! coupling — LS coupling, Clebsch–Gordan recoupling, and barrier factors.
//!
//! Purpose
//! -------
//! Provide the per-decay angular-momentum algebra consumed by amplitude
//! evaluators: which `(L, S)` couplings a two-body decay admits, the fixed
//! recoupling matrix that turns LS couplings into helicity amplitudes, and
//! the Blatt–Weisskopf barrier factors for each `L`.
//!
//! Key behaviors
//! -------------
//! - [`ls::ls_list`] enumerates allowed pairs with optional parity
//!   conservation.
//! - [`ls::cg_matrix`] builds the `(2jB+1)(2jC+1) × |ls|` recoupling block.
//! - [`ls::SpinCoupling`] caches both for one decay; the particle graph
//!   creates one per distinct set of quantum numbers and shares it.
//! - [`barrier::barrier_factor`] evaluates `q^L · B'_L` for a list of `L`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Everything here is a pure function of `(J, P)` values and momenta; no
//!   state, no errors. Triangle and parity loops simply yield fewer pairs.
//!
//! Downstream usage
//! ----------------
//! - `particle::graph` attaches a shared [`ls::SpinCoupling`] to every
//!   registered two-body decay.
//! - Amplitude implementations read `ls_list`, `cg_matrix`, and
//!   `barrier_factor` from the decay's coupling.
//!
//! Testing notes
//! -------------
//! - Unit tests check tabulated Clebsch–Gordan values, parity selection,
//!   matrix shapes, and the closed-form low-L barrier polynomials.

pub mod barrier;
pub mod cg;
pub mod ls;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::barrier::{DEFAULT_BARRIER_RADIUS, barrier_factor, bprime};
pub use self::cg::clebsch_gordan;
pub use self::ls::{LsPair, SpinCoupling, cg_matrix, ls_list};

// ---- Optional convenience prelude for downstream crates -------------------

pub mod prelude {
    pub use super::barrier::barrier_factor;
    pub use super::ls::{LsPair, SpinCoupling, cg_matrix, ls_list};
}
