//! Error surface for particle graphs and decay-chain topologies.
//!
//! Every variant describes a malformed or inconsistent topology
//! specification. These errors are raised at construction time and are
//! never recoverable for the same input; callers fix the input and rebuild.

/// Result alias for topology construction and comparison.
pub type TopologyResult<T> = Result<T, TopologyError>;

#[derive(Debug, Clone, PartialEq)]
pub enum TopologyError {
    // ---- Particles ----
    /// A particle with the same identity is already registered.
    DuplicateParticle {
        name: String,
    },

    /// Spin must be a non-negative multiple of 1/2.
    InvalidSpin {
        value: f64,
    },

    /// Particle name must be non-empty.
    InvalidParticleName {
        name: String,
    },

    /// Identifier does not refer to a particle or decay of this graph.
    UnknownId {
        kind: &'static str,
        index: usize,
    },

    // ---- Decays ----
    /// Registered decays are restricted to two daughters.
    NotTwoBody {
        core: String,
        found: usize,
    },

    /// A decay needs at least two daughters.
    TooFewDaughters {
        core: String,
        found: usize,
    },

    /// Registered decays lead back to a particle already on the path.
    CyclicDecay {
        name: String,
    },

    // ---- Chains ----
    /// A chain must hold at least one decay.
    EmptyChain,

    /// No particle appears only as a core.
    NoTopParticle,

    /// More than one particle appears only as a core.
    MultipleTopParticles {
        tops: Vec<String>,
    },

    /// A particle is the core of more than one decay in the same chain.
    ParticleDecaysTwice {
        name: String,
    },

    /// A particle is the daughter of more than one decay in the same chain.
    ParticleProducedTwice {
        name: String,
    },

    /// Bottom-up resolution stalled before reaching the top (cycle or
    /// disconnected edges).
    UnresolvedChain {
        pending: usize,
    },

    // ---- Topology algebra ----
    /// Topology generation needs at least two final particles.
    TooFewFinals {
        found: usize,
    },

    /// No grouping of built nodes reproduces a descendant set.
    ReconstructionFailed {
        particle: String,
    },

    /// Two chains could not be put into a one-to-one correspondence.
    NoMappingFound {
        reason: String,
    },

    // ---- Groups ----
    /// A decay group must hold at least one chain.
    EmptyGroup,

    /// Chains of one group must share the same top particle.
    MismatchedTop {
        expected: String,
        found: String,
    },

    /// Chains of one group must share the same final state.
    MismatchedFinals {
        expected: Vec<String>,
        found: Vec<String>,
    },
}

impl std::error::Error for TopologyError {}

impl std::fmt::Display for TopologyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Particles ----
            TopologyError::DuplicateParticle { name } => {
                write!(f, "Particle '{name}' is already registered")
            }
            TopologyError::InvalidSpin { value } => {
                write!(f, "Invalid spin {value}: must be a non-negative multiple of 1/2")
            }
            TopologyError::InvalidParticleName { name } => {
                write!(f, "Invalid particle name '{name}'")
            }
            TopologyError::UnknownId { kind, index } => {
                write!(f, "Unknown {kind} id {index}")
            }

            // ---- Decays ----
            TopologyError::NotTwoBody { core, found } => {
                write!(f, "Decay of '{core}' has {found} daughters, registered decays are two-body")
            }
            TopologyError::TooFewDaughters { core, found } => {
                write!(f, "Decay of '{core}' has {found} daughters, at least 2 are required")
            }
            TopologyError::CyclicDecay { name } => {
                write!(f, "Registered decays of '{name}' form a cycle")
            }

            // ---- Chains ----
            TopologyError::EmptyChain => write!(f, "Decay chain has no decays"),
            TopologyError::NoTopParticle => {
                write!(f, "Decay chain has no top particle")
            }
            TopologyError::MultipleTopParticles { tops } => {
                write!(f, "Decay chain has multiple top particles: {}", tops.join(", "))
            }
            TopologyError::ParticleDecaysTwice { name } => {
                write!(f, "Particle '{name}' decays more than once in the chain")
            }
            TopologyError::ParticleProducedTwice { name } => {
                write!(f, "Particle '{name}' is produced more than once in the chain")
            }
            TopologyError::UnresolvedChain { pending } => {
                write!(f, "Decay chain could not be resolved, {pending} decays left pending")
            }

            // ---- Topology algebra ----
            TopologyError::TooFewFinals { found } => {
                write!(f, "Topology generation needs at least 2 final particles, found {found}")
            }
            TopologyError::ReconstructionFailed { particle } => {
                write!(f, "Not found in searching: no decay reproduces '{particle}'")
            }
            TopologyError::NoMappingFound { reason } => {
                write!(f, "No mapping found between decay chains: {reason}")
            }

            // ---- Groups ----
            TopologyError::EmptyGroup => write!(f, "Decay group has no chains"),
            TopologyError::MismatchedTop { expected, found } => {
                write!(f, "Decay group top mismatch: expected '{expected}', found '{found}'")
            }
            TopologyError::MismatchedFinals { expected, found } => {
                write!(
                    f,
                    "Decay group final-state mismatch: expected [{}], found [{}]",
                    expected.join(", "),
                    found.join(", ")
                )
            }
        }
    }
}
