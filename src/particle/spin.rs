//! particle::spin — half-integer angular momenta and intrinsic parity.
//!
//! Purpose
//! -------
//! Represent total spins `J` and spin projections `λ` exactly. Half-integer
//! values are stored as twice their value in an `i32`, so triangle checks,
//! range iteration, and parity exponents never touch floating point.
//!
//! Conventions
//! -----------
//! - [`Spin`] is signed so the same type carries spins and helicities;
//!   non-negativity of a particle's `J` is enforced where particles are
//!   built.
//! - [`Parity`] is a two-valued sign; multiplication follows `±1` algebra.
use crate::particle::errors::{TopologyError, TopologyResult};
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// Half-integer angular momentum value or projection, stored doubled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Spin(i32);

impl Spin {
    pub const ZERO: Spin = Spin(0);
    pub const HALF: Spin = Spin(1);
    pub const ONE: Spin = Spin(2);

    /// Build from twice the physical value (`from_twice(3)` is `3/2`).
    pub const fn from_twice(twice: i32) -> Self {
        Spin(twice)
    }

    /// Build from an integer value.
    pub const fn from_int(value: i32) -> Self {
        Spin(2 * value)
    }

    /// Build from a float that must be an exact multiple of `1/2`.
    ///
    /// # Errors
    /// - [`TopologyError::InvalidSpin`] when `value` is non-finite or not a
    ///   multiple of `1/2`.
    pub fn from_f64(value: f64) -> TopologyResult<Self> {
        let doubled = 2.0 * value;
        if !doubled.is_finite() || (doubled - doubled.round()).abs() > 1e-9 {
            return Err(TopologyError::InvalidSpin { value });
        }
        Ok(Spin(doubled.round() as i32))
    }

    pub const fn twice(self) -> i32 {
        self.0
    }

    pub fn value(self) -> f64 {
        f64::from(self.0) / 2.0
    }

    pub const fn is_integer(self) -> bool {
        self.0 % 2 == 0
    }

    pub const fn abs(self) -> Self {
        Spin(self.0.abs())
    }

    /// Multiplicity `2J + 1` of a spin value.
    pub const fn multiplicity(self) -> usize {
        (self.0 + 1) as usize
    }

    /// Projections `-J, -J+1, ..., J` in increasing order.
    ///
    /// Returns an empty list for negative `self`.
    pub fn projections(self) -> Vec<Spin> {
        (-self.0..=self.0).step_by(2).map(Spin).collect()
    }

    /// Values `lo, lo+1, ..., hi` (inclusive), empty when `lo > hi`.
    pub fn range_inclusive(lo: Spin, hi: Spin) -> Vec<Spin> {
        if lo.0 > hi.0 {
            return Vec::new();
        }
        (lo.0..=hi.0).step_by(2).map(Spin).collect()
    }
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_integer() { write!(f, "{}", self.0 / 2) } else { write!(f, "{}/2", self.0) }
    }
}

impl Add for Spin {
    type Output = Spin;
    fn add(self, rhs: Spin) -> Spin {
        Spin(self.0 + rhs.0)
    }
}

impl Sub for Spin {
    type Output = Spin;
    fn sub(self, rhs: Spin) -> Spin {
        Spin(self.0 - rhs.0)
    }
}

impl Neg for Spin {
    type Output = Spin;
    fn neg(self) -> Spin {
        Spin(-self.0)
    }
}

/// Intrinsic parity `P = ±1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Parity {
    Plus,
    Minus,
}

impl Parity {
    /// Parity from a sign: non-negative values map to `Plus`.
    pub fn from_sign(sign: i32) -> Self {
        if sign >= 0 { Parity::Plus } else { Parity::Minus }
    }

    pub const fn sign(self) -> i32 {
        match self {
            Parity::Plus => 1,
            Parity::Minus => -1,
        }
    }

    /// Orbital parity `(-1)^L`.
    pub const fn orbital(l: u32) -> Self {
        if l % 2 == 0 { Parity::Plus } else { Parity::Minus }
    }
}

impl Mul for Parity {
    type Output = Parity;
    fn mul(self, rhs: Parity) -> Parity {
        if self == rhs { Parity::Plus } else { Parity::Minus }
    }
}

impl fmt::Display for Parity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Parity::Plus => write!(f, "+"),
            Parity::Minus => write!(f, "-"),
        }
    }
}
