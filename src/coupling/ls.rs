//! coupling::ls — allowed (L, S) pairs and helicity recoupling matrices.
//!
//! Purpose
//! -------
//! For a two-body decay `A -> B C`, enumerate the orbital angular momentum
//! `L` and total daughter spin `S` combinations allowed by angular-momentum
//! addition and (optionally) parity conservation, and build the fixed
//! Clebsch–Gordan block that maps LS couplings onto helicity amplitudes.
//!
//! Key behaviors
//! -------------
//! - [`ls_list`] walks `S` over `|jB - jC| ..= jB + jC` and, inside each `S`,
//!   `L` over `|jA - S| ..= jA + S`. Ordering is increasing `S`, then
//!   increasing `L`.
//! - Parity is enforced when all three parities are known and
//!   `p_break == false`: only `L` with `(-1)^L = pA·pB·pC` survive.
//! - [`cg_matrix`] returns a `(2jB+1)(2jC+1) × |ls|` matrix, rows ordered
//!   by `λB` (outer) then `λC` (inner), both increasing.
//! - [`SpinCoupling`] bundles both results for one decay; it is computed
//!   once when the decay is created and shared read-only afterwards.
//!
//! Invariants & assumptions
//! ------------------------
//! - `L` is always integral. An `S` for which `jA - S` is half-integral
//!   admits no `L` and contributes nothing.
//! - An empty list is a valid result; deciding whether it is acceptable
//!   belongs to the amplitude layer.
//!
//! Conventions
//! -----------
//! - Coupling-parameter names follow `"{prefix}_l{L}_s{S}_r"` and
//!   `"{prefix}_l{L}_s{S}_i"` with `S` printed as a decimal.
//!
//! Testing notes
//! -------------
//! - Unit tests cover parity selection, triangle bounds, matrix shape,
//!   and a closed-form matrix entry.
use crate::coupling::{
    barrier::{DEFAULT_BARRIER_RADIUS, barrier_factor},
    cg::clebsch_gordan,
};
use crate::particle::spin::{Parity, Spin};
use ndarray::{Array1, Array2};
use std::fmt;

/// One allowed `(L, S)` coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LsPair {
    pub l: u32,
    pub s: Spin,
}

impl fmt::Display for LsPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "l{}_s{}", self.l, self.s.value())
    }
}

/// Enumerate allowed `(L, S)` couplings for `A -> B C`.
///
/// Parameters
/// ----------
/// - `ja`, `jb`, `jc`: spins of core and daughters.
/// - `pa`, `pb`, `pc`: parities; any `None` disables the parity rule.
/// - `p_break`: when `true`, keep every triangle-valid pair.
///
/// Returns
/// -------
/// Pairs ordered by increasing `S`, then increasing `L`.
pub fn ls_list(
    ja: Spin, jb: Spin, jc: Spin, pa: Option<Parity>, pb: Option<Parity>, pc: Option<Parity>,
    p_break: bool,
) -> Vec<LsPair> {
    let parity_class = match (pa, pb, pc, p_break) {
        (Some(a), Some(b), Some(c), false) => Some(a * b * c),
        _ => None,
    };
    let mut out = Vec::new();
    for s in Spin::range_inclusive((jb - jc).abs(), jb + jc) {
        if !(ja - s).is_integer() {
            continue;
        }
        for l in Spin::range_inclusive((ja - s).abs(), ja + s) {
            let l = (l.twice() / 2) as u32;
            if parity_class.is_some_and(|p| Parity::orbital(l) != p) {
                continue;
            }
            out.push(LsPair { l, s });
        }
    }
    out
}

/// Helicity recoupling matrix for `A -> B C` over the given `(L, S)` list.
///
/// Entry `[(λB, λC), k]` is
/// `sqrt((2L+1)/(2jA+1)) · <jB λB; jC -λC | S δ> · <L 0; S δ | jA δ>` with
/// `δ = λB - λC` and `(L, S) = ls[k]`.
pub fn cg_matrix(ja: Spin, jb: Spin, jc: Spin, ls: &[LsPair]) -> Array2<f64> {
    let lambda_b = jb.projections();
    let lambda_c = jc.projections();
    let mut out = Array2::<f64>::zeros((lambda_b.len() * lambda_c.len(), ls.len()));
    let norm_a = f64::from(ja.twice() + 1);
    for (ib, &lb) in lambda_b.iter().enumerate() {
        for (ic, &lc) in lambda_c.iter().enumerate() {
            let row = ib * lambda_c.len() + ic;
            let delta = lb - lc;
            for (k, pair) in ls.iter().enumerate() {
                let l = Spin::from_int(pair.l as i32);
                let weight = (f64::from(2 * pair.l + 1) / norm_a).sqrt();
                let cg_s = clebsch_gordan(jb, lb, jc, -lc, pair.s, delta);
                if cg_s == 0.0 {
                    continue;
                }
                let cg_l = clebsch_gordan(l, Spin::ZERO, pair.s, delta, ja, delta);
                out[[row, k]] = weight * cg_s * cg_l;
            }
        }
    }
    out
}

/// Precomputed spin-coupling data for one two-body decay.
#[derive(Debug, Clone, PartialEq)]
pub struct SpinCoupling {
    ja: Spin,
    jb: Spin,
    jc: Spin,
    ls: Vec<LsPair>,
    cg: Array2<f64>,
}

impl SpinCoupling {
    pub fn new(
        ja: Spin, jb: Spin, jc: Spin, pa: Option<Parity>, pb: Option<Parity>, pc: Option<Parity>,
        p_break: bool,
    ) -> Self {
        let ls = ls_list(ja, jb, jc, pa, pb, pc, p_break);
        let cg = cg_matrix(ja, jb, jc, &ls);
        Self { ja, jb, jc, ls, cg }
    }

    pub fn spins(&self) -> (Spin, Spin, Spin) {
        (self.ja, self.jb, self.jc)
    }

    pub fn ls_list(&self) -> &[LsPair] {
        &self.ls
    }

    pub fn l_list(&self) -> Vec<u32> {
        self.ls.iter().map(|p| p.l).collect()
    }

    /// Lowest allowed orbital angular momentum, if any pair is allowed.
    pub fn min_l(&self) -> Option<u32> {
        self.ls.iter().map(|p| p.l).min()
    }

    pub fn cg_matrix(&self) -> &Array2<f64> {
        &self.cg
    }

    /// Real/imaginary coupling-parameter names, one pair per `(L, S)`.
    pub fn param_names(&self, prefix: &str) -> Vec<(String, String)> {
        self.ls
            .iter()
            .map(|p| (format!("{prefix}_{p}_r"), format!("{prefix}_{p}_i")))
            .collect()
    }

    /// Barrier factors `q^L · B'_L(q, q0)` for every `L` in [`Self::l_list`],
    /// using the default interaction radius.
    pub fn barrier_factor(&self, q: &Array1<f64>, q0: f64) -> Array2<f64> {
        barrier_factor(&self.l_list(), q, q0, DEFAULT_BARRIER_RADIUS)
    }
}
