//! coupling::barrier — Blatt–Weisskopf angular-momentum barrier factors.
//!
//! The barrier polynomial for orbital momentum `L` is
//! `P_L(z) = |Σ_k a_k i^k x^(L-k)|²` with `x = q·d`, `z = x²` and
//! `a_k = (L+k)! / (k! (L-k)! 2^k)`, i.e. the squared modulus of the reduced
//! spherical Hankel function. This gives `1`, `z + 1`, `z² + 3z + 9`,
//! `z³ + 6z² + 45z + 225`, ... for any `L`.
use ndarray::{Array1, Array2};

/// Default interaction radius `d` (GeV⁻¹).
pub const DEFAULT_BARRIER_RADIUS: f64 = 3.0;

/// Blatt–Weisskopf polynomial `P_L(z)` evaluated at `x = q·d`.
pub fn blatt_weisskopf_poly(l: u32, x: f64) -> f64 {
    let l = l as usize;
    let mut real = 0.0;
    let mut imag = 0.0;
    let mut a_k = 1.0;
    for k in 0..=l {
        if k > 0 {
            // a_k / a_{k-1} = (L+k)(L-k+1) / (2k)
            a_k *= ((l + k) * (l - k + 1)) as f64 / (2 * k) as f64;
        }
        let term = a_k * x.powi((l - k) as i32);
        match k % 4 {
            0 => real += term,
            1 => imag += term,
            2 => real -= term,
            _ => imag -= term,
        }
    }
    real * real + imag * imag
}

/// Ratio `B'_L(q, q0) = sqrt(P_L(q0·d) / P_L(q·d))`.
pub fn bprime(l: u32, q: f64, q0: f64, d: f64) -> f64 {
    (blatt_weisskopf_poly(l, q0 * d) / blatt_weisskopf_poly(l, q * d)).sqrt()
}

/// Barrier factors `q^L · B'_L(q, q0, d)` for every `L` in `l_list`.
///
/// Returns an array of shape `(q.len(), l_list.len())`; column `k` belongs
/// to `l_list[k]`.
pub fn barrier_factor(l_list: &[u32], q: &Array1<f64>, q0: f64, d: f64) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros((q.len(), l_list.len()));
    for (k, &l) in l_list.iter().enumerate() {
        for (i, &qi) in q.iter().enumerate() {
            out[[i, k]] = qi.powi(l as i32) * bprime(l, qi, q0, d);
        }
    }
    out
}
