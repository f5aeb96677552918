//! coupling::cg — Clebsch–Gordan coefficients for half-integer spins.
//!
//! Evaluates `<j1 m1; j2 m2 | j m>` with the Racah closed form. All
//! factorial arguments are formed from doubled spins so the selection rules
//! are exact integer checks; the sum itself runs in log space through
//! `statrs` log-factorials and is exponentiated term by term.
use crate::particle::spin::Spin;
use statrs::function::factorial::ln_factorial;

/// Clebsch–Gordan coefficient `<j1 m1; j2 m2 | j m>` (Condon–Shortley phase).
///
/// Returns `0.0` whenever any selection rule fails: `m ≠ m1 + m2`, a
/// projection outside `[-j, j]` or of the wrong integrality, or a triangle
/// violation among `(j1, j2, j)`.
pub fn clebsch_gordan(j1: Spin, m1: Spin, j2: Spin, m2: Spin, j: Spin, m: Spin) -> f64 {
    let (tj1, tm1, tj2, tm2, tj, tm) =
        (j1.twice(), m1.twice(), j2.twice(), m2.twice(), j.twice(), m.twice());

    if tm != tm1 + tm2 || !projection_ok(tj1, tm1) || !projection_ok(tj2, tm2) {
        return 0.0;
    }
    if !projection_ok(tj, tm) || !triangle_ok(tj1, tj2, tj) {
        return 0.0;
    }

    // Half-differences below are integral once the checks above pass.
    let half = |x: i32| -> i64 { i64::from(x / 2) };
    let a = half(tj1 + tj2 - tj);
    let b = half(tj1 - tm1);
    let c = half(tj2 + tm2);
    let d = half(tj - tj2 + tm1);
    let e = half(tj - tj1 - tm2);

    let ln_delta = ln_fact(half(tj + tj1 - tj2)) + ln_fact(half(tj - tj1 + tj2)) + ln_fact(a)
        - ln_fact(half(tj1 + tj2 + tj) + 1);
    let ln_norm = ln_fact(half(tj + tm))
        + ln_fact(half(tj - tm))
        + ln_fact(b)
        + ln_fact(half(tj1 + tm1))
        + ln_fact(half(tj2 - tm2))
        + ln_fact(c);
    let prefactor = 0.5 * (f64::from(tj + 1).ln() + ln_delta + ln_norm);

    let k_min = 0.max(-d).max(-e);
    let k_max = a.min(b).min(c);
    let mut sum = 0.0;
    for k in k_min..=k_max {
        let ln_den = ln_fact(k)
            + ln_fact(a - k)
            + ln_fact(b - k)
            + ln_fact(c - k)
            + ln_fact(d + k)
            + ln_fact(e + k);
        let sign = if k % 2 == 0 { 1.0 } else { -1.0 };
        sum += sign * (prefactor - ln_den).exp();
    }
    sum
}

// ---- Helper methods ----

fn ln_fact(n: i64) -> f64 {
    ln_factorial(n as u64)
}

fn projection_ok(tj: i32, tm: i32) -> bool {
    tj >= 0 && tm.abs() <= tj && (tj - tm) % 2 == 0
}

fn triangle_ok(tj1: i32, tj2: i32, tj: i32) -> bool {
    tj >= (tj1 - tj2).abs() && tj <= tj1 + tj2 && (tj1 + tj2 + tj) % 2 == 0
}
