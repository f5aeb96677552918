//! nll_optimizer::builders — L-BFGS solver construction helpers.
//!
//! Purpose
//! -------
//! Build the L-BFGS solvers used by the NLL minimizer from [`FitOptions`],
//! so higher-level code can request a configured solver without touching
//! Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Construct L-BFGS with either Hager–Zhang or More–Thuente line search.
//! - Apply the optional gradient and cost-change tolerances through the
//!   shared [`configure_lbfgs`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Solvers operate on the canonical numeric types [`Theta`], [`Grad`] and
//!   [`Cost`].
//! - The history length is `opts.lbfgs_mem`, or `DEFAULT_LBFGS_MEM` when
//!   unset.
//! - Tolerances rejected by Argmin surface as [`OptError`](crate::optimization::errors::OptError)
//!   through `From<argmin::core::Error>`.
//!
//! Conventions
//! -----------
//! - Builders set neither `theta0` nor `max_iters`; the runner applies both,
//!   since the iteration budget shrinks across restarts.
//!
//! Testing notes
//! -------------
//! - Unit tests check construction for both line searches with and without
//!   an explicit history length; full solves are exercised in `api`.
use argmin::solver::quasinewton::LBFGS;

use crate::optimization::{
    errors::OptResult,
    nll_optimizer::{
        traits::FitOptions,
        types::{Cost, Grad, HagerZhangLS, LbfgsHagerZhang, LbfgsMoreThuente, MoreThuenteLS, Theta},
    },
};

/// Construct L-BFGS with Hager–Zhang line search and the tolerances from
/// `opts`.
///
/// # Errors
/// `OptError` (via `From<argmin::core::Error>`) when Argmin rejects a
/// tolerance.
pub fn build_optimizer_hager_zhang(opts: &FitOptions) -> OptResult<LbfgsHagerZhang> {
    let hager_zhang = HagerZhangLS::new();
    let lbfgs = LbfgsHagerZhang::new(hager_zhang, opts.lbfgs_mem());
    configure_lbfgs(lbfgs, opts)
}

/// Construct L-BFGS with More–Thuente line search and the tolerances from
/// `opts`.
///
/// # Errors
/// `OptError` (via `From<argmin::core::Error>`) when Argmin rejects a
/// tolerance.
pub fn build_optimizer_more_thuente(opts: &FitOptions) -> OptResult<LbfgsMoreThuente> {
    let more_thuente = MoreThuenteLS::new();
    let lbfgs = LbfgsMoreThuente::new(more_thuente, opts.lbfgs_mem());
    configure_lbfgs(lbfgs, opts)
}

/// Apply the optional tolerances of `opts` to an L-BFGS solver, whatever
/// its line search.
///
/// A `None` tolerance leaves Argmin's default in effect.
///
/// # Errors
/// `OptError` (via `From<argmin::core::Error>`) when `with_tolerance_grad`
/// or `with_tolerance_cost` rejects a value.
pub fn configure_lbfgs<L>(
    mut solver: LBFGS<L, Theta, Grad, Cost>, opts: &FitOptions,
) -> OptResult<LBFGS<L, Theta, Grad, Cost>> {
    if let Some(g) = opts.tols.tol_grad {
        solver = solver.with_tolerance_grad(g)?;
    }
    if let Some(c) = opts.tols.tol_cost {
        solver = solver.with_tolerance_cost(c)?;
    }
    Ok(solver)
}
