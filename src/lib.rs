//! rust_pwa — decay topologies, LS couplings and batched likelihoods for
//! partial-wave analysis.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and, with the `python-bindings`
//! feature, as the PyO3 bridge that exposes the spin-coupling tables and
//! topology enumeration to Python via the `_rust_pwa` extension module.
//!
//! Key behaviors
//! -------------
//! - `particle`: particle/decay graph, decay chains, topology identity,
//!   mapping and enumeration.
//! - `coupling`: allowed `(L, S)` couplings, Clebsch–Gordan recoupling
//!   matrices and Blatt–Weisskopf barrier factors.
//! - `likelihood`: weighted NLL with analytic gradient and Hessian, exact
//!   chunked summation and simultaneous fits.
//! - `optimization`: L-BFGS minimization of any NLL with restarts.
//! - `inference`: parameter errors from the Hessian at the minimum.
//!
//! Invariants & assumptions
//! ------------------------
//! - All numerical work lives in the inner modules; the bindings below only
//!   convert arguments and map errors.
//!
//! Conventions
//! -----------
//! - Errors from core Rust code are propagated as rich error types
//!   internally and converted to `ValueError` at the PyO3 boundary.
//! - Spins cross the boundary as floats (multiples of 1/2) and parities as
//!   signed integers.
//!
//! Testing notes
//! -------------
//! - Core behavior is covered by unit tests in the inner modules and by the
//!   end-to-end pipeline test under `tests/`.

pub mod coupling;
pub mod inference;
pub mod likelihood;
pub mod optimization;
pub mod particle;

#[cfg(feature = "python-bindings")]
use numpy::{IntoPyArray, PyArray2};

#[cfg(feature = "python-bindings")]
use pyo3::{exceptions::PyValueError, prelude::*};

#[cfg(feature = "python-bindings")]
use crate::{
    coupling::{LsPair, SpinCoupling},
    particle::{
        DecayGroup, Parity, ParticleGraph, ParticleKey, Spin, TopologyError,
        graph::Particle,
    },
};

#[cfg(feature = "python-bindings")]
fn to_py_err(err: TopologyError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

#[cfg(feature = "python-bindings")]
fn spin_arg(value: f64) -> PyResult<Spin> {
    Spin::from_f64(value).map_err(to_py_err)
}

#[cfg(feature = "python-bindings")]
fn parity_arg(sign: Option<i32>) -> Option<Parity> {
    sign.map(Parity::from_sign)
}

/// Allowed `(L, S)` couplings for `A -> B C` as a list of `(L, S)` tuples.
///
/// Parity arguments are signs (+1 / -1); omitting any of them, or setting
/// `p_break`, disables the parity rule.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (ja, jb, jc, pa = None, pb = None, pc = None, p_break = false))]
fn ls_list(
    ja: f64, jb: f64, jc: f64, pa: Option<i32>, pb: Option<i32>, pc: Option<i32>, p_break: bool,
) -> PyResult<Vec<(u32, f64)>> {
    let pairs = coupling::ls_list(
        spin_arg(ja)?,
        spin_arg(jb)?,
        spin_arg(jc)?,
        parity_arg(pa),
        parity_arg(pb),
        parity_arg(pc),
        p_break,
    );
    Ok(pairs.iter().map(|p: &LsPair| (p.l, p.s.value())).collect())
}

/// Helicity recoupling matrix of `A -> B C`, shape
/// `((2jB+1)(2jC+1), n_ls)`, with columns in `ls_list` order.
#[cfg(feature = "python-bindings")]
#[pyfunction]
#[pyo3(signature = (ja, jb, jc, pa = None, pb = None, pc = None, p_break = false))]
fn cg_matrix<'py>(
    py: Python<'py>, ja: f64, jb: f64, jc: f64, pa: Option<i32>, pb: Option<i32>,
    pc: Option<i32>, p_break: bool,
) -> PyResult<Bound<'py, PyArray2<f64>>> {
    let coupling = SpinCoupling::new(
        spin_arg(ja)?,
        spin_arg(jb)?,
        spin_arg(jc)?,
        parity_arg(pa),
        parity_arg(pb),
        parity_arg(pc),
        p_break,
    );
    Ok(coupling.cg_matrix().clone().into_pyarray_bound(py))
}

/// Every binary decay topology from `top` to `finals`, one string per chain
/// listing its decays as `core->out1+out2`.
#[cfg(feature = "python-bindings")]
#[pyfunction]
fn decay_topologies(top: &str, finals: Vec<String>) -> PyResult<Vec<String>> {
    let mut graph = ParticleGraph::new();
    let top = graph.add_particle(Particle::new(ParticleKey::parse(top))).map_err(to_py_err)?;
    let finals = finals
        .iter()
        .map(|name| graph.add_particle(Particle::new(ParticleKey::parse(name))))
        .collect::<Result<Vec<_>, _>>()
        .map_err(to_py_err)?;
    let group = DecayGroup::from_particles(&mut graph, top, &finals).map_err(to_py_err)?;
    Ok(group
        .iter()
        .map(|chain| {
            chain.decay_keys().iter().map(|k| k.to_string()).collect::<Vec<_>>().join(", ")
        })
        .collect())
}

/// _rust_pwa — PyO3 module initializer for the Python extension.
///
/// Registers `ls_list`, `cg_matrix` and `decay_topologies`. Invoked by
/// Python when importing the compiled extension.
#[cfg(feature = "python-bindings")]
#[pymodule]
fn _rust_pwa<'py>(_py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(ls_list, m)?)?;
    m.add_function(wrap_pyfunction!(cg_matrix, m)?)?;
    m.add_function(wrap_pyfunction!(decay_topologies, m)?)?;
    Ok(())
}

#[cfg(all(test, feature = "python-bindings"))]
mod tests {
    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The bindings and the numerics share one `ndarray` version, so crate
    //   arrays convert to NumPy without copies through a second `ndarray`.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // A crate-side recoupling matrix is a `numpy::ndarray` array.
    //
    // Given
    // -----
    // - The `1 -> 1/2 1/2` coupling matrix built by `SpinCoupling`.
    //
    // Expect
    // ------
    // - It type-checks as `numpy::ndarray::Array2<f64>` with 4 rows and one
    //   column per `(L, S)` pair.
    fn bindings_share_the_ndarray_version() {
        let half = super::Spin::from_f64(0.5).unwrap();
        let one = super::Spin::from_f64(1.0).unwrap();
        let coupling = super::SpinCoupling::new(one, half, half, None, None, None, false);

        let matrix: numpy::ndarray::Array2<f64> = coupling.cg_matrix().clone();

        assert_eq!(matrix.nrows(), 4);
        assert_eq!(matrix.ncols(), coupling.ls_list().len());
    }
}
