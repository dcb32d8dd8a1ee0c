//! HiGHS backend for trackopt.
//!
//! [`HighsBackend`] implements [`trackopt_solver::Backend`] by building a
//! HiGHS row problem from an [`trackopt_solver::IlpProblem`].

mod backend;
pub mod ffi;
mod status;

pub use backend::HighsBackend;
pub use ffi::{HighsModel, HighsModelError, HighsOption, HighsStatus, ObjectiveSense, highs_version};
