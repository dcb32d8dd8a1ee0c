//! Decision variable kinds.
//!
//! A kind declares one variable per key (a node, an edge, ...) and the
//! coupling constraints tying its variables to other kinds. The session
//! instantiates each kind at most once, on first use, and adds its coupling
//! constraints at the same time.

mod events;
mod map;
mod selected;

use std::fmt;
use std::hash::Hash;

use trackopt_expr::Constraint;
use trackopt_solver::VariableType;

use crate::Solver;
use crate::error::SolverError;
use crate::graph::TrackGraph;

pub use events::{NodeAppear, NodeDisappear, NodeMerge, NodeSplit};
pub use map::VariableMap;
pub(crate) use map::VariableRegistry;
pub use selected::{EdgeSelected, NodeSelected};

/// A class of decision variables keyed by graph elements.
pub trait VariableKind: 'static {
    /// Name used in variable handles and log lines.
    const NAME: &'static str;

    type Key: Clone + Eq + Hash + Ord + fmt::Display + fmt::Debug + 'static;

    /// Keys needing one variable each, in a deterministic order.
    fn instantiate(graph: &TrackGraph) -> Vec<Self::Key>;

    /// Constraints coupling this kind to others.
    fn instantiate_constraints(_solver: &mut Solver) -> Result<Vec<Constraint>, SolverError> {
        Ok(Vec::new())
    }

    fn variable_type() -> VariableType {
        VariableType::Binary
    }
}
