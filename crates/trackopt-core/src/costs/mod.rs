//! Learnable linear costs.
//!
//! A cost never computes objective coefficients directly. It registers its
//! [`Weight`]s with the session and adds `(variable, weight, value)` entries
//! to the [`Features`] matrix; the objective is `features · weights`.

mod distance;
mod events;
mod features;
mod selection;
mod weight;
mod weights;

use std::fmt;

use trackopt_expr::VariableId;

use crate::Solver;
use crate::error::SolverError;
use crate::graph::Attributes;

pub use distance::{EdgeDistance, Position, SymmetricDivision};
pub use events::{Appear, Disappear, Merge, Split};
pub use features::Features;
pub use selection::{EdgeSelection, NodeSelection};
pub use weight::{Weight, WeightObserver};
pub use weights::{WeightKey, Weights};

/// A set of weighted features added to a session.
pub trait Cost {
    /// Default registration name, e.g. `"EdgeSelection"`.
    fn name(&self) -> &'static str;

    /// `(field name, weight)` pairs to register before [`Cost::apply`].
    fn weights(&self) -> Vec<(&'static str, Weight)>;

    /// Add this cost's features through [`Solver::add_variable_cost`].
    fn apply(&self, solver: &mut Solver) -> Result<(), SolverError>;
}

/// Numeric value of `attribute` on a node or edge.
pub(crate) fn numeric_attribute(
    attributes: Option<&Attributes>,
    attribute: &str,
    element: &dyn fmt::Display,
) -> Result<f64, SolverError> {
    attributes
        .and_then(|attributes| attributes.get(attribute))
        .and_then(|value| value.as_f64())
        .ok_or_else(|| SolverError::MissingAttribute {
            element: element.to_string(),
            attribute: attribute.to_string(),
        })
}

/// Per-variable features of the common `weight * attribute + constant`
/// shape: `None` means no attribute term.
pub(crate) struct WeightedTerms {
    terms: Vec<(VariableId, Option<f64>)>,
}

impl WeightedTerms {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            terms: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, index: VariableId, feature: Option<f64>) {
        self.terms.push((index, feature));
    }

    /// Charge `weight * feature` and `constant * 1` per collected variable.
    pub(crate) fn charge(
        self,
        solver: &mut Solver,
        weight: &Weight,
        constant: &Weight,
    ) -> Result<(), SolverError> {
        for (index, feature) in self.terms {
            if let Some(feature) = feature {
                solver.add_variable_cost(index, feature, weight)?;
            }
            solver.add_variable_cost(index, 1.0, constant)?;
        }
        Ok(())
    }
}
