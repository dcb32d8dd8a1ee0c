//! Thin wrapper over the `highs` crate.
//!
//! This module contains the only unsafe code of the workspace: info queries
//! that the safe `highs` API does not expose.
#![allow(unsafe_code)]

use std::ffi::{CStr, CString};
use std::fmt;

use highs::{Col, HighsModelStatus, RowProblem, Sense as HighsSense, SolvedModel};
use tracing::{debug, trace, warn};

/// Objective sense for optimization
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    Minimize,
    Maximize,
}

/// Model status reported by HiGHS after a solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighsStatus {
    Optimal,
    Infeasible,
    Unbounded,
    UnboundedOrInfeasible,
    /// Stopped at the time limit; may hold a feasible incumbent.
    ReachedTimeLimit,
    /// Stopped at the iteration limit; may hold a feasible incumbent.
    ReachedIterationLimit,
    Unknown,
}

/// Errors returned by the HiGHS model wrapper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HighsModelError {
    ColumnCoefficientLengthMismatch { columns: usize, coefficients: usize },
    ColumnIndexOutOfBounds { column_index: usize, num_columns: usize },
    SolveRequired { operation: &'static str },
}

impl fmt::Display for HighsModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighsModelError::ColumnCoefficientLengthMismatch {
                columns,
                coefficients,
            } => write!(
                f,
                "columns length ({columns}) must match coefficients length ({coefficients})"
            ),
            HighsModelError::ColumnIndexOutOfBounds {
                column_index,
                num_columns,
            } => write!(
                f,
                "column index {column_index} out of bounds (num_columns = {num_columns})"
            ),
            HighsModelError::SolveRequired { operation } => {
                write!(f, "solve must be called before {operation}")
            }
        }
    }
}

impl std::error::Error for HighsModelError {}

/// Option value types for HiGHS solver configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum HighsOption {
    Bool(bool),
    Int(i32),
    Float(f64),
    Str(String),
}

/// Safe wrapper around a HiGHS row problem and its solved model.
pub struct HighsModel {
    problem: RowProblem,
    objective_sense: ObjectiveSense,
    solved: Option<SolvedModel>,
    columns: Vec<Col>,
    log_to_console: bool,
    options: Vec<(String, HighsOption)>,
    verbosity: Option<u32>,
}

impl HighsModel {
    pub fn new() -> Self {
        trace!(
            component = "highs",
            operation = "init_highs",
            status = "success",
            "Creating new HiGHS model"
        );
        HighsModel {
            problem: RowProblem::default(),
            objective_sense: ObjectiveSense::Minimize,
            solved: None,
            columns: Vec::new(),
            log_to_console: false,
            options: Vec::new(),
            verbosity: None,
        }
    }

    /// Add a continuous column and return its index.
    pub fn add_col(
        &mut self,
        lower_bound: f64,
        upper_bound: f64,
        objective_coefficient: f64,
    ) -> usize {
        self.add_col_with_integrality(lower_bound, upper_bound, objective_coefficient, false)
    }

    /// Add an integer column and return its index.
    pub fn add_integer_col(
        &mut self,
        lower_bound: f64,
        upper_bound: f64,
        objective_coefficient: f64,
    ) -> usize {
        self.add_col_with_integrality(lower_bound, upper_bound, objective_coefficient, true)
    }

    fn add_col_with_integrality(
        &mut self,
        lower_bound: f64,
        upper_bound: f64,
        objective_coefficient: f64,
        is_integer: bool,
    ) -> usize {
        self.solved = None;
        let col = if is_integer {
            self.problem
                .add_integer_column(objective_coefficient, lower_bound..=upper_bound)
        } else {
            self.problem
                .add_column(objective_coefficient, lower_bound..=upper_bound)
        };
        self.columns.push(col);
        self.columns.len() - 1
    }

    /// Add the row `lower_bound <= sum(coefficients * columns) <= upper_bound`.
    ///
    /// # Errors
    ///
    /// Returns an error if columns and coefficients have different lengths
    /// or if any column index is out of bounds.
    pub fn add_row(
        &mut self,
        lower_bound: f64,
        upper_bound: f64,
        columns: &[usize],
        coefficients: &[f64],
    ) -> Result<usize, HighsModelError> {
        if columns.len() != coefficients.len() {
            warn!(
                component = "highs",
                operation = "add_row",
                status = "error",
                columns = columns.len(),
                coefficients = coefficients.len(),
                "Column/coefficients length mismatch"
            );
            return Err(HighsModelError::ColumnCoefficientLengthMismatch {
                columns: columns.len(),
                coefficients: coefficients.len(),
            });
        }
        self.solved = None;
        let num_columns = self.columns.len();
        let mut factors = Vec::with_capacity(columns.len());
        for (column_index, coeff) in columns.iter().copied().zip(coefficients.iter().copied()) {
            let col = *self.columns.get(column_index).ok_or(
                HighsModelError::ColumnIndexOutOfBounds {
                    column_index,
                    num_columns,
                },
            )?;
            factors.push((col, coeff));
        }
        self.problem.add_row(lower_bound..=upper_bound, factors);
        Ok(self.problem.num_rows().saturating_sub(1))
    }

    pub fn set_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective_sense = sense;
    }

    pub fn objective_sense(&self) -> ObjectiveSense {
        self.objective_sense
    }

    /// Enable or disable logging to console for the next solve
    pub fn set_log_to_console(&mut self, enabled: bool) {
        self.log_to_console = enabled;
    }

    /// Set a HiGHS option for the next solve.
    pub fn set_option(&mut self, option: impl Into<String>, value: HighsOption) {
        self.options.push((option.into(), value));
    }

    pub fn set_verbosity(&mut self, level: u32) {
        self.verbosity = Some(level);
    }

    /// Number of columns added since the last solve.
    pub fn columns(&self) -> usize {
        self.columns.len()
    }

    /// Solve the model. The built problem is consumed; another solve needs
    /// the columns and rows to be added again.
    pub fn solve(&mut self) -> HighsStatus {
        debug!(
            component = "highs",
            operation = "solve",
            status = "started",
            num_cols = self.problem.num_cols(),
            num_rows = self.problem.num_rows(),
            sense = ?self.objective_sense,
            "Solving model"
        );

        let sense = match self.objective_sense {
            ObjectiveSense::Minimize => HighsSense::Minimise,
            ObjectiveSense::Maximize => HighsSense::Maximise,
        };

        let problem = std::mem::take(&mut self.problem);
        let mut model = problem.optimise(sense);
        if self.verbosity.unwrap_or(0) == 0 && !self.log_to_console {
            model.make_quiet();
        }
        if let Some(level) = self.verbosity {
            model.set_option("output_flag", level > 0);
        }
        for (option, value) in self.options.drain(..) {
            match value {
                HighsOption::Bool(val) => model.set_option(option.as_str(), val),
                HighsOption::Int(val) => model.set_option(option.as_str(), val),
                HighsOption::Float(val) => model.set_option(option.as_str(), val),
                HighsOption::Str(val) => model.set_option(option.as_str(), val.as_str()),
            }
        }
        if self.log_to_console {
            model.set_option("log_to_console", true);
            model.set_option("output_flag", true);
        }

        let solved = model.solve();
        let status = map_status(solved.status());
        trace!(
            component = "highs",
            operation = "solve",
            status = "success",
            highs_status = ?status,
            "Solution status received"
        );
        self.solved = Some(solved);
        self.columns.clear();
        self.verbosity = None;
        status
    }

    /// Objective value of the last solve, without any constant offset.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been solved yet.
    pub fn objective_value(&self) -> Result<f64, HighsModelError> {
        let solved = self.solved.as_ref().ok_or(HighsModelError::SolveRequired {
            operation: "objective_value",
        })?;
        Ok(solved.objective_value())
    }

    /// Primal column values of the last solve.
    ///
    /// # Errors
    ///
    /// Returns an error if the model has not been solved yet.
    pub fn column_values(&self) -> Result<Vec<f64>, HighsModelError> {
        let solved = self.solved.as_ref().ok_or(HighsModelError::SolveRequired {
            operation: "column_values",
        })?;
        Ok(solved.get_solution().columns().to_vec())
    }

    /// MIP gap of the last solve, NaN before any solve.
    pub fn mip_gap(&self) -> f64 {
        match self.solved.as_ref() {
            Some(solved) => solved.mip_gap(),
            None => f64::NAN,
        }
    }

    /// Whether the last solve left a feasible primal solution. False before
    /// any solve.
    pub fn has_primal_solution(&self) -> bool {
        self.get_int_info("primal_solution_status") == Some(PRIMAL_SOLUTION_FEASIBLE)
    }

    pub fn simplex_iteration_count(&self) -> u64 {
        self.get_int_info("simplex_iteration_count").unwrap_or(0)
    }

    fn get_int_info(&self, name: &str) -> Option<u64> {
        let solved = self.solved.as_ref()?;
        let c_name = CString::new(name).ok()?;
        let mut value: highs_sys::HighsInt = 0;
        let status = unsafe {
            highs_sys::Highs_getIntInfoValue(solved.as_ptr(), c_name.as_ptr(), &raw mut value)
        };
        if status == highs_sys::STATUS_OK && value >= 0 {
            Some(value as u64)
        } else {
            None
        }
    }
}

// HiGHS `kSolutionStatusFeasible`.
const PRIMAL_SOLUTION_FEASIBLE: u64 = 2;

impl Default for HighsModel {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HighsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let objective_value = self.solved.as_ref().map(|s| s.objective_value());
        f.debug_struct("HighsModel")
            .field("num_variables", &self.problem.num_cols())
            .field("num_constraints", &self.problem.num_rows())
            .field("objective_sense", &self.objective_sense)
            .field("objective_value", &objective_value)
            .finish_non_exhaustive()
    }
}

/// Return the HiGHS library version string, if available.
pub fn highs_version() -> Option<String> {
    unsafe {
        let ptr = highs_sys::Highs_version();
        if ptr.is_null() {
            None
        } else {
            CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
        }
    }
}

fn map_status(status: HighsModelStatus) -> HighsStatus {
    match status {
        HighsModelStatus::Optimal => HighsStatus::Optimal,
        HighsModelStatus::Infeasible => HighsStatus::Infeasible,
        HighsModelStatus::Unbounded => HighsStatus::Unbounded,
        HighsModelStatus::UnboundedOrInfeasible => HighsStatus::UnboundedOrInfeasible,
        HighsModelStatus::ReachedTimeLimit => HighsStatus::ReachedTimeLimit,
        HighsModelStatus::ReachedIterationLimit => HighsStatus::ReachedIterationLimit,
        _ => HighsStatus::Unknown,
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_row_checks_columns() {
        let mut model = HighsModel::new();
        let x = model.add_integer_col(0.0, 1.0, -1.0);
        assert_eq!(model.columns(), 1);
        assert_eq!(
            model.add_row(0.0, 1.0, &[x, 3], &[1.0, 1.0]).unwrap_err(),
            HighsModelError::ColumnIndexOutOfBounds {
                column_index: 3,
                num_columns: 1,
            }
        );
        assert!(matches!(
            model.add_row(0.0, 1.0, &[x], &[]),
            Err(HighsModelError::ColumnCoefficientLengthMismatch { .. })
        ));
    }

    #[test]
    fn test_solve_binary_column() {
        let mut model = HighsModel::new();
        let x = model.add_integer_col(0.0, 1.0, -2.0);
        let y = model.add_integer_col(0.0, 1.0, -1.0);
        model
            .add_row(f64::NEG_INFINITY, 1.0, &[x, y], &[1.0, 1.0])
            .unwrap();
        assert_eq!(model.solve(), HighsStatus::Optimal);
        let values = model.column_values().unwrap();
        assert!((values[0] - 1.0).abs() < 1e-9);
        assert!(values[1].abs() < 1e-9);
        assert!((model.objective_value().unwrap() + 2.0).abs() < 1e-9);
        assert!(model.has_primal_solution());
    }

    #[test]
    fn test_values_require_solve() {
        let model = HighsModel::new();
        assert!(matches!(
            model.objective_value(),
            Err(HighsModelError::SolveRequired { .. })
        ));
        assert!(model.mip_gap().is_nan());
        assert_eq!(model.simplex_iteration_count(), 0);
        assert!(!model.has_primal_solution());
    }
}
