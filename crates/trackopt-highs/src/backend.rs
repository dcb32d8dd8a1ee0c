//! [`Backend`] implementation over HiGHS.

use std::time::Instant;

use tracing::{debug, trace, warn};
use trackopt_expr::{Constraint, Relation, Sense};
use trackopt_solver::{
    Backend, BackendError, IlpProblem, Solution, SolverConfig, SolverEvent, VariableType,
};

use crate::ffi::{HighsModel, HighsModelError, HighsOption, HighsStatus, ObjectiveSense};
use crate::status::{highs_has_solution, highs_status_string, solve_status};

fn highs_model_error(err: HighsModelError) -> BackendError {
    BackendError::Internal(err.to_string())
}

/// Solves [`IlpProblem`]s with the HiGHS MIP solver.
///
/// Binary variables become integer columns in `[0, 1]`. Quadratic terms are
/// rejected.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsBackend;

impl HighsBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for HighsBackend {
    fn name(&self) -> &'static str {
        "highs"
    }

    fn solve(
        &mut self,
        problem: &IlpProblem,
        config: &SolverConfig,
    ) -> Result<Solution, BackendError> {
        self.ensure_selected(config)?;
        problem.validate()?;
        if problem.is_quadratic() {
            return Err(BackendError::Unsupported(
                "HiGHS backend only supports linear objectives and constraints".to_string(),
            ));
        }
        solve_problem(problem, config)
    }
}

fn apply_solver_config(highs_model: &mut HighsModel, config: &SolverConfig) {
    highs_model.set_log_to_console(config.log_to_console.unwrap_or(false));

    if let Some(limit) = config.time_limit {
        highs_model.set_option("time_limit", HighsOption::Float(limit));
    }
    if let Some(gap) = config.mip_gap {
        highs_model.set_option("mip_rel_gap", HighsOption::Float(gap));
    }
    if let Some(level) = config.verbosity {
        highs_model.set_verbosity(level);
    }
    if let Some(presolve) = config.presolve {
        let presolve_str = if presolve { "on" } else { "off" };
        highs_model.set_option("presolve", HighsOption::Str(presolve_str.to_string()));
    }
    if let Some(threads) = config.threads {
        let threads = i32::try_from(threads).unwrap_or(i32::MAX);
        highs_model.set_option("threads", HighsOption::Int(threads));
    }
}

fn column_bounds(variable_type: VariableType) -> (f64, f64, bool) {
    match variable_type {
        VariableType::Binary => (0.0, 1.0, true),
        VariableType::Integer => (f64::NEG_INFINITY, f64::INFINITY, true),
        VariableType::Continuous => (f64::NEG_INFINITY, f64::INFINITY, false),
    }
}

fn row_bounds(constraint: &Constraint) -> (f64, f64) {
    let rhs = constraint.rhs();
    match constraint.relation() {
        Relation::LessEqual => (f64::NEG_INFINITY, rhs),
        Relation::GreaterEqual => (rhs, f64::INFINITY),
        Relation::Equal => (rhs, rhs),
    }
}

fn add_variables(
    problem: &IlpProblem,
    highs_model: &mut HighsModel,
) -> Result<(), BackendError> {
    let objective = problem.objective();
    for index in 0..problem.num_variables() {
        let id = trackopt_expr::VariableId::from_index(index).ok_or_else(|| {
            BackendError::InvalidProblem(format!("variable index {index} exceeds u32 range"))
        })?;
        let coeff = objective.linear().get(&id).copied().unwrap_or(0.0);
        let (lower, upper, is_integer) = column_bounds(problem.variable_type(id));
        if is_integer {
            highs_model.add_integer_col(lower, upper, coeff);
        } else {
            highs_model.add_col(lower, upper, coeff);
        }
    }
    Ok(())
}

fn add_constraints(
    problem: &IlpProblem,
    highs_model: &mut HighsModel,
) -> Result<(), BackendError> {
    for (row, constraint) in problem.constraints().iter().enumerate() {
        let (lower, upper) = row_bounds(constraint);
        let (columns, coefficients): (Vec<usize>, Vec<f64>) = constraint
            .linear()
            .iter()
            .map(|(id, coeff)| (id.index(), *coeff))
            .unzip();
        highs_model
            .add_row(lower, upper, &columns, &coefficients)
            .map_err(highs_model_error)?;
        trace!(
            component = "highs",
            operation = "add_constraint",
            status = "success",
            row,
            lower,
            upper,
            num_coeffs = columns.len(),
            "Added constraint to HiGHS"
        );
    }
    Ok(())
}

fn solve_problem(problem: &IlpProblem, config: &SolverConfig) -> Result<Solution, BackendError> {
    let solver_version = crate::ffi::highs_version().unwrap_or_else(|| "unknown".to_string());
    let solve_started = Instant::now();
    config.emit(&SolverEvent::Started {
        backend: "highs",
        num_variables: problem.num_variables(),
        num_constraints: problem.num_constraints(),
    });

    let mut highs_model = HighsModel::new();
    apply_solver_config(&mut highs_model, config);
    highs_model.set_objective_sense(match problem.objective().sense() {
        Sense::Minimize => ObjectiveSense::Minimize,
        Sense::Maximize => ObjectiveSense::Maximize,
    });
    add_variables(problem, &mut highs_model)?;
    add_constraints(problem, &mut highs_model)?;

    let status = highs_model.solve();
    let solve_time_seconds = solve_started.elapsed().as_secs_f64();
    let optimality_gap = highs_model.mip_gap();
    let simplex_iterations = highs_model.simplex_iteration_count();
    let has_incumbent = highs_model.has_primal_solution();

    let (values, objective_value) = if highs_has_solution(status, has_incumbent) {
        let values = highs_model.column_values().map_err(highs_model_error)?;
        let objective_value = highs_model.objective_value().map_err(highs_model_error)?
            + problem.objective().constant();
        (values, objective_value)
    } else {
        (vec![0.0; problem.num_variables()], 0.0)
    };

    if status == HighsStatus::Optimal {
        debug!(
            component = "highs",
            operation = "solve",
            status = "success",
            solver_version = %solver_version,
            solver_status = highs_status_string(status),
            simplex_iterations,
            objective_value,
            optimality_gap,
            duration_ms = solve_time_seconds * 1000.0,
            "HiGHS solve completed"
        );
    } else {
        warn!(
            component = "highs",
            operation = "solve",
            status = "warn",
            solver_version = %solver_version,
            solver_status = highs_status_string(status),
            has_incumbent,
            simplex_iterations,
            objective_value,
            optimality_gap,
            duration_ms = solve_time_seconds * 1000.0,
            "HiGHS did not prove optimality"
        );
    }

    let stopped_without_incumbent = matches!(
        status,
        HighsStatus::ReachedTimeLimit | HighsStatus::ReachedIterationLimit
    ) && !has_incumbent;
    let message = if stopped_without_incumbent {
        format!(
            "HiGHS {solver_version}: {} before any feasible solution",
            highs_status_string(status)
        )
    } else {
        format!("HiGHS {solver_version}: {}", highs_status_string(status))
    };
    let status = solve_status(status, has_incumbent);
    config.emit(&SolverEvent::Finished {
        status,
        objective_value,
        solve_time_seconds,
    });

    Ok(Solution::new(values, objective_value, status)
        .with_message(message)
        .with_solve_time(solve_time_seconds))
}
