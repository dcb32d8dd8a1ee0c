//! Status conversions for HiGHS integration.

use trackopt_solver::SolverStatus;

use crate::ffi::HighsStatus;

pub(crate) fn highs_to_status(status: HighsStatus) -> SolverStatus {
    match status {
        HighsStatus::Optimal => SolverStatus::Optimal,
        HighsStatus::Infeasible => SolverStatus::Infeasible,
        HighsStatus::Unbounded => SolverStatus::Unbounded,
        HighsStatus::UnboundedOrInfeasible => SolverStatus::Unknown,
        HighsStatus::ReachedTimeLimit => SolverStatus::ReachedTimeLimit,
        HighsStatus::ReachedIterationLimit => SolverStatus::ReachedIterationLimit,
        HighsStatus::Unknown => SolverStatus::Unknown,
    }
}

pub(crate) fn highs_status_string(status: HighsStatus) -> &'static str {
    match status {
        HighsStatus::Optimal => "optimal",
        HighsStatus::Infeasible => "infeasible",
        HighsStatus::Unbounded => "unbounded",
        HighsStatus::UnboundedOrInfeasible => "unbounded_or_infeasible",
        HighsStatus::ReachedTimeLimit => "time_limit",
        HighsStatus::ReachedIterationLimit => "iteration_limit",
        HighsStatus::Unknown => "unknown",
    }
}

fn is_limit(status: HighsStatus) -> bool {
    matches!(
        status,
        HighsStatus::ReachedTimeLimit | HighsStatus::ReachedIterationLimit
    )
}

/// Whether column values are meaningful after a solve with `status`.
///
/// A limit only leaves usable values when HiGHS reports a feasible
/// incumbent.
pub(crate) fn highs_has_solution(status: HighsStatus, has_incumbent: bool) -> bool {
    status == HighsStatus::Optimal || (is_limit(status) && has_incumbent)
}

/// Session status for a solve: a limit hit before any feasible incumbent
/// is [`SolverStatus::Unknown`], never a usable degraded result.
pub(crate) fn solve_status(status: HighsStatus, has_incumbent: bool) -> SolverStatus {
    if is_limit(status) && !has_incumbent {
        SolverStatus::Unknown
    } else {
        highs_to_status(status)
    }
}
