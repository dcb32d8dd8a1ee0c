//! Tracking session: variables, constraints, costs and solving.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, info, warn};
use trackopt_expr::{Constraint, Objective, Sense, VariableId};
use trackopt_solver::{Backend, BackendError, IlpProblem, Solution, SolverConfig};

use crate::constraints::{SelectEdgeNodes, SolverConstraint};
use crate::costs::{Cost, Features, Weight, WeightKey, Weights};
use crate::error::SolverError;
use crate::graph::TrackGraph;
use crate::variables::{EdgeSelected, NodeSelected, VariableKind, VariableMap, VariableRegistry};

/// One optimization session over a [`TrackGraph`].
///
/// Variables, constraints and costs are only ever added. Variable indices
/// are allocated per kind, in first-use order, and never reused.
pub struct Solver {
    graph: TrackGraph,
    registry: VariableRegistry,
    constraints: Vec<Constraint>,
    weights: Weights,
    features: Features,
    costs: Vec<f64>,
    costs_dirty: Rc<Cell<bool>>,
    cost_names: BTreeSet<String>,
    solution: Option<Solution>,
}

impl Solver {
    // ── Constructors ────────────────────────────────────────

    /// Session with the core [`SelectEdgeNodes`] constraints.
    pub fn new(graph: TrackGraph) -> Result<Self, SolverError> {
        let mut solver = Self::without_core_constraints(graph);
        solver.add_constraint(SelectEdgeNodes)?;
        Ok(solver)
    }

    /// Session without any constraints.
    pub fn without_core_constraints(graph: TrackGraph) -> Self {
        let costs_dirty = Rc::new(Cell::new(true));
        let mut weights = Weights::new();
        let flag = Rc::clone(&costs_dirty);
        weights.register_observer(Rc::new(move |_, _| flag.set(true)));

        debug!(
            component = "solver",
            operation = "init",
            status = "success",
            num_nodes = graph.num_nodes(),
            num_edges = graph.num_edges(),
            "Creating tracking session"
        );

        Self {
            graph,
            registry: VariableRegistry::default(),
            constraints: Vec::new(),
            weights,
            features: Features::new(),
            costs: Vec::new(),
            costs_dirty,
            cost_names: BTreeSet::new(),
            solution: None,
        }
    }

    // ── Accessors ───────────────────────────────────────────

    pub fn graph(&self) -> &TrackGraph {
        &self.graph
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn weights_mut(&mut self) -> &mut Weights {
        &mut self.weights
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.registry.num_variables()
    }

    /// Solution of the last [`Solver::solve`], if any.
    pub fn solution(&self) -> Option<&Solution> {
        self.solution.as_ref()
    }

    /// Registered cost names.
    pub fn cost_names(&self) -> impl Iterator<Item = &str> {
        self.cost_names.iter().map(String::as_str)
    }

    /// `(kind name, variable count)` in allocation order.
    pub fn variable_kinds(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        self.registry.kinds()
    }

    // ── Variables ───────────────────────────────────────────

    /// Index map of kind `K`, instantiating it and its coupling constraints
    /// on first use.
    pub fn get_variables<K: VariableKind>(&mut self) -> Result<VariableMap<K>, SolverError> {
        if let Some(map) = self.registry.get::<K>() {
            return Ok(map);
        }

        let start = Instant::now();
        let keys = K::instantiate(&self.graph);
        let map = self.registry.allocate::<K>(keys)?;
        self.features
            .resize(self.registry.num_variables(), self.features.num_weights());
        self.costs_dirty.set(true);

        let constraints = K::instantiate_constraints(self)?;
        let num_constraints = constraints.len();
        self.constraints.extend(constraints);

        debug!(
            component = "solver",
            operation = "add_variables",
            status = "success",
            kind = K::NAME,
            num_variables = map.len(),
            num_constraints,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Added variables"
        );
        Ok(map)
    }

    /// Index map of kind `K` if it is already instantiated.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::KindNotInstantiated`] otherwise.
    pub fn variables<K: VariableKind>(&self) -> Result<VariableMap<K>, SolverError> {
        self.registry
            .get::<K>()
            .ok_or(SolverError::KindNotInstantiated(K::NAME))
    }

    // ── Constraints ─────────────────────────────────────────

    /// Instantiate `constraint` and add everything it yields.
    pub fn add_constraint<C: SolverConstraint>(&mut self, constraint: C) -> Result<(), SolverError> {
        let start = Instant::now();
        let constraints = constraint.instantiate(self)?;
        let num_constraints = constraints.len();
        self.constraints.extend(constraints);
        debug!(
            component = "solver",
            operation = "add_constraint",
            status = "success",
            constraint = constraint.name(),
            num_constraints,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Added constraints"
        );
        Ok(())
    }

    // ── Costs ───────────────────────────────────────────────

    /// Add `cost` under its default name.
    pub fn add_cost<C: Cost>(&mut self, cost: C) -> Result<(), SolverError> {
        let name = cost.name();
        self.add_cost_named(cost, name)
    }

    /// Register the weights of `cost` under `name` and apply it.
    ///
    /// A cost that fails to apply leaves no weights, features or name
    /// behind. Variables it instantiated stay allocated.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::DuplicateCost`] when `name` is taken, and any
    /// error raised while applying the cost.
    pub fn add_cost_named<C: Cost>(&mut self, cost: C, name: &str) -> Result<(), SolverError> {
        if self.cost_names.contains(name) {
            return Err(SolverError::DuplicateCost(name.to_string()));
        }

        let start = Instant::now();
        let num_weights = self.weights.len();
        let features = self.features.clone();
        for (field, weight) in cost.weights() {
            if self.weights.index_of(&weight).is_none() {
                self.weights.add_weight(weight, WeightKey::new(name, field));
            }
        }
        self.features
            .resize(self.registry.num_variables(), self.weights.len());

        if let Err(err) = cost.apply(self) {
            self.weights.truncate(num_weights);
            self.features = features;
            self.costs_dirty.set(true);
            warn!(
                component = "solver",
                operation = "add_cost",
                status = "failed",
                cost = name,
                error = %err,
                "Cost rolled back"
            );
            return Err(err);
        }
        self.cost_names.insert(name.to_string());
        self.costs_dirty.set(true);

        debug!(
            component = "solver",
            operation = "add_cost",
            status = "success",
            cost = name,
            num_weights = self.weights.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Added cost"
        );
        Ok(())
    }

    /// Add `value` as the feature of variable `index` for `weight`.
    ///
    /// # Errors
    ///
    /// Returns [`SolverError::UnregisteredWeight`] unless `weight` belongs to
    /// a cost added to this session.
    pub fn add_variable_cost(
        &mut self,
        index: VariableId,
        value: f64,
        weight: &Weight,
    ) -> Result<(), SolverError> {
        let column = self
            .weights
            .index_of(weight)
            .ok_or(SolverError::UnregisteredWeight)?;
        self.features.add_feature(index.index(), column, value);
        self.costs_dirty.set(true);
        Ok(())
    }

    /// Per-variable costs `features · weights`, recomputed only after a
    /// weight or feature changed.
    pub fn costs(&mut self) -> &[f64] {
        let num_variables = self.registry.num_variables();
        if self.costs_dirty.get() || self.costs.len() != num_variables {
            let mut costs = self.features.dot(&self.weights.to_vec());
            costs.resize(num_variables, 0.0);
            self.costs = costs;
            self.costs_dirty.set(false);
        }
        &self.costs
    }

    // ── Solving ─────────────────────────────────────────────

    /// The ILP handed to a backend: variable domains, the linear objective
    /// and every constraint.
    pub fn build_problem(&mut self) -> Result<IlpProblem, SolverError> {
        let costs = self.costs().to_vec();
        let mut problem = IlpProblem::new(self.registry.num_variables());
        for (range, variable_type) in self.registry.typed_ranges() {
            for index in range {
                problem.set_variable_type(variable_id(index)?, variable_type)?;
            }
        }
        problem.set_objective(Objective::from_dense(Sense::Minimize, &costs));
        problem.extend_constraints(self.constraints.iter().cloned());
        Ok(problem)
    }

    /// Solve with `backend` under `config`.
    ///
    /// A session without variables is trivially optimal and never reaches
    /// the backend. Infeasible and unbounded outcomes are returned as the
    /// solution status; a time limit returns the incumbent.
    pub fn solve<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        config: &SolverConfig,
    ) -> Result<&Solution, SolverError> {
        let start = Instant::now();
        let solution = if self.registry.num_variables() == 0 {
            debug!(
                component = "solver",
                operation = "solve",
                status = "skipped",
                "Session has no variables; returning empty solution"
            );
            Solution::empty()
        } else {
            let problem = self.build_problem()?;
            backend.solve(&problem, config)?
        };

        let duration_ms = start.elapsed().as_secs_f64() * 1000.0;
        if solution.status().is_degraded() {
            warn!(
                component = "solver",
                operation = "solve",
                status = "degraded",
                solver_status = %solution.status(),
                objective = solution.objective_value(),
                duration_ms,
                "Solver stopped at a limit; returning best solution found"
            );
        } else if !solution.is_feasible() {
            warn!(
                component = "solver",
                operation = "solve",
                status = "failed",
                solver_status = %solution.status(),
                duration_ms,
                "Solver found no feasible solution"
            );
        } else {
            info!(
                component = "solver",
                operation = "solve",
                status = "success",
                backend = backend.name(),
                num_variables = solution.len(),
                num_constraints = self.constraints.len(),
                objective = solution.objective_value(),
                duration_ms,
                "ILP solver returned with: {}",
                solution.message()
            );
        }

        Ok(self.solution.insert(solution))
    }

    /// [`Solver::solve`] with a time limit (non-positive for none) and a
    /// thread count.
    pub fn solve_with<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        timeout: f64,
        num_threads: u32,
    ) -> Result<&Solution, SolverError> {
        let config = SolverConfig::new()
            .with_time_limit(timeout)
            .with_threads(num_threads);
        self.solve(backend, &config)
    }

    /// Nodes and edges whose indicator exceeds 0.5 in `solution`, or in the
    /// last solution when `None`.
    ///
    /// # Errors
    ///
    /// - [`SolverError::NoSolution`] without a solution, or when it is not
    ///   feasible
    /// - [`SolverError::StaleSolution`] when variables were added after it
    pub fn get_selected_subgraph(
        &self,
        solution: Option<&Solution>,
    ) -> Result<TrackGraph, SolverError> {
        let solution = solution
            .or(self.solution.as_ref())
            .ok_or(SolverError::NoSolution)?;
        if !solution.is_feasible() {
            return Err(SolverError::NoSolution);
        }
        if solution.len() < self.registry.num_variables() {
            return Err(SolverError::StaleSolution {
                solution_len: solution.len(),
                num_variables: self.registry.num_variables(),
            });
        }

        let is_selected = |index: VariableId| solution.value(index).is_some_and(|v| v > 0.5);
        let mut selected = TrackGraph::new(self.graph.frame_attribute());

        if let Some(nodes) = self.registry.get::<NodeSelected>() {
            for (node, index) in nodes.iter() {
                if is_selected(index) {
                    let attributes = self.graph.node_attrs(*node).cloned().unwrap_or_default();
                    selected.add_node(*node, attributes)?;
                }
            }
        }
        if let Some(edges) = self.registry.get::<EdgeSelected>() {
            for (edge, index) in edges.iter() {
                if !is_selected(index) {
                    continue;
                }
                for node in edge.nodes() {
                    if !selected.contains_node(node) {
                        let attributes = self.graph.node_attrs(node).cloned().unwrap_or_default();
                        selected.add_node(node, attributes)?;
                    }
                }
                let attributes = self.graph.edge_attrs(edge).cloned().unwrap_or_default();
                selected.add_edge(edge.clone(), attributes)?;
            }
        }

        debug!(
            component = "solver",
            operation = "get_selected_subgraph",
            status = "success",
            num_nodes = selected.num_nodes(),
            num_edges = selected.num_edges(),
            "Extracted selected subgraph"
        );
        Ok(selected)
    }
}

fn variable_id(index: usize) -> Result<VariableId, SolverError> {
    VariableId::from_index(index).ok_or_else(|| {
        SolverError::Backend(BackendError::InvalidProblem(format!(
            "variable index {index} exceeds u32 range"
        )))
    })
}

impl std::fmt::Debug for Solver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solver")
            .field("num_nodes", &self.graph.num_nodes())
            .field("num_edges", &self.graph.num_edges())
            .field("num_variables", &self.registry.num_variables())
            .field("num_constraints", &self.constraints.len())
            .field("weights", &self.weights)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use trackopt_solver::{BackendPreference, SolverStatus};

    use super::*;
    use crate::attrs;
    use crate::costs::{EdgeSelection, NodeSelection};
    use crate::graph::{EdgeId, NodeId};

    /// Selects every variable whose objective coefficient is negative.
    struct Greedy {
        calls: usize,
        status: SolverStatus,
    }

    impl Greedy {
        fn new() -> Self {
            Self {
                calls: 0,
                status: SolverStatus::Optimal,
            }
        }
    }

    impl Backend for Greedy {
        fn name(&self) -> &'static str {
            "greedy"
        }

        fn solve(
            &mut self,
            problem: &IlpProblem,
            config: &SolverConfig,
        ) -> Result<Solution, BackendError> {
            self.ensure_selected(config)?;
            self.calls += 1;
            let mut values = vec![0.0; problem.num_variables()];
            for (id, coeff) in problem.objective().linear() {
                if *coeff < 0.0 {
                    values[id.index()] = 1.0;
                }
            }
            let objective = problem.objective().evaluate(&values);
            Ok(Solution::new(values, objective, self.status))
        }
    }

    fn graph() -> TrackGraph {
        let mut graph = TrackGraph::default();
        graph.add_node(0u64, attrs! { "t" => 0, "score" => 1.0 }).unwrap();
        graph.add_node(1u64, attrs! { "t" => 1, "score" => 1.0 }).unwrap();
        graph.add_node(2u64, attrs! { "t" => 1, "score" => 1.0 }).unwrap();
        graph.add_edge(EdgeId::simple(0u64, 1u64), attrs! {}).unwrap();
        graph.add_edge(EdgeId::simple(0u64, 2u64), attrs! {}).unwrap();
        graph
    }

    #[test]
    fn test_duplicate_cost_name_is_rejected() {
        let mut solver = Solver::new(graph()).unwrap();
        solver.add_cost(EdgeSelection::new(1.0)).unwrap();
        let err = solver.add_cost(EdgeSelection::new(2.0)).unwrap_err();
        assert_eq!(err, SolverError::DuplicateCost("EdgeSelection".to_string()));
        solver
            .add_cost_named(EdgeSelection::new(2.0), "EdgeSelection2")
            .unwrap();
        assert_eq!(solver.weights().len(), 4);
        assert_eq!(
            solver.cost_names().collect::<Vec<_>>(),
            vec!["EdgeSelection", "EdgeSelection2"]
        );
    }

    /// Charges the first node, then fails.
    struct FailsAfterCharging(Weight);

    impl Cost for FailsAfterCharging {
        fn name(&self) -> &'static str {
            "FailsAfterCharging"
        }

        fn weights(&self) -> Vec<(&'static str, Weight)> {
            vec![("weight", self.0.clone())]
        }

        fn apply(&self, solver: &mut Solver) -> Result<(), SolverError> {
            let nodes = solver.get_variables::<NodeSelected>()?;
            solver.add_variable_cost(nodes.get(&NodeId::new(0))?, 5.0, &self.0)?;
            Err(SolverError::MissingAttribute {
                element: "node 1".to_string(),
                attribute: "x".to_string(),
            })
        }
    }

    #[test]
    fn test_failed_cost_can_be_retried_under_same_name() {
        let mut graph = graph();
        graph.add_node(0u64, attrs! { "x" => 2.0 }).unwrap();
        let mut solver = Solver::new(graph).unwrap();

        let err = solver
            .add_cost(NodeSelection::new(1.0).with_attribute("x"))
            .unwrap_err();
        assert!(matches!(err, SolverError::MissingAttribute { .. }));
        assert!(solver.weights().is_empty());
        assert_eq!(solver.cost_names().count(), 0);

        solver
            .add_cost(NodeSelection::new(1.0).with_attribute("score"))
            .unwrap();
        assert_eq!(solver.weights().len(), 2);
        assert_eq!(solver.cost_names().collect::<Vec<_>>(), vec!["NodeSelection"]);
        let nodes = solver.variables::<NodeSelected>().unwrap();
        let index = nodes.get(&NodeId::new(1)).unwrap().index();
        assert_eq!(solver.costs()[index], 1.0);
    }

    #[test]
    fn test_failed_cost_leaves_no_features() {
        let mut solver = Solver::new(graph()).unwrap();
        solver.add_cost(EdgeSelection::new(0.0).with_constant(-1.0)).unwrap();
        let before = solver.costs().to_vec();

        let err = solver
            .add_cost(FailsAfterCharging(Weight::new(1.0)))
            .unwrap_err();
        assert!(matches!(err, SolverError::MissingAttribute { .. }));
        assert_eq!(solver.weights().len(), 2);
        assert_eq!(solver.cost_names().collect::<Vec<_>>(), vec!["EdgeSelection"]);
        assert_eq!(solver.costs(), before.as_slice());

        solver
            .add_cost_named(NodeSelection::new(0.0).with_constant(2.0), "FailsAfterCharging")
            .unwrap();
        assert_eq!(solver.weights().len(), 4);
    }

    #[test]
    fn test_costs_follow_weight_changes() {
        let mut solver = Solver::new(graph()).unwrap();
        let cost = NodeSelection::new(2.0).with_attribute("score");
        let weight = cost.weight().clone();
        solver.add_cost(cost).unwrap();
        let nodes = solver.get_variables::<NodeSelected>().unwrap();
        let index = nodes.get(&NodeId::new(0)).unwrap().index();
        assert_eq!(solver.costs()[index], 2.0);

        weight.set_value(-3.0);
        assert_eq!(solver.costs()[index], -3.0);
        solver.weights().set("NodeSelection", "constant", 1.0).unwrap();
        assert_eq!(solver.costs()[index], -2.0);
    }

    #[test]
    fn test_unregistered_weight_is_rejected() {
        let mut solver = Solver::new(graph()).unwrap();
        let err = solver
            .add_variable_cost(VariableId::new(0), 1.0, &Weight::new(1.0))
            .unwrap_err();
        assert_eq!(err, SolverError::UnregisteredWeight);
    }

    #[test]
    fn test_empty_graph_solves_without_backend() {
        let mut solver = Solver::new(TrackGraph::default()).unwrap();
        let mut backend = Greedy::new();
        let solution = solver.solve(&mut backend, &SolverConfig::new()).unwrap();
        assert!(solution.is_empty());
        assert_eq!(backend.calls, 0);
        let selected = solver.get_selected_subgraph(None).unwrap();
        assert!(selected.is_empty());
    }

    #[test]
    fn test_selected_subgraph_uses_threshold() {
        let mut solver = Solver::new(graph()).unwrap();
        solver.add_cost(NodeSelection::new(-1.0).with_attribute("score")).unwrap();
        solver.add_cost(EdgeSelection::new(1.0).with_constant(-1.0)).unwrap();
        let edges = solver.get_variables::<EdgeSelected>().unwrap();
        solver.solve_with(&mut Greedy::new(), 0.0, 1).unwrap();
        let selected = solver.get_selected_subgraph(None).unwrap();
        assert_eq!(selected.num_nodes(), 3);
        assert_eq!(selected.num_edges(), 2);

        let mut values = solver.solution().unwrap().values().to_vec();
        values[edges.get(&EdgeId::simple(0u64, 2u64)).unwrap().index()] = 0.5;
        let partial = Solution::new(values, 0.0, SolverStatus::Optimal);
        let selected = solver.get_selected_subgraph(Some(&partial)).unwrap();
        assert_eq!(selected.num_edges(), 1);
        assert_eq!(selected.frame_attribute(), "t");
    }

    #[test]
    fn test_selected_subgraph_errors() {
        let mut solver = Solver::new(graph()).unwrap();
        assert_eq!(
            solver.get_selected_subgraph(None).unwrap_err(),
            SolverError::NoSolution
        );

        let mut backend = Greedy::new();
        backend.status = SolverStatus::Infeasible;
        let solution = solver.solve(&mut backend, &SolverConfig::new()).unwrap();
        assert_eq!(solution.status(), SolverStatus::Infeasible);
        assert_eq!(
            solver.get_selected_subgraph(None).unwrap_err(),
            SolverError::NoSolution
        );

        solver.solve(&mut Greedy::new(), &SolverConfig::new()).unwrap();
        solver.get_variables::<crate::variables::NodeAppear>().unwrap();
        assert!(matches!(
            solver.get_selected_subgraph(None).unwrap_err(),
            SolverError::StaleSolution { .. }
        ));
    }

    #[test]
    fn test_time_limit_returns_incumbent() {
        let mut solver = Solver::new(graph()).unwrap();
        solver.add_cost(NodeSelection::new(0.0).with_constant(-1.0)).unwrap();
        solver.add_cost(EdgeSelection::new(0.0).with_constant(1.0)).unwrap();
        let mut backend = Greedy::new();
        backend.status = SolverStatus::ReachedTimeLimit;

        let config = SolverConfig::new().with_time_limit(0.5);
        let solution = solver.solve(&mut backend, &config).unwrap();
        assert_eq!(solution.status(), SolverStatus::ReachedTimeLimit);
        assert_ne!(solution.status(), SolverStatus::Optimal);
        assert!(solution.status().is_degraded());
        assert_eq!(solution.objective_value(), -3.0);

        let selected = solver.get_selected_subgraph(None).unwrap();
        assert_eq!(selected.num_nodes(), 3);
        assert_eq!(selected.num_edges(), 0);
    }

    #[test]
    fn test_limit_without_incumbent_has_no_selection() {
        let mut solver = Solver::new(graph()).unwrap();
        solver.add_cost(NodeSelection::new(0.0).with_constant(-1.0)).unwrap();
        let mut backend = Greedy::new();
        backend.status = SolverStatus::Unknown;

        let solution = solver.solve_with(&mut backend, 0.5, 1).unwrap();
        assert_eq!(solution.status(), SolverStatus::Unknown);
        assert!(!solution.is_feasible());
        assert_eq!(
            solver.get_selected_subgraph(None).unwrap_err(),
            SolverError::NoSolution
        );
    }

    #[test]
    fn test_backend_preference_is_enforced() {
        let mut solver = Solver::new(graph()).unwrap();
        let config = SolverConfig::new().with_backend(BackendPreference::named("gurobi"));
        let err = solver.solve(&mut Greedy::new(), &config).unwrap_err();
        assert_eq!(err.code(), "BACKEND_NOT_AVAILABLE");
    }

    #[test]
    fn test_variables_requires_instantiation() {
        let solver = Solver::without_core_constraints(graph());
        assert_eq!(
            solver.variables::<NodeSelected>().unwrap_err(),
            SolverError::KindNotInstantiated("NodeSelected")
        );
    }

    #[test]
    fn test_build_problem_matches_session() {
        let mut solver = Solver::new(graph()).unwrap();
        solver.add_cost(EdgeSelection::new(0.0).with_constant(-2.0)).unwrap();
        let problem = solver.build_problem().unwrap();
        assert_eq!(problem.num_variables(), 5);
        assert_eq!(problem.num_constraints(), 2);
        assert_eq!(problem.objective().linear().len(), 2);
        problem.validate().unwrap();
    }
}
