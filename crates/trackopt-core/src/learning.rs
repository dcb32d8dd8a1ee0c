//! Fitting cost weights to partial ground truth.
//!
//! [`Solver::fit_weights`] collects everything a structured-SVM style
//! learner needs into a [`LearningProblem`] and imports whatever weight
//! vector the [`WeightLearner`] returns.

use std::time::Instant;

use tracing::{debug, info, trace};
use trackopt_expr::{Objective, Sense};
use trackopt_solver::{Backend, IlpProblem, SolverConfig};

use crate::Solver;
use crate::error::SolverError;
use crate::variables::{EdgeSelected, NodeSelected};

/// Input of one weight fit.
#[derive(Debug, Clone)]
pub struct LearningProblem {
    /// Domains and constraints; the objective is replaced by the learner.
    pub problem: IlpProblem,
    /// Features transposed: one row of `num_variables` entries per weight.
    pub features_t: Vec<Vec<f64>>,
    /// Labels per variable; zero where unlabeled.
    pub ground_truth: Vec<f64>,
    /// 1.0 for labeled variables, 0.0 otherwise.
    pub mask: Vec<f64>,
    pub regularizer_weight: f64,
    pub eps: f64,
    pub max_iterations: usize,
    pub initial_weights: Vec<f64>,
}

impl LearningProblem {
    pub fn num_weights(&self) -> usize {
        self.features_t.len()
    }

    /// Per-variable costs `F w`.
    pub fn costs(&self, weights: &[f64]) -> Vec<f64> {
        let mut costs = vec![0.0; self.problem.num_variables()];
        for (row, weight) in self.features_t.iter().zip(weights) {
            for (cost, feature) in costs.iter_mut().zip(row) {
                *cost += feature * weight;
            }
        }
        costs
    }

    /// Masked Hamming distance of `values` to the ground truth.
    pub fn hamming(&self, values: &[f64]) -> f64 {
        values
            .iter()
            .zip(&self.ground_truth)
            .zip(&self.mask)
            .map(|((y, gt), mask)| mask * (y.round() - gt).abs())
            .sum()
    }
}

/// A structured learner for cost weights.
pub trait WeightLearner {
    /// Optimal weights, in [`crate::costs::Weights`] column order.
    fn fit(&mut self, problem: &LearningProblem) -> Result<Vec<f64>, SolverError>;
}

impl Solver {
    /// Fit all registered weights to the labels in `gt_attribute` and
    /// import the result.
    ///
    /// Only nodes and edges (the NodeSelected and EdgeSelected indicators)
    /// are labeled: a truthy value means part of the solution, a falsy one
    /// means excluded, a missing attribute leaves the element unlabeled.
    ///
    /// # Errors
    ///
    /// - [`SolverError::MissingGroundTruth`] when no element is labeled
    /// - any error of the learner or of the weight import
    pub fn fit_weights<L: WeightLearner + ?Sized>(
        &mut self,
        learner: &mut L,
        gt_attribute: &str,
        regularizer_weight: f64,
        max_iterations: usize,
        eps: f64,
    ) -> Result<Vec<f64>, SolverError> {
        let start = Instant::now();
        let nodes = self.get_variables::<NodeSelected>()?;
        let edges = self.get_variables::<EdgeSelected>()?;

        let num_variables = self.num_variables();
        let mut ground_truth = vec![0.0; num_variables];
        let mut mask = vec![0.0; num_variables];
        let mut label = |index: usize, value: bool| {
            mask[index] = 1.0;
            ground_truth[index] = if value { 1.0 } else { 0.0 };
        };

        let graph = self.graph();
        for (node, index) in nodes.iter() {
            if let Some(value) = graph.node_attrs(*node).and_then(|a| a.get(gt_attribute)) {
                label(index.index(), value.is_truthy());
            }
        }
        for (edge, index) in edges.iter() {
            if let Some(value) = graph.edge_attrs(edge).and_then(|a| a.get(gt_attribute)) {
                label(index.index(), value.is_truthy());
            }
        }

        let num_labeled = mask.iter().filter(|m| **m > 0.0).count();
        if num_labeled == 0 {
            return Err(SolverError::MissingGroundTruth(gt_attribute.to_string()));
        }

        let mut features = self.features().clone();
        features.resize(num_variables, self.weights().len());
        let problem = LearningProblem {
            problem: self.build_problem()?,
            features_t: features.transposed(),
            ground_truth,
            mask,
            regularizer_weight,
            eps,
            max_iterations,
            initial_weights: self.weights().to_vec(),
        };

        debug!(
            component = "learning",
            operation = "fit_weights",
            status = "started",
            num_variables,
            num_weights = problem.num_weights(),
            num_labeled,
            "Fitting weights"
        );

        let weights = learner.fit(&problem)?;
        self.weights().from_slice(&weights)?;

        info!(
            component = "learning",
            operation = "fit_weights",
            status = "success",
            num_weights = weights.len(),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Fitted weights:\n{}",
            self.weights()
        );
        Ok(weights)
    }
}

/// Subgradient descent on the regularized structured hinge loss.
///
/// Each iteration solves the loss-augmented problem with the wrapped
/// backend, takes a Pegasos step `1 / (lambda * t)` and remembers the
/// iterate with the lowest objective `lambda / 2 * |w|^2 + L(w)`.
pub struct SubgradientLearner<B: Backend> {
    backend: B,
    config: SolverConfig,
}

impl<B: Backend> SubgradientLearner<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: SolverConfig::new(),
        }
    }

    /// Options for every loss-augmented solve.
    pub fn with_config(mut self, config: SolverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn into_backend(self) -> B {
        self.backend
    }
}

impl<B: Backend> WeightLearner for SubgradientLearner<B> {
    fn fit(&mut self, learning: &LearningProblem) -> Result<Vec<f64>, SolverError> {
        let lambda = learning.regularizer_weight;
        let mut weights = learning.initial_weights.clone();
        weights.resize(learning.num_weights(), 0.0);

        let mut best = weights.clone();
        let mut best_objective = f64::INFINITY;
        let mut problem = learning.problem.clone();

        for iteration in 1..=learning.max_iterations {
            let costs = learning.costs(&weights);

            // Masked Hamming loss is linear in y: mask * (1 - 2 gt) per variable.
            let augmented: Vec<f64> = costs
                .iter()
                .zip(&learning.ground_truth)
                .zip(&learning.mask)
                .map(|((cost, gt), mask)| cost - mask * (1.0 - 2.0 * gt))
                .collect();
            problem.set_objective(Objective::from_dense(Sense::Minimize, &augmented));

            let solution = self.backend.solve(&problem, &self.config)?;
            if !solution.is_feasible() {
                return Err(SolverError::NoSolution);
            }
            let predicted = solution.values();

            let energy = |values: &[f64]| -> f64 {
                costs.iter().zip(values).map(|(c, y)| c * y).sum()
            };
            let loss = learning.hamming(predicted) - energy(predicted)
                + energy(&learning.ground_truth);
            let norm_sq: f64 = weights.iter().map(|w| w * w).sum();
            let objective = 0.5 * lambda * norm_sq + loss;
            if objective < best_objective {
                best_objective = objective;
                best.clone_from(&weights);
            }

            let gradient: Vec<f64> = learning
                .features_t
                .iter()
                .zip(&weights)
                .map(|(row, weight)| {
                    let margin: f64 = row
                        .iter()
                        .zip(&learning.ground_truth)
                        .zip(predicted)
                        .map(|((f, gt), y)| f * (gt - y))
                        .sum();
                    lambda * weight + margin
                })
                .collect();

            let step = if lambda > 0.0 {
                1.0 / (lambda * iteration as f64)
            } else {
                1.0 / iteration as f64
            };
            let step_norm = step * gradient.iter().map(|g| g * g).sum::<f64>().sqrt();

            trace!(
                component = "learning",
                operation = "subgradient_step",
                iteration,
                loss,
                objective,
                step_norm,
                "Subgradient step"
            );

            for (weight, g) in weights.iter_mut().zip(&gradient) {
                *weight -= step * g;
            }
            if step_norm < learning.eps {
                debug!(
                    component = "learning",
                    operation = "subgradient",
                    status = "converged",
                    iteration,
                    objective,
                    "Subgradient steps converged"
                );
                break;
            }
        }

        Ok(best)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use trackopt_solver::{BackendError, Solution, SolverStatus};

    use super::*;
    use crate::attrs;
    use crate::costs::NodeSelection;
    use crate::graph::{NodeId, TrackGraph};

    /// Exhaustive search over binary assignments.
    struct BruteForce;

    impl Backend for BruteForce {
        fn name(&self) -> &'static str {
            "brute_force"
        }

        fn solve(
            &mut self,
            problem: &IlpProblem,
            _config: &SolverConfig,
        ) -> Result<Solution, BackendError> {
            let n = problem.num_variables();
            let mut best: Option<(f64, Vec<f64>)> = None;
            for bits in 0u32..(1 << n) {
                let values: Vec<f64> = (0..n).map(|i| f64::from((bits >> i) & 1)).collect();
                if !problem.constraints().iter().all(|c| c.is_satisfied(&values, 1e-9)) {
                    continue;
                }
                let objective = problem.objective().evaluate(&values);
                if best.as_ref().is_none_or(|(value, _)| objective < *value) {
                    best = Some((objective, values));
                }
            }
            Ok(match best {
                Some((objective, values)) => {
                    Solution::new(values, objective, SolverStatus::Optimal)
                }
                None => Solution::new(vec![0.0; n], 0.0, SolverStatus::Infeasible),
            })
        }
    }

    fn labeled_graph() -> TrackGraph {
        let mut graph = TrackGraph::default();
        graph
            .add_node(0u64, attrs! { "t" => 0, "score" => 1.0, "gt" => true })
            .unwrap();
        graph
            .add_node(1u64, attrs! { "t" => 0, "score" => -1.0, "gt" => false })
            .unwrap();
        graph.add_node(2u64, attrs! { "t" => 1, "score" => 0.0 }).unwrap();
        graph
    }

    #[test]
    fn test_fit_reproduces_ground_truth() {
        let mut solver = Solver::new(labeled_graph()).unwrap();
        solver.add_cost(NodeSelection::new(1.0).with_attribute("score")).unwrap();

        let mut learner = SubgradientLearner::new(BruteForce);
        let weights = solver.fit_weights(&mut learner, "gt", 0.1, 50, 1e-6).unwrap();
        assert_eq!(weights.len(), 2);
        assert!(solver.weights().get("NodeSelection", "weight").unwrap() < 0.0);

        solver.solve(&mut BruteForce, &SolverConfig::new()).unwrap();
        let selected = solver.get_selected_subgraph(None).unwrap();
        assert!(selected.contains_node(NodeId::new(0)));
        assert!(!selected.contains_node(NodeId::new(1)));
    }

    #[test]
    fn test_missing_ground_truth() {
        let mut solver = Solver::new(labeled_graph()).unwrap();
        solver.add_cost(NodeSelection::new(1.0)).unwrap();
        let err = solver
            .fit_weights(&mut SubgradientLearner::new(BruteForce), "label", 0.1, 10, 1e-6)
            .unwrap_err();
        assert_eq!(err, SolverError::MissingGroundTruth("label".to_string()));
    }

    #[test]
    fn test_learning_problem_layout() {
        struct Capture(Option<LearningProblem>);

        impl WeightLearner for Capture {
            fn fit(&mut self, problem: &LearningProblem) -> Result<Vec<f64>, SolverError> {
                self.0 = Some(problem.clone());
                Ok(problem.initial_weights.clone())
            }
        }

        let mut solver = Solver::new(labeled_graph()).unwrap();
        solver
            .add_cost(NodeSelection::new(2.0).with_attribute("score").with_constant(0.5))
            .unwrap();
        let mut capture = Capture(None);
        solver.fit_weights(&mut capture, "gt", 0.0, 0, 1e-6).unwrap();
        let problem = capture.0.unwrap();

        assert_eq!(problem.num_weights(), 2);
        assert_eq!(problem.features_t[0], vec![1.0, -1.0, 0.0]);
        assert_eq!(problem.features_t[1], vec![1.0, 1.0, 1.0]);
        assert_eq!(problem.mask, vec![1.0, 1.0, 0.0]);
        assert_eq!(problem.ground_truth, vec![1.0, 0.0, 0.0]);
        assert_eq!(problem.initial_weights, vec![2.0, 0.5]);
        assert_eq!(problem.costs(&[2.0, 0.5]), vec![2.5, -1.5, 0.5]);
        assert_eq!(problem.hamming(&[0.0, 1.0, 1.0]), 2.0);
    }
}
