//! Costs on node and edge selection.

use crate::Solver;
use crate::costs::{Cost, Weight, WeightedTerms, numeric_attribute};
use crate::error::SolverError;
use crate::variables::{EdgeSelected, NodeSelected};

/// Cost per selected node: `weight * attribute + constant`.
#[derive(Debug, Clone)]
pub struct NodeSelection {
    weight: Weight,
    attribute: Option<String>,
    constant: Weight,
}

impl NodeSelection {
    /// Cost with attribute weight `weight` and no constant.
    pub fn new(weight: f64) -> Self {
        Self {
            weight: Weight::new(weight),
            attribute: None,
            constant: Weight::new(0.0),
        }
    }

    /// Node attribute providing the feature; without it only the constant
    /// applies.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Constant added per selected element.
    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = Weight::new(constant);
        self
    }

    /// Weight scaling the attribute feature.
    pub fn weight(&self) -> &Weight {
        &self.weight
    }

    /// Weight of the constant feature.
    pub fn constant(&self) -> &Weight {
        &self.constant
    }
}

impl Cost for NodeSelection {
    fn name(&self) -> &'static str {
        "NodeSelection"
    }

    fn weights(&self) -> Vec<(&'static str, Weight)> {
        vec![("weight", self.weight.clone()), ("constant", self.constant.clone())]
    }

    fn apply(&self, solver: &mut Solver) -> Result<(), SolverError> {
        let nodes = solver.get_variables::<NodeSelected>()?;
        let graph = solver.graph();
        let mut terms = WeightedTerms::with_capacity(nodes.len());
        for (node, index) in nodes.iter() {
            let feature = match &self.attribute {
                Some(attribute) => Some(numeric_attribute(
                    graph.node_attrs(*node),
                    attribute,
                    &format_args!("node {node}"),
                )?),
                None => None,
            };
            terms.push(index, feature);
        }
        terms.charge(solver, &self.weight, &self.constant)
    }
}

/// Cost per selected edge or hyperedge: `weight * attribute + constant`.
#[derive(Debug, Clone)]
pub struct EdgeSelection {
    weight: Weight,
    attribute: Option<String>,
    constant: Weight,
}

impl EdgeSelection {
    /// Cost with attribute weight `weight` and no constant.
    pub fn new(weight: f64) -> Self {
        Self {
            weight: Weight::new(weight),
            attribute: None,
            constant: Weight::new(0.0),
        }
    }

    /// Edge attribute providing the feature; without it only the constant
    /// applies.
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    /// Constant added per selected element.
    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = Weight::new(constant);
        self
    }

    /// Weight scaling the attribute feature.
    pub fn weight(&self) -> &Weight {
        &self.weight
    }

    /// Weight of the constant feature.
    pub fn constant(&self) -> &Weight {
        &self.constant
    }
}

impl Cost for EdgeSelection {
    fn name(&self) -> &'static str {
        "EdgeSelection"
    }

    fn weights(&self) -> Vec<(&'static str, Weight)> {
        vec![("weight", self.weight.clone()), ("constant", self.constant.clone())]
    }

    fn apply(&self, solver: &mut Solver) -> Result<(), SolverError> {
        let edges = solver.get_variables::<EdgeSelected>()?;
        let graph = solver.graph();
        let mut terms = WeightedTerms::with_capacity(edges.len());
        for (edge, index) in edges.iter() {
            let feature = match &self.attribute {
                Some(attribute) => Some(numeric_attribute(
                    graph.edge_attrs(edge),
                    attribute,
                    &format_args!("edge {edge}"),
                )?),
                None => None,
            };
            terms.push(index, feature);
        }
        terms.charge(solver, &self.weight, &self.constant)
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::graph::{EdgeId, NodeId, TrackGraph};

    fn graph() -> TrackGraph {
        let mut graph = TrackGraph::default();
        graph.add_node(0u64, attrs! { "t" => 0, "score" => 0.5 }).unwrap();
        graph.add_node(1u64, attrs! { "t" => 1, "score" => 2.0 }).unwrap();
        graph
            .add_edge(EdgeId::simple(0u64, 1u64), attrs! { "distance" => 3.0 })
            .unwrap();
        graph
    }

    #[test]
    fn test_node_selection_costs() {
        let mut solver = Solver::new(graph()).unwrap();
        solver
            .add_cost(NodeSelection::new(2.0).with_attribute("score").with_constant(1.0))
            .unwrap();
        let nodes = solver.get_variables::<NodeSelected>().unwrap();
        let costs = solver.costs();
        assert_eq!(costs[nodes.get(&NodeId::new(0)).unwrap().index()], 2.0);
        assert_eq!(costs[nodes.get(&NodeId::new(1)).unwrap().index()], 5.0);
    }

    #[test]
    fn test_edge_selection_constant_only() {
        let mut solver = Solver::new(graph()).unwrap();
        solver.add_cost(EdgeSelection::new(1.0).with_constant(-4.0)).unwrap();
        let edges = solver.get_variables::<EdgeSelected>().unwrap();
        let index = edges.get(&EdgeId::simple(0u64, 1u64)).unwrap();
        assert_eq!(solver.costs()[index.index()], -4.0);
        assert_eq!(solver.weights().get("EdgeSelection", "weight"), Some(1.0));
    }

    #[test]
    fn test_missing_attribute_is_reported() {
        let mut solver = Solver::new(graph()).unwrap();
        let err = solver
            .add_cost(EdgeSelection::new(1.0).with_attribute("overlap"))
            .unwrap_err();
        assert_eq!(
            err,
            SolverError::MissingAttribute {
                element: "edge (0, 1)".to_string(),
                attribute: "overlap".to_string()
            }
        );
    }
}
