//! Costs derived from node positions.

use crate::Solver;
use crate::costs::{Cost, Weight, WeightedTerms};
use crate::error::SolverError;
use crate::graph::{EdgeId, NodeId, TrackGraph};
use crate::variables::EdgeSelected;

/// Where a node's position is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Position {
    /// One attribute holding a scalar or a list of coordinates.
    Attribute(String),
    /// One scalar attribute per coordinate, e.g. `["z", "y", "x"]`.
    Coordinates(Vec<String>),
}

impl Position {
    fn describe(&self) -> String {
        match self {
            Position::Attribute(name) => name.clone(),
            Position::Coordinates(names) => names.join(", "),
        }
    }

    fn read(&self, graph: &TrackGraph, node: NodeId) -> Result<Vec<f64>, SolverError> {
        let missing = || SolverError::MissingAttribute {
            element: format!("node {node}"),
            attribute: self.describe(),
        };
        let attributes = graph.node_attrs(node).ok_or_else(missing)?;
        match self {
            Position::Attribute(name) => attributes
                .get(name)
                .and_then(|value| value.as_vector())
                .ok_or_else(missing),
            Position::Coordinates(names) => names
                .iter()
                .map(|name| attributes.get(name).and_then(|value| value.as_f64()))
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(missing),
        }
    }

    /// Mean position of `nodes`.
    fn centroid(&self, graph: &TrackGraph, nodes: &[NodeId]) -> Result<Vec<f64>, SolverError> {
        let mut sum: Vec<f64> = Vec::new();
        for node in nodes {
            let position = self.read(graph, *node)?;
            if sum.is_empty() {
                sum = position;
            } else {
                check_dimensions(&sum, &position, *node, self)?;
                for (total, coordinate) in sum.iter_mut().zip(&position) {
                    *total += coordinate;
                }
            }
        }
        let count = nodes.len().max(1) as f64;
        Ok(sum.into_iter().map(|total| total / count).collect())
    }
}

impl From<&str> for Position {
    fn from(name: &str) -> Self {
        Position::Attribute(name.to_string())
    }
}

impl From<String> for Position {
    fn from(name: String) -> Self {
        Position::Attribute(name)
    }
}

impl<const N: usize> From<[&str; N]> for Position {
    fn from(names: [&str; N]) -> Self {
        Position::Coordinates(names.iter().map(|name| name.to_string()).collect())
    }
}

fn check_dimensions(
    a: &[f64],
    b: &[f64],
    node: NodeId,
    position: &Position,
) -> Result<(), SolverError> {
    if a.len() == b.len() {
        Ok(())
    } else {
        Err(SolverError::MissingAttribute {
            element: format!("node {node}"),
            attribute: format!("{} ({} coordinates, expected {})", position.describe(), b.len(), a.len()),
        })
    }
}

fn distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Cost per selected edge: `weight * ||pos(u) - pos(v)|| + constant`.
///
/// For a hyperedge the distance is taken between the mean positions of
/// its two sides.
#[derive(Debug, Clone)]
pub struct EdgeDistance {
    position: Position,
    weight: Weight,
    constant: Weight,
}

impl EdgeDistance {
    /// Cost over the coordinates in `position`, with weight 1.
    pub fn new(position: impl Into<Position>) -> Self {
        Self {
            position: position.into(),
            weight: Weight::new(1.0),
            constant: Weight::new(0.0),
        }
    }

    /// Weight scaling the distance feature.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Weight::new(weight);
        self
    }

    /// Constant added per charged edge.
    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = Weight::new(constant);
        self
    }

    /// Weight scaling the distance feature.
    pub fn weight(&self) -> &Weight {
        &self.weight
    }

    /// Weight of the constant feature.
    pub fn constant(&self) -> &Weight {
        &self.constant
    }

    fn feature(&self, graph: &TrackGraph, edge: &EdgeId) -> Result<f64, SolverError> {
        let source = self.position.centroid(graph, &edge.in_nodes())?;
        let outs = edge.out_nodes();
        let target = self.position.centroid(graph, &outs)?;
        if let Some(first) = outs.first() {
            check_dimensions(&source, &target, *first, &self.position)?;
        }
        Ok(distance(&source, &target))
    }
}

impl Cost for EdgeDistance {
    fn name(&self) -> &'static str {
        "EdgeDistance"
    }

    fn weights(&self) -> Vec<(&'static str, Weight)> {
        vec![("weight", self.weight.clone()), ("constant", self.constant.clone())]
    }

    fn apply(&self, solver: &mut Solver) -> Result<(), SolverError> {
        let edges = solver.get_variables::<EdgeSelected>()?;
        let graph = solver.graph();
        let mut terms = WeightedTerms::with_capacity(edges.len());
        for (edge, index) in edges.iter() {
            terms.push(index, Some(self.feature(graph, edge)?));
        }
        terms.charge(solver, &self.weight, &self.constant)
    }
}

/// Cost per selected division `(p) -> (c1, c2)`:
/// `weight * ||pos(p) - (pos(c1) + pos(c2)) / 2|| + constant`.
///
/// Every other edge gets a zero feature, so both weights still have a
/// feature column.
#[derive(Debug, Clone)]
pub struct SymmetricDivision {
    position: Position,
    weight: Weight,
    constant: Weight,
}

impl SymmetricDivision {
    /// Cost over the coordinates in `position`, with weight 1.
    pub fn new(position: impl Into<Position>) -> Self {
        Self {
            position: position.into(),
            weight: Weight::new(1.0),
            constant: Weight::new(0.0),
        }
    }

    /// Weight scaling the distance feature.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Weight::new(weight);
        self
    }

    /// Constant added per charged edge.
    pub fn with_constant(mut self, constant: f64) -> Self {
        self.constant = Weight::new(constant);
        self
    }

    /// Weight scaling the distance feature.
    pub fn weight(&self) -> &Weight {
        &self.weight
    }

    /// Weight of the constant feature.
    pub fn constant(&self) -> &Weight {
        &self.constant
    }
}

impl Cost for SymmetricDivision {
    fn name(&self) -> &'static str {
        "SymmetricDivision"
    }

    fn weights(&self) -> Vec<(&'static str, Weight)> {
        vec![("weight", self.weight.clone()), ("constant", self.constant.clone())]
    }

    fn apply(&self, solver: &mut Solver) -> Result<(), SolverError> {
        let edges = solver.get_variables::<EdgeSelected>()?;
        let mut divisions = Vec::new();
        let mut others = Vec::new();
        {
            let graph = solver.graph();
            for (edge, index) in edges.iter() {
                match edge {
                    EdgeId::Hyper { ins, outs } if ins.len() == 1 && outs.len() == 2 => {
                        let parent = self.position.centroid(graph, ins)?;
                        let children = self.position.centroid(graph, outs)?;
                        check_dimensions(&parent, &children, outs[0], &self.position)?;
                        divisions.push((index, distance(&parent, &children)));
                    }
                    _ => others.push(index),
                }
            }
        }

        let mut terms = WeightedTerms::with_capacity(divisions.len());
        for (index, feature) in divisions {
            terms.push(index, Some(feature));
        }
        terms.charge(solver, &self.weight, &self.constant)?;
        for index in others {
            solver.add_variable_cost(index, 0.0, &self.weight)?;
            solver.add_variable_cost(index, 0.0, &self.constant)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs;

    fn division_graph() -> TrackGraph {
        let mut graph = TrackGraph::default();
        graph.add_node(0u64, attrs! { "t" => 0, "x" => 1.0, "y" => 1.0 }).unwrap();
        graph.add_node(1u64, attrs! { "t" => 1, "x" => 0.0, "y" => 1.0 }).unwrap();
        graph.add_node(2u64, attrs! { "t" => 1, "x" => 4.0, "y" => 1.0 }).unwrap();
        graph
            .add_node(3u64, attrs! { "t" => 1, "pos" => vec![3.0, 5.0] })
            .unwrap();
        graph.add_edge(EdgeId::simple(0u64, 1u64), attrs! {}).unwrap();
        graph
            .add_edge(EdgeId::hyper([0u64], [1u64, 2u64]).unwrap(), attrs! {})
            .unwrap();
        graph
    }

    fn cost_of(solver: &mut Solver, edge: &EdgeId) -> f64 {
        let edges = solver.get_variables::<EdgeSelected>().unwrap();
        let index = edges.get(edge).unwrap();
        solver.costs()[index.index()]
    }

    #[test]
    fn test_edge_distance_over_coordinates() {
        let mut solver = Solver::new(division_graph()).unwrap();
        solver
            .add_cost(EdgeDistance::new(["x", "y"]).with_weight(2.0).with_constant(0.5))
            .unwrap();
        let simple = cost_of(&mut solver, &EdgeId::simple(0u64, 1u64));
        assert!((simple - 2.5).abs() < 1e-9);
        // Centroid of the children is (2, 1): distance 1.
        let division = EdgeId::hyper([0u64], [1u64, 2u64]).unwrap();
        assert!((cost_of(&mut solver, &division) - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_symmetric_division_only_charges_divisions() {
        let mut solver = Solver::new(division_graph()).unwrap();
        solver
            .add_cost(SymmetricDivision::new(["x"]).with_constant(1.0))
            .unwrap();
        let division = EdgeId::hyper([0u64], [1u64, 2u64]).unwrap();
        assert!((cost_of(&mut solver, &division) - 2.0).abs() < 1e-9);
        assert!(cost_of(&mut solver, &EdgeId::simple(0u64, 1u64)).abs() < 1e-9);
        assert_eq!(solver.features().num_weights(), 2);
    }

    #[test]
    fn test_missing_position_is_reported() {
        let mut solver = Solver::new(division_graph()).unwrap();
        let err = solver.add_cost(EdgeDistance::new("pos")).unwrap_err();
        assert_eq!(err.code(), "SOLVER_MISSING_ATTRIBUTE");
    }

    #[test]
    fn test_list_attribute_position() {
        let mut graph = TrackGraph::default();
        graph.add_node(0u64, attrs! { "t" => 0, "pos" => vec![0.0, 0.0] }).unwrap();
        graph.add_node(1u64, attrs! { "t" => 1, "pos" => vec![3.0, 4.0] }).unwrap();
        graph.add_edge(EdgeId::simple(0u64, 1u64), attrs! {}).unwrap();
        let mut solver = Solver::new(graph).unwrap();
        solver.add_cost(EdgeDistance::new("pos")).unwrap();
        assert!((cost_of(&mut solver, &EdgeId::simple(0u64, 1u64)) - 5.0).abs() < 1e-9);
    }
}
