//! Costs on track events: appear, disappear, split and merge.

use crate::Solver;
use crate::costs::{Cost, Weight, WeightedTerms, numeric_attribute};
use crate::error::SolverError;
use crate::graph::{NodeId, TrackGraph};
use crate::variables::{NodeAppear, NodeDisappear, NodeMerge, NodeSplit, VariableKind};

/// Which boundary frame an endpoint cost may exempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    First,
    Last,
}

impl Boundary {
    fn contains(self, graph: &TrackGraph, node: NodeId) -> bool {
        let (begin, end) = graph.get_frames();
        let frame = graph.frame_of(node);
        match self {
            Boundary::First => frame.is_some() && frame == begin,
            Boundary::Last => frame.is_some() && frame == end.map(|end| end - 1),
        }
    }
}

/// Shared body of the four node-event costs.
#[derive(Debug, Clone)]
struct EventCost {
    weight: Weight,
    attribute: Option<String>,
    constant: Weight,
    ignore_attribute: Option<String>,
    exempt_boundary_frames: bool,
}

impl EventCost {
    fn new(weight: f64) -> Self {
        Self {
            weight: Weight::new(weight),
            attribute: None,
            constant: Weight::new(0.0),
            ignore_attribute: None,
            exempt_boundary_frames: false,
        }
    }

    fn weights(&self) -> Vec<(&'static str, Weight)> {
        vec![("weight", self.weight.clone()), ("constant", self.constant.clone())]
    }

    /// An explicit ignore attribute decides when present; otherwise boundary
    /// nodes are exempt if requested.
    fn is_exempt(&self, graph: &TrackGraph, node: NodeId, boundary: Option<Boundary>) -> bool {
        let flag = self.ignore_attribute.as_ref().and_then(|attribute| {
            graph
                .node_attrs(node)
                .and_then(|attributes| attributes.get(attribute))
        });
        match (flag, boundary) {
            (Some(flag), _) => flag.is_truthy(),
            (None, Some(boundary)) => {
                self.exempt_boundary_frames && boundary.contains(graph, node)
            }
            (None, None) => false,
        }
    }

    fn apply<K: VariableKind<Key = NodeId>>(
        &self,
        solver: &mut Solver,
        boundary: Option<Boundary>,
    ) -> Result<(), SolverError> {
        let indicators = solver.get_variables::<K>()?;
        let graph = solver.graph();
        let mut terms = WeightedTerms::with_capacity(indicators.len());
        for (node, index) in indicators.iter() {
            if self.is_exempt(graph, *node, boundary) {
                continue;
            }
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

macro_rules! event_cost {
    ($(#[$doc:meta])* $name:ident, $kind:ty, $boundary:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone)]
        pub struct $name(EventCost);

        impl $name {
            /// Cost with attribute weight `weight` and no constant.
            pub fn new(weight: f64) -> Self {
                Self(EventCost::new(weight))
            }

            /// Node attribute providing the feature; without it only the
            /// constant applies.
            pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
                self.0.attribute = Some(attribute.into());
                self
            }

            /// Constant added per event.
            pub fn with_constant(mut self, constant: f64) -> Self {
                self.0.constant = Weight::new(constant);
                self
            }

            /// Weight scaling the attribute feature.
            pub fn weight(&self) -> &Weight {
                &self.0.weight
            }

            /// Weight of the constant feature.
            pub fn constant(&self) -> &Weight {
                &self.0.constant
            }
        }

        impl Cost for $name {
            fn name(&self) -> &'static str {
                stringify!($name)
            }

            fn weights(&self) -> Vec<(&'static str, Weight)> {
                self.0.weights()
            }

            fn apply(&self, solver: &mut Solver) -> Result<(), SolverError> {
                self.0.apply::<$kind>(solver, $boundary)
            }
        }
    };
}

macro_rules! endpoint_options {
    ($name:ident) => {
        impl $name {
            /// Nodes whose value for `attribute` is truthy are not charged;
            /// falsy values force a charge even on boundary frames.
            pub fn with_ignore_attribute(mut self, attribute: impl Into<String>) -> Self {
                self.0.ignore_attribute = Some(attribute.into());
                self
            }

            /// Do not charge nodes in the boundary frame unless they carry
            /// the ignore attribute.
            pub fn with_exempt_boundary_frames(mut self, exempt: bool) -> Self {
                self.0.exempt_boundary_frames = exempt;
                self
            }
        }
    };
}

event_cost!(
    /// Cost per track start: `weight * attribute + constant`.
    Appear,
    NodeAppear,
    Some(Boundary::First)
);
event_cost!(
    /// Cost per track end: `weight * attribute + constant`.
    Disappear,
    NodeDisappear,
    Some(Boundary::Last)
);
event_cost!(
    /// Cost per node with more than one selected child.
    Split,
    NodeSplit,
    None
);
event_cost!(
    /// Cost per node with more than one selected parent.
    Merge,
    NodeMerge,
    None
);
endpoint_options!(Appear);
endpoint_options!(Disappear);

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::attrs;
    use crate::graph::EdgeId;

    fn chain() -> TrackGraph {
        let mut graph = TrackGraph::default();
        graph.add_node(0u64, attrs! { "t" => 0, "score" => 1.0 }).unwrap();
        graph.add_node(1u64, attrs! { "t" => 1, "score" => 2.0 }).unwrap();
        graph
            .add_node(2u64, attrs! { "t" => 2, "score" => 3.0, "skip" => true })
            .unwrap();
        graph.add_edge(EdgeId::simple(0u64, 1u64), attrs! {}).unwrap();
        graph.add_edge(EdgeId::simple(1u64, 2u64), attrs! {}).unwrap();
        graph
    }

    fn cost_of<K: VariableKind<Key = NodeId>>(solver: &mut Solver, node: u64) -> f64 {
        let indicators = solver.get_variables::<K>().unwrap();
        let index = indicators.get(&NodeId::new(node)).unwrap();
        solver.costs()[index.index()]
    }

    #[test]
    fn test_appear_with_attribute() {
        let mut solver = Solver::new(chain()).unwrap();
        solver
            .add_cost(Appear::new(-1.0).with_attribute("score").with_constant(10.0))
            .unwrap();
        assert_eq!(cost_of::<NodeAppear>(&mut solver, 0), 9.0);
        assert_eq!(cost_of::<NodeAppear>(&mut solver, 1), 8.0);
    }

    #[test]
    fn test_boundary_exemption() {
        let mut solver = Solver::new(chain()).unwrap();
        solver
            .add_cost(Appear::new(0.0).with_constant(5.0).with_exempt_boundary_frames(true))
            .unwrap();
        solver
            .add_cost(Disappear::new(0.0).with_constant(7.0).with_exempt_boundary_frames(true))
            .unwrap();
        assert_eq!(cost_of::<NodeAppear>(&mut solver, 0), 0.0);
        assert_eq!(cost_of::<NodeAppear>(&mut solver, 1), 5.0);
        assert_eq!(cost_of::<NodeDisappear>(&mut solver, 1), 7.0);
        assert_eq!(cost_of::<NodeDisappear>(&mut solver, 2), 0.0);
    }

    #[test]
    fn test_ignore_attribute_takes_precedence() {
        let mut graph = chain();
        graph.add_node(0u64, attrs! { "skip" => false }).unwrap();
        let mut solver = Solver::new(graph).unwrap();
        solver
            .add_cost(
                Appear::new(0.0)
                    .with_constant(5.0)
                    .with_ignore_attribute("skip")
                    .with_exempt_boundary_frames(true),
            )
            .unwrap();
        solver
            .add_cost(Disappear::new(0.0).with_constant(7.0).with_ignore_attribute("skip"))
            .unwrap();
        // Explicit `false` on a first-frame node overrides the exemption.
        assert_eq!(cost_of::<NodeAppear>(&mut solver, 0), 5.0);
        assert_eq!(cost_of::<NodeDisappear>(&mut solver, 2), 0.0);
        assert_eq!(cost_of::<NodeDisappear>(&mut solver, 1), 7.0);
    }

    #[test]
    fn test_split_and_merge_names() {
        let mut solver = Solver::new(chain()).unwrap();
        solver.add_cost(Split::new(1.0).with_constant(3.0)).unwrap();
        solver.add_cost(Merge::new(1.0).with_constant(4.0)).unwrap();
        assert_eq!(solver.weights().get("Split", "constant"), Some(3.0));
        assert_eq!(solver.weights().get("Merge", "constant"), Some(4.0));
        assert_eq!(cost_of::<NodeSplit>(&mut solver, 1), 3.0);
        assert_eq!(cost_of::<NodeMerge>(&mut solver, 1), 4.0);
    }
}
