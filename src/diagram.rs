//! Flowchart derived from a roadmap's phase order.
//!
//! The graph is always a single path: `start -> phase 1 -> ... -> phase n -> end`.
//! It is recomputed on demand and never stored alongside the roadmap.

use serde::Serialize;

use crate::models::{unique_phase_ids, Phase};

pub const START_NODE_ID: &str = "start";
pub const END_NODE_ID: &str = "end";
const COLUMN_X: f64 = 250.0;
const ROW_SPACING: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Input,
    Default,
    Output,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeLabel {
    pub label: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub data: NodeLabel,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagramEdge {
    pub id: String,
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Diagram {
    pub nodes: Vec<DiagramNode>,
    pub edges: Vec<DiagramEdge>,
}

fn node(id: String, kind: NodeKind, label: &str, row: usize) -> DiagramNode {
    DiagramNode {
        id,
        kind,
        data: NodeLabel { label: label.to_string() },
        position: Position { x: COLUMN_X, y: row as f64 * ROW_SPACING },
    }
}

impl Diagram {
    pub fn from_phases(phases: &[Phase]) -> Self {
        let mut nodes = Vec::with_capacity(phases.len() + 2);
        let mut edges = Vec::with_capacity(phases.len() + 1);

        nodes.push(node(START_NODE_ID.to_string(), NodeKind::Input, "Start Learning", 0));

        let mut previous = START_NODE_ID.to_string();
        for (index, (phase, id)) in phases.iter().zip(unique_phase_ids(phases)).enumerate() {
            nodes.push(node(id.clone(), NodeKind::Default, &phase.title, index + 1));
            edges.push(DiagramEdge { id: format!("edge-{index}"), source: previous, target: id.clone() });
            previous = id;
        }

        nodes.push(node(END_NODE_ID.to_string(), NodeKind::Output, "Complete!", phases.len() + 1));
        edges.push(DiagramEdge { id: "edge-final".to_string(), source: previous, target: END_NODE_ID.to_string() });

        Self { nodes, edges }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn phases(n: usize) -> Vec<Phase> {
        (0..n)
            .map(|i| Phase { id: format!("p{i}"), title: format!("Phase {i}"), ..Default::default() })
            .collect()
    }

    // Walks the edges from `start` and returns the visited node ids.
    fn walk(diagram: &Diagram) -> Vec<String> {
        let next: HashMap<&str, &str> = diagram.edges.iter().map(|e| (e.source.as_str(), e.target.as_str())).collect();
        assert_eq!(next.len(), diagram.edges.len(), "a node has more than one outgoing edge");
        let mut path = vec![START_NODE_ID.to_string()];
        let mut current = START_NODE_ID;
        while let Some(&target) = next.get(current) {
            assert!(!path.iter().any(|p| p == target), "cycle at {target}");
            path.push(target.to_string());
            current = target;
        }
        path
    }

    #[test]
    fn path_graph_for_any_phase_count() {
        for n in 0..8 {
            let diagram = Diagram::from_phases(&phases(n));
            assert_eq!(diagram.nodes.len(), n + 2);
            assert_eq!(diagram.edges.len(), n + 1);

            let path = walk(&diagram);
            let node_ids: Vec<String> = diagram.nodes.iter().map(|n| n.id.clone()).collect();
            assert_eq!(path, node_ids);
            assert_eq!(path.last().map(String::as_str), Some(END_NODE_ID));
        }
    }

    #[test]
    fn empty_roadmap_links_start_to_end() {
        let diagram = Diagram::from_phases(&[]);
        assert_eq!(
            diagram.edges,
            vec![DiagramEdge { id: "edge-final".into(), source: "start".into(), target: "end".into() }]
        );
    }

    #[test]
    fn nodes_are_stacked_vertically() {
        let diagram = Diagram::from_phases(&phases(3));
        let ys: Vec<f64> = diagram.nodes.iter().map(|n| n.position.y).collect();
        assert_eq!(ys, vec![0.0, 150.0, 300.0, 450.0, 600.0]);
        assert!(diagram.nodes.iter().all(|n| n.position.x == COLUMN_X));
        assert_eq!(diagram.nodes[0].kind, NodeKind::Input);
        assert_eq!(diagram.nodes[4].kind, NodeKind::Output);
    }

    #[test]
    fn blank_phase_ids_fall_back_to_position() {
        let mut input = phases(2);
        input[1].id = String::new();
        let diagram = Diagram::from_phases(&input);
        assert_eq!(diagram.nodes[2].id, "phase-2");
        assert_eq!(diagram.edges[2].source, "phase-2");
    }

    #[test]
    fn repeated_ids_never_loop_back() {
        let mut input = phases(3);
        input[0].id = "phase-1".into();
        input[1].id = "phase-1".into();
        let diagram = Diagram::from_phases(&input);
        assert!(diagram.edges.iter().all(|e| e.source != e.target));
        assert_eq!(walk(&diagram).len(), 5);
    }

    #[test]
    fn phases_named_start_or_end_get_their_own_nodes() {
        let mut input = phases(2);
        input[0].id = START_NODE_ID.into();
        input[1].id = END_NODE_ID.into();
        let diagram = Diagram::from_phases(&input);
        let ids: Vec<&str> = diagram.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["start", "phase-1", "phase-2", "end"]);
        assert_eq!(walk(&diagram), ids);
    }

    #[test]
    fn serializes_in_flowchart_shape() {
        let value = serde_json::to_value(Diagram::from_phases(&phases(1))).unwrap();
        assert_eq!(value["nodes"][0]["type"], "input");
        assert_eq!(value["nodes"][1]["data"]["label"], "Phase 0");
        assert_eq!(value["edges"][0]["source"], "start");
    }
}
