//! Highlight Query
//!
//! Read-only projections of a built [`CallGraph`] marking the edges one
//! capture walked through.

use serde::{Deserialize, Serialize};

use crate::domain::callgraph::CallGraph;

/// An edge as handed to a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderedEdge {
    pub from: usize,
    pub to: usize,
    pub selected: bool,
}

/// Edges of `graph` in graph order, flagged when `selected` contributed to them.
pub fn render(graph: &CallGraph, selected: Option<usize>) -> Vec<RenderedEdge> {
    graph
        .edges
        .iter()
        .map(|edge| RenderedEdge {
            from: edge.from,
            to: edge.to,
            selected: selected.is_some_and(|index| edge.contributors.contains(&index)),
        })
        .collect()
}

/// Color tags for highlighted and regular edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgePalette {
    pub highlight: String,
    pub base: String,
}

impl Default for EdgePalette {
    fn default() -> Self {
        Self {
            highlight: "red".to_string(),
            base: "black".to_string(),
        }
    }
}

impl EdgePalette {
    pub fn color(&self, selected: bool) -> &str {
        if selected {
            &self.highlight
        } else {
            &self.base
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewNode {
    pub id: usize,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewEdge {
    pub from: usize,
    pub to: usize,
    pub selected: bool,
    pub color: String,
}

/// Everything a rendering backend needs: labelled nodes, colored edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GraphView {
    pub selected: Option<usize>,
    pub nodes: Vec<ViewNode>,
    pub edges: Vec<ViewEdge>,
}

impl GraphView {
    pub fn new(graph: &CallGraph, selected: Option<usize>, palette: &EdgePalette) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|node| ViewNode {
                id: node.id,
                label: node.label(),
            })
            .collect();
        let edges = render(graph, selected)
            .into_iter()
            .map(|edge| ViewEdge {
                from: edge.from,
                to: edge.to,
                selected: edge.selected,
                color: palette.color(edge.selected).to_string(),
            })
            .collect();
        Self {
            selected,
            nodes,
            edges,
        }
    }

    pub fn highlighted(&self) -> impl Iterator<Item = &ViewEdge> + '_ {
        self.edges.iter().filter(|edge| edge.selected)
    }
}
