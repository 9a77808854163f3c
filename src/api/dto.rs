use serde::{Deserialize, Serialize};

use crate::domain::callgraph::CallGraph;
use crate::domain::highlight::RenderedEdge;
use crate::domain::locals_table::LocalsTable;

#[derive(Debug, Serialize, Deserialize)]
pub struct GraphDto {
    pub name: String,
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NodeDto {
    pub id: usize,
    pub label: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EdgeDto {
    pub from: usize,
    pub to: usize,
    pub contributors: Vec<usize>,
}

impl GraphDto {
    pub fn new(name: &str, cg: &CallGraph) -> Self {
        let nodes = cg
            .nodes
            .iter()
            .map(|n| NodeDto {
                id: n.id,
                label: n.label(),
            })
            .collect();
        let edges = cg
            .edges
            .iter()
            .map(|e| EdgeDto {
                from: e.from,
                to: e.to,
                contributors: e.contributors.iter().copied().collect(),
            })
            .collect();
        GraphDto {
            name: name.to_string(),
            nodes,
            edges,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TableDto {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub invalid_rows: Vec<usize>,
    pub issues: Vec<String>,
}

impl From<&LocalsTable> for TableDto {
    fn from(table: &LocalsTable) -> Self {
        TableDto {
            columns: table.columns(),
            rows: table.cell_rows(),
            invalid_rows: table
                .rows
                .iter()
                .filter(|r| !r.schema_valid)
                .map(|r| r.index)
                .collect(),
            issues: table.issues.iter().map(|i| i.to_string()).collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectionDto {
    pub index: usize,
    pub edges: Vec<SelectedEdgeDto>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SelectedEdgeDto {
    pub from: usize,
    pub to: usize,
    pub selected: bool,
}

impl SelectionDto {
    pub fn new(index: usize, edges: &[RenderedEdge]) -> Self {
        SelectionDto {
            index,
            edges: edges
                .iter()
                .map(|e| SelectedEdgeDto {
                    from: e.from,
                    to: e.to,
                    selected: e.selected,
                })
                .collect(),
        }
    }
}
