// Call graph structures for hitgraph.
// Aggregates captured stacks into deduplicated caller -> callee edges.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::capture::{CaptureStore, Frame};

/// What makes two frames the same node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeIdentity {
    /// Frames with the same canonical name fold into one node.
    #[default]
    Name,
    /// Frames also need the same call site to share a node.
    CallSite,
}

impl NodeIdentity {
    fn key(self, frame: &Frame) -> (String, Option<String>) {
        match self {
            NodeIdentity::Name => (frame.name.clone(), None),
            NodeIdentity::CallSite => (frame.name.clone(), frame.site.clone()),
        }
    }
}

/// A node in the call graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallGraphNode {
    pub id: usize,
    pub name: String,
    pub site: Option<String>, // only set under call-site identity
}

impl CallGraphNode {
    /// Display label for renderers.
    pub fn label(&self) -> String {
        match &self.site {
            Some(site) => format!("{} @ {}", self.name, site),
            None => self.name.clone(),
        }
    }
}

/// A caller -> callee edge and the captures that walked it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallGraphEdge {
    pub from: usize,
    pub to: usize,
    pub contributors: BTreeSet<usize>,
}

/// The call graph itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallGraph {
    pub nodes: Vec<CallGraphNode>,
    pub edges: Vec<CallGraphEdge>,
}

impl CallGraph {
    /// Build the graph with canonical-name identity.
    pub fn build(store: &CaptureStore) -> Self {
        Self::build_with(store, NodeIdentity::Name)
    }

    /// Build the graph from every capture in the store.
    ///
    /// Node ids follow order of first appearance, edges order of first
    /// traversal, so the result is a pure function of the store contents.
    pub fn build_with(store: &CaptureStore, identity: NodeIdentity) -> Self {
        let mut nodes: Vec<CallGraphNode> = Vec::new();
        let mut node_ids: HashMap<(String, Option<String>), usize> = HashMap::new();

        // Pass 1: node registry, remembering each capture's id sequence.
        let mut stacks: Vec<(usize, Vec<usize>)> = Vec::with_capacity(store.count());
        for event in store.all() {
            let ids = event
                .frames()
                .iter()
                .map(|frame| {
                    let key = identity.key(frame);
                    *node_ids.entry(key).or_insert_with_key(|(name, site)| {
                        nodes.push(CallGraphNode {
                            id: nodes.len(),
                            name: name.clone(),
                            site: site.clone(),
                        });
                        nodes.len() - 1
                    })
                })
                .collect();
            stacks.push((event.index(), ids));
        }

        // Pass 2: one edge per (caller, callee), accumulating contributors.
        let mut edges: Vec<CallGraphEdge> = Vec::new();
        let mut edge_slots: HashMap<(usize, usize), usize> = HashMap::new();
        for (index, ids) in &stacks {
            for pair in ids.windows(2) {
                let (to, from) = (pair[0], pair[1]);
                let slot = *edge_slots.entry((from, to)).or_insert_with(|| {
                    edges.push(CallGraphEdge {
                        from,
                        to,
                        contributors: BTreeSet::new(),
                    });
                    edges.len() - 1
                });
                edges[slot].contributors.insert(*index);
            }
        }

        debug!(
            captures = store.count(),
            nodes = nodes.len(),
            edges = edges.len(),
            "call graph built"
        );
        CallGraph { nodes, edges }
    }

    pub fn node(&self, id: usize) -> Option<&CallGraphNode> {
        self.nodes.get(id)
    }

    /// Id of the first node with this canonical name.
    pub fn node_id(&self, name: &str) -> Option<usize> {
        self.nodes.iter().find(|n| n.name == name).map(|n| n.id)
    }

    pub fn edge(&self, from: usize, to: usize) -> Option<&CallGraphEdge> {
        self.edges.iter().find(|e| e.from == from && e.to == to)
    }

    /// Edge lookup by canonical names.
    pub fn edge_between(&self, caller: &str, callee: &str) -> Option<&CallGraphEdge> {
        let from = self.node_id(caller)?;
        let to = self.node_id(callee)?;
        self.edge(from, to)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Memoizes the last graph, keyed by the store's capture count.
///
/// The store only grows, so an unchanged count means unchanged contents.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    identity: NodeIdentity,
    cached: Option<(usize, CallGraph)>,
    builds: usize,
}

impl GraphBuilder {
    pub fn new(identity: NodeIdentity) -> Self {
        Self {
            identity,
            cached: None,
            builds: 0,
        }
    }

    pub fn identity(&self) -> NodeIdentity {
        self.identity
    }

    /// Graph for the current store contents, rebuilt only when it grew.
    pub fn build(&mut self, store: &CaptureStore) -> &CallGraph {
        let count = store.count();
        let entry = match self.cached.take() {
            Some((built_for, graph)) if built_for == count => (built_for, graph),
            _ => {
                self.builds += 1;
                (count, CallGraph::build_with(store, self.identity))
            }
        };
        &self.cached.insert(entry).1
    }

    /// Last built graph, if any.
    pub fn cached(&self) -> Option<&CallGraph> {
        self.cached.as_ref().map(|(_, graph)| graph)
    }

    /// Number of full derivations performed so far.
    pub fn builds(&self) -> usize {
        self.builds
    }
}
