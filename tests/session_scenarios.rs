/// Session Scenario Tests
///
/// Drives full sessions (capture -> complete -> select) against in-memory
/// collaborators and checks the graph, highlight and table hand-offs.

use std::cell::Cell;
use std::collections::{BTreeSet, HashSet};

use hitgraph::application::{CaptureMode, Session, SessionError};
use hitgraph::config::Config;
use hitgraph::domain::callgraph::{CallGraph, GraphBuilder};
use hitgraph::domain::capture::{CaptureStore, LocalVar, RawFrame};
use hitgraph::domain::error::CaptureError;
use hitgraph::domain::highlight::{render, GraphView};
use hitgraph::infrastructure::{MemoryRenderer, MemoryTableView};
use hitgraph::ports::GraphRenderer;

fn frames(names: &[&str]) -> Vec<RawFrame> {
    names.iter().map(|n| RawFrame::named(*n)).collect()
}

fn locals(pairs: &[(&str, &str)]) -> Vec<LocalVar> {
    pairs.iter().map(|(n, v)| LocalVar::new(*n, *v)).collect()
}

/// Node name pairs of the edges flagged in `view`.
fn highlighted_pairs(graph: &CallGraph, view: &GraphView) -> HashSet<(String, String)> {
    view.highlighted()
        .map(|e| {
            (
                graph.nodes[e.from].name.clone(),
                graph.nodes[e.to].name.clone(),
            )
        })
        .collect()
}

fn pair(from: &str, to: &str) -> (String, String) {
    (from.to_string(), to.to_string())
}

#[test]
fn test_two_paths_graph_and_highlight() {
    let renderer = MemoryRenderer::new();
    let table = MemoryTableView::new();
    let mut session = Session::start("leaf.cc:42", &Config::default(), &renderer, &table).unwrap();

    assert!(!session.on_capture(frames(&["Leaf", "Mid", "Main"]), locals(&[("x", "1")])));
    assert!(!session.on_capture(frames(&["Leaf", "Other", "Main"]), locals(&[("x", "2")])));
    session.on_complete().unwrap();

    let graph = session.graph().unwrap().clone();
    let mut names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
    names.sort();
    assert_eq!(names, vec!["Leaf", "Main", "Mid", "Other"]);

    let edges: HashSet<(String, String)> = graph
        .edges
        .iter()
        .map(|e| (graph.nodes[e.from].name.clone(), graph.nodes[e.to].name.clone()))
        .collect();
    assert_eq!(
        edges,
        HashSet::from([
            pair("Main", "Mid"),
            pair("Mid", "Leaf"),
            pair("Main", "Other"),
            pair("Other", "Leaf"),
        ])
    );
    assert!(graph.edges.iter().all(|e| e.contributors.len() == 1));

    // Completion renders the overview with nothing highlighted.
    let (name, overview) = renderer.last().unwrap();
    assert_eq!(name, "leaf.cc-42");
    assert_eq!(overview.highlighted().count(), 0);

    // Selecting capture 1 highlights exactly its path.
    session.on_row_selected(1).unwrap();
    let (name, selected) = renderer.last().unwrap();
    assert_eq!(name, "leaf.cc-42-1");
    assert_eq!(
        highlighted_pairs(&graph, &selected),
        HashSet::from([pair("Main", "Other"), pair("Other", "Leaf")])
    );
    assert!(selected
        .edges
        .iter()
        .filter(|e| !e.selected)
        .all(|e| e.color == "black"));

    // Selecting does not rebuild the graph.
    assert_eq!(session.graph().unwrap(), &graph);
}

#[test]
fn test_single_frame_capture() {
    let renderer = MemoryRenderer::new();
    let table = MemoryTableView::new();
    let mut session = Session::start("x", &Config::default(), &renderer, &table).unwrap();

    session.on_capture(frames(&["X"]), vec![]);
    session.on_complete().unwrap();

    let graph = session.graph().unwrap();
    assert_eq!(graph.nodes.len(), 1);
    assert_eq!(graph.nodes[0].name, "X");
    assert!(graph.edges.is_empty());
}

#[test]
fn test_empty_session_completes() {
    let renderer = MemoryRenderer::new();
    let table = MemoryTableView::new();
    let mut session = Session::start("never-hit", &Config::default(), &renderer, &table).unwrap();

    let projected = session.on_complete().unwrap();
    assert!(projected.is_empty());
    assert!(session.graph().unwrap().is_empty());
    assert_eq!(table.columns().unwrap(), vec!["Stack Index", "test name"]);
    assert!(session.on_row_selected(0).is_err());
}

#[test]
fn test_identical_stacks_share_one_edge() {
    let mut store = CaptureStore::default();
    for _ in 0..5 {
        store.append(frames(&["leaf", "mid", "main"]), vec![]);
    }
    let graph = CallGraph::build(&store);
    assert_eq!(graph.edges.len(), 2);
    for edge in &graph.edges {
        assert_eq!(edge.contributors, BTreeSet::from([0, 1, 2, 3, 4]));
    }
}

#[test]
fn test_every_adjacent_pair_has_an_edge() {
    let stacks: Vec<Vec<&str>> = vec![
        vec!["d", "c", "b", "a"],
        vec!["e", "c", "a"],
        vec!["d", "b", "a"],
        vec!["a"],
        vec!["c", "c", "a"],
    ];
    let mut store = CaptureStore::default();
    for stack in &stacks {
        store.append(frames(stack), vec![]);
    }
    let graph = CallGraph::build(&store);

    let distinct: HashSet<&str> = stacks.iter().flatten().copied().collect();
    assert_eq!(graph.nodes.len(), distinct.len());

    for (index, stack) in stacks.iter().enumerate() {
        for window in stack.windows(2) {
            let edge = graph
                .edge_between(window[1], window[0])
                .unwrap_or_else(|| panic!("missing edge {} -> {}", window[1], window[0]));
            assert!(edge.contributors.contains(&index));
        }
    }

    let mut keys: Vec<(usize, usize)> = graph.edges.iter().map(|e| (e.from, e.to)).collect();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), graph.edges.len(), "edges must be unique per pair");
}

#[test]
fn test_highlight_matches_contributors() {
    let mut store = CaptureStore::default();
    store.append(frames(&["d", "c", "b", "a"]), vec![]);
    store.append(frames(&["e", "c", "a"]), vec![]);
    store.append(frames(&["d", "c", "b", "a"]), vec![]);
    let graph = CallGraph::build(&store);

    for selected in [None, Some(0), Some(1), Some(2), Some(3)] {
        for (edge, rendered) in graph.edges.iter().zip(render(&graph, selected)) {
            let expected = selected.is_some_and(|k| edge.contributors.contains(&k));
            assert_eq!(rendered.selected, expected);
            assert_eq!((rendered.from, rendered.to), (edge.from, edge.to));
        }
    }
}

#[test]
fn test_rebuild_is_stable() {
    let mut store = CaptureStore::default();
    store.append(frames(&["Leaf", "Mid", "Main"]), vec![]);
    store.append(frames(&["Leaf", "Other", "Main"]), vec![]);

    let first = CallGraph::build(&store);
    let second = CallGraph::build(&store);
    assert_eq!(first, second);

    // A memoized builder hands back the same graph without rebuilding.
    let mut builder = GraphBuilder::default();
    assert_eq!(builder.build(&store), &first);
    assert_eq!(builder.build(&store), &first);
    assert_eq!(builder.builds(), 1);

    // Ids already handed out survive growth of the store.
    store.append(frames(&["New", "Main"]), vec![]);
    let grown = builder.build(&store).clone();
    assert_eq!(builder.builds(), 2);
    for node in &first.nodes {
        assert_eq!(grown.nodes[node.id].name, node.name);
    }
}

#[test]
fn test_pause_on_hit_mode() {
    let renderer = MemoryRenderer::new();
    let table = MemoryTableView::new();
    let mut config = Config::default();
    config.session.mode = CaptureMode::PauseOnHit;
    let mut session = Session::start("inspect", &config, &renderer, &table).unwrap();

    assert!(session.on_capture(frames(&["leaf(int)", "std::run()", "main"]), locals(&[("n", "1")])));
    assert!(session.on_capture(frames(&["leaf(int)", "main"]), locals(&[("n", "2")])));
    assert_eq!(session.store().count(), 2);

    // The report shows canonical names, innermost first, then the locals.
    let report = session.hit_report(0).unwrap();
    assert_eq!(report.location, "inspect");
    assert_eq!(report.frames, vec!["leaf", "run", "main"]);
    assert_eq!(report.locals, vec!["n: 1"]);
    assert_eq!(
        session.hit_report(1).unwrap().lines().collect::<Vec<_>>(),
        vec!["leaf", "main", "n: 2"]
    );
    assert_eq!(
        session.hit_report(2).unwrap_err(),
        CaptureError::IndexOutOfRange { index: 2, count: 2 }
    );
}

#[test]
fn test_lifecycle_errors() {
    let renderer = MemoryRenderer::new();
    let table = MemoryTableView::new();
    let mut session = Session::start("leaf", &Config::default(), &renderer, &table).unwrap();
    session.on_capture(frames(&["leaf", "main"]), vec![]);

    let err = session.on_row_selected(0).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::NotCompleted(_))
    ));

    session.on_complete().unwrap();
    let err = session.on_complete().unwrap_err();
    assert!(matches!(
        err.downcast_ref::<SessionError>(),
        Some(SessionError::AlreadyCompleted(_))
    ));

    let err = session.on_row_selected(3).unwrap_err();
    assert_eq!(
        err.downcast_ref::<SessionError>(),
        Some(&SessionError::Capture(CaptureError::IndexOutOfRange { index: 3, count: 1 }))
    );

    // Late captures are dropped and never pause the exiting target.
    assert!(!session.on_capture(frames(&["late", "main"]), vec![]));
    assert_eq!(session.store().count(), 1);
    assert_eq!(renderer.count(), 1);
}

#[test]
fn test_table_handoff_flags_bad_rows() {
    let renderer = MemoryRenderer::new();
    let table = MemoryTableView::new();
    let mut config = Config::default();
    config.table.test_name_depth = 2;
    let mut session = Session::start("bridge", &config, &renderer, &table).unwrap();

    session.on_capture(
        frames(&["Import", "TestRoundtrip", "main"]),
        locals(&[("array", "[1, 2]"), ("status", "OK")]),
    );
    session.on_capture(frames(&["Import", "main"]), locals(&[("array", "[]")]));
    session.on_capture(
        frames(&["Import"]),
        locals(&[("array", "[3]"), ("status", "Invalid")]),
    );

    let projected = session.on_complete().unwrap();
    assert_eq!(projected.issues.len(), 2);
    assert!(!projected.rows[1].schema_valid);
    assert_eq!(projected.rows[2].test_name, None);

    assert_eq!(
        table.columns().unwrap(),
        vec!["Stack Index", "array", "status", "test name"]
    );
    assert_eq!(
        table.rows().unwrap(),
        vec![
            vec!["0", "[1, 2]", "OK", "TestRoundtrip"],
            vec!["1", "", "", "Import"],
            vec!["2", "[3]", "Invalid", ""],
        ]
    );
}

struct FailingRenderer {
    calls: Cell<usize>,
}

impl GraphRenderer for FailingRenderer {
    fn render(&self, _name: &str, _view: &GraphView) -> anyhow::Result<()> {
        self.calls.set(self.calls.get() + 1);
        anyhow::bail!("layout engine unavailable")
    }
}

#[test]
fn test_render_failure_propagates() {
    let renderer = FailingRenderer { calls: Cell::new(0) };
    let table = MemoryTableView::new();
    let mut session = Session::start("leaf", &Config::default(), &renderer, &table).unwrap();
    session.on_capture(frames(&["leaf", "main"]), vec![]);

    let err = session.on_complete().unwrap_err();
    assert!(format!("{:#}", err).contains("layout engine unavailable"));
    assert_eq!(renderer.calls.get(), 1);
}
