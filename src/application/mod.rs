//! Session Controller
//!
//! Drives one capture session: a capture per breakpoint hit, a single
//! completion that materializes the graph and the locals table, then any
//! number of row selections re-rendering the already built graph.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::domain::callgraph::{CallGraph, GraphBuilder};
use crate::domain::capture::{CaptureStore, LocalVar, RawFrame};
use crate::domain::error::CaptureError;
use crate::domain::highlight::{render, EdgePalette, GraphView, RenderedEdge};
use crate::domain::locals_table::{project, LocalsTable};
use crate::ports::{GraphRenderer, TableView};

/// What a breakpoint hit does besides recording the capture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureMode {
    /// Report the hit and stop the target, like a plain inspection breakpoint.
    PauseOnHit,
    /// Record silently and let the target run on.
    #[default]
    AggregateOnly,
}

impl CaptureMode {
    pub fn should_pause(self) -> bool {
        matches!(self, CaptureMode::PauseOnHit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session at {0} has already completed")]
    AlreadyCompleted(String),
    #[error("session at {0} has not completed yet")]
    NotCompleted(String),
    #[error(transparent)]
    Capture(#[from] CaptureError),
}

/// What a pausing breakpoint shows: one canonical frame name per line,
/// innermost first, then `name: value` per local.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HitReport {
    pub index: usize,
    pub location: String,
    pub frames: Vec<String>,
    pub locals: Vec<String>,
}

impl HitReport {
    pub fn lines(&self) -> impl Iterator<Item = &str> + '_ {
        self.frames.iter().chain(&self.locals).map(String::as_str)
    }
}

pub struct Session<'a> {
    location: String,
    graph_name: String,
    mode: CaptureMode,
    test_name_depth: usize,
    palette: EdgePalette,
    store: CaptureStore,
    builder: GraphBuilder,
    table: Option<LocalsTable>,
    renderer: &'a dyn GraphRenderer,
    table_view: &'a dyn TableView,
}

impl<'a> Session<'a> {
    /// Start capturing at `location` (a breakpoint location such as `bridge.cc:120`).
    pub fn start(
        location: &str,
        config: &Config,
        renderer: &'a dyn GraphRenderer,
        table_view: &'a dyn TableView,
    ) -> Result<Self> {
        config.validate()?;
        let normalizer = config.normalizer()?;
        let graph_name = config
            .graph
            .name
            .clone()
            .unwrap_or_else(|| artifact_name(location));

        info!(location, graph = %graph_name, mode = ?config.session.mode, "capture session started");

        Ok(Self {
            location: location.to_string(),
            graph_name,
            mode: config.session.mode,
            test_name_depth: config.table.test_name_depth,
            palette: config.graph.palette(),
            store: CaptureStore::new(normalizer),
            builder: GraphBuilder::new(config.graph.identity),
            table: None,
            renderer,
            table_view,
        })
    }

    /// Record one breakpoint hit. Returns whether the target should stop.
    pub fn on_capture(&mut self, frames: Vec<RawFrame>, locals: Vec<LocalVar>) -> bool {
        if self.is_completed() {
            warn!(location = %self.location, "capture after completion ignored");
            return false;
        }

        let index = self.store.append(frames, locals);
        if self.mode.should_pause() {
            self.report_hit(index);
        }
        self.mode.should_pause()
    }

    /// Materialize and hand off the graph and the locals table.
    ///
    /// Runs once, when the target exits. Render failures propagate.
    pub fn on_complete(&mut self) -> Result<&LocalsTable> {
        if self.is_completed() {
            return Err(SessionError::AlreadyCompleted(self.location.clone()).into());
        }

        let table = project(&self.store, self.test_name_depth);
        for issue in &table.issues {
            warn!(%issue, "locals table row flagged");
        }
        let table = self.table.insert(table);

        let graph = self.builder.build(&self.store);
        info!(
            captures = self.store.count(),
            nodes = graph.nodes.len(),
            edges = graph.edges.len(),
            "capture session complete"
        );

        let view = GraphView::new(graph, None, &self.palette);
        self.renderer
            .render(&self.graph_name, &view)
            .with_context(|| format!("Failed to render call graph {}", self.graph_name))?;
        self.table_view
            .show(&table.columns(), &table.cell_rows())
            .context("Failed to show locals table")?;

        Ok(table)
    }

    /// Re-render the built graph with the edges of capture `index` highlighted.
    pub fn on_row_selected(&self, index: usize) -> Result<Vec<RenderedEdge>> {
        let (Some(table), Some(graph)) = (self.table.as_ref(), self.builder.cached()) else {
            return Err(SessionError::NotCompleted(self.location.clone()).into());
        };
        if table.row(index).is_none() {
            return Err(SessionError::from(CaptureError::IndexOutOfRange {
                index,
                count: table.len(),
            })
            .into());
        }

        let name = format!("{}-{}", self.graph_name, index);
        let view = GraphView::new(graph, Some(index), &self.palette);
        debug!(index, highlighted = view.highlighted().count(), "row selected");
        self.renderer
            .render(&name, &view)
            .with_context(|| format!("Failed to render call graph {}", name))?;

        Ok(render(graph, Some(index)))
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn graph_name(&self) -> &str {
        &self.graph_name
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn store(&self) -> &CaptureStore {
        &self.store
    }

    /// Graph built at completion.
    pub fn graph(&self) -> Option<&CallGraph> {
        self.builder.cached()
    }

    pub fn table(&self) -> Option<&LocalsTable> {
        self.table.as_ref()
    }

    pub fn palette(&self) -> &EdgePalette {
        &self.palette
    }

    pub fn is_completed(&self) -> bool {
        self.table.is_some()
    }

    /// Stack and locals of capture `index`, as shown when the target stops.
    pub fn hit_report(&self, index: usize) -> Result<HitReport, CaptureError> {
        let event = self.store.get(index)?;
        Ok(HitReport {
            index,
            location: self.location.clone(),
            frames: event.frame_names().map(str::to_string).collect(),
            locals: event
                .locals()
                .iter()
                .map(|local| format!("{}: {}", local.name, local.value))
                .collect(),
        })
    }

    fn report_hit(&self, index: usize) {
        let Ok(report) = self.hit_report(index) else {
            return;
        };
        info!(index, location = %self.location, "breakpoint hit");
        for line in report.lines() {
            info!(index, "{}", line);
        }
    }
}

/// File-system friendly artifact name for a breakpoint location.
fn artifact_name(location: &str) -> String {
    let name: String = location
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' { c } else { '-' })
        .collect();
    let name = name.trim_matches('-');
    if name.is_empty() {
        "call-graph".to_string()
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_name() {
        assert_eq!(artifact_name("bridge_test.cc:120"), "bridge_test.cc-120");
        assert_eq!(artifact_name("arrow::ImportArray"), "arrow--ImportArray");
        assert_eq!(artifact_name("  "), "call-graph");
    }

    #[test]
    fn test_mode_pause() {
        assert!(CaptureMode::PauseOnHit.should_pause());
        assert!(!CaptureMode::AggregateOnly.should_pause());
        assert_eq!(CaptureMode::default(), CaptureMode::AggregateOnly);
    }

    #[test]
    fn test_hit_report_lists_stack_then_locals() {
        let report = HitReport {
            index: 0,
            location: "leaf.cc:3".to_string(),
            frames: vec!["leaf".to_string(), "main".to_string()],
            locals: vec!["n: 3".to_string()],
        };
        assert_eq!(report.lines().collect::<Vec<_>>(), vec!["leaf", "main", "n: 3"]);
    }
}
