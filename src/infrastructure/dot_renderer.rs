//! Graphviz DOT Renderer
//!
//! Writes a [`GraphView`] as `<output_dir>/<name>.dot`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::domain::highlight::GraphView;
use crate::ports::GraphRenderer;

pub struct DotRenderer {
    output_dir: PathBuf,
}

impl DotRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path the artifact called `name` is written to.
    pub fn artifact_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.dot", name))
    }

    /// Convert a GraphView to a DOT string.
    pub fn to_dot(name: &str, view: &GraphView) -> String {
        let mut lines = Vec::new();

        lines.push(format!("digraph \"{}\" {{", Self::escape_label(name)));
        lines.push("    rankdir=TB;".to_string());
        lines.push("    node [shape=box, fontname=\"Helvetica\", fontsize=12];".to_string());
        lines.push("    edge [fontname=\"Helvetica\", fontsize=10];".to_string());
        lines.push("".to_string());

        for node in &view.nodes {
            lines.push(format!(
                "    \"{}\" [label=\"{}\"];",
                node.id,
                Self::escape_label(&node.label)
            ));
        }

        lines.push("".to_string());

        for edge in &view.edges {
            let width = if edge.selected { ", penwidth=2" } else { "" };
            lines.push(format!(
                "    \"{}\" -> \"{}\" [color=\"{}\"{}];",
                edge.from,
                edge.to,
                Self::escape_label(&edge.color),
                width
            ));
        }

        lines.push("}".to_string());

        lines.join("\n")
    }

    fn escape_label(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}

impl GraphRenderer for DotRenderer {
    fn render(&self, name: &str, view: &GraphView) -> Result<()> {
        fs::create_dir_all(&self.output_dir).with_context(|| {
            format!("Failed to create output directory {}", self.output_dir.display())
        })?;
        let path = self.artifact_path(name);
        fs::write(&path, Self::to_dot(name, view))
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), nodes = view.nodes.len(), edges = view.edges.len(), "call graph written");
        Ok(())
    }
}
