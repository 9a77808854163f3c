//! In-memory collaborators. The session server answers from these, and
//! tests inspect what a session handed off.

use std::cell::RefCell;

use anyhow::Result;

use crate::domain::highlight::GraphView;
use crate::ports::{GraphRenderer, TableView};

/// Keeps every rendered view, in render order.
#[derive(Debug, Default)]
pub struct MemoryRenderer {
    renders: RefCell<Vec<(String, GraphView)>>,
}

impl MemoryRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn renders(&self) -> Vec<(String, GraphView)> {
        self.renders.borrow().clone()
    }

    pub fn last(&self) -> Option<(String, GraphView)> {
        self.renders.borrow().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.renders.borrow().len()
    }
}

impl GraphRenderer for MemoryRenderer {
    fn render(&self, name: &str, view: &GraphView) -> Result<()> {
        self.renders.borrow_mut().push((name.to_string(), view.clone()));
        Ok(())
    }
}

/// Keeps the last table shown.
#[derive(Debug, Default)]
pub struct MemoryTableView {
    shown: RefCell<Option<(Vec<String>, Vec<Vec<String>>)>>,
}

impl MemoryTableView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> Option<Vec<String>> {
        self.shown.borrow().as_ref().map(|(columns, _)| columns.clone())
    }

    pub fn rows(&self) -> Option<Vec<Vec<String>>> {
        self.shown.borrow().as_ref().map(|(_, rows)| rows.clone())
    }
}

impl TableView for MemoryTableView {
    fn show(&self, columns: &[String], rows: &[Vec<String>]) -> Result<()> {
        *self.shown.borrow_mut() = Some((columns.to_vec(), rows.to_vec()));
        Ok(())
    }
}
