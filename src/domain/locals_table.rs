//! Locals Table Projector
//!
//! One row per capture: the formatted locals of the breakpoint frame plus a
//! test name read from a fixed depth of the stack. Malformed rows are
//! flagged and reported, never fatal.

use serde::Serialize;
use thiserror::Error;

use crate::domain::capture::{CaptureEvent, CaptureStore};

pub const STACK_INDEX_COLUMN: &str = "Stack Index";
pub const TEST_NAME_COLUMN: &str = "test name";

/// A per-row problem found while projecting.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowIssue {
    #[error("capture {index}: locals {found:?} do not match the table schema {expected:?}")]
    SchemaMismatch {
        index: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("capture {index}: stack of depth {len} is shorter than the test name depth {depth}")]
    DepthOutOfRange { index: usize, depth: usize, len: usize },
}

impl RowIssue {
    pub fn index(&self) -> usize {
        match self {
            RowIssue::SchemaMismatch { index, .. } | RowIssue::DepthOutOfRange { index, .. } => {
                *index
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableRow {
    pub index: usize,
    /// Local values in schema order. Empty when `schema_valid` is false.
    pub values: Vec<String>,
    pub test_name: Option<String>,
    pub schema_valid: bool,
}

/// Projected table. The schema is the local names of the first capture.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LocalsTable {
    pub schema: Vec<String>,
    pub rows: Vec<TableRow>,
    pub issues: Vec<RowIssue>,
}

impl LocalsTable {
    /// Column labels: stack index, one per local, test name.
    pub fn columns(&self) -> Vec<String> {
        let mut columns = Vec::with_capacity(self.schema.len() + 2);
        columns.push(STACK_INDEX_COLUMN.to_string());
        columns.extend(self.schema.iter().cloned());
        columns.push(TEST_NAME_COLUMN.to_string());
        columns
    }

    /// Rows as display strings, one cell per column.
    pub fn cell_rows(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells = Vec::with_capacity(self.schema.len() + 2);
                cells.push(row.index.to_string());
                if row.schema_valid {
                    cells.extend(row.values.iter().cloned());
                } else {
                    cells.extend(std::iter::repeat(String::new()).take(self.schema.len()));
                }
                cells.push(row.test_name.clone().unwrap_or_default());
                cells
            })
            .collect()
    }

    pub fn row(&self, index: usize) -> Option<&TableRow> {
        self.rows.get(index)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Project every capture of `store` into a table row.
pub fn project(store: &CaptureStore, test_name_depth: usize) -> LocalsTable {
    let schema: Vec<String> = store
        .all()
        .first()
        .map(|first| first.locals().iter().map(|l| l.name.clone()).collect())
        .unwrap_or_default();

    let mut table = LocalsTable {
        schema,
        rows: Vec::with_capacity(store.count()),
        issues: Vec::new(),
    };

    for event in store.all() {
        let schema_valid = matches_schema(event, &table.schema);
        if !schema_valid {
            table.issues.push(RowIssue::SchemaMismatch {
                index: event.index(),
                expected: table.schema.clone(),
                found: event.locals().iter().map(|l| l.name.clone()).collect(),
            });
        }

        let test_name = test_name_at(event, test_name_depth);
        if test_name.is_none() {
            table.issues.push(RowIssue::DepthOutOfRange {
                index: event.index(),
                depth: test_name_depth,
                len: event.depth(),
            });
        }

        let values = if schema_valid {
            event.locals().iter().map(|l| l.value.clone()).collect()
        } else {
            Vec::new()
        };
        table.rows.push(TableRow {
            index: event.index(),
            values,
            test_name,
            schema_valid,
        });
    }

    table
}

fn matches_schema(event: &CaptureEvent, schema: &[String]) -> bool {
    event.locals().len() == schema.len()
        && event
            .locals()
            .iter()
            .zip(schema)
            .all(|(local, name)| &local.name == name)
}

/// `frames[len - depth]`, counting from the outermost frame. Depth 0 names
/// no frame.
fn test_name_at(event: &CaptureEvent, depth: usize) -> Option<String> {
    if depth == 0 {
        return None;
    }
    let position = event.depth().checked_sub(depth)?;
    event.frames().get(position).map(|frame| frame.name.clone())
}
