//! Table views writing the locals table to a stream.

use std::cell::RefCell;
use std::io::Write;

use anyhow::{Context, Result};
use serde_json::json;

use crate::ports::TableView;

/// Column-aligned plain text.
pub struct TextTableView<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> TextTableView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }

    pub fn format(columns: &[String], rows: &[Vec<String>]) -> String {
        let mut widths: Vec<usize> = columns.iter().map(|c| c.chars().count()).collect();
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut out = Vec::with_capacity(rows.len() + 2);
        out.push(line(columns));
        out.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in rows {
            out.push(line(row));
        }
        out.join("\n")
    }
}

impl<W: Write> TableView for TextTableView<W> {
    fn show(&self, columns: &[String], rows: &[Vec<String>]) -> Result<()> {
        let mut out = self.out.borrow_mut();
        writeln!(out, "{}", Self::format(columns, rows)).context("Failed to write locals table")?;
        out.flush().context("Failed to flush locals table")
    }
}

/// One JSON document with `columns` and `rows`.
pub struct JsonTableView<W: Write> {
    out: RefCell<W>,
}

impl<W: Write> JsonTableView<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write> TableView for JsonTableView<W> {
    fn show(&self, columns: &[String], rows: &[Vec<String>]) -> Result<()> {
        let mut out = self.out.borrow_mut();
        let doc = json!({ "columns": columns, "rows": rows });
        serde_json::to_writer_pretty(&mut *out, &doc).context("Failed to serialize locals table")?;
        writeln!(out).context("Failed to write locals table")?;
        Ok(())
    }
}
