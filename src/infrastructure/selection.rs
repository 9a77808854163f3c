//! Terminal selection loop: the table UI's row-selection callback, driven
//! by row indices read one per line.

use std::io::BufRead;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::application::Session;

/// Feed row selections to `session` until `q` or end of input.
///
/// Bad input and invalid rows are reported and skipped. Returns the number
/// of selections rendered.
pub fn run_selection_loop<R: BufRead>(session: &Session<'_>, input: R) -> Result<usize> {
    let mut rendered = 0;
    for line in input.lines() {
        let line = line.context("Failed to read selection")?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "q" || trimmed == "quit" {
            break;
        }

        let index = match trimmed.parse::<usize>() {
            Ok(index) => index,
            Err(_) => {
                warn!(input = trimmed, "expected a row index");
                continue;
            }
        };
        match session.on_row_selected(index) {
            Ok(edges) => {
                let highlighted = edges.iter().filter(|e| e.selected).count();
                info!(index, highlighted, "selection rendered");
                rendered += 1;
            }
            Err(e) => warn!(index, "selection failed: {:#}", e),
        }
    }
    Ok(rendered)
}
