//! Capture Log Reader
//!
//! A capture log is JSON lines, one breakpoint hit per line, as written by
//! the debugger-side hook:
//!
//! ```text
//! {"frames": ["Leaf(int)", null, {"function": "main", "site": "main.cc:3"}],
//!  "locals": [{"name": "n", "value": "3"}]}
//! ```
//!
//! A `null` frame is one the debugger could not symbolize. Blank lines and
//! lines starting with `#` are skipped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::capture::{LocalVar, RawFrame};

/// A frame as written to the log: a bare identifier or an object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum FrameRecord {
    Name(String),
    Detailed {
        function: Option<String>,
        #[serde(default)]
        site: Option<String>,
    },
}

impl FrameRecord {
    fn into_raw(self) -> RawFrame {
        match self {
            FrameRecord::Name(name) => RawFrame::named(name),
            FrameRecord::Detailed { function, site } => RawFrame { function, site },
        }
    }
}

/// One breakpoint hit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HitRecord {
    pub frames: Vec<Option<FrameRecord>>,
    #[serde(default)]
    pub locals: Vec<LocalVar>,
}

impl HitRecord {
    /// Split into the arguments of `Session::on_capture`.
    pub fn into_parts(self) -> (Vec<RawFrame>, Vec<LocalVar>) {
        let frames = self
            .frames
            .into_iter()
            .map(|frame| frame.map(FrameRecord::into_raw).unwrap_or_default())
            .collect();
        (frames, self.locals)
    }
}

/// Parse every hit from a reader.
pub fn read_records<R: BufRead>(reader: R) -> Result<Vec<HitRecord>> {
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read line {}", line_no + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record: HitRecord = serde_json::from_str(trimmed)
            .with_context(|| format!("Invalid capture record on line {}", line_no + 1))?;
        records.push(record);
    }
    Ok(records)
}

/// Load a capture log file.
pub fn read_capture_log(path: &Path) -> Result<Vec<HitRecord>> {
    let file = File::open(path)
        .with_context(|| format!("Cannot open capture log {}", path.display()))?;
    read_records(BufReader::new(file))
        .with_context(|| format!("Failed to parse capture log {}", path.display()))
}
