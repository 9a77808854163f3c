//! Capture Store
//!
//! Append-only record of breakpoint hits. Each hit is normalized on the way
//! in and never changes afterwards.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::error::CaptureError;
use crate::domain::normalize::NameNormalizer;

/// A local variable as formatted by the debugger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalVar {
    pub name: String,
    pub value: String,
}

impl LocalVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A stack frame as reported by the debugger, before normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawFrame {
    /// Function identifier; `None` when symbol lookup failed.
    pub function: Option<String>,
    /// Optional call site (`file:line`), used by call-site node identity.
    pub site: Option<String>,
}

impl RawFrame {
    pub fn named(function: impl Into<String>) -> Self {
        Self {
            function: Some(function.into()),
            site: None,
        }
    }

    pub fn unresolved() -> Self {
        Self::default()
    }

    pub fn with_site(mut self, site: impl Into<String>) -> Self {
        self.site = Some(site.into());
        self
    }
}

/// A normalized frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Frame {
    pub name: String,
    pub site: Option<String>,
}

/// One breakpoint hit. Frame 0 is the breakpoint frame, the last frame is
/// the entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureEvent {
    index: usize,
    frames: Vec<Frame>,
    locals: Vec<LocalVar>,
}

impl CaptureEvent {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.frames.iter().map(|f| f.name.as_str())
    }

    pub fn locals(&self) -> &[LocalVar] {
        &self.locals
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }
}

/// Owns every capture of a session, in hit order.
#[derive(Debug, Default)]
pub struct CaptureStore {
    normalizer: NameNormalizer,
    events: Vec<CaptureEvent>,
}

impl CaptureStore {
    pub fn new(normalizer: NameNormalizer) -> Self {
        Self {
            normalizer,
            events: Vec::new(),
        }
    }

    /// Normalize and record one hit. Returns its index.
    pub fn append(&mut self, frames: Vec<RawFrame>, locals: Vec<LocalVar>) -> usize {
        let index = self.events.len();
        let mut unresolved = 0usize;
        let frames: Vec<Frame> = frames
            .into_iter()
            .map(|raw| {
                if raw.function.is_none() {
                    unresolved += 1;
                }
                Frame {
                    name: self.normalizer.normalize_frame(raw.function.as_deref()),
                    site: raw.site,
                }
            })
            .collect();

        if unresolved > 0 {
            warn!(index, unresolved, "capture contains frames without symbol information");
        }
        debug!(index, depth = frames.len(), locals = locals.len(), "capture appended");

        self.events.push(CaptureEvent {
            index,
            frames,
            locals,
        });
        index
    }

    pub fn get(&self, index: usize) -> Result<&CaptureEvent, CaptureError> {
        self.events.get(index).ok_or(CaptureError::IndexOutOfRange {
            index,
            count: self.events.len(),
        })
    }

    pub fn count(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn all(&self) -> &[CaptureEvent] {
        &self.events
    }

    pub fn normalizer(&self) -> &NameNormalizer {
        &self.normalizer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize::UNKNOWN_FRAME;

    fn frames(names: &[&str]) -> Vec<RawFrame> {
        names.iter().map(|n| RawFrame::named(*n)).collect()
    }

    #[test]
    fn test_append_assigns_sequential_indices() {
        let mut store = CaptureStore::default();
        assert_eq!(store.append(frames(&["a", "main"]), vec![]), 0);
        assert_eq!(store.append(frames(&["b", "main"]), vec![]), 1);
        assert_eq!(store.count(), 2);
        assert_eq!(store.get(1).unwrap().index(), 1);
    }

    #[test]
    fn test_append_normalizes_frames() {
        let mut store = CaptureStore::default();
        let index = store.append(
            vec![
                RawFrame::named("std::sort(int*, int*)"),
                RawFrame::unresolved(),
                RawFrame::named("main(int, char**)"),
            ],
            vec![LocalVar::new("n", "3")],
        );
        let event = store.get(index).unwrap();
        let names: Vec<&str> = event.frame_names().collect();
        assert_eq!(names, vec!["sort", UNKNOWN_FRAME, "main"]);
        assert_eq!(event.locals(), &[LocalVar::new("n", "3")]);
    }

    #[test]
    fn test_get_out_of_range() {
        let mut store = CaptureStore::default();
        store.append(frames(&["main"]), vec![]);
        assert_eq!(
            store.get(1).unwrap_err(),
            CaptureError::IndexOutOfRange { index: 1, count: 1 }
        );
    }

    #[test]
    fn test_site_is_kept() {
        let mut store = CaptureStore::default();
        store.append(vec![RawFrame::named("leaf").with_site("leaf.cc:10")], vec![]);
        assert_eq!(
            store.all()[0].frames()[0].site.as_deref(),
            Some("leaf.cc:10")
        );
    }
}
