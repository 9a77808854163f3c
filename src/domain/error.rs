use thiserror::Error;

/// Errors raised by the capture store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error("capture index {index} out of range (store holds {count} captures)")]
    IndexOutOfRange { index: usize, count: usize },
}
