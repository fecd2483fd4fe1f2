//! Downsampled preview snapshots handed to the observer

use serde::{Deserialize, Serialize};

/// Fixed-length, stride-picked view of the preview ring
///
/// `original` and `filtered` always have the same length L.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewSnapshot {
    /// Raw input values, oldest first
    pub original: Vec<f64>,

    /// Filtered values, oldest first
    pub filtered: Vec<f64>,

    /// Number of samples recorded when the snapshot was taken
    #[serde(skip)]
    pub sample_count: u64,
}

impl PreviewSnapshot {
    /// Snapshot of `len` zeros (silence)
    pub fn silent(len: usize) -> Self {
        Self {
            original: vec![0.0; len],
            filtered: vec![0.0; len],
            sample_count: 0,
        }
    }

    /// Snapshot length L
    pub fn len(&self) -> usize {
        self.original.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    /// Serialize as `{"original": [...], "filtered": [...]}` for a renderer
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
