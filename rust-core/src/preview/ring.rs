//! Fixed-capacity preview ring
//!
//! Records the most recent C raw/filtered pairs. Storage is allocated and
//! zeroed once; `record` and `maybe_snapshot` never allocate.

use super::snapshot::PreviewSnapshot;
use crate::config::PreviewConfig;
use crate::error::ConfigError;

/// One raw input sample and its filtered value
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SamplePair {
    pub raw: f64,
    pub filtered: f64,
}

impl SamplePair {
    pub fn new(raw: f64, filtered: f64) -> Self {
        Self { raw, filtered }
    }
}

/// Circular record of recent sample pairs
pub struct PreviewRing {
    /// Ring storage, zero-initialized so early snapshots render as silence
    pairs: Box<[SamplePair]>,

    /// Next write position (also the oldest entry once full)
    cursor: usize,

    /// Total pairs recorded since creation
    sample_count: u64,

    downsample_factor: usize,
    cadence: u64,
}

impl PreviewRing {
    /// Create a ring; the configuration is validated first so `record`
    /// never indexes an empty ring
    pub fn new(config: &PreviewConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            pairs: vec![SamplePair::default(); config.capacity].into_boxed_slice(),
            cursor: 0,
            sample_count: 0,
            downsample_factor: config.downsample_factor,
            cadence: config.cadence,
        })
    }

    /// Append a pair, overwriting the oldest one
    #[inline]
    pub fn record(&mut self, pair: SamplePair) {
        self.pairs[self.cursor] = pair;
        self.cursor += 1;
        if self.cursor == self.pairs.len() {
            self.cursor = 0;
        }
        self.sample_count += 1;
    }

    /// True when the sample counter sits on a cadence boundary
    #[inline]
    pub fn snapshot_due(&self) -> bool {
        self.sample_count > 0 && self.sample_count % self.cadence == 0
    }

    /// Fill `out` if a snapshot is due
    ///
    /// `out` must have been sized with `snapshot_len()`. Returns whether it
    /// was written.
    #[inline]
    pub fn maybe_snapshot(&self, out: &mut PreviewSnapshot) -> bool {
        if !self.snapshot_due() {
            return false;
        }
        self.write_snapshot(out);
        true
    }

    /// Stride-pick every `downsample_factor`-th pair in chronological order
    pub fn write_snapshot(&self, out: &mut PreviewSnapshot) {
        let (newer, older) = self.pairs.split_at(self.cursor);
        let picked = older
            .iter()
            .chain(newer.iter())
            .step_by(self.downsample_factor);

        for ((pair, raw), filtered) in picked
            .zip(out.original.iter_mut())
            .zip(out.filtered.iter_mut())
        {
            *raw = pair.raw;
            *filtered = pair.filtered;
        }
        out.sample_count = self.sample_count;
    }

    /// Build a new snapshot of the current contents (allocates)
    pub fn snapshot(&self) -> PreviewSnapshot {
        let mut out = PreviewSnapshot::silent(self.snapshot_len());
        self.write_snapshot(&mut out);
        out
    }

    /// Snapshot length L
    pub fn snapshot_len(&self) -> usize {
        self.pairs.len() / self.downsample_factor
    }

    /// Ring capacity C
    pub fn capacity(&self) -> usize {
        self.pairs.len()
    }

    /// Number of pairs recorded since creation
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }
}
