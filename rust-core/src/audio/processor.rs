//! Realtime denoising pipeline
//!
//! `RealtimeDenoiser` is moved into the audio callback and owns the filter
//! state and preview ring outright. `ObserverHandle` stays on the UI side and
//! only talks to it through the two single-slot channels, so no field of the
//! realtime state is ever touched from both contexts.

use crate::channel::{
    parameter_channel, snapshot_channel, ParameterUpdate, SnapshotPublisher, SnapshotReceiver,
    UpdateReceiver, UpdateSender,
};
use crate::config::DenoiserConfig;
use crate::error::{ConfigError, UpdateError};
use crate::filters::KalmanFilter;
use crate::preview::{PreviewRing, PreviewSnapshot, SamplePair};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Q and R as last applied by the realtime context
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterParameters {
    pub process_noise: f64,
    pub measurement_noise: f64,
}

/// Applied parameters mirrored as f64 bits for lock-free reads
struct AppliedParameters {
    process_noise: AtomicU64,
    measurement_noise: AtomicU64,
}

impl AppliedParameters {
    fn new(filter: &KalmanFilter) -> Self {
        Self {
            process_noise: AtomicU64::new(filter.process_noise().to_bits()),
            measurement_noise: AtomicU64::new(filter.measurement_noise().to_bits()),
        }
    }

    #[inline]
    fn store(&self, filter: &KalmanFilter) {
        self.process_noise
            .store(filter.process_noise().to_bits(), Ordering::Relaxed);
        self.measurement_noise
            .store(filter.measurement_noise().to_bits(), Ordering::Relaxed);
    }

    fn load(&self) -> FilterParameters {
        FilterParameters {
            process_noise: f64::from_bits(self.process_noise.load(Ordering::Relaxed)),
            measurement_noise: f64::from_bits(self.measurement_noise.load(Ordering::Relaxed)),
        }
    }
}

/// Create the realtime pipeline and its observer handle for one stream
pub fn denoiser_pair(config: &DenoiserConfig) -> Result<(RealtimeDenoiser, ObserverHandle), ConfigError> {
    config.validate()?;

    let filter = KalmanFilter::new(config.process_noise, config.measurement_noise)?;
    let ring = PreviewRing::new(&config.preview)?;
    let (update_sender, update_receiver) = parameter_channel();
    let (snapshot_publisher, snapshot_receiver) = snapshot_channel(ring.snapshot_len());
    let applied = Arc::new(AppliedParameters::new(&filter));

    let snapshot_len = ring.snapshot_len();

    Ok((
        RealtimeDenoiser {
            filter,
            ring,
            updates: update_receiver,
            snapshots: snapshot_publisher,
            applied: Arc::clone(&applied),
        },
        ObserverHandle {
            updates: update_sender,
            snapshots: snapshot_receiver,
            applied,
            snapshot_len,
        },
    ))
}

/// Realtime half: filter engine, preview ring, and the channel ends it polls
///
/// Nothing here blocks, locks, or allocates after construction.
pub struct RealtimeDenoiser {
    filter: KalmanFilter,
    ring: PreviewRing,
    updates: UpdateReceiver,
    snapshots: SnapshotPublisher,
    applied: Arc<AppliedParameters>,
}

impl RealtimeDenoiser {
    /// Process one sample
    ///
    /// Order: drain at most one pending update, filter, record the pair,
    /// publish a snapshot on cadence boundaries.
    #[inline]
    pub fn process_sample(&mut self, raw: f64) -> f64 {
        if let Some(update) = self.updates.try_take_update() {
            self.apply(update);
        }

        let filtered = self.filter.step(raw);

        self.ring.record(SamplePair::new(raw, filtered));
        self.snapshots.publish_if_due(&self.ring);

        filtered
    }

    /// Process a block; `output` must be the same length as `input`
    pub fn process_block(&mut self, input: &[f64], output: &mut [f64]) {
        debug_assert_eq!(input.len(), output.len(), "block length mismatch");
        for (out, &raw) in output.iter_mut().zip(input.iter()) {
            *out = self.process_sample(raw);
        }
    }

    /// Process a block in-place
    pub fn process_block_inplace(&mut self, buffer: &mut [f64]) {
        for sample in buffer.iter_mut() {
            *sample = self.process_sample(*sample);
        }
    }

    /// Filter channel 0 of an interleaved f32 block
    ///
    /// `sink` receives one filtered sample per frame.
    #[inline]
    pub fn process_interleaved_f32<F>(&mut self, data: &[f32], channels: usize, mut sink: F)
    where
        F: FnMut(f32),
    {
        if channels == 0 {
            return;
        }
        for frame in data.chunks(channels) {
            let filtered = self.process_sample(frame[0] as f64);
            sink(filtered as f32);
        }
    }

    /// Restore P and x to their initial values; Q and R are kept
    pub fn reset(&mut self) {
        self.filter.reset();
    }

    fn apply(&mut self, update: ParameterUpdate) {
        update.apply_to(&mut self.filter);
        self.applied.store(&self.filter);
    }

    pub fn filter(&self) -> &KalmanFilter {
        &self.filter
    }

    pub fn ring(&self) -> &PreviewRing {
        &self.ring
    }

    /// Samples processed since the stream started
    pub fn sample_count(&self) -> u64 {
        self.ring.sample_count()
    }

    /// Snapshots the observer never saw
    pub fn dropped_snapshots(&self) -> u64 {
        self.snapshots.dropped()
    }
}

/// Observer half: posts tuning updates and reads committed snapshots
pub struct ObserverHandle {
    updates: UpdateSender,
    snapshots: SnapshotReceiver,
    applied: Arc<AppliedParameters>,
    snapshot_len: usize,
}

impl ObserverHandle {
    /// Post a tuning update; rejected updates leave the engine untouched
    ///
    /// Fails with `UpdateError::Disconnected` once the realtime half is gone.
    pub fn post_update(&mut self, update: ParameterUpdate) -> Result<(), UpdateError> {
        self.updates.post_update(update)
    }

    /// Copy out the freshest snapshot, if a new one was published
    pub fn take_snapshot(&mut self) -> Option<PreviewSnapshot> {
        self.snapshots.take_snapshot()
    }

    /// Borrow the freshest snapshot, if a new one was published
    pub fn latest_snapshot(&mut self) -> Option<&PreviewSnapshot> {
        self.snapshots.latest()
    }

    /// Parameters the engine has actually applied
    pub fn current_parameters(&self) -> FilterParameters {
        self.applied.load()
    }

    /// True while a posted update is still waiting for the engine
    pub fn update_pending(&self) -> bool {
        self.updates.is_pending()
    }

    /// False once the realtime half has been dropped
    pub fn is_connected(&self) -> bool {
        self.updates.is_connected()
    }

    /// Snapshot length L
    pub fn snapshot_len(&self) -> usize {
        self.snapshot_len
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (RealtimeDenoiser, ObserverHandle) {
        denoiser_pair(&DenoiserConfig::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = DenoiserConfig::default();
        config.measurement_noise = 0.0;
        assert!(denoiser_pair(&config).is_err());
    }

    #[test]
    fn test_output_matches_bare_filter() {
        let (mut denoiser, _observer) = pair();
        let mut reference = KalmanFilter::new(1e-5, 0.25).unwrap();

        let input: Vec<f64> = (0..300).map(|i| (i as f64 * 0.05).sin() * 0.8).collect();
        let mut output = vec![0.0; input.len()];
        denoiser.process_block(&input, &mut output);

        let expected = reference.process_block(&input);
        assert_eq!(output, expected);
    }

    #[test]
    fn test_snapshot_cadence_over_stream() {
        let (mut denoiser, mut observer) = pair();

        let mut received = 0;
        for block in 0..10 {
            let mut buffer: Vec<f64> = (0..128)
                .map(|i| ((block * 128 + i) as f64 * 0.01).sin())
                .collect();
            denoiser.process_block_inplace(&mut buffer);

            if let Some(snapshot) = observer.take_snapshot() {
                assert_eq!(snapshot.len(), 128);
                assert_eq!(snapshot.filtered.len(), 128);
                received += 1;
            }
        }

        assert_eq!(received, 10);
        assert_eq!(denoiser.sample_count(), 1280);
        assert_eq!(denoiser.dropped_snapshots(), 0);
    }

    #[test]
    fn test_update_applies_at_next_sample() {
        let (mut denoiser, mut observer) = pair();
        denoiser.process_sample(0.1);

        observer
            .post_update(ParameterUpdate::process_noise(1e-4))
            .unwrap();
        observer
            .post_update(ParameterUpdate::measurement_noise(0.5))
            .unwrap();

        // Nothing has been applied yet
        assert_eq!(denoiser.filter().process_noise(), 1e-5);
        assert_eq!(denoiser.filter().measurement_noise(), 0.25);
        assert!(observer.update_pending());

        // Both land together, before this sample's step
        let mut reference = denoiser.filter().clone();
        reference.set_process_noise(1e-4).unwrap();
        reference.set_measurement_noise(0.5).unwrap();
        let expected = reference.step(0.2);

        assert_eq!(denoiser.process_sample(0.2), expected);
        assert_eq!(denoiser.filter().process_noise(), 1e-4);
        assert_eq!(denoiser.filter().measurement_noise(), 0.5);
        assert!(!observer.update_pending());
        assert_eq!(
            observer.current_parameters(),
            FilterParameters {
                process_noise: 1e-4,
                measurement_noise: 0.5,
            }
        );
    }

    #[test]
    fn test_rejected_update_keeps_last_good() {
        let (mut denoiser, mut observer) = pair();

        assert!(observer
            .post_update(ParameterUpdate::measurement_noise(-0.1))
            .is_err());
        assert!(!observer.update_pending());

        denoiser.process_sample(0.5);
        assert_eq!(denoiser.filter().measurement_noise(), 0.25);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "block length mismatch")]
    fn test_mismatched_block_lengths_panic_in_debug() {
        let (mut denoiser, _observer) = pair();
        let input = [0.1; 8];
        let mut output = [0.0; 12];
        denoiser.process_block(&input, &mut output);
    }

    #[test]
    fn test_teardown_discards_pending_slots() {
        let (mut denoiser, mut observer) = pair();
        denoiser.process_block_inplace(&mut [0.2; 128]);
        assert!(observer.is_connected());

        drop(denoiser);

        assert!(!observer.is_connected());
        assert!(observer.take_snapshot().is_none());
        assert!(matches!(
            observer.post_update(ParameterUpdate::measurement_noise(0.5)),
            Err(UpdateError::Disconnected)
        ));
        // Invalid values are still reported as such
        assert!(matches!(
            observer.post_update(ParameterUpdate::measurement_noise(-0.5)),
            Err(UpdateError::Rejected(_))
        ));
    }

    #[test]
    fn test_reset_keeps_parameters() {
        let (mut denoiser, mut observer) = pair();
        observer
            .post_update(ParameterUpdate::measurement_noise(0.4))
            .unwrap();
        denoiser.process_block_inplace(&mut [0.3; 16]);

        denoiser.reset();

        let state = denoiser.filter().state();
        assert_eq!(state.estimate_covariance, 1.0);
        assert_eq!(state.prior_estimate, 0.0);
        assert_eq!(state.measurement_noise, 0.4);
    }

    #[test]
    fn test_interleaved_uses_first_channel() {
        let (mut denoiser, _observer) = pair();
        let mut reference = KalmanFilter::new(1e-5, 0.25).unwrap();

        let data = [0.5f32, -9.0, 0.25, -9.0, 1.0, -9.0];
        let mut out = Vec::new();
        denoiser.process_interleaved_f32(&data, 2, |s| out.push(s));

        let expected: Vec<f32> = [0.5, 0.25, 1.0]
            .iter()
            .map(|&x| reference.step(x) as f32)
            .collect();
        assert_eq!(out, expected);
    }
}
