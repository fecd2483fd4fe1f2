//! Engine → observer preview snapshots
//!
//! Slots are pre-sized to the snapshot length so the realtime side fills
//! them in place. An unread snapshot is replaced by the next one.

use super::mailbox::{mailbox_with, MailboxReader, MailboxWriter};
use crate::preview::{PreviewRing, PreviewSnapshot};

/// Create the snapshot channel for snapshots of length `len`
pub fn snapshot_channel(len: usize) -> (SnapshotPublisher, SnapshotReceiver) {
    let (writer, reader) = mailbox_with(|| PreviewSnapshot::silent(len));
    (
        SnapshotPublisher {
            writer,
            dropped: 0,
        },
        SnapshotReceiver { reader },
    )
}

/// Realtime end
pub struct SnapshotPublisher {
    writer: MailboxWriter<PreviewSnapshot>,
    /// Snapshots replaced before the observer read them
    dropped: u64,
}

impl SnapshotPublisher {
    /// Snapshot the ring if it is on a cadence boundary and publish it
    ///
    /// Returns true if a snapshot was published.
    #[inline]
    pub fn publish_if_due(&mut self, ring: &PreviewRing) -> bool {
        if !ring.maybe_snapshot(self.writer.slot_mut()) {
            return false;
        }
        if self.writer.publish() {
            self.dropped += 1;
        }
        true
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Observer end
pub struct SnapshotReceiver {
    reader: MailboxReader<PreviewSnapshot>,
}

impl SnapshotReceiver {
    /// Borrow the freshest snapshot if one arrived since the last call
    ///
    /// An unread snapshot is discarded once the publisher is dropped.
    pub fn latest(&mut self) -> Option<&PreviewSnapshot> {
        if !self.reader.is_connected() {
            return None;
        }
        self.reader.take()
    }

    /// Copy out the freshest snapshot if one arrived since the last call
    pub fn take_snapshot(&mut self) -> Option<PreviewSnapshot> {
        self.latest().cloned()
    }

    pub fn has_fresh(&self) -> bool {
        self.reader.is_connected() && self.reader.has_fresh()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PreviewConfig;
    use crate::preview::SamplePair;

    #[test]
    fn test_publish_on_cadence_only() {
        let config = PreviewConfig {
            capacity: 8,
            downsample_factor: 2,
            cadence: 4,
        };
        let mut ring = PreviewRing::new(&config).unwrap();
        let (mut publisher, mut receiver) = snapshot_channel(config.snapshot_len());

        for i in 1..=3 {
            ring.record(SamplePair::new(i as f64, 0.0));
            assert!(!publisher.publish_if_due(&ring));
        }
        assert!(receiver.take_snapshot().is_none());

        ring.record(SamplePair::new(4.0, 0.0));
        assert!(publisher.publish_if_due(&ring));

        let snapshot = receiver.take_snapshot().unwrap();
        assert_eq!(snapshot.original, vec![0.0, 0.0, 1.0, 3.0]);
        assert_eq!(snapshot.sample_count, 4);
        assert!(receiver.take_snapshot().is_none());
    }

    #[test]
    fn test_unread_snapshot_is_superseded() {
        let config = PreviewConfig {
            capacity: 4,
            downsample_factor: 1,
            cadence: 2,
        };
        let mut ring = PreviewRing::new(&config).unwrap();
        let (mut publisher, mut receiver) = snapshot_channel(config.snapshot_len());

        for i in 1..=6 {
            ring.record(SamplePair::new(i as f64, 0.0));
            publisher.publish_if_due(&ring);
        }

        // Snapshots at 2, 4, 6; only the last survives
        assert_eq!(publisher.dropped(), 2);
        let snapshot = receiver.latest().unwrap();
        assert_eq!(snapshot.sample_count, 6);
        assert_eq!(snapshot.original, vec![3.0, 4.0, 5.0, 6.0]);
        assert!(receiver.latest().is_none());
    }

    #[test]
    fn test_unread_snapshot_discarded_on_teardown() {
        let config = PreviewConfig {
            capacity: 4,
            downsample_factor: 1,
            cadence: 4,
        };
        let mut ring = PreviewRing::new(&config).unwrap();
        let (mut publisher, mut receiver) = snapshot_channel(config.snapshot_len());

        for i in 1..=4 {
            ring.record(SamplePair::new(i as f64, 0.0));
        }
        assert!(publisher.publish_if_due(&ring));
        assert!(receiver.has_fresh());

        drop(publisher);
        assert!(!receiver.has_fresh());
        assert!(receiver.take_snapshot().is_none());
    }
}
