//! Cross-context parameter and preview exchange
//!
//! Each direction is a single-producer/single-consumer, lock-free,
//! last-write-wins slot. The realtime side only polls or publishes; it never
//! waits for the observer.

pub mod mailbox;
pub mod params;
pub mod snapshots;

pub use mailbox::{mailbox, mailbox_with, MailboxReader, MailboxWriter};
pub use params::{parameter_channel, ParameterUpdate, UpdateReceiver, UpdateSender};
pub use snapshots::{snapshot_channel, SnapshotPublisher, SnapshotReceiver};
