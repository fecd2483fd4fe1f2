//! Preview buffer: recent raw/filtered history and its downsampled snapshots

pub mod ring;
pub mod snapshot;

pub use ring::{PreviewRing, SamplePair};
pub use snapshot::PreviewSnapshot;
