//! Realtime pipeline and live audio I/O with cpal

pub mod buffer;
pub mod processor;
#[cfg(feature = "live")]
pub mod input;
#[cfg(feature = "live")]
pub mod output;
#[cfg(feature = "live")]
pub mod session;

pub use buffer::AudioRingBuffer;
pub use processor::{denoiser_pair, FilterParameters, ObserverHandle, RealtimeDenoiser};
#[cfg(feature = "live")]
pub use input::AudioInput;
#[cfg(feature = "live")]
pub use output::AudioOutput;
#[cfg(feature = "live")]
pub use session::{LiveSession, SessionError};
