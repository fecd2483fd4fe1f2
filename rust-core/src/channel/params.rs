//! Observer → engine parameter updates
//!
//! Updates are validated on the observer side before they reach the slot, so
//! the engine only ever sees positive, finite Q and R.

use super::mailbox::{mailbox, MailboxReader, MailboxWriter};
use crate::config::{validate_measurement_noise, validate_process_noise};
use crate::error::{ConfigError, UpdateError};
use crate::filters::KalmanFilter;

/// Partial retuning request; absent fields are left unchanged
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ParameterUpdate {
    pub process_noise: Option<f64>,
    pub measurement_noise: Option<f64>,
}

impl ParameterUpdate {
    pub fn process_noise(q: f64) -> Self {
        Self {
            process_noise: Some(q),
            measurement_noise: None,
        }
    }

    pub fn measurement_noise(r: f64) -> Self {
        Self {
            process_noise: None,
            measurement_noise: Some(r),
        }
    }

    /// Build an update from control positions
    ///
    /// Q is exposed on a logarithmic control (`Q = 10^control`), R on a
    /// linear one.
    pub fn from_controls(q_control: Option<f64>, r: Option<f64>) -> Self {
        Self {
            process_noise: q_control.map(|c| 10f64.powf(c)),
            measurement_noise: r,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.process_noise.is_none() && self.measurement_noise.is_none()
    }

    /// Reject empty updates and non-positive or non-finite values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.is_empty() {
            return Err(ConfigError::EmptyUpdate);
        }
        if let Some(q) = self.process_noise {
            validate_process_noise(q)?;
        }
        if let Some(r) = self.measurement_noise {
            validate_measurement_noise(r)?;
        }
        Ok(())
    }

    /// Combine with a newer update; fields set in `newer` win
    pub fn merge(self, newer: ParameterUpdate) -> Self {
        Self {
            process_noise: newer.process_noise.or(self.process_noise),
            measurement_noise: newer.measurement_noise.or(self.measurement_noise),
        }
    }

    /// Apply to a filter
    ///
    /// Only validated updates reach the engine. In release builds a field the
    /// filter refuses leaves its previous value in place.
    #[inline]
    pub fn apply_to(&self, filter: &mut KalmanFilter) {
        if let Some(q) = self.process_noise {
            let applied = filter.set_process_noise(q);
            debug_assert!(applied.is_ok(), "unvalidated Q reached the engine: {}", q);
        }
        if let Some(r) = self.measurement_noise {
            let applied = filter.set_measurement_noise(r);
            debug_assert!(applied.is_ok(), "unvalidated R reached the engine: {}", r);
        }
    }
}

/// Create the observer → engine update channel
pub fn parameter_channel() -> (UpdateSender, UpdateReceiver) {
    let (writer, reader) = mailbox::<ParameterUpdate>();
    (
        UpdateSender {
            writer,
            pending: ParameterUpdate::default(),
        },
        UpdateReceiver { reader },
    )
}

/// Observer end of the update channel
pub struct UpdateSender {
    writer: MailboxWriter<ParameterUpdate>,
    /// Everything posted since the engine last drained the slot
    pending: ParameterUpdate,
}

impl UpdateSender {
    /// Post a tuning update
    ///
    /// Invalid updates are rejected here and never reach the engine. Fields
    /// posted since the last drain are merged, so `{Q}` followed by `{R}`
    /// lands as one `{Q, R}` update at a single sample. Once the engine end
    /// is gone the update is discarded with `UpdateError::Disconnected`.
    pub fn post_update(&mut self, update: ParameterUpdate) -> Result<(), UpdateError> {
        if let Err(e) = update.validate() {
            log::warn!("Rejected parameter update {:?}: {}", update, e);
            return Err(e.into());
        }
        if !self.writer.is_connected() {
            log::debug!("Discarded parameter update {:?}: engine stopped", update);
            return Err(UpdateError::Disconnected);
        }

        // If the engine drained the slot between our check and the publish,
        // the merged update re-applies values it already has. That is a no-op.
        self.pending = if self.writer.is_pending() {
            self.pending.merge(update)
        } else {
            update
        };
        self.writer.post(self.pending);
        Ok(())
    }

    /// True while a posted update has not yet been drained by the engine
    pub fn is_pending(&self) -> bool {
        self.writer.is_pending()
    }

    /// False once the engine end has been dropped
    pub fn is_connected(&self) -> bool {
        self.writer.is_connected()
    }
}

/// Engine end of the update channel
pub struct UpdateReceiver {
    reader: MailboxReader<ParameterUpdate>,
}

impl UpdateReceiver {
    /// Non-blocking poll; returns the pending update at most once
    #[inline]
    pub fn try_take_update(&mut self) -> Option<ParameterUpdate> {
        self.reader.take().copied()
    }
}
