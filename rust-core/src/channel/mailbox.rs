//! Lock-free single-slot mailbox
//!
//! Single-producer/single-consumer exchange with overwrite semantics, built as
//! a triple buffer. Three slots are allocated up front; at any time one is
//! owned by the writer, one by the reader, and one is shared. The shared slot
//! index and a "fresh" flag live in one atomic byte, so publishing and taking
//! are each a single swap. Neither side ever blocks or allocates.

use crossbeam_utils::CachePadded;
use std::cell::UnsafeCell;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

const INDEX_MASK: u8 = 0b011;
const FRESH: u8 = 0b100;

struct Shared<T> {
    slots: [CachePadded<UnsafeCell<T>>; 3],
    /// Index of the shared slot, plus FRESH if it holds an unread value
    middle: CachePadded<AtomicU8>,
}

// Each slot index is owned by exactly one of writer, reader, or the shared
// position; ownership only moves through the `middle` swap. Sharing an
// endpoint across threads hands out `&T` to each of them, so `Sync` also
// requires `T: Sync`.
unsafe impl<T: Send> Send for Shared<T> {}
unsafe impl<T: Send + Sync> Sync for Shared<T> {}

/// Create a mailbox whose slots are built by `init`
///
/// `init` runs three times; use it to pre-size buffers so the writer can
/// fill slots in place.
pub fn mailbox_with<T, F>(mut init: F) -> (MailboxWriter<T>, MailboxReader<T>)
where
    F: FnMut() -> T,
{
    let shared = Arc::new(Shared {
        slots: [
            CachePadded::new(UnsafeCell::new(init())),
            CachePadded::new(UnsafeCell::new(init())),
            CachePadded::new(UnsafeCell::new(init())),
        ],
        middle: CachePadded::new(AtomicU8::new(1)),
    });

    (
        MailboxWriter {
            shared: Arc::clone(&shared),
            index: 0,
        },
        MailboxReader { shared, index: 2 },
    )
}

/// Create a mailbox with default-initialized slots
///
/// Endpoints are only `Sync` when `T` is:
///
/// ```compile_fail
/// use std::cell::Cell;
/// use kalman_denoise::channel::mailbox;
///
/// fn assert_sync<S: Sync>(_: &S) {}
///
/// let (_writer, reader) = mailbox::<Cell<u32>>();
/// assert_sync(&reader);
/// ```
pub fn mailbox<T: Default>() -> (MailboxWriter<T>, MailboxReader<T>) {
    mailbox_with(T::default)
}

/// Producing end
pub struct MailboxWriter<T> {
    shared: Arc<Shared<T>>,
    index: u8,
}

impl<T> MailboxWriter<T> {
    /// Writer-owned slot; fill it, then `publish`
    ///
    /// Holds whatever was last swapped back from the shared position, so
    /// callers should overwrite every field they care about.
    #[inline]
    pub fn slot_mut(&mut self) -> &mut T {
        // SAFETY: `self.index` is owned by the writer until the next publish.
        unsafe { &mut *self.shared.slots[self.index as usize].get() }
    }

    /// Make the writer slot visible to the reader
    ///
    /// Returns true if an unread value was discarded in the process.
    #[inline]
    pub fn publish(&mut self) -> bool {
        let previous = self
            .shared
            .middle
            .swap(self.index | FRESH, Ordering::AcqRel);
        self.index = previous & INDEX_MASK;
        previous & FRESH != 0
    }

    /// Write `value` into the writer slot and publish it
    #[inline]
    pub fn post(&mut self, value: T) -> bool {
        *self.slot_mut() = value;
        self.publish()
    }

    /// True while the last published value has not been taken
    pub fn is_pending(&self) -> bool {
        self.shared.middle.load(Ordering::Acquire) & FRESH != 0
    }

    /// False once the reader has been dropped
    pub fn is_connected(&self) -> bool {
        Arc::strong_count(&self.shared) > 1
    }
}

/// Consuming end
pub struct MailboxReader<T> {
    shared: Arc<Shared<T>>,
    index: u8,
}

impl<T> MailboxReader<T> {
    /// Take the freshest published value, if one arrived since the last take
    #[inline]
    pub fn take(&mut self) -> Option<&T> {
        if !self.has_fresh() {
            return None;
        }
        let previous = self.shared.middle.swap(self.index, Ordering::AcqRel);
        self.index = previous & INDEX_MASK;
        // SAFETY: the swapped-out index now belongs to the reader.
        Some(unsafe { &*self.shared.slots[self.index as usize].get() })
    }

    /// Check for an unread value without taking it
    #[inline]
    pub fn has_fresh(&self) -> bool {
        self.shared.middle.load(Ordering::Relaxed) & FRESH != 0
    }

    /// False once the writer has been dropped
    pub fn is_connected(&self) -> bool {
        Arc::strong_count(&self.shared) > 1
    }

    /// Last value taken (initial slot contents before the first take)
    pub fn current(&self) -> &T {
        // SAFETY: `self.index` is owned by the reader.
        unsafe { &*self.shared.slots[self.index as usize].get() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::thread;

    fn assert_send_sync<S: Send + Sync>(_: &S) {}

    #[test]
    fn test_endpoints_are_sync_for_sync_values() {
        let (writer, reader) = mailbox::<AtomicU32>();
        assert_send_sync(&writer);
        assert_send_sync(&reader);

        let (writer, reader) = mailbox::<Vec<f64>>();
        assert_send_sync(&writer);
        assert_send_sync(&reader);
    }

    #[test]
    fn test_connection_tracks_other_end() {
        let (writer, reader) = mailbox::<u32>();
        assert!(writer.is_connected());
        assert!(reader.is_connected());

        drop(writer);
        assert!(!reader.is_connected());

        let (writer, reader) = mailbox::<u32>();
        drop(reader);
        assert!(!writer.is_connected());
    }

    #[test]
    fn test_take_is_once() {
        let (mut writer, mut reader) = mailbox::<u32>();

        assert!(reader.take().is_none());

        assert!(!writer.post(7));
        assert!(writer.is_pending());
        assert_eq!(reader.take(), Some(&7));
        assert!(!writer.is_pending());
        assert!(reader.take().is_none());
        assert_eq!(*reader.current(), 7);
    }

    #[test]
    fn test_overwrite_keeps_latest() {
        let (mut writer, mut reader) = mailbox::<u32>();

        assert!(!writer.post(1));
        assert!(writer.post(2));
        assert!(writer.post(3));

        assert_eq!(reader.take(), Some(&3));
        assert!(reader.take().is_none());
    }

    #[test]
    fn test_fill_in_place() {
        let (mut writer, mut reader) = mailbox_with(|| vec![0.0f64; 4]);

        writer.slot_mut().copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        writer.publish();

        assert_eq!(reader.take().map(|v| v.as_slice()), Some(&[1.0, 2.0, 3.0, 4.0][..]));
        assert_eq!(writer.slot_mut().len(), 4);
    }

    #[test]
    fn test_cross_thread_values_are_monotonic() {
        let (mut writer, mut reader) = mailbox::<(u64, u64)>();

        let producer = thread::spawn(move || {
            for i in 1..=100_000u64 {
                // Both halves must always be seen together
                writer.post((i, i * 2));
            }
        });

        let mut last = 0;
        while last < 100_000 {
            if let Some(&(a, b)) = reader.take() {
                assert_eq!(b, a * 2);
                assert!(a > last);
                last = a;
            } else if producer.is_finished() && !reader.has_fresh() {
                break;
            }
        }

        producer.join().unwrap();
        assert_eq!(last, 100_000);
    }
}
