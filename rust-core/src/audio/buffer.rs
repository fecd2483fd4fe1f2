//! Lock-free sample transport from the capture callback to the playback callback
//!
//! Carries filtered mono samples. Both ends run inside audio callbacks, so
//! neither end blocks: a full buffer drops new samples and an empty one plays
//! silence. Drops and underruns are counted for diagnostics.

use ringbuf::{HeapConsumer, HeapProducer, HeapRb};

/// Mono f32 ring buffer between two audio callbacks
pub struct AudioRingBuffer {
    producer: HeapProducer<f32>,
    consumer: HeapConsumer<f32>,
    capacity: usize,
}

impl AudioRingBuffer {
    /// Create new ring buffer with given capacity in samples
    pub fn new(capacity: usize) -> Self {
        let rb = HeapRb::<f32>::new(capacity);
        let (producer, consumer) = rb.split();

        Self {
            producer,
            consumer,
            capacity,
        }
    }

    /// Split into producer and consumer ends
    pub fn split(self) -> (AudioProducer, AudioConsumer) {
        (
            AudioProducer {
                producer: self.producer,
                dropped: 0,
            },
            AudioConsumer {
                consumer: self.consumer,
                underruns: 0,
            },
        )
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Capture side
pub struct AudioProducer {
    producer: HeapProducer<f32>,
    dropped: u64,
}

impl AudioProducer {
    /// Queue one sample; returns false (and counts a drop) if the buffer is full
    #[inline]
    pub fn push_sample(&mut self, sample: f32) -> bool {
        if self.producer.push(sample).is_ok() {
            true
        } else {
            self.dropped += 1;
            false
        }
    }

    /// Queue a slice; returns how many samples fit
    pub fn write(&mut self, samples: &[f32]) -> usize {
        let written = self.producer.push_slice(samples);
        self.dropped += (samples.len() - written) as u64;
        written
    }

    pub fn free_len(&self) -> usize {
        self.producer.free_len()
    }

    /// Samples discarded because the playback side fell behind
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

/// Playback side
pub struct AudioConsumer {
    consumer: HeapConsumer<f32>,
    underruns: u64,
}

impl AudioConsumer {
    /// Fill an interleaved output block, copying each mono sample to every
    /// channel. Frames with no data are silenced.
    ///
    /// # Returns
    /// Number of frames filled from the buffer
    #[inline]
    pub fn fill_interleaved(&mut self, data: &mut [f32], channels: usize) -> usize {
        if channels == 0 {
            return 0;
        }

        let mut filled = 0;
        for frame in data.chunks_mut(channels) {
            let sample = match self.consumer.pop() {
                Some(sample) => {
                    filled += 1;
                    sample
                }
                None => 0.0,
            };
            frame.fill(sample);
        }

        if filled * channels < data.len() {
            self.underruns += 1;
        }
        filled
    }

    /// Read samples into `buffer`; returns how many were read
    pub fn read(&mut self, buffer: &mut [f32]) -> usize {
        self.consumer.pop_slice(buffer)
    }

    pub fn len(&self) -> usize {
        self.consumer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.consumer.is_empty()
    }

    /// Output blocks that could not be fully served
    pub fn underruns(&self) -> u64 {
        self.underruns
    }
}
