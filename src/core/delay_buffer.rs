use alloc::vec;
use alloc::vec::Vec;

/// Fixed-capacity circular history of mono samples.
///
/// The capacity is set at construction and never changes. The write cursor
/// always points at the oldest sample, which is the slot overwritten next.
pub struct DelayBuffer {
    samples: Vec<f32>,
    write_cursor: usize,
}

impl DelayBuffer {
    /// Creates a silent buffer holding `capacity` samples.
    ///
    /// A capacity of zero is raised to one so that every index stays valid.
    pub fn new(capacity: usize) -> Self {
        DelayBuffer {
            samples: vec![0.0; capacity.max(1)],
            write_cursor: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.samples.len()
    }

    pub fn write_cursor(&self) -> usize {
        self.write_cursor
    }

    /// The longest delay, in samples, that can be read back.
    pub fn max_delay(&self) -> usize {
        self.samples.len() - 1
    }

    /// Index of the sample written `delay_samples` writes before the cursor.
    ///
    /// Delays longer than [`max_delay`](Self::max_delay) are clamped to it.
    /// A delay of zero lands on the cursor itself, i.e. the oldest sample in
    /// the history, since the current input has not been written yet.
    #[inline]
    pub fn read_index(&self, delay_samples: usize) -> usize {
        let len = self.samples.len();
        let delay = delay_samples.min(len - 1);
        (self.write_cursor + len - delay) % len
    }

    #[inline]
    pub fn tap(&self, delay_samples: usize) -> f32 {
        self.samples[self.read_index(delay_samples)]
    }

    /// Stores `sample` at the cursor and advances it by one slot.
    #[inline]
    pub fn write(&mut self, sample: f32) {
        self.samples[self.write_cursor] = sample;
        self.write_cursor += 1;
        if self.write_cursor == self.samples.len() {
            self.write_cursor = 0;
        }
    }

    /// Silences the history and rewinds the cursor.
    pub fn reset(&mut self) {
        self.samples.fill(0.0);
        self.write_cursor = 0;
    }
}
