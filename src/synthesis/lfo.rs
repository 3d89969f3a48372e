use crate::FrameProcessor;
use core::f64::consts::TAU;

/// A sine Low Frequency Oscillator used as a delay modulator.
///
/// Produces the unipolar factor `1 + sin(phase)` in `[0, 2]`. The phase is
/// kept in `f64` so that it stays periodic over long runs at high sample
/// rates.
pub struct Lfo {
    phase: f64,
    increment: f64,
    frequency_hz: f64,
    sample_rate: f64,
}

impl Lfo {
    /// Creates a new LFO starting at phase zero.
    ///
    /// # Arguments
    /// * `frequency_hz` - Modulation rate in Hz.
    /// * `sample_rate` - Rate at which `next_modulation_factor` is called.
    pub fn new(frequency_hz: f64, sample_rate: f64) -> Self {
        Lfo {
            phase: 0.0,
            increment: TAU * frequency_hz / sample_rate,
            frequency_hz,
            sample_rate,
        }
    }

    /// Returns the factor for the current phase, then advances one sample.
    ///
    /// The phase wraps by subtracting a full turn so the sweep has no
    /// discontinuity.
    #[inline]
    pub fn next_modulation_factor(&mut self) -> f64 {
        let factor = 1.0 + libm::sin(self.phase);

        self.phase += self.increment;
        if self.phase >= TAU {
            self.phase -= TAU;
        }

        factor
    }

    /// Current phase in radians, always in `[0, 2π)`.
    pub fn phase(&self) -> f64 {
        self.phase
    }

    /// Phase advance per sample in radians.
    pub fn increment(&self) -> f64 {
        self.increment
    }

    /// Length of one modulation cycle in samples.
    pub fn period_samples(&self) -> f64 {
        self.sample_rate / self.frequency_hz
    }
}

impl FrameProcessor for Lfo {
    fn process(&mut self, buffer: &mut [f32], _sample_index: u64) {
        for sample in buffer.iter_mut() {
            *sample = self.next_modulation_factor() as f32;
        }
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}
