use crate::core::config::EffectConfig;
use crate::core::delay_buffer::DelayBuffer;
use crate::synthesis::lfo::Lfo;
use crate::FrameProcessor;

/// A mono flanger without feedback.
///
/// Each sample reads one tap from the delay history at a distance of
/// `depth * (1 + sin(phase))` seconds, mixes it with the input using fixed
/// dry and wet gains and then stores the input. The tap is not interpolated.
///
/// The output is not clamped. With the default gains (0.7 dry, 0.5 wet) a
/// sustained full-scale input can exceed unity.
pub struct Flanger {
    buffer: DelayBuffer,
    lfo: Lfo,
    depth_seconds: f64,
    sample_rate: f64,
    dry_gain: f32,
    wet_gain: f32,
}

impl Flanger {
    /// Creates a flanger for the given configuration with a silent history.
    pub fn from_config(config: &EffectConfig) -> Self {
        let sample_rate = config.sample_rate() as f64;

        Flanger {
            buffer: DelayBuffer::new(config.buffer_capacity()),
            lfo: Lfo::new(config.mod_freq_hz(), sample_rate),
            depth_seconds: config.depth_seconds(),
            sample_rate,
            dry_gain: config.dry_gain(),
            wet_gain: config.wet_gain(),
        }
    }

    /// Converts a modulation factor into a whole-sample delay.
    ///
    /// The result is truncated and clamped to `[0, capacity - 1]`.
    #[inline]
    pub fn delay_samples_for(&self, factor: f64) -> usize {
        let delay_seconds = self.depth_seconds * factor;
        let delay = delay_seconds * self.sample_rate;
        (delay.max(0.0) as usize).min(self.buffer.max_delay())
    }

    /// Processes a single sample.
    #[inline]
    pub fn tick(&mut self, input: f32) -> f32 {
        let factor = self.lfo.next_modulation_factor();
        let delay = self.delay_samples_for(factor);

        let delayed = self.buffer.tap(delay);
        let output = self.dry_gain * input + self.wet_gain * delayed;

        self.buffer.write(input);
        output
    }

    pub fn buffer(&self) -> &DelayBuffer {
        &self.buffer
    }

    pub fn lfo(&self) -> &Lfo {
        &self.lfo
    }
}

impl FrameProcessor for Flanger {
    fn process(&mut self, buffer: &mut [f32], _sample_index: u64) {
        for sample in buffer.iter_mut() {
            *sample = self.tick(*sample);
        }
    }

    fn reset(&mut self) {
        self.buffer.reset();
        self.lfo.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::f64::consts::TAU;

    /// Delay taps recomputed directly from the formulas, with the same
    /// floating point operation order as the engine.
    fn reference_delays(config: &EffectConfig, count: usize) -> Vec<usize> {
        let sample_rate = config.sample_rate() as f64;
        let increment = TAU * config.mod_freq_hz() / sample_rate;
        let max_delay = config.buffer_capacity() - 1;
        let mut phase = 0.0f64;

        (0..count)
            .map(|_| {
                let factor = 1.0 + libm::sin(phase);
                phase += increment;
                if phase >= TAU {
                    phase -= TAU;
                }
                let delay = config.depth_seconds() * factor * sample_rate;
                (delay.max(0.0) as usize).min(max_delay)
            })
            .collect()
    }

    /// Value held in the slot the engine reads at sample `n`.
    fn reference_tap(input: &[f32], n: usize, delay: usize, capacity: usize) -> f32 {
        let back = if delay == 0 { capacity } else { delay };
        n.checked_sub(back).map_or(0.0, |t| input[t])
    }

    #[test]
    fn test_impulse_at_default_settings() {
        let config = EffectConfig::builder().depth_seconds(0.008).build().unwrap();
        assert_eq!(config.sample_rate(), 144_000);
        assert_eq!(config.buffer_capacity(), 7200);
        assert_eq!(config.mod_freq_hz(), 0.25);

        let len = 7200;
        let mut buffer = vec![0.0f32; len];
        buffer[0] = 1.0;

        let mut flanger = Flanger::from_config(&config);
        flanger.process(&mut buffer, 0);

        // The dry path passes the impulse; the wet tap only sees silence.
        assert!((buffer[0] - 0.7).abs() < 1e-6);

        let delays = reference_delays(&config, len);
        let hits: Vec<usize> = (1..len).filter(|&n| delays[n] == n).collect();
        assert_eq!(hits.len(), 1);
        let echo = hits[0];
        assert!(echo >= 1152 && echo < 2304);

        for (n, &sample) in buffer.iter().enumerate().skip(1) {
            let expected = if n == echo { 0.5 } else { 0.0 };
            assert!((sample - expected).abs() < 1e-6, "sample {} = {}", n, sample);
        }
    }

    #[test]
    fn test_step_response() {
        let config = EffectConfig::builder()
            .sample_rate(1000)
            .depth_seconds(0.01)
            .build()
            .unwrap();
        let capacity = config.buffer_capacity();
        assert_eq!(capacity, 50);

        let len = 200;
        let input: Vec<f32> = (0..len).map(|n| if n < capacity { 0.0 } else { 1.0 }).collect();
        let mut output = input.clone();

        let mut flanger = Flanger::from_config(&config);
        flanger.process(&mut output, 0);

        let delays = reference_delays(&config, len);
        let first_wet = (capacity..len)
            .find(|&n| n - delays[n] >= capacity)
            .unwrap();

        for n in capacity..first_wet {
            assert!((output[n] - 0.7).abs() < 1e-6);
        }
        assert!((output[first_wet] - 1.2).abs() < 1e-6);

        for n in 0..len {
            let expected = 0.7 * input[n] + 0.5 * reference_tap(&input, n, delays[n], capacity);
            assert!((output[n] - expected).abs() < 1e-6, "sample {}", n);
        }
    }

    #[test]
    fn test_delay_is_clamped() {
        let depths = [0.0001, 0.008, 0.024, 0.025, 0.05, 1.0, 1.0e6];
        for &depth in depths.iter() {
            let config = EffectConfig::builder()
                .sample_rate(1000)
                .depth_seconds(depth)
                .build()
                .unwrap();
            let flanger = Flanger::from_config(&config);
            let max_delay = config.buffer_capacity() - 1;

            for step in 0..=200 {
                let factor = step as f64 / 100.0;
                assert!(flanger.delay_samples_for(factor) <= max_delay);
            }
        }

        let config = EffectConfig::builder()
            .sample_rate(1000)
            .depth_seconds(1.0)
            .build()
            .unwrap();
        let flanger = Flanger::from_config(&config);
        assert_eq!(flanger.delay_samples_for(1.0), 49);
        assert_eq!(flanger.delay_samples_for(0.0), 0);
    }

    #[test]
    fn test_long_run_with_clamped_depth() {
        // Peak delay is far beyond the 50 sample history.
        let config = EffectConfig::builder()
            .sample_rate(1000)
            .depth_seconds(0.5)
            .mod_freq_hz(3.0)
            .build()
            .unwrap();
        let mut flanger = Flanger::from_config(&config);

        let mut input = [0.0f32; 64];
        for (i, sample) in input.iter_mut().enumerate() {
            *sample = if i % 2 == 0 { 1.0 } else { -1.0 };
        }
        for _ in 0..100 {
            let mut block = input;
            flanger.process(&mut block, 0);
            assert!(block.iter().all(|s| s.is_finite() && s.abs() <= 1.2 + 1e-6));
            assert!(flanger.buffer().write_cursor() < flanger.buffer().capacity());
        }
    }

    #[test]
    fn test_custom_gains() {
        let config = EffectConfig::builder()
            .sample_rate(1000)
            .dry_gain(1.0)
            .wet_gain(0.0)
            .build()
            .unwrap();
        let mut flanger = Flanger::from_config(&config);

        let mut buffer = [0.3f32, -0.2, 0.9, 0.0];
        flanger.process(&mut buffer, 0);
        assert_eq!(buffer, [0.3, -0.2, 0.9, 0.0]);
    }

    #[test]
    fn test_reset() {
        let config = EffectConfig::builder().sample_rate(1000).build().unwrap();
        let mut flanger = Flanger::from_config(&config);
        let mut first = [1.0f32; 32];
        flanger.process(&mut first, 0);

        flanger.reset();
        assert_eq!(flanger.buffer().write_cursor(), 0);
        assert_eq!(flanger.lfo().phase(), 0.0);

        let mut second = [1.0f32; 32];
        flanger.process(&mut second, 0);
        assert_eq!(first, second);
    }
}
