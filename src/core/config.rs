use core::str::FromStr;

/// Default base modulation depth in seconds.
pub const DEFAULT_DEPTH_SECONDS: f64 = 0.008;
/// Default stream sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: u32 = 144_000;
/// Default number of frames per callback block.
pub const DEFAULT_BLOCK_SIZE: usize = 256;
/// Default LFO rate in Hz.
pub const DEFAULT_MOD_FREQ_HZ: f64 = 0.25;
/// Default length of the delay history in milliseconds.
pub const DEFAULT_DELAY_BUFFER_MS: u32 = 50;
/// Default gain applied to the unprocessed input.
pub const DEFAULT_DRY_GAIN: f32 = 0.7;
/// Default gain applied to the delayed tap.
pub const DEFAULT_WET_GAIN: f32 = 0.5;

/// Errors raised while validating effect parameters.
///
/// All of them are detected before a stream is opened; none can occur once
/// processing has started.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid depth value `{0}`: depth must be a positive number of seconds")]
    InvalidDepth(alloc::string::String),
    #[error("invalid depth value {0}: depth must be a positive number of seconds")]
    NonPositiveDepth(f64),
    #[error("sample rate must be greater than zero")]
    InvalidSampleRate,
    #[error("block size must be greater than zero")]
    InvalidBlockSize,
    #[error("modulation frequency {frequency} Hz must be positive and below {nyquist} Hz")]
    InvalidModulationFrequency { frequency: f64, nyquist: f64 },
    #[error("{name} gain {value} is not a finite number")]
    InvalidGain { name: &'static str, value: f32 },
    #[error("a {ms} ms delay buffer holds no samples at {sample_rate} Hz")]
    InvalidBufferLength { ms: u32, sample_rate: u32 },
}

/// Parses a user supplied depth in seconds.
///
/// Anything that is not a finite number greater than zero is rejected.
pub fn parse_depth(value: &str) -> Result<f64, ConfigError> {
    let depth = f64::from_str(value.trim())
        .map_err(|_| ConfigError::InvalidDepth(alloc::string::String::from(value)))?;
    validate_depth(depth)
}

fn validate_depth(depth: f64) -> Result<f64, ConfigError> {
    if depth.is_finite() && depth > 0.0 {
        Ok(depth)
    } else {
        Err(ConfigError::NonPositiveDepth(depth))
    }
}

/// Immutable run parameters of the flanger.
///
/// Only obtainable through [`EffectConfigBuilder::build`], so every instance
/// has passed validation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EffectConfig {
    sample_rate: u32,
    block_size: usize,
    depth_seconds: f64,
    mod_freq_hz: f64,
    dry_gain: f32,
    wet_gain: f32,
    delay_buffer_ms: u32,
}

impl EffectConfig {
    /// Starts a builder populated with the default parameters.
    pub fn builder() -> EffectConfigBuilder {
        EffectConfigBuilder::default()
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn block_size(&self) -> usize {
        self.block_size
    }

    pub fn depth_seconds(&self) -> f64 {
        self.depth_seconds
    }

    pub fn mod_freq_hz(&self) -> f64 {
        self.mod_freq_hz
    }

    pub fn dry_gain(&self) -> f32 {
        self.dry_gain
    }

    pub fn wet_gain(&self) -> f32 {
        self.wet_gain
    }

    pub fn delay_buffer_ms(&self) -> u32 {
        self.delay_buffer_ms
    }

    /// Number of samples held by the delay buffer.
    pub fn buffer_capacity(&self) -> usize {
        buffer_capacity(self.delay_buffer_ms, self.sample_rate)
    }

    /// Largest delay, in samples, the oscillator can ask for before clamping.
    pub fn peak_delay_samples(&self) -> f64 {
        self.depth_seconds * 2.0 * self.sample_rate as f64
    }

    /// True when the modulated delay would reach past the buffer and gets clamped.
    pub fn depth_exceeds_buffer(&self) -> bool {
        self.peak_delay_samples() > (self.buffer_capacity() - 1) as f64
    }
}

impl Default for EffectConfig {
    fn default() -> Self {
        EffectConfig {
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: DEFAULT_BLOCK_SIZE,
            depth_seconds: DEFAULT_DEPTH_SECONDS,
            mod_freq_hz: DEFAULT_MOD_FREQ_HZ,
            dry_gain: DEFAULT_DRY_GAIN,
            wet_gain: DEFAULT_WET_GAIN,
            delay_buffer_ms: DEFAULT_DELAY_BUFFER_MS,
        }
    }
}

fn buffer_capacity(delay_buffer_ms: u32, sample_rate: u32) -> usize {
    (delay_buffer_ms as u64 * sample_rate as u64 / 1000) as usize
}

/// Collects effect parameters and validates them into an [`EffectConfig`].
#[derive(Debug, Clone, Copy)]
pub struct EffectConfigBuilder {
    config: EffectConfig,
}

impl Default for EffectConfigBuilder {
    fn default() -> Self {
        EffectConfigBuilder {
            config: EffectConfig::default(),
        }
    }
}

impl EffectConfigBuilder {
    pub fn sample_rate(mut self, sample_rate: u32) -> Self {
        self.config.sample_rate = sample_rate;
        self
    }

    pub fn block_size(mut self, block_size: usize) -> Self {
        self.config.block_size = block_size;
        self
    }

    /// Sets the base modulation depth in seconds.
    pub fn depth_seconds(mut self, depth_seconds: f64) -> Self {
        self.config.depth_seconds = depth_seconds;
        self
    }

    pub fn mod_freq_hz(mut self, mod_freq_hz: f64) -> Self {
        self.config.mod_freq_hz = mod_freq_hz;
        self
    }

    pub fn dry_gain(mut self, dry_gain: f32) -> Self {
        self.config.dry_gain = dry_gain;
        self
    }

    pub fn wet_gain(mut self, wet_gain: f32) -> Self {
        self.config.wet_gain = wet_gain;
        self
    }

    pub fn delay_buffer_ms(mut self, delay_buffer_ms: u32) -> Self {
        self.config.delay_buffer_ms = delay_buffer_ms;
        self
    }

    /// Validates the collected parameters.
    pub fn build(self) -> Result<EffectConfig, ConfigError> {
        let config = self.config;

        validate_depth(config.depth_seconds)?;
        if config.sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        if config.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize);
        }

        let nyquist = config.sample_rate as f64 / 2.0;
        if !(config.mod_freq_hz.is_finite()
            && config.mod_freq_hz > 0.0
            && config.mod_freq_hz < nyquist)
        {
            return Err(ConfigError::InvalidModulationFrequency {
                frequency: config.mod_freq_hz,
                nyquist,
            });
        }

        for (name, value) in [("dry", config.dry_gain), ("wet", config.wet_gain)] {
            if !value.is_finite() {
                return Err(ConfigError::InvalidGain { name, value });
            }
        }

        if buffer_capacity(config.delay_buffer_ms, config.sample_rate) == 0 {
            return Err(ConfigError::InvalidBufferLength {
                ms: config.delay_buffer_ms,
                sample_rate: config.sample_rate,
            });
        }

        Ok(config)
    }
}
