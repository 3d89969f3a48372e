use clap::Parser;
use liveflanger_core::core::config::{
    parse_depth, DEFAULT_BLOCK_SIZE, DEFAULT_DELAY_BUFFER_MS, DEFAULT_DRY_GAIN,
    DEFAULT_MOD_FREQ_HZ, DEFAULT_SAMPLE_RATE, DEFAULT_WET_GAIN,
};
use liveflanger_core::{ConfigError, EffectConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Microphone pass-through with a flanger effect", long_about = None)]
pub struct Cli {
    /// Modulation depth in seconds (default 0.008).
    #[arg(value_parser = parse_depth, allow_negative_numbers = true)]
    pub depth: Option<f64>,

    /// Stream sample rate in Hz.
    #[arg(long, default_value_t = DEFAULT_SAMPLE_RATE)]
    pub sample_rate: u32,

    /// Frames per audio callback.
    #[arg(long, default_value_t = DEFAULT_BLOCK_SIZE)]
    pub block_size: usize,

    /// LFO rate in Hz.
    #[arg(long, default_value_t = DEFAULT_MOD_FREQ_HZ)]
    pub mod_freq: f64,

    /// Gain of the unprocessed signal.
    #[arg(long, default_value_t = DEFAULT_DRY_GAIN, allow_negative_numbers = true)]
    pub dry: f32,

    /// Gain of the delayed signal.
    #[arg(long, default_value_t = DEFAULT_WET_GAIN, allow_negative_numbers = true)]
    pub wet: f32,

    /// Length of the delay history in milliseconds.
    #[arg(long, default_value_t = DEFAULT_DELAY_BUFFER_MS)]
    pub buffer_ms: u32,

    /// Log the available audio devices and exit.
    #[arg(long)]
    pub list_devices: bool,
}

impl Cli {
    /// Validates the arguments into the immutable run configuration.
    pub fn effect_config(&self) -> Result<EffectConfig, ConfigError> {
        let mut builder = EffectConfig::builder()
            .sample_rate(self.sample_rate)
            .block_size(self.block_size)
            .mod_freq_hz(self.mod_freq)
            .dry_gain(self.dry)
            .wet_gain(self.wet)
            .delay_buffer_ms(self.buffer_ms);

        if let Some(depth) = self.depth {
            builder = builder.depth_seconds(depth);
        }

        builder.build()
    }
}
