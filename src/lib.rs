#![no_std]

extern crate alloc;

pub mod core;
pub mod effects;
pub mod synthesis;

pub use crate::core::block::BlockProcessor;
pub use crate::core::config::{ConfigError, EffectConfig, EffectConfigBuilder};
pub use crate::core::frame_processor::FrameProcessor;
pub use crate::effects::modulation::flanger::Flanger;
pub use crate::synthesis::lfo::Lfo;
