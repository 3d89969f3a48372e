pub mod block;
pub mod config;
pub mod delay_buffer;
pub mod frame_processor;
