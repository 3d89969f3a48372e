pub mod audio_backend;
pub mod cli;
pub mod shutdown;
pub mod stream_controller;
