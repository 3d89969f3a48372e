use crate::audio_backend::{self, device_label, StreamStats};
use anyhow::{bail, Context, Result};
use cpal::traits::{HostTrait, StreamTrait};
use liveflanger_core::EffectConfig;
use std::sync::Arc;

/// The start/stop surface the controller needs from a backend stream.
pub trait StreamHandle {
    fn play(&self) -> Result<()>;
    fn pause(&self) -> Result<()>;
}

impl StreamHandle for cpal::Stream {
    fn play(&self) -> Result<()> {
        StreamTrait::play(self)?;
        Ok(())
    }

    fn pause(&self) -> Result<()> {
        StreamTrait::pause(self)?;
        Ok(())
    }
}

/// Counters collected over the lifetime of a stream pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamReport {
    pub blocks: u64,
    pub overruns: u64,
    pub underruns: u64,
}

impl StreamReport {
    fn from_stats(stats: &StreamStats) -> Self {
        StreamReport {
            blocks: stats.blocks(),
            overruns: stats.overruns(),
            underruns: stats.underruns(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamState {
    Opened,
    Running,
}

/// Owns the capture and playback streams of a run.
///
/// The flanger state lives inside the playback callback, so it is torn down
/// together with the streams when the controller is stopped or dropped.
pub struct StreamController<S = cpal::Stream> {
    input: S,
    output: S,
    stats: Arc<StreamStats>,
    state: StreamState,
}

impl StreamController<cpal::Stream> {
    /// Opens both streams on the default devices without starting them.
    pub fn open(config: &EffectConfig) -> Result<Self> {
        let host = cpal::default_host();
        let input_device = host
            .default_input_device()
            .context("no input device available")?;
        let output_device = host
            .default_output_device()
            .context("no output device available")?;

        tracing::info!(
            host = ?host.id(),
            input = %device_label(&input_device),
            output = %device_label(&output_device),
            sample_rate = config.sample_rate(),
            block_size = config.block_size(),
            "opening audio streams"
        );

        let stats = Arc::new(StreamStats::default());
        let (producer, consumer) = audio_backend::capture_ring(config.block_size());

        let input =
            audio_backend::build_input_stream(&input_device, config, producer, stats.clone())?;
        let output =
            audio_backend::build_output_stream(&output_device, config, consumer, stats.clone())?;

        Ok(StreamController::new(input, output, stats))
    }
}

impl<S: StreamHandle> StreamController<S> {
    /// Wraps two already opened, not yet started streams.
    pub fn new(input: S, output: S, stats: Arc<StreamStats>) -> Self {
        StreamController {
            input,
            output,
            stats,
            state: StreamState::Opened,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        if self.state == StreamState::Running {
            bail!("audio streams are already running");
        }

        self.input.play().context("failed to start the input stream")?;
        self.output
            .play()
            .context("failed to start the output stream")?;
        self.state = StreamState::Running;
        Ok(())
    }

    /// Stops both streams and releases them.
    ///
    /// Returns once no callback is in flight any more. The streams are
    /// released even when stopping fails.
    pub fn stop(self) -> Result<StreamReport> {
        let StreamController {
            input,
            output,
            stats,
            state,
        } = self;

        if state == StreamState::Running {
            output
                .pause()
                .context("failed to stop the output stream")?;
            input.pause().context("failed to stop the input stream")?;
        }

        drop(output);
        drop(input);

        Ok(StreamReport::from_stats(&stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct FakeStream {
        name: &'static str,
        fail_pause: bool,
        log: Log,
    }

    impl FakeStream {
        fn new(name: &'static str, fail_pause: bool, log: &Log) -> Self {
            FakeStream {
                name,
                fail_pause,
                log: log.clone(),
            }
        }
    }

    impl StreamHandle for FakeStream {
        fn play(&self) -> Result<()> {
            self.log.borrow_mut().push(format!("play {}", self.name));
            Ok(())
        }

        fn pause(&self) -> Result<()> {
            self.log.borrow_mut().push(format!("pause {}", self.name));
            if self.fail_pause {
                Err(anyhow!("device disconnected"))
            } else {
                Ok(())
            }
        }
    }

    impl Drop for FakeStream {
        fn drop(&mut self) {
            self.log.borrow_mut().push(format!("drop {}", self.name));
        }
    }

    #[test]
    fn test_start_and_stop_order() {
        let log = Log::default();
        let mut controller = StreamController::new(
            FakeStream::new("input", false, &log),
            FakeStream::new("output", false, &log),
            Arc::new(StreamStats::default()),
        );

        controller.start().unwrap();
        assert!(controller.start().is_err());

        let report = controller.stop().unwrap();
        assert_eq!(
            report,
            StreamReport {
                blocks: 0,
                overruns: 0,
                underruns: 0
            }
        );
        assert_eq!(
            *log.borrow(),
            [
                "play input",
                "play output",
                "pause output",
                "pause input",
                "drop output",
                "drop input"
            ]
        );
    }

    #[test]
    fn test_stop_failure_is_reported() {
        let log = Log::default();
        let mut controller = StreamController::new(
            FakeStream::new("input", false, &log),
            FakeStream::new("output", true, &log),
            Arc::new(StreamStats::default()),
        );
        controller.start().unwrap();

        let err = controller.stop().unwrap_err();
        assert_eq!(err.to_string(), "failed to stop the output stream");
        assert_eq!(
            format!("{:#}", err),
            "failed to stop the output stream: device disconnected"
        );

        // Both streams are still released.
        let log = log.borrow();
        assert!(log.iter().any(|entry| entry == "drop output"));
        assert!(log.iter().any(|entry| entry == "drop input"));
        assert!(!log.iter().any(|entry| entry == "pause input"));
    }

    #[test]
    fn test_stop_without_start_skips_pause() {
        let log = Log::default();
        let controller = StreamController::new(
            FakeStream::new("input", true, &log),
            FakeStream::new("output", true, &log),
            Arc::new(StreamStats::default()),
        );

        assert!(controller.stop().is_ok());
        assert_eq!(*log.borrow(), ["drop output", "drop input"]);
    }
}
