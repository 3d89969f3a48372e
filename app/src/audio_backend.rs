use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::Sample;
use liveflanger_core::{BlockProcessor, EffectConfig, Flanger};
use ringbuf::traits::{Consumer, Producer, Split};
use ringbuf::{HeapCons, HeapProd, HeapRb};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Blocks of headroom in the capture ring.
const RING_BLOCKS: usize = 8;
/// Blocks of silence queued before playback starts.
const PREFILL_BLOCKS: usize = 1;

/// Counters shared between the audio callbacks and the control thread.
#[derive(Debug, Default)]
pub struct StreamStats {
    overruns: AtomicU64,
    underruns: AtomicU64,
    blocks: AtomicU64,
}

impl StreamStats {
    /// Input samples dropped because the capture ring was full.
    pub fn overruns(&self) -> u64 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Input samples replaced by silence because the capture ring was empty.
    pub fn underruns(&self) -> u64 {
        self.underruns.load(Ordering::Relaxed)
    }

    /// Blocks handed to the flanger.
    pub fn blocks(&self) -> u64 {
        self.blocks.load(Ordering::Relaxed)
    }
}

/// Creates the capture ring, already holding the playback cushion.
pub fn capture_ring(block_size: usize) -> (HeapProd<f32>, HeapCons<f32>) {
    let ring = HeapRb::<f32>::new(block_size * RING_BLOCKS);
    let (mut producer, consumer) = ring.split();
    for _ in 0..block_size * PREFILL_BLOCKS {
        let _ = producer.try_push(0.0);
    }
    (producer, consumer)
}

/// Input callback state: forwards the first channel of every frame.
pub struct InputCapture {
    producer: HeapProd<f32>,
    channels: usize,
    stats: Arc<StreamStats>,
}

impl InputCapture {
    pub fn new(producer: HeapProd<f32>, channels: usize, stats: Arc<StreamStats>) -> Self {
        InputCapture {
            producer,
            channels: channels.max(1),
            stats,
        }
    }

    pub fn capture<T>(&mut self, data: &[T])
    where
        T: Sample,
        f32: cpal::FromSample<T>,
    {
        let mut dropped = 0u64;
        for frame in data.chunks(self.channels) {
            if self.producer.try_push(f32::from_sample(frame[0])).is_err() {
                dropped += 1;
            }
        }
        if dropped > 0 {
            self.stats.overruns.fetch_add(dropped, Ordering::Relaxed);
        }
    }
}

/// Output callback state: owns the flanger and runs it once per block.
pub struct PlaybackRender {
    consumer: HeapCons<f32>,
    engine: BlockProcessor<Flanger>,
    input_block: Vec<f32>,
    output_block: Vec<f32>,
    channels: usize,
    stats: Arc<StreamStats>,
}

impl PlaybackRender {
    /// Allocates the per-block scratch buffers up front.
    pub fn new(
        consumer: HeapCons<f32>,
        engine: BlockProcessor<Flanger>,
        block_size: usize,
        channels: usize,
        stats: Arc<StreamStats>,
    ) -> Self {
        let block_size = block_size.max(1);
        PlaybackRender {
            consumer,
            engine,
            input_block: vec![0.0; block_size],
            output_block: vec![0.0; block_size],
            channels: channels.max(1),
            stats,
        }
    }

    /// Fills an interleaved device buffer, writing the mono result to every channel.
    ///
    /// Slots of a trailing partial frame are silenced.
    pub fn render<T>(&mut self, data: &mut [T])
    where
        T: Sample + cpal::FromSample<f32>,
    {
        let channels = self.channels;
        for chunk in data.chunks_mut(self.input_block.len() * channels) {
            let frames = chunk.len() / channels;
            let (whole, partial) = chunk.split_at_mut(frames * channels);
            partial.fill(T::EQUILIBRIUM);
            if frames == 0 {
                continue;
            }

            let input = &mut self.input_block[..frames];
            let output = &mut self.output_block[..frames];

            let received = self.consumer.pop_slice(input);
            if received < frames {
                input[received..].fill(0.0);
                self.stats
                    .underruns
                    .fetch_add((frames - received) as u64, Ordering::Relaxed);
            }

            self.engine.process(input, output);
            self.stats.blocks.fetch_add(1, Ordering::Relaxed);

            for (frame, &sample) in whole.chunks_exact_mut(channels).zip(output.iter()) {
                let value = T::from_sample(sample);
                for slot in frame.iter_mut() {
                    *slot = value;
                }
            }
        }
    }

    #[cfg(test)]
    fn engine(&self) -> &BlockProcessor<Flanger> {
        &self.engine
    }
}

#[allow(deprecated)]
pub fn device_label(device: &cpal::Device) -> String {
    device.name().unwrap_or_else(|_| String::from("<unnamed device>"))
}

/// Logs every input and output device of the default host.
pub fn list_devices() -> Result<()> {
    let host = cpal::default_host();
    tracing::info!(host = ?host.id(), "listing audio devices");

    for device in host.input_devices().context("failed to enumerate input devices")? {
        let config = device.default_input_config().ok();
        tracing::info!(
            name = %device_label(&device),
            channels = config.as_ref().map(|c| c.channels()),
            sample_rate = config.as_ref().map(|c| c.sample_rate()),
            "input device"
        );
    }
    for device in host.output_devices().context("failed to enumerate output devices")? {
        let config = device.default_output_config().ok();
        tracing::info!(
            name = %device_label(&device),
            channels = config.as_ref().map(|c| c.channels()),
            sample_rate = config.as_ref().map(|c| c.sample_rate()),
            "output device"
        );
    }
    Ok(())
}

/// Picks mono when the device offers it for the stream's sample format and
/// rate, otherwise the device's default channel count.
///
/// `ranges` holds `(channels, min_sample_rate, max_sample_rate)` per
/// supported configuration of the matching sample format.
pub fn preferred_channels<I>(
    ranges: I,
    sample_rate: u32,
    default: cpal::ChannelCount,
) -> cpal::ChannelCount
where
    I: IntoIterator<Item = (cpal::ChannelCount, u32, u32)>,
{
    let mono = ranges
        .into_iter()
        .any(|(channels, min, max)| channels == 1 && (min..=max).contains(&sample_rate));
    if mono {
        1
    } else {
        default
    }
}

fn stream_config(
    channels: cpal::ChannelCount,
    config: &EffectConfig,
) -> Result<cpal::StreamConfig> {
    let frames = u32::try_from(config.block_size()).map_err(|_| {
        anyhow!("block size {} is too large for the backend", config.block_size())
    })?;
    Ok(cpal::StreamConfig {
        channels,
        sample_rate: config.sample_rate(),
        buffer_size: cpal::BufferSize::Fixed(frames),
    })
}

/// Opens the capture stream on `device`, converting its native format to f32.
pub fn build_input_stream(
    device: &cpal::Device,
    config: &EffectConfig,
    producer: HeapProd<f32>,
    stats: Arc<StreamStats>,
) -> Result<cpal::Stream> {
    let supported = device
        .default_input_config()
        .context("failed to query the input device configuration")?;
    let format = supported.sample_format();
    let ranges = device
        .supported_input_configs()
        .map(|ranges| {
            ranges
                .filter(|range| range.sample_format() == format)
                .map(|range| {
                    (range.channels(), range.min_sample_rate(), range.max_sample_rate())
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let channels = preferred_channels(ranges, config.sample_rate(), supported.channels());
    let stream_config = stream_config(channels, config)?;
    let capture = InputCapture::new(producer, stream_config.channels as usize, stats);

    tracing::debug!(channels, ?format, "input stream format");
    match format {
        cpal::SampleFormat::F32 => run_input::<f32>(device, &stream_config, capture),
        cpal::SampleFormat::I16 => run_input::<i16>(device, &stream_config, capture),
        cpal::SampleFormat::U16 => run_input::<u16>(device, &stream_config, capture),
        other => Err(anyhow!("unsupported input sample format {:?}", other)),
    }
}

/// Opens the playback stream on `device`; the flanger moves into its callback.
pub fn build_output_stream(
    device: &cpal::Device,
    config: &EffectConfig,
    consumer: HeapCons<f32>,
    stats: Arc<StreamStats>,
) -> Result<cpal::Stream> {
    let supported = device
        .default_output_config()
        .context("failed to query the output device configuration")?;
    let format = supported.sample_format();
    let ranges = device
        .supported_output_configs()
        .map(|ranges| {
            ranges
                .filter(|range| range.sample_format() == format)
                .map(|range| {
                    (range.channels(), range.min_sample_rate(), range.max_sample_rate())
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();
    let channels = preferred_channels(ranges, config.sample_rate(), supported.channels());
    let stream_config = stream_config(channels, config)?;
    let render = PlaybackRender::new(
        consumer,
        BlockProcessor::new(Flanger::from_config(config)),
        config.block_size(),
        stream_config.channels as usize,
        stats,
    );

    tracing::debug!(channels, ?format, "output stream format");
    match format {
        cpal::SampleFormat::F32 => run_output::<f32>(device, &stream_config, render),
        cpal::SampleFormat::I16 => run_output::<i16>(device, &stream_config, render),
        cpal::SampleFormat::U16 => run_output::<u16>(device, &stream_config, render),
        other => Err(anyhow!("unsupported output sample format {:?}", other)),
    }
}

fn run_input<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut capture: InputCapture,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample,
    f32: cpal::FromSample<T>,
{
    let err_fn = |err: cpal::StreamError| tracing::error!(%err, "input stream error");

    let stream = device
        .build_input_stream(
            config,
            move |data: &[T], _: &cpal::InputCallbackInfo| capture.capture(data),
            err_fn,
            None,
        )
        .context("failed to open the input stream")?;

    Ok(stream)
}

fn run_output<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    mut render: PlaybackRender,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let err_fn = |err: cpal::StreamError| tracing::error!(%err, "output stream error");

    let stream = device
        .build_output_stream(
            config,
            move |data: &mut [T], _: &cpal::OutputCallbackInfo| render.render(data),
            err_fn,
            None,
        )
        .context("failed to open the output stream")?;

    Ok(stream)
}
