use anyhow::Result;
use clap::Parser;
use liveflanger_app::audio_backend;
use liveflanger_app::cli::Cli;
use liveflanger_app::shutdown::ShutdownSignal;
use liveflanger_app::stream_controller::StreamController;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    if cli.list_devices {
        return audio_backend::list_devices();
    }

    let config = cli.effect_config()?;
    if cli.depth.is_none() {
        tracing::info!(depth = config.depth_seconds(), "no depth given, using the default");
    }
    if config.depth_exceeds_buffer() {
        tracing::warn!(
            peak_delay_samples = config.peak_delay_samples(),
            buffer_samples = config.buffer_capacity(),
            "modulated delay exceeds the delay buffer and will be clamped"
        );
    }

    let shutdown = ShutdownSignal::install()?;

    let mut controller = StreamController::open(&config)?;
    controller.start()?;
    tracing::info!(
        depth = config.depth_seconds(),
        mod_freq = config.mod_freq_hz(),
        dry = config.dry_gain(),
        wet = config.wet_gain(),
        "microphone pass-through with flanger started, press Ctrl+C to stop"
    );

    shutdown.wait()?;
    tracing::info!("shutting down");

    let report = controller.stop()?;
    tracing::info!(
        blocks = report.blocks,
        overruns = report.overruns,
        underruns = report.underruns,
        "audio streams stopped"
    );
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}
