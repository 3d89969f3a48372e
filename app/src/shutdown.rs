use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};

/// Fires once when the process receives Ctrl-C or SIGTERM.
pub struct ShutdownSignal {
    receiver: Receiver<()>,
}

impl ShutdownSignal {
    /// Installs the process signal handler.
    ///
    /// Can only be called once per process.
    pub fn install() -> Result<Self> {
        let (sender, signal) = Self::channel();
        ctrlc::set_handler(move || {
            // A second signal while the first is pending is dropped.
            let _ = sender.try_send(());
        })
        .context("failed to install the shutdown signal handler")?;

        Ok(signal)
    }

    /// A signal fired by sending on the returned sender instead of by the OS.
    pub fn channel() -> (Sender<()>, Self) {
        let (sender, receiver) = bounded(1);
        (sender, ShutdownSignal { receiver })
    }

    /// Blocks the calling thread until a shutdown is requested.
    pub fn wait(&self) -> Result<()> {
        self.receiver
            .recv()
            .context("shutdown signal handler was dropped")
    }
}
