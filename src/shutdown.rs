// src/shutdown.rs
//! Shutdown triggers for the server binary: SIGINT, SIGTERM, or a panic anywhere in
//! the process. Once triggered, in-flight requests get `grace` to finish before the
//! process is forced down with exit code 1.

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Interrupt,
    Terminate,
    /// A panic, with its message.
    Fatal(String),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::Interrupt => f.write_str("SIGINT"),
            Trigger::Terminate => f.write_str("SIGTERM"),
            Trigger::Fatal(msg) => write!(f, "fatal error: {msg}"),
        }
    }
}

/// Receives the first trigger. Senders can be handed to anything that may need to
/// bring the server down.
pub struct Shutdown {
    tx: UnboundedSender<Trigger>,
    rx: UnboundedReceiver<Trigger>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = unbounded_channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> UnboundedSender<Trigger> {
        self.tx.clone()
    }

    /// Chain a panic hook that reports every panic as [`Trigger::Fatal`].
    pub fn install_panic_hook(&self) {
        let tx = self.sender();
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic| {
            previous(panic);
            let msg = panic
                .payload()
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.payload().downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic".to_string());
            let _ = tx.send(Trigger::Fatal(msg));
        }));
    }

    /// Resolves on the first trigger, then arms the forced-exit timer.
    pub async fn wait(mut self, grace: Duration) -> Trigger {
        let trigger = tokio::select! {
            _ = tokio::signal::ctrl_c() => Trigger::Interrupt,
            _ = terminate() => Trigger::Terminate,
            Some(t) = self.rx.recv() => t,
        };
        match &trigger {
            Trigger::Fatal(_) => error!(trigger = %trigger, "shutting down gracefully"),
            _ => info!(trigger = %trigger, "shutting down gracefully"),
        }
        arm_force_exit(grace);
        trigger
    }
}

fn arm_force_exit(grace: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(grace).await;
        error!(grace_secs = grace.as_secs(), "could not close connections in time, forcefully shutting down");
        std::process::exit(1);
    });
}

#[cfg(unix)]
async fn terminate() {
    use tokio::signal::unix::{signal, SignalKind};
    match signal(SignalKind::terminate()) {
        Ok(mut sig) => {
            sig.recv().await;
        }
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable");
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
