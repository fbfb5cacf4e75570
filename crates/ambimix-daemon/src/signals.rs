//! Signal handling for graceful shutdown.

use std::fmt;

use anyhow::{Context, Result};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::info;

/// Signal that asked the daemon to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Terminate,
    Interrupt,
    Hangup,
}

impl fmt::Display for Shutdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminate => write!(f, "SIGTERM"),
            Self::Interrupt => write!(f, "SIGINT"),
            Self::Hangup => write!(f, "SIGHUP"),
        }
    }
}

/// Set up signal handlers for graceful shutdown.
///
/// The returned receiver yields the first SIGTERM, SIGHUP, or SIGINT received.
pub fn setup_signal_handlers() -> Result<mpsc::Receiver<Shutdown>> {
    let (tx, rx) = mpsc::channel(1);

    for (kind, reason) in [(SignalKind::terminate(), Shutdown::Terminate), (SignalKind::hangup(), Shutdown::Hangup)] {
        let mut stream = signal(kind).with_context(|| format!("Failed to install {reason} handler"))?;
        let tx = tx.clone();
        tokio::spawn(async move {
            if stream.recv().await.is_some() {
                info!(signal = %reason, "Received signal");
                let _ = tx.send(reason).await;
            }
        });
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!(signal = %Shutdown::Interrupt, "Received signal");
            let _ = tx.send(Shutdown::Interrupt).await;
        }
    });

    Ok(rx)
}
