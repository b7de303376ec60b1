use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::commands::{submit, Command, ControlSender};

/// Relays every Ctrl-C into a channel. Installing the handler disables the
/// default SIGINT termination, so the process must exit on its own.
pub fn forward_ctrl_c() -> mpsc::Receiver<()> {
    let (tx, rx) = mpsc::channel(4);
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if tx.send(()).await.is_err() {
                break;
            }
        }
    });
    rx
}

/// The first interrupt asks the control task for a clean exit without
/// waiting on it. Returns true on a second interrupt, when the caller must
/// terminate at once (the control task may be stuck delivering a message).
pub async fn watch_interrupts(mut signals: mpsc::Receiver<()>, control: ControlSender) -> bool {
    if signals.recv().await.is_none() {
        return false;
    }
    info!("interrupt received, stopping");
    tokio::spawn(async move {
        submit(&control, Command::Exit).await;
    });

    if signals.recv().await.is_none() {
        return false;
    }
    warn!("second interrupt received, exiting immediately");
    true
}
