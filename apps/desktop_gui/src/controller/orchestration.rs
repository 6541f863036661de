//! Command orchestration helpers from UI actions to backend command queue.

use client_core::FormEffect;
use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) {
    let cmd_name = cmd.name();

    match cmd_tx.try_send(cmd) {
        Ok(()) => tracing::debug!(command = cmd_name, "queued ui->backend command"),
        Err(TrySendError::Full(_)) => {
            *status = "UI command queue is full; please retry".to_string();
        }
        Err(TrySendError::Disconnected(_)) => {
            *status =
                "Backend command processor disconnected (possible startup/runtime failure); relaunch the app"
                    .to_string();
        }
    }
}

/// Forwards an effect returned by the form, if any.
pub fn dispatch_effect(
    cmd_tx: &Sender<BackendCommand>,
    effect: Option<FormEffect>,
    status: &mut String,
) {
    if let Some(effect) = effect {
        dispatch_backend_command(cmd_tx, BackendCommand::Perform(effect), status);
    }
}
