//! Runtime bridge between UI command queue and backend event intake.

use std::{sync::Arc, thread};

use client_core::{perform, HttpReservationClient, Settings};
use crossbeam_channel::{Receiver, Sender};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

pub fn launch(cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>, settings: Settings) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let client = match HttpReservationClient::from_settings(&settings) {
                Ok(client) => Arc::new(client),
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!(
                            "backend worker startup failure: {err} (server url '{}')",
                            settings.server_url
                        ),
                    )));
                    tracing::error!(server_url = %settings.server_url, "unusable server url: {err}");
                    return;
                }
            };
            let _ = ui_tx.try_send(UiEvent::Info(format!(
                "Connected to {}",
                client.base_url()
            )));

            while let Ok(cmd) = cmd_rx.recv() {
                match cmd {
                    BackendCommand::Perform(effect) => {
                        tracing::info!(effect = effect.name(), "backend: perform");
                        let client = Arc::clone(&client);
                        let ui_tx = ui_tx.clone();
                        // Outcomes arrive in completion order, not queue order.
                        tokio::spawn(async move {
                            let outcome = perform(client.as_ref(), effect).await;
                            if ui_tx.try_send(UiEvent::Outcome(outcome)).is_err() {
                                tracing::warn!("ui event queue unavailable; dropping outcome");
                            }
                        });
                    }
                    BackendCommand::Shutdown => {
                        tracing::info!("backend: shutdown");
                        break;
                    }
                }
            }
        });
    });
}
