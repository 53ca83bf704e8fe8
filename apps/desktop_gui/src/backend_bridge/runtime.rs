//! Runtime bridge between UI command queue and backend event intake.

use std::thread;

use crossbeam_channel::{Receiver, Sender};
use shared::domain::{PersistedTicket, FORM_ROUTE, TICKET_STORAGE_KEY};
use storage::{KeyValueStore, Storage};
use ticket_core::{EventDetails, Navigator, SubmitError, TicketRenderer};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Hands route requests back to the UI thread, which owns the current view.
pub struct ChannelNavigator {
    ui_tx: Sender<UiEvent>,
}

impl ChannelNavigator {
    pub fn new(ui_tx: Sender<UiEvent>) -> Self {
        Self { ui_tx }
    }
}

impl Navigator for ChannelNavigator {
    fn navigate_to(&self, path: &str) {
        if self.ui_tx.try_send(UiEvent::Navigate(path.to_string())).is_err() {
            tracing::warn!(path, "ui event queue unavailable; navigation dropped");
        }
    }
}

/// The form stays busy until this arrives, so unlike other events it waits
/// for queue space instead of being dropped.
pub fn deliver_submission_result(
    ui_tx: &Sender<UiEvent>,
    result: Result<PersistedTicket, SubmitError>,
) {
    if ui_tx.send(UiEvent::SubmissionFinished(result)).is_err() {
        tracing::warn!("ui event queue closed; submission result dropped");
    }
}

pub fn launch(
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
    database_url: String,
    event: EventDetails,
) {
    thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("failed to build backend runtime: {err}"),
                )));
                return;
            }
        };

        runtime.block_on(async move {
            let storage = match Storage::new(&database_url).await {
                Ok(storage) => storage,
                Err(err) => {
                    tracing::error!(error = %format!("{err:#}"), "ticket store unavailable");
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("{err:#}"),
                    )));
                    return;
                }
            };
            tracing::info!(database_url = %database_url, "backend worker ready");

            let navigator = ChannelNavigator::new(ui_tx.clone());
            let renderer = TicketRenderer::new(event);

            while let Ok(cmd) = cmd_rx.recv() {
                let cmd_name = cmd.name();
                tracing::debug!(command = cmd_name, "backend command received");
                match cmd {
                    BackendCommand::Submit(pending) => {
                        let result = pending.commit(&storage, &navigator).await;
                        deliver_submission_result(&ui_tx, result);
                    }
                    BackendCommand::LoadTicket => {
                        let view = renderer.load(&storage).await;
                        let _ = ui_tx.try_send(UiEvent::TicketLoaded(view));
                    }
                    BackendCommand::ClearTicket => {
                        match storage.remove_item(TICKET_STORAGE_KEY).await {
                            Ok(()) => {
                                let _ = ui_tx.try_send(UiEvent::Info(
                                    "Cleared the stored ticket".to_string(),
                                ));
                                navigator.navigate_to(FORM_ROUTE);
                            }
                            Err(err) => {
                                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                                    UiErrorContext::ClearTicket,
                                    format!("{err:#}"),
                                )));
                            }
                        }
                    }
                }
            }
            tracing::debug!("ui command channel closed; backend worker exiting");
        });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::bounded;
    use std::time::Duration;

    #[test]
    fn submission_result_waits_for_a_full_queue() {
        let (ui_tx, ui_rx) = bounded::<UiEvent>(1);
        ui_tx
            .try_send(UiEvent::Info("filler".to_string()))
            .expect("fill queue");

        let drainer = thread::spawn(move || {
            thread::sleep(Duration::from_millis(50));
            let first = ui_rx.recv().expect("filler");
            let second = ui_rx.recv().expect("result");
            (first, second)
        });

        deliver_submission_result(&ui_tx, Ok(PersistedTicket::default()));

        let (first, second) = drainer.join().expect("drainer thread");
        assert!(matches!(first, UiEvent::Info(_)));
        assert!(matches!(second, UiEvent::SubmissionFinished(Ok(_))));
    }
}
