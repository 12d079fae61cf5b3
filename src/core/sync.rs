// src/core/sync.rs

//! # Sync Coordinator
//!
//! Runs each manager's sync on its own worker, one manager at a time, and forwards the
//! worker's events to the sync screen. A worker's channel closes when its sync returns,
//! which is what moves the coordinator on to the next manager.

use crate::core::managers::Manager;
use crate::models::{SyncEvent, SyncStatus};
use crossbeam_channel::Sender;
use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SyncError {
    #[error("Sync of manager '{manager}' panicked: {message}")]
    WorkerPanicked { manager: String, message: String },
}

/// What the coordinator tells the sync screen.
#[derive(Debug, Clone)]
pub enum SyncMessage {
    Event { manager: String, event: SyncEvent },
    ManagerDone { manager: String, attempted: bool },
    AllDone,
}

/// Syncs `managers` sequentially, forwarding events to `ui`.
///
/// A panicking worker is reported to the UI as a final `Aborted` event and returned as an
/// error once every manager has had its turn. If the UI hangs up, remaining events are dropped
/// but the running worker finishes. Once `stop` is set no further manager is started.
pub fn run_sync(managers: &[Box<dyn Manager>], ui: &Sender<SyncMessage>, stop: &AtomicBool) -> Result<(), SyncError> {
    let mut first_panic = None;

    for manager in managers {
        let key = manager.key().to_string();
        if stop.load(Ordering::SeqCst) {
            log::info!("Sync stopped before '{}'", key);
            break;
        }
        log::debug!("Starting sync of '{}'", key);
        let (events_tx, events_rx) = crossbeam_channel::unbounded::<SyncEvent>();

        let joined = thread::scope(|scope| {
            let worker = scope.spawn(move || {
                // The sender is dropped when the sync returns, closing the channel.
                let events_tx = events_tx;
                manager.sync(&events_tx)
            });

            for event in events_rx.iter() {
                let message = SyncMessage::Event {
                    manager: key.clone(),
                    event,
                };
                if ui.send(message).is_err() {
                    log::debug!("Sync screen closed, dropping events of '{}'", key);
                }
            }
            worker.join()
        });

        match joined {
            Ok(attempted) => {
                let _ = ui.send(SyncMessage::ManagerDone {
                    manager: key,
                    attempted,
                });
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Sync worker of '{}' panicked: {}", key, message);
                let _ = ui.send(SyncMessage::Event {
                    manager: key.clone(),
                    event: SyncEvent::new(SyncStatus::Aborted, format!("Crashed: {}", message)),
                });
                let _ = ui.send(SyncMessage::ManagerDone {
                    manager: key.clone(),
                    attempted: true,
                });
                first_panic.get_or_insert(SyncError::WorkerPanicked {
                    manager: key,
                    message,
                });
            }
        }
    }

    let _ = ui.send(SyncMessage::AllDone);
    match first_panic {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// MARK: --- UNIT TESTS ---
