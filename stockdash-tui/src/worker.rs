//! Background worker thread: pipeline runs happen here.
//!
//! Communication with the TUI main thread is via `mpsc` channels. A slow
//! provider request blocks only this thread; the UI keeps drawing.

use std::io;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use stockdash_core::{Dashboard, DashboardError, DashboardOutcome, Selection};

/// Commands sent from the TUI to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkerCommand {
    /// Run the pipeline for a selection. `id` is echoed back in the response.
    Load { id: u64, selection: Selection },
    Shutdown,
}

/// Responses sent from the worker back to the TUI.
#[derive(Debug, Clone)]
pub enum WorkerResponse {
    Loaded {
        id: u64,
        outcome: Box<DashboardOutcome>,
    },
    Failed {
        id: u64,
        selection: Selection,
        error: DashboardError,
    },
}

impl WorkerResponse {
    pub fn id(&self) -> u64 {
        match self {
            WorkerResponse::Loaded { id, .. } | WorkerResponse::Failed { id, .. } => *id,
        }
    }
}

/// Spawn the background worker thread.
pub fn spawn_worker(
    dashboard: Arc<Dashboard>,
    rx: Receiver<WorkerCommand>,
    tx: Sender<WorkerResponse>,
) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("stockdash-worker".into())
        .spawn(move || worker_loop(&dashboard, rx, tx))
}

fn worker_loop(dashboard: &Dashboard, rx: Receiver<WorkerCommand>, tx: Sender<WorkerResponse>) {
    loop {
        let mut cmd = match rx.recv() {
            Ok(cmd) => cmd,
            Err(_) => break,
        };

        // Only the newest queued selection matters; skip the ones it replaced.
        while let Ok(newer) = rx.try_recv() {
            if newer == WorkerCommand::Shutdown {
                return;
            }
            cmd = newer;
        }

        match cmd {
            WorkerCommand::Shutdown => break,
            WorkerCommand::Load { id, selection } => {
                let response = run_load(dashboard, id, selection);
                if tx.send(response).is_err() {
                    break;
                }
            }
        }
    }
    tracing::debug!("worker stopped");
}

/// Run one pipeline cycle and package the result for the UI thread.
pub fn run_load(dashboard: &Dashboard, id: u64, selection: Selection) -> WorkerResponse {
    tracing::debug!(id, company = %selection.company, range = %selection.range, "worker load");
    match dashboard.run(&selection) {
        Ok(outcome) => WorkerResponse::Loaded {
            id,
            outcome: Box::new(outcome),
        },
        Err(error) => {
            tracing::warn!(id, stage = error.stage(), %error, "dashboard run failed");
            WorkerResponse::Failed {
                id,
                selection,
                error,
            }
        }
    }
}
