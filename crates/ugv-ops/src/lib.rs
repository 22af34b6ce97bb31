//! Operational helpers: logging setup and the shared source status board.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use tracing_subscriber::{fmt, EnvFilter};
use ugv_types::{
    camera::{CameraId, SourceStatus},
    config::OpsConfig,
    ConsoleError, Result,
};

pub fn init_tracing(config: &OpsConfig) -> Result<()> {
    let filter = EnvFilter::try_new(config.log_level.clone())
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|err| ConsoleError::Ops(format!("failed to create log filter: {err}")))?;

    // Logs go to stderr; stdout belongs to the TUI's alternate screen.
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| ConsoleError::Ops(format!("tracing init error: {err}")))?;
    Ok(())
}

/// Per-camera source health, shared between the scheduler side (writer) and
/// the UI thread (reader). Every slot starts out `Waiting`.
#[derive(Clone)]
pub struct StatusBoard {
    slots: Arc<Mutex<HashMap<CameraId, SourceStatus>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        let slots = CameraId::ALL
            .iter()
            .map(|camera| (*camera, SourceStatus::Waiting))
            .collect();
        Self {
            slots: Arc::new(Mutex::new(slots)),
        }
    }

    pub fn set(&self, camera: CameraId, status: SourceStatus) {
        if let Ok(mut slots) = self.slots.lock() {
            slots.insert(camera, status);
        }
    }

    pub fn get(&self, camera: CameraId) -> SourceStatus {
        self.slots
            .lock()
            .ok()
            .and_then(|slots| slots.get(&camera).copied())
            .unwrap_or(SourceStatus::Waiting)
    }

    pub fn snapshot(&self) -> Vec<(CameraId, SourceStatus)> {
        CameraId::ALL
            .iter()
            .map(|camera| (*camera, self.get(*camera)))
            .collect()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}
