use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{ConsoleError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptureConfig {
    /// External grab command producing one PNG frame on stdout. The device
    /// index is appended as the final argument. Absent means no local camera.
    pub grab_command: Option<String>,
    pub device_index: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// `host:port` of the turret camera server.
    pub turret_addr: String,
    /// `host:port` of the rear camera server.
    pub rear_addr: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub bind_addr: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    pub capture: CaptureConfig,
    pub streams: StreamConfig,
    pub telemetry: TelemetryConfig,
    pub scheduler: SchedulerConfig,
    pub ops: OpsConfig,
}

impl ConsoleConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref).map_err(|err| {
            ConsoleError::Configuration(format!(
                "unable to read config file {}: {err}",
                path_ref.display()
            ))
        })?;
        toml::from_str(&contents).map_err(|err| {
            ConsoleError::Configuration(format!(
                "failed to parse config file {}: {err}",
                path_ref.display()
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.scheduler.poll_interval_ms == 0 {
            return Err(ConsoleError::Configuration(
                "scheduler.poll_interval_ms must be greater than zero".into(),
            ));
        }
        if self.telemetry.port == 0 {
            return Err(ConsoleError::Configuration(
                "telemetry.port must be a valid port (>0)".into(),
            ));
        }
        for (name, addr) in [
            ("streams.turret_addr", &self.streams.turret_addr),
            ("streams.rear_addr", &self.streams.rear_addr),
        ] {
            if !addr.contains(':') {
                return Err(ConsoleError::Configuration(format!(
                    "{name} must be a host:port pair, got '{addr}'"
                )));
            }
        }
        Ok(())
    }
}
