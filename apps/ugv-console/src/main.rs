use std::{env, sync::mpsc, time::Duration};

use anyhow::Result;
use clap::Parser;
use tracing::warn;
use ugv_ops::StatusBoard;
use ugv_scheduler::{ConsolePresenter, RefreshScheduler};
use ugv_sources::{FrameSource, LocalFrameSource, RemoteFrameSource};
use ugv_telemetry::TelemetryIngestServer;
use ugv_types::{
    camera::{CameraId, SourceStatus},
    config::{
        CaptureConfig, ConsoleConfig, OpsConfig, SchedulerConfig, StreamConfig, TelemetryConfig,
    },
    events::{
        ConsoleEvent, EventKind, EventPayload, FrameEvent, LifecycleEvent, LifecyclePhase,
        OrientationEvent, StatusEvent,
    },
    frame::VideoFrame,
    telemetry::TimestampedSample,
};

mod ui;

#[derive(Parser, Debug)]
#[command(name = "ugv-console", about = "Operator console for the UGV")]
struct Args {
    /// Path to the TOML config file.
    #[arg(short, long)]
    config: Option<String>,
}

/// Forwards scheduler callbacks to the UI thread and the status board.
struct ChannelPresenter {
    tx: mpsc::Sender<ConsoleEvent>,
    board: StatusBoard,
}

impl ConsolePresenter for ChannelPresenter {
    fn frame_ready(&mut self, camera: CameraId, frame: VideoFrame) {
        let event = ConsoleEvent::new(
            EventKind::Frame,
            EventPayload::Frame(FrameEvent { camera, frame }),
        );
        let _ = self.tx.send(event);
    }

    fn orientation(&mut self, sample: TimestampedSample) {
        let event = ConsoleEvent::new(
            EventKind::Orientation,
            EventPayload::Orientation(OrientationEvent { sample }),
        );
        let _ = self.tx.send(event);
    }

    fn source_status(&mut self, camera: CameraId, status: SourceStatus) {
        self.board.set(camera, status);
        let event = ConsoleEvent::new(
            EventKind::Status,
            EventPayload::Status(StatusEvent { camera, status }),
        );
        let _ = self.tx.send(event);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args);
    ugv_ops::init_tracing(&config.ops)?;

    let board = StatusBoard::new();
    let (ui_tx, ui_rx) = mpsc::channel();

    let local = LocalFrameSource::open(CameraId::Driver, &config.capture);
    let turret = RemoteFrameSource::connect(CameraId::Turret, &config.streams.turret_addr).await;
    let rear = RemoteFrameSource::connect(CameraId::Rear, &config.streams.rear_addr).await;
    let sources: Vec<Box<dyn FrameSource>> =
        vec![Box::new(local), Box::new(turret), Box::new(rear)];

    let (telemetry, telemetry_rx) = TelemetryIngestServer::bind(&config.telemetry).await?;
    let telemetry_task = tokio::spawn(async move {
        if let Err(err) = telemetry.run().await {
            warn!(%err, "telemetry ingest server stopped");
        }
    });

    let presenter = ChannelPresenter {
        tx: ui_tx.clone(),
        board: board.clone(),
    };
    let mut scheduler = RefreshScheduler::new(
        sources,
        telemetry_rx,
        presenter,
        Duration::from_millis(config.scheduler.poll_interval_ms),
    );
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let scheduler_task = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

    let _ = ui_tx.send(ConsoleEvent::new(
        EventKind::Lifecycle,
        EventPayload::Lifecycle(LifecycleEvent {
            phase: LifecyclePhase::Boot,
            details: Some(format!(
                "telemetry on port {}, polling every {} ms",
                config.telemetry.port, config.scheduler.poll_interval_ms
            )),
        }),
    ));
    drop(ui_tx);

    let summary = config_summary(&config);
    let ui_board = board.clone();
    let ui_result = tokio::task::spawn_blocking(move || ui::run(ui_rx, ui_board, summary)).await?;

    // Operator quit: stop the refresh loop, then cut the ingest server off.
    // In-flight telemetry needs no draining on the way out.
    let _ = shutdown_tx.send(true);
    let _ = scheduler_task.await;
    telemetry_task.abort();

    ui_result
}

fn load_config(args: &Args) -> ConsoleConfig {
    let from_env = env::var("UGV_CONSOLE_CONFIG").ok();
    let path = args
        .config
        .clone()
        .or(from_env)
        .unwrap_or_else(|| "configs/dev.toml".into());
    match ConsoleConfig::from_file(&path) {
        Ok(cfg) => {
            if let Err(err) = cfg.validate() {
                eprintln!(
                    "Invalid config in '{}': {err}. Falling back to internal defaults.",
                    path
                );
                default_config()
            } else {
                cfg
            }
        }
        Err(err) => {
            eprintln!(
                "Failed to load config from '{}': {err}. Falling back to internal defaults.",
                path
            );
            default_config()
        }
    }
}

fn default_config() -> ConsoleConfig {
    let config = ConsoleConfig {
        capture: CaptureConfig {
            grab_command: None,
            device_index: 0,
        },
        streams: StreamConfig {
            turret_addr: "192.168.148.186:9999".into(),
            rear_addr: "192.168.148.12:9999".into(),
        },
        telemetry: TelemetryConfig {
            bind_addr: "0.0.0.0".into(),
            port: 9001,
        },
        scheduler: SchedulerConfig {
            poll_interval_ms: 30,
        },
        ops: OpsConfig {
            log_level: "info".into(),
        },
    };
    debug_assert!(config.validate().is_ok());
    config
}

fn config_summary(config: &ConsoleConfig) -> String {
    format!(
        "turret {} | rear {} | telemetry :{} | tick {} ms",
        config.streams.turret_addr,
        config.streams.rear_addr,
        config.telemetry.port,
        config.scheduler.poll_interval_ms
    )
}
