use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    camera::{CameraId, SourceStatus},
    frame::VideoFrame,
    telemetry::TimestampedSample,
};

/// High-level event kinds moving from the scheduler to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    Lifecycle,
    Frame,
    Orientation,
    Status,
}

/// Immutable event envelope carried over the UI channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleEvent {
    pub id: Uuid,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    Lifecycle(LifecycleEvent),
    Frame(FrameEvent),
    Orientation(OrientationEvent),
    Status(StatusEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleEvent {
    pub phase: LifecyclePhase,
    pub details: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LifecyclePhase {
    Boot,
    Ready,
    Shutdown,
}

/// A freshly decoded frame for one camera slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameEvent {
    pub camera: CameraId,
    pub frame: VideoFrame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrientationEvent {
    pub sample: TimestampedSample,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEvent {
    pub camera: CameraId,
    pub status: SourceStatus,
}

impl ConsoleEvent {
    pub fn new(kind: EventKind, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: Utc::now(),
            payload,
        }
    }
}
