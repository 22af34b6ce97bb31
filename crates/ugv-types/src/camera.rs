use std::fmt;

use serde::{Deserialize, Serialize};

/// Fixed console camera slots. Each slot owns one frame source: the driver
/// view is the local capture device, the other two are remote stream feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CameraId {
    Driver,
    Turret,
    Rear,
}

impl CameraId {
    pub const ALL: [CameraId; 3] = [CameraId::Driver, CameraId::Turret, CameraId::Rear];
}

impl fmt::Display for CameraId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CameraId::Driver => "driver",
            CameraId::Turret => "turret",
            CameraId::Rear => "rear",
        };
        f.write_str(name)
    }
}

/// Reported health of a camera slot's frame source.
///
/// A source that fails to connect, or whose peer goes away, stays `Disabled`
/// for the rest of the process; there is no reconnection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceStatus {
    Waiting,
    Live,
    Disabled,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceStatus::Waiting => "waiting",
            SourceStatus::Live => "live",
            SourceStatus::Disabled => "disabled",
        };
        f.write_str(name)
    }
}
