//! Frame sources feeding the console's camera slots.
//!
//! A source is polled on the scheduler's cadence and must never block beyond
//! one bounded read. Remote sources speak the length-prefixed wire framing
//! from `ugv-codec`; the local source wraps a capture device directly.

use async_trait::async_trait;
use bytes::BytesMut;
use tokio::net::TcpStream;
use tracing::{debug, info, warn};
use ugv_types::{
    camera::{CameraId, SourceStatus},
    frame::VideoFrame,
    ConsoleError, Result,
};

pub mod capture;

pub use capture::{CaptureDevice, CommandCapture, LocalFrameSource};

/// Bytes pulled off the socket per poll. Bounds per-tick work; a frame larger
/// than this simply accumulates across polls.
const READ_CHUNK: usize = 4096;

#[async_trait]
pub trait FrameSource: Send {
    fn id(&self) -> CameraId;
    fn status(&self) -> SourceStatus;
    /// One non-blocking poll cycle. At most one frame per call; `None` means
    /// nothing decoded yet, try again next tick.
    async fn poll_frame(&mut self) -> Option<VideoFrame>;
}

struct StreamState {
    stream: TcpStream,
    buf: BytesMut,
}

/// One outbound connection to a remote camera server.
///
/// A failed connect, a read error, or a peer close permanently disables the
/// source; the slot stays blank for the rest of the process. Reconnection is
/// deliberately not attempted (fail-fast-once for a fixed-topology rig).
pub struct RemoteFrameSource {
    id: CameraId,
    state: Option<StreamState>,
    delivered_any: bool,
}

impl RemoteFrameSource {
    pub async fn connect(id: CameraId, addr: &str) -> Self {
        let state = match try_connect(addr).await {
            Ok(stream) => {
                info!(camera = %id, addr, "camera stream connected");
                Some(StreamState {
                    stream,
                    buf: BytesMut::with_capacity(READ_CHUNK),
                })
            }
            Err(err) => {
                warn!(camera = %id, addr, %err, "slot disabled");
                None
            }
        };
        Self {
            id,
            state,
            delivered_any: false,
        }
    }

    fn disable(&mut self) {
        self.state = None;
    }
}

#[async_trait]
impl FrameSource for RemoteFrameSource {
    fn id(&self) -> CameraId {
        self.id
    }

    fn status(&self) -> SourceStatus {
        match (&self.state, self.delivered_any) {
            (None, _) => SourceStatus::Disabled,
            (Some(_), false) => SourceStatus::Waiting,
            (Some(_), true) => SourceStatus::Live,
        }
    }

    async fn poll_frame(&mut self) -> Option<VideoFrame> {
        let state = self.state.as_mut()?;

        let mut chunk = [0u8; READ_CHUNK];
        match state.stream.try_read(&mut chunk) {
            Ok(0) => {
                info!(camera = %self.id, "camera peer closed; slot disabled");
                self.disable();
                return None;
            }
            Ok(n) => state.buf.extend_from_slice(&chunk[..n]),
            Err(err) if err.kind() == std::io::ErrorKind::WouldBlock => {
                // Nothing new on the wire; the buffer may still hold a
                // complete frame from an earlier read.
            }
            Err(err) => {
                let err = stream_error(format!("read failed: {err}"));
                warn!(camera = %self.id, %err, "slot disabled");
                self.disable();
                return None;
            }
        }

        match ugv_codec::try_decode(&mut state.buf) {
            Ok(Some(frame)) => {
                self.delivered_any = true;
                Some(frame)
            }
            Ok(None) => None,
            Err(err) => {
                debug!(camera = %self.id, %err, "discarding malformed frame message");
                state.buf.clear();
                None
            }
        }
    }
}

async fn try_connect(addr: &str) -> Result<TcpStream> {
    TcpStream::connect(addr)
        .await
        .map_err(|err| stream_error(format!("connect to {addr} failed: {err}")))
}

pub fn stream_error(message: impl Into<String>) -> ConsoleError {
    ConsoleError::Stream(message.into())
}
