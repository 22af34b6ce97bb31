//! Local capture device wrapper.
//!
//! The driver slot is fed by an external grab command that writes one PNG
//! frame to stdout per invocation (configured in `capture.grab_command`).
//! When no command is configured or the device is unavailable, the slot
//! silently shows nothing.

use async_trait::async_trait;
use image::ImageFormat;
use tokio::process::Command;
use tracing::{debug, info};
use ugv_types::{
    camera::{CameraId, SourceStatus},
    config::CaptureConfig,
    frame::VideoFrame,
    ConsoleError, Result,
};

use crate::FrameSource;

#[async_trait]
pub trait CaptureDevice: Send {
    /// One synchronous-equivalent device read. `Ok(None)` means no frame was
    /// available this cycle.
    async fn grab(&mut self) -> Result<Option<VideoFrame>>;
}

/// Capture backend shelling out to an external grab command.
pub struct CommandCapture {
    program: String,
    device_index: u32,
}

impl CommandCapture {
    pub fn new(program: impl Into<String>, device_index: u32) -> Self {
        Self {
            program: program.into(),
            device_index,
        }
    }
}

#[async_trait]
impl CaptureDevice for CommandCapture {
    async fn grab(&mut self) -> Result<Option<VideoFrame>> {
        let output = Command::new(&self.program)
            .arg(self.device_index.to_string())
            .output()
            .await
            .map_err(|err| capture_error(format!("grab command failed to run: {err}")))?;

        if !output.status.success() {
            return Err(capture_error(format!(
                "grab command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Ok(None);
        }

        let img = image::load_from_memory_with_format(&output.stdout, ImageFormat::Png)
            .map_err(|err| capture_error(format!("grab output decode failed: {err}")))?;
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Ok(Some(VideoFrame::rgb8(width, height, rgb.into_raw())?))
    }
}

/// Frame source for the driver slot, wrapping a capture device opened once at
/// startup. Capture errors are per-poll and never disable the device.
pub struct LocalFrameSource {
    id: CameraId,
    device: Option<Box<dyn CaptureDevice>>,
    delivered_any: bool,
}

impl LocalFrameSource {
    pub fn open(id: CameraId, config: &CaptureConfig) -> Self {
        let device: Option<Box<dyn CaptureDevice>> = match &config.grab_command {
            Some(program) => {
                info!(camera = %id, program, index = config.device_index, "local capture ready");
                Some(Box::new(CommandCapture::new(
                    program.as_str(),
                    config.device_index,
                )))
            }
            None => {
                info!(camera = %id, "no grab command configured; slot stays blank");
                None
            }
        };
        Self {
            id,
            device,
            delivered_any: false,
        }
    }

    pub fn with_device(id: CameraId, device: Box<dyn CaptureDevice>) -> Self {
        Self {
            id,
            device: Some(device),
            delivered_any: false,
        }
    }
}

#[async_trait]
impl FrameSource for LocalFrameSource {
    fn id(&self) -> CameraId {
        self.id
    }

    fn status(&self) -> SourceStatus {
        match (&self.device, self.delivered_any) {
            (None, _) => SourceStatus::Disabled,
            (Some(_), false) => SourceStatus::Waiting,
            (Some(_), true) => SourceStatus::Live,
        }
    }

    async fn poll_frame(&mut self) -> Option<VideoFrame> {
        let device = self.device.as_mut()?;
        match device.grab().await {
            Ok(Some(frame)) => {
                self.delivered_any = true;
                Some(frame)
            }
            Ok(None) => None,
            Err(err) => {
                debug!(camera = %self.id, %err, "capture read failed this cycle");
                None
            }
        }
    }
}

pub fn capture_error(message: impl Into<String>) -> ConsoleError {
    ConsoleError::Capture(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubCapture {
        frames: Vec<Option<VideoFrame>>,
    }

    #[async_trait]
    impl CaptureDevice for StubCapture {
        async fn grab(&mut self) -> Result<Option<VideoFrame>> {
            if self.frames.is_empty() {
                Ok(None)
            } else {
                Ok(self.frames.remove(0))
            }
        }
    }

    fn frame(width: u32, height: u32) -> VideoFrame {
        VideoFrame::rgb8(width, height, vec![1; width as usize * height as usize * 3])
            .expect("build frame")
    }

    #[tokio::test]
    async fn unconfigured_device_stays_blank() {
        let config = CaptureConfig {
            grab_command: None,
            device_index: 0,
        };
        let mut source = LocalFrameSource::open(CameraId::Driver, &config);
        assert_eq!(source.status(), SourceStatus::Disabled);
        assert!(source.poll_frame().await.is_none());
    }

    #[tokio::test]
    async fn stub_device_yields_frames_in_order() {
        let device = StubCapture {
            frames: vec![None, Some(frame(2, 1)), Some(frame(1, 1))],
        };
        let mut source = LocalFrameSource::with_device(CameraId::Driver, Box::new(device));
        assert_eq!(source.status(), SourceStatus::Waiting);

        assert!(source.poll_frame().await.is_none());
        let first = source.poll_frame().await.expect("first frame");
        assert_eq!((first.width, first.height), (2, 1));
        assert_eq!(source.status(), SourceStatus::Live);
        let second = source.poll_frame().await.expect("second frame");
        assert_eq!((second.width, second.height), (1, 1));
        assert!(source.poll_frame().await.is_none());
    }
}
