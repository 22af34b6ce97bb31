use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ConsoleError, Result};

/// Bytes per pixel for the console's working format (3-channel 8-bit color).
pub const BYTES_PER_PIXEL: usize = 3;

/// One decoded still image from a camera source.
///
/// Row-major RGB byte payload. Frames are transient: produced by a source,
/// consumed once by the scheduler, then dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub captured_at: DateTime<Utc>,
}

impl VideoFrame {
    /// Wrap a raw RGB buffer, checking it matches the stated dimensions.
    pub fn rgb8(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(ConsoleError::Codec(format!(
                "frame buffer is {} bytes, expected {} for {}x{}",
                data.len(),
                expected,
                width,
                height
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            captured_at: Utc::now(),
        })
    }

    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            data: Vec::new(),
            captured_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rgb8_checks_buffer_length() {
        assert!(VideoFrame::rgb8(2, 2, vec![0; 12]).is_ok());
        assert!(VideoFrame::rgb8(2, 2, vec![0; 11]).is_err());
    }
}
