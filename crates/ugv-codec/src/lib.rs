//! Length-prefixed wire codec for remote camera frames.
//!
//! Each message on the wire is a 4-byte big-endian length followed by exactly
//! that many bytes of a serialized [`VideoFrame`]. The decoder is incremental:
//! feed it an accumulation buffer across reads and it yields a frame only once
//! the full prefixed length has arrived. Payload bytes are never interpreted
//! as a frame boundary.

use bytes::{Buf, Bytes, BytesMut};
use ugv_types::{frame::VideoFrame, ConsoleError, Result};

/// Size of the length prefix on every wire message.
pub const LEN_PREFIX: usize = 4;

/// Upper bound on a declared payload length. A prefix above this is treated
/// as a decode failure so a desynchronized or hostile peer cannot make the
/// accumulation buffer grow without bound.
pub const MAX_FRAME_PAYLOAD: usize = 64 * 1024 * 1024;

/// Prefix an opaque payload with its 4-byte big-endian length.
pub fn encode_payload(payload: &[u8]) -> Bytes {
    let mut out = BytesMut::with_capacity(LEN_PREFIX + payload.len());
    out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    out.extend_from_slice(payload);
    out.freeze()
}

/// Serialize a frame and wrap it in the wire framing.
pub fn encode_frame(frame: &VideoFrame) -> Result<Bytes> {
    let payload = bincode::serde::encode_to_vec(frame, bincode::config::standard())
        .map_err(|err| codec_error(format!("frame serialization failed: {err}")))?;
    Ok(encode_payload(&payload))
}

/// Split the next complete payload off the accumulation buffer.
///
/// Returns `Ok(None)` without consuming anything while fewer than
/// `4 + declared_len` bytes are buffered. An oversize declared length is an
/// error; the caller's buffer should be reset to resynchronize.
pub fn try_split_payload(buf: &mut BytesMut) -> Result<Option<Bytes>> {
    if buf.len() < LEN_PREFIX {
        return Ok(None);
    }
    let mut prefix = [0u8; LEN_PREFIX];
    prefix.copy_from_slice(&buf[..LEN_PREFIX]);
    let declared = u32::from_be_bytes(prefix) as usize;
    if declared > MAX_FRAME_PAYLOAD {
        return Err(codec_error(format!(
            "declared payload length {declared} exceeds cap {MAX_FRAME_PAYLOAD}"
        )));
    }
    if buf.len() < LEN_PREFIX + declared {
        return Ok(None);
    }
    buf.advance(LEN_PREFIX);
    Ok(Some(buf.split_to(declared).freeze()))
}

/// Decode the next complete frame off the accumulation buffer.
///
/// On a malformed payload the message has already been consumed when the
/// error is returned; the caller should clear its buffer and resume fresh on
/// the next poll rather than treat the stream as lost.
pub fn try_decode(buf: &mut BytesMut) -> Result<Option<VideoFrame>> {
    let Some(payload) = try_split_payload(buf)? else {
        return Ok(None);
    };
    let (frame, _) =
        bincode::serde::decode_from_slice::<VideoFrame, _>(&payload, bincode::config::standard())
            .map_err(|err| codec_error(format!("malformed frame payload: {err}")))?;
    Ok(Some(frame))
}

pub fn codec_error(message: impl Into<String>) -> ConsoleError {
    ConsoleError::Codec(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame(width: u32, height: u32) -> VideoFrame {
        let data = vec![0x3c; width as usize * height as usize * 3];
        VideoFrame::rgb8(width, height, data).expect("build frame")
    }

    #[test]
    fn round_trip_preserves_trailing_bytes() {
        let frame = test_frame(4, 2);
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encode_frame(&frame).expect("encode"));
        buf.extend_from_slice(b"trailing");

        let decoded = try_decode(&mut buf).expect("decode").expect("frame ready");
        assert_eq!(decoded.width, 4);
        assert_eq!(decoded.height, 2);
        assert_eq!(decoded.data, frame.data);
        assert_eq!(&buf[..], b"trailing");
    }

    #[test]
    fn payload_round_trip_is_exact() {
        for len in [0usize, 1, 4096] {
            let payload = vec![0xa5u8; len];
            let mut buf = BytesMut::from(&encode_payload(&payload)[..]);
            let split = try_split_payload(&mut buf)
                .expect("split")
                .expect("payload ready");
            assert_eq!(&split[..], &payload[..]);
            assert!(buf.is_empty());
        }
    }

    #[test]
    fn short_buffer_is_left_untouched() {
        let mut buf = BytesMut::from(&[0x00u8, 0x00][..]);
        assert!(try_decode(&mut buf).expect("decode").is_none());
        assert_eq!(&buf[..], &[0x00, 0x00]);
    }

    #[test]
    fn incomplete_payload_is_left_untouched() {
        let encoded = encode_payload(&[1, 2, 3, 4, 5]);
        let mut buf = BytesMut::from(&encoded[..encoded.len() - 2]);
        let before = buf.clone();
        assert!(try_split_payload(&mut buf).expect("split").is_none());
        assert_eq!(buf, before);
    }

    #[test]
    fn malformed_payload_consumes_the_message() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encode_payload(b"not a frame"));
        buf.extend_from_slice(b"rest");

        assert!(try_decode(&mut buf).is_err());
        // The bad message is gone; only the unrelated remainder is left.
        assert_eq!(&buf[..], b"rest");
    }

    #[test]
    fn oversize_declared_length_is_rejected() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&u32::MAX.to_be_bytes());
        buf.extend_from_slice(&[0u8; 16]);
        assert!(try_split_payload(&mut buf).is_err());
    }

    #[test]
    fn two_messages_decode_in_order() {
        let first = test_frame(2, 2);
        let second = test_frame(1, 1);
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encode_frame(&first).expect("encode first"));
        buf.extend_from_slice(&encode_frame(&second).expect("encode second"));

        let a = try_decode(&mut buf).expect("decode").expect("first frame");
        let b = try_decode(&mut buf).expect("decode").expect("second frame");
        assert_eq!((a.width, a.height), (2, 2));
        assert_eq!((b.width, b.height), (1, 1));
        assert!(buf.is_empty());
    }
}
