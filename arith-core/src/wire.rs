//! Framing: length-prefix (4 bytes LE) + JSON payload.

use serde::de::DeserializeOwned;
use serde::Serialize;

pub const LEN_SIZE: usize = 4;
pub const MAX_FRAME_LEN: u32 = 1024 * 1024; // 1 MiB

/// Encode a value into a single frame: 4 bytes LE length + JSON payload.
pub fn encode_frame<T: Serialize>(msg: &T) -> Result<Vec<u8>, FrameEncodeError> {
    let payload = serde_json::to_vec(msg).map_err(FrameEncodeError::Encode)?;
    if payload.len() > MAX_FRAME_LEN as usize {
        return Err(FrameEncodeError::TooLarge);
    }
    let len = payload.len() as u32;
    let mut out = Vec::with_capacity(LEN_SIZE + payload.len());
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&payload);
    Ok(out)
}

/// Error encoding a value into a frame (serialization or size limit).
#[derive(Debug, thiserror::Error)]
pub enum FrameEncodeError {
    #[error("encode error: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("frame too large")]
    TooLarge,
}

/// Payload length announced by a frame header. Fails if it exceeds the cap.
pub fn frame_len(header: [u8; LEN_SIZE]) -> Result<usize, FrameDecodeError> {
    let len = u32::from_le_bytes(header);
    if len > MAX_FRAME_LEN {
        return Err(FrameDecodeError::TooLarge);
    }
    Ok(len as usize)
}

/// Decode one frame from the front of `bytes`. Returns the value and the number of bytes consumed.
/// Call with partial buffer; returns error if not enough bytes (caller should try again after more data).
pub fn decode_frame<T: DeserializeOwned>(bytes: &[u8]) -> Result<(T, usize), FrameDecodeError> {
    if bytes.len() < LEN_SIZE {
        return Err(FrameDecodeError::NeedMore);
    }
    let len = frame_len([bytes[0], bytes[1], bytes[2], bytes[3]])?;
    if bytes.len() < LEN_SIZE + len {
        return Err(FrameDecodeError::NeedMore);
    }
    let msg = decode_payload(&bytes[LEN_SIZE..LEN_SIZE + len])?;
    Ok((msg, LEN_SIZE + len))
}

/// Decode a frame body whose header has already been consumed.
pub fn decode_payload<T: DeserializeOwned>(payload: &[u8]) -> Result<T, FrameDecodeError> {
    serde_json::from_slice(payload).map_err(FrameDecodeError::Decode)
}

/// Error decoding a frame (need more bytes, too large, or bad JSON).
#[derive(Debug, thiserror::Error)]
pub enum FrameDecodeError {
    #[error("need more bytes")]
    NeedMore,
    #[error("frame too large")]
    TooLarge,
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}
