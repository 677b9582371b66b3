//! # Frame Codec
//!
//! Encodes a serialized message into a gRPC-Web frame and decodes frames out of a byte buffer.
//! No I/O happens here; the incremental path in [`super::reader`] reuses these functions once it
//! has assembled the bytes of a whole frame.
use bytes::{BufMut, Bytes, BytesMut};

/// Size of the `[flags:1][length:4]` prefix.
pub const HEADER_LEN: usize = 5;

/// Largest payload accepted from a server unless configured otherwise (1 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 1024 * 1024;

const TRAILER_FLAG: u8 = 0x80;
const COMPRESSED_FLAG: u8 = 0x01;

/// Framing violations. All of them are fatal for the call that hit them.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Truncated frame: needed {needed} bytes but only {available} were available")]
    Truncated { needed: usize, available: usize },
    #[error("Stream ended in the middle of a frame")]
    UnexpectedEof,
    #[error("Frame declares {length} bytes, above the {max} bytes limit")]
    OversizedMessage { length: usize, max: usize },
    #[error("Trailer frame is not valid UTF-8: '{0}'")]
    InvalidTrailerEncoding(#[source] std::str::Utf8Error),
    #[error("Received a compressed frame but no compression was negotiated")]
    CompressionUnsupported,
    #[error("Response finished successfully without a message frame")]
    MissingMessage,
    #[error("Received more than one message frame for a unary call")]
    UnexpectedMessage,
}

/// The decoded `[flags:1][length:4]` prefix of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub is_trailer: bool,
    pub compressed: bool,
    pub length: u32,
}

impl FrameHeader {
    /// Parses the first [`HEADER_LEN`] bytes of `bytes`.
    pub fn parse(bytes: &[u8]) -> Result<Self, FrameError> {
        let Some(header) = bytes.get(..HEADER_LEN) else {
            return Err(FrameError::Truncated {
                needed: HEADER_LEN,
                available: bytes.len(),
            });
        };

        let flags = header[0];
        let length = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);

        Ok(Self {
            is_trailer: flags & TRAILER_FLAG != 0,
            compressed: flags & COMPRESSED_FLAG != 0,
            length,
        })
    }

    /// Payload length as a `usize`.
    pub fn payload_len(&self) -> usize {
        self.length as usize
    }
}

/// One complete frame. A `Frame` is never partially populated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub is_trailer: bool,
    pub compressed: bool,
    pub payload: Bytes,
}

impl Frame {
    pub fn length(&self) -> u32 {
        self.payload.len() as u32
    }
}

/// Prepends the 5-byte message header to `payload`.
///
/// The caller is responsible for keeping `payload` below `u32::MAX` bytes; the client checks
/// this before encoding a request.
pub fn encode(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(HEADER_LEN + payload.len());
    buf.put_u8(0x00);
    buf.put_u32(payload.len() as u32);
    buf.extend_from_slice(payload);
    buf.freeze()
}

/// Decodes exactly one frame starting at `offset`.
///
/// Returns the frame and the number of bytes it occupied (`5 + length`). The payload shares the
/// allocation of `buffer`.
pub fn decode_one(buffer: &Bytes, offset: usize) -> Result<(Frame, usize), FrameError> {
    let remaining = buffer.get(offset..).unwrap_or_default();
    let header = FrameHeader::parse(remaining)?;

    let total = HEADER_LEN + header.payload_len();
    if remaining.len() < total {
        return Err(FrameError::Truncated {
            needed: total,
            available: remaining.len(),
        });
    }

    let start = offset + HEADER_LEN;
    let frame = Frame {
        is_trailer: header.is_trailer,
        compressed: header.compressed,
        payload: buffer.slice(start..offset + total),
    };

    Ok((frame, total))
}
