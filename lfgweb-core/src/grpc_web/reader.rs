//! # Incremental Frame Reader
//!
//! Assembles frames off a live response body as chunks arrive. The transport may split a frame
//! anywhere (down to one byte per chunk) or pack several frames in one chunk, so every read loops
//! until the exact number of bytes it needs is buffered or the body ends.
//!
//! Bytes of a chunk past the end of the returned frame stay buffered for the next read, so the
//! buffer holds at most one frame plus the tail of the chunk that completed it.
use super::frame::{self, Frame, FrameError, FrameHeader, HEADER_LEN};
use crate::BoxError;
use bytes::{BufMut, BytesMut};
use http_body::Body as HttpBody;
use http_body_util::BodyExt;
use std::pin::Pin;

/// Errors produced while pulling frames off a body.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error(transparent)]
    Malformed(#[from] FrameError),
    #[error("Failed to read response body: '{0}'")]
    Body(#[source] BoxError),
}

/// Reads one frame at a time from an `http_body::Body`.
pub struct FrameReader<B> {
    body: Pin<Box<B>>,
    buffer: BytesMut,
    max_message_size: usize,
}

impl<B> FrameReader<B>
where
    B: HttpBody,
    B::Error: Into<BoxError>,
{
    pub fn new(body: B, max_message_size: usize) -> Self {
        Self {
            body: Box::pin(body),
            buffer: BytesMut::new(),
            max_message_size,
        }
    }

    /// Reads the next complete frame.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(frame))` - A whole frame was assembled.
    /// * `Ok(None)` - The body ended cleanly on a frame boundary.
    /// * `Err(ReadError::Malformed(UnexpectedEof))` - The body ended inside a frame.
    /// * `Err(ReadError::Malformed(OversizedMessage))` - The declared length exceeds the limit.
    ///   Nothing is allocated for the payload in that case.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>, ReadError> {
        if !self.fill(HEADER_LEN).await? {
            if self.buffer.is_empty() {
                return Ok(None);
            }
            return Err(FrameError::UnexpectedEof.into());
        }

        let header = FrameHeader::parse(&self.buffer)?;
        let length = header.payload_len();
        if length > self.max_message_size {
            return Err(FrameError::OversizedMessage {
                length,
                max: self.max_message_size,
            }
            .into());
        }

        let total = HEADER_LEN + length;
        if !self.fill(total).await? {
            return Err(FrameError::UnexpectedEof.into());
        }

        let raw = self.buffer.split_to(total).freeze();
        let (frame, _) = frame::decode_one(&raw, 0)?;

        tracing::trace!(
            is_trailer = frame.is_trailer,
            length = frame.length(),
            "decoded gRPC-Web frame"
        );

        Ok(Some(frame))
    }

    /// Pulls chunks until at least `needed` bytes are buffered.
    ///
    /// Returns `false` if the body ended first.
    async fn fill(&mut self, needed: usize) -> Result<bool, ReadError> {
        if self.buffer.len() < needed {
            self.buffer.reserve(needed - self.buffer.len());
        }

        while self.buffer.len() < needed {
            let Some(frame) = self.body.frame().await else {
                return Ok(false);
            };

            let frame = frame.map_err(|e| ReadError::Body(e.into()))?;

            // HTTP trailers carry nothing for gRPC-Web; status lives in the body.
            if let Ok(data) = frame.into_data() {
                self.buffer.put(data);
            }
        }

        Ok(true)
    }
}
