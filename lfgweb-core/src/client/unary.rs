//! # Unary Calls
//!
//! One request, one buffered response body, exactly one message frame optionally followed by a
//! trailer frame.
//!
//! The body is buffered whole before it is decoded, but never past one message and its trailer:
//! a first frame declaring more than `max_message_size` bytes stops the read right after its
//! header arrives.
use super::{CallContext, CallError, Deadline, GrpcWebClient, UnaryOutcome, race};
use crate::{
    BoxError,
    grpc_web::{
        frame::{self, Frame, FrameError, FrameHeader, HEADER_LEN},
        trailer::{GrpcStatus, Trailers, status_from_headers},
    },
    transport::TransportError,
};
use bytes::{BufMut, Bytes, BytesMut};
use http_body::Body as HttpBody;
use http_body_util::{BodyExt, Limited};
use tonic::client::GrpcService;

/// Room left after the message for its trailer frame.
const TRAILER_ALLOWANCE: usize = 16 * 1024;

impl<S> GrpcWebClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Performs a unary call (Single Request -> Single Response).
    ///
    /// `request` is the serialized request message; it is framed here.
    ///
    /// # Returns
    ///
    /// * `Ok(UnaryOutcome::Message(bytes))` - The serialized response message.
    /// * `Ok(UnaryOutcome::Canceled)` - The call's token or the client shutdown fired first.
    /// * `Err(CallError)` - Transport failure, non-OK status, or malformed response.
    pub async fn unary(
        &mut self,
        ctx: CallContext,
        request: impl Into<Bytes>,
    ) -> Result<UnaryOutcome, CallError> {
        let scope = self.scope(&ctx);
        let timeout = ctx.timeout.or(self.config.timeout());
        let deadline = timeout.map(Deadline::after);
        let max_message_size = self.config.max_message_size;

        tracing::debug!(method = %ctx.method, "starting unary call");

        let call = async {
            let response = self.open(&ctx, request.into(), timeout).await?;
            let header_status = status_from_headers(response.headers());
            let body = read_body(response.into_body(), max_message_size).await?;
            decode_unary(&body, header_status.as_ref(), max_message_size)
        };

        match race(&scope, deadline, call).await? {
            Some(message) => Ok(UnaryOutcome::Message(message)),
            None => {
                tracing::debug!(method = %ctx.method, "unary call canceled");
                Ok(UnaryOutcome::Canceled)
            }
        }
    }
}

/// Buffers a unary response body.
///
/// The whole body may not exceed one maximum-sized message plus a trailer; going over fails
/// with [`TransportError::Body`].
async fn read_body<B>(body: B, max_message_size: usize) -> Result<Bytes, CallError>
where
    B: HttpBody,
    B::Error: Into<BoxError>,
{
    let limit = max_message_size.saturating_add(2 * HEADER_LEN + TRAILER_ALLOWANCE);
    let mut body = Box::pin(Limited::new(body, limit));
    let mut buffer = BytesMut::new();
    let mut header_checked = false;

    while let Some(frame) = body.frame().await {
        let frame = frame.map_err(TransportError::Body)?;
        if let Ok(data) = frame.into_data() {
            buffer.put(data);
        }

        if !header_checked && buffer.len() >= HEADER_LEN {
            let length = FrameHeader::parse(&buffer)?.payload_len();
            if length > max_message_size {
                return Err(FrameError::OversizedMessage {
                    length,
                    max: max_message_size,
                }
                .into());
            }
            header_checked = true;
        }
    }

    Ok(buffer.freeze())
}

/// Extracts the single message of a buffered unary response body.
fn decode_unary(
    body: &Bytes,
    header_status: Option<&GrpcStatus>,
    max_message_size: usize,
) -> Result<Bytes, CallError> {
    let (first, mut offset) = frame::decode_one(body, 0)?;

    if first.is_trailer {
        // Error replies usually carry no message at all.
        Trailers::parse(&first.payload)?.status.into_result()?;
        return Err(FrameError::MissingMessage.into());
    }

    let message = checked_payload(first, max_message_size)?;

    if offset == body.len() {
        tracing::debug!("unary response carried no trailer frame");
        return Ok(message);
    }

    let (next, used) = frame::decode_one(body, offset)?;
    if !next.is_trailer {
        return Err(FrameError::UnexpectedMessage.into());
    }
    offset += used;

    let trailers = Trailers::parse(&next.payload)?;
    if header_status.is_some_and(GrpcStatus::is_ok) && !trailers.status.is_ok() {
        tracing::warn!(
            code = ?trailers.status.code,
            "response headers reported OK but the trailer did not, trusting the trailer"
        );
    }
    trailers.status.into_result()?;

    if offset < body.len() {
        tracing::warn!(ignored = body.len() - offset, "ignoring bytes after trailer frame");
    }

    Ok(message)
}

/// Validates a message frame against what this client can accept.
pub(super) fn checked_payload(frame: Frame, max_message_size: usize) -> Result<Bytes, FrameError> {
    if frame.compressed {
        return Err(FrameError::CompressionUnsupported);
    }

    let length = frame.payload.len();
    if length > max_message_size {
        return Err(FrameError::OversizedMessage {
            length,
            max: max_message_size,
        });
    }

    Ok(frame.payload)
}
