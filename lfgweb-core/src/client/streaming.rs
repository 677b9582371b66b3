//! # Server-Streaming Calls
//!
//! The response body is consumed frame by frame as bytes arrive. Memory use stays bounded by one
//! frame plus whatever part of the last transport chunk belongs to later frames. Each
//! [`ServerStream::next`] races the pending read against the cancel scope and the deadline, and
//! no chunk is pulled once the frame being returned is complete.
use super::{
    CallContext, CallError, Deadline, GrpcWebClient, StreamOutcome, race, unary::checked_payload,
};
use crate::{
    BoxError,
    cancel::CancelScope,
    grpc_web::{
        frame::Frame,
        reader::FrameReader,
        trailer::{Trailers, status_from_headers},
    },
};
use bytes::Bytes;
use futures_util::Stream;
use http_body::Body as HttpBody;
use tonic::client::GrpcService;

impl<S> GrpcWebClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Performs a Server Streaming call (Single Request -> Stream of Responses).
    ///
    /// Resolves once the response head has been validated. Messages are then pulled with
    /// [`ServerStream::next`]. Unlike unary calls, streams get no deadline from the client
    /// configuration; only an explicit [`CallContext::timeout`] bounds them.
    ///
    /// # Returns
    ///
    /// * `Ok(ServerStream)` - The live stream. It is already in the canceled state if the scope
    ///   fired before the response head arrived.
    /// * `Err(CallError)` - The call failed before any message could be read.
    pub async fn server_streaming(
        &mut self,
        ctx: CallContext,
        request: impl Into<Bytes>,
    ) -> Result<ServerStream<S::ResponseBody>, CallError> {
        let scope = self.scope(&ctx);
        let deadline = ctx.timeout.map(Deadline::after);
        let max_message_size = self.config.max_message_size;

        tracing::debug!(method = %ctx.method, "starting server-streaming call");

        let opened = race(
            &scope,
            deadline,
            self.open(&ctx, request.into(), ctx.timeout),
        )
        .await?;

        let Some(response) = opened else {
            tracing::debug!(method = %ctx.method, "stream canceled before the response head");
            return Ok(ServerStream {
                state: State::Canceled,
                scope,
                deadline,
                method: ctx.method,
                headers_ok: false,
            });
        };

        let headers_ok = status_from_headers(response.headers()).is_some();
        let reader = FrameReader::new(response.into_body(), max_message_size);

        Ok(ServerStream {
            state: State::Open(reader),
            scope,
            deadline,
            method: ctx.method,
            headers_ok,
        })
    }
}

enum State<B> {
    Open(FrameReader<B>),
    /// Ended by a trailer, a clean end of body, or an error.
    Finished,
    Canceled,
}

/// A live server-streaming response. Finite and not restartable.
pub struct ServerStream<B> {
    state: State<B>,
    scope: CancelScope,
    deadline: Option<Deadline>,
    method: String,
    /// The response head carried an OK `grpc-status`.
    headers_ok: bool,
}

impl<B> ServerStream<B>
where
    B: HttpBody<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    /// Pulls the next message.
    ///
    /// # Returns
    ///
    /// * `Ok(StreamOutcome::Message(bytes))` - The next message, in wire order.
    /// * `Ok(StreamOutcome::End)` - An OK trailer arrived, or the body ended on a frame boundary.
    /// * `Ok(StreamOutcome::Canceled)` - The scope fired; the response body has been released.
    /// * `Err(CallError)` - The stream failed; it is finished afterwards.
    ///
    /// Once a terminal outcome has been returned, no more reads happen: later calls return
    /// `Canceled` for a canceled stream and `End` otherwise.
    pub async fn next(&mut self) -> Result<StreamOutcome, CallError> {
        let reader = match &mut self.state {
            State::Open(reader) => reader,
            State::Finished => return Ok(StreamOutcome::End),
            State::Canceled => return Ok(StreamOutcome::Canceled),
        };

        let read = race(&self.scope, self.deadline, async {
            reader.next_frame().await.map_err(CallError::from)
        })
        .await;

        match read {
            Ok(Some(Some(frame))) => self.on_frame(frame),
            Ok(Some(None)) => {
                tracing::debug!(method = %self.method, "stream body ended without a trailer frame");
                self.state = State::Finished;
                Ok(StreamOutcome::End)
            }
            Ok(None) => {
                tracing::debug!(method = %self.method, "stream canceled");
                self.state = State::Canceled;
                Ok(StreamOutcome::Canceled)
            }
            Err(err) => {
                self.state = State::Finished;
                Err(err)
            }
        }
    }

    /// Adapts the stream into a `futures` stream of messages.
    ///
    /// The adapted stream ends after `End` or `Canceled`, and after yielding an error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Bytes, CallError>> {
        futures_util::stream::unfold(self, |mut stream| async move {
            match stream.next().await {
                Ok(StreamOutcome::Message(message)) => Some((Ok(message), stream)),
                Ok(StreamOutcome::End | StreamOutcome::Canceled) => None,
                Err(err) => Some((Err(err), stream)),
            }
        })
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self.state, State::Canceled)
    }

    pub fn method(&self) -> &str {
        &self.method
    }

    fn on_frame(&mut self, frame: Frame) -> Result<StreamOutcome, CallError> {
        if !frame.is_trailer {
            return match checked_payload(frame, usize::MAX) {
                Ok(message) => Ok(StreamOutcome::Message(message)),
                Err(err) => {
                    self.state = State::Finished;
                    Err(err.into())
                }
            };
        }

        self.state = State::Finished;

        let trailers = Trailers::parse(&frame.payload)?;
        if self.headers_ok && !trailers.status.is_ok() {
            tracing::warn!(
                method = %self.method,
                code = ?trailers.status.code,
                "response headers reported OK but the trailer did not, trusting the trailer"
            );
        }
        trailers.status.into_result()?;

        tracing::debug!(method = %self.method, "stream completed");
        Ok(StreamOutcome::End)
    }
}
