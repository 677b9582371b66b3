//! # gRPC-Web Client
//!
//! [`GrpcWebClient`] executes calls on raw message bytes. It owns a [`Transport`] (and through it
//! the HTTP connection pool) plus the shutdown side of every call's [`CancelScope`].
//!
//! ## Error Handling
//!
//! Failures come back as a [`CallError`] that tells apart transport problems, authentication
//! failures, application statuses and framing violations. Cancellation is not an error: it shows
//! up as [`UnaryOutcome::Canceled`] or [`StreamOutcome::Canceled`]. No call is ever retried here.
//!
//! ## Example
//!
//! ```rust,no_run
//! use lfgweb_core::{CallContext, ClientConfig, GrpcWebClient, UnaryOutcome};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("http://localhost:8080").with_auth_token("api-key");
//! let mut client = GrpcWebClient::http1(config)?;
//!
//! let ctx = CallContext::new("/lfg.Lfg/ListGroups");
//! match client.unary(ctx, Vec::new()).await? {
//!     UnaryOutcome::Message(bytes) => println!("{} bytes", bytes.len()),
//!     UnaryOutcome::Canceled => println!("canceled"),
//! }
//! # Ok(())
//! # }
//! ```
mod streaming;
mod types;
mod unary;

pub use streaming::ServerStream;
pub use types::*;

use crate::{
    BoxError,
    cancel::{CancelScope, CancelToken, ShutdownGuard},
    config::{ClientConfig, ConfigError},
    grpc_web::{
        frame::{self, FrameError},
        reader::ReadError,
        trailer::status_from_headers,
    },
    transport::{self, Http1Client, OutgoingCall, Transport, TransportError},
};
use bytes::Bytes;
use http_body::Body as HttpBody;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tonic::{
    Code,
    client::GrpcService,
    transport::{Channel, Endpoint},
};

/// Errors that can occur when connecting to a server.
#[derive(Debug, thiserror::Error)]
pub enum ClientConnectError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
}

/// The failure of a single call. Every variant is terminal for that call.
#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("Unauthenticated: '{message}'")]
    Unauthenticated { message: String },
    #[error("Server returned status {code:?}: '{message}'")]
    Rpc { code: Code, message: String },
    #[error("Malformed response: {0}")]
    Malformed(#[from] FrameError),
}

impl CallError {
    /// The closest gRPC status code for this error.
    pub fn code(&self) -> Code {
        match self {
            CallError::Transport(TransportError::Timeout(_)) => Code::DeadlineExceeded,
            CallError::Transport(_) => Code::Unavailable,
            CallError::Unauthenticated { .. } => Code::Unauthenticated,
            CallError::Rpc { code, .. } => *code,
            CallError::Malformed(_) => Code::Internal,
        }
    }
}

impl From<ReadError> for CallError {
    fn from(err: ReadError) -> Self {
        match err {
            ReadError::Malformed(err) => CallError::Malformed(err),
            ReadError::Body(err) => CallError::Transport(TransportError::Body(err)),
        }
    }
}

/// A gRPC-Web client working on serialized message bytes.
///
/// Clones share the HTTP connection pool and the shutdown signal. Dropping the last clone (or
/// calling [`GrpcWebClient::shutdown`]) cancels every call and stream it started.
#[derive(Debug, Clone)]
pub struct GrpcWebClient<S = Channel> {
    transport: Transport<S>,
    config: ClientConfig,
    shutdown: Arc<ShutdownGuard>,
}

impl GrpcWebClient<Channel> {
    /// Connects over HTTP/2 using a `tonic` channel.
    ///
    /// # Returns
    ///
    /// * `Ok(GrpcWebClient)` - The connected client.
    /// * `Err(ClientConnectError)` - If the URL is invalid or connection fails.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientConnectError> {
        let url = config.url.clone();
        let endpoint =
            Endpoint::new(url.clone()).map_err(|e| ClientConnectError::InvalidUrl(url.clone(), e))?;

        let channel = endpoint
            .connect()
            .await
            .map_err(|e| ClientConnectError::ConnectionFailed(url, e))?;

        Ok(Self::from_service(channel, config)?)
    }
}

impl GrpcWebClient<Http1Client> {
    /// Builds a client speaking HTTP/1.1. Connections are opened on the first call.
    pub fn http1(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::from_service(transport::http1_client(), config)
    }
}

impl<S> GrpcWebClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Creates a client from an existing HTTP service.
    pub fn from_service(service: S, config: ClientConfig) -> Result<Self, ConfigError> {
        let base = config.base_uri()?;
        Ok(Self {
            transport: Transport::new(service, base),
            config,
            shutdown: Arc::new(ShutdownGuard::new()),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Cancels every in-flight call and live stream started by this client or its clones.
    pub fn shutdown(&self) {
        tracing::debug!("shutting down gRPC-Web client");
        self.shutdown.handle().cancel();
    }

    /// A token that fires when the client shuts down.
    pub fn shutdown_token(&self) -> CancelToken {
        self.shutdown.handle().token()
    }

    fn scope(&self, ctx: &CallContext) -> CancelScope {
        CancelScope::new(ctx.cancel.clone(), self.shutdown_token())
    }

    /// Sends the request and validates the response head.
    ///
    /// A non-OK `grpc-status` header fails the call before anything else, then non-2xx HTTP
    /// statuses are rejected.
    async fn open(
        &mut self,
        ctx: &CallContext,
        request: Bytes,
        timeout: Option<Duration>,
    ) -> Result<http::Response<S::ResponseBody>, CallError> {
        if request.len() > u32::MAX as usize {
            return Err(FrameError::OversizedMessage {
                length: request.len(),
                max: u32::MAX as usize,
            }
            .into());
        }

        let auth_token = ctx
            .auth_token
            .as_deref()
            .or(self.config.auth_token.as_deref());

        let http_request = self.transport.build_request(OutgoingCall {
            method: &ctx.method,
            frame: frame::encode(&request),
            auth_token,
            timeout,
            metadata: &ctx.metadata,
        })?;

        let response = self.transport.send(http_request).await?;

        if let Some(status) = status_from_headers(response.headers()) {
            if !status.is_ok() {
                tracing::debug!(method = %ctx.method, code = ?status.code, "call rejected via headers");
                status.into_result()?;
            }
        }

        transport::ensure_success(&response)?;
        Ok(response)
    }
}

/// Absolute deadline of a call, with the timeout it was derived from for error reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Deadline {
    at: Instant,
    timeout: Duration,
}

impl Deadline {
    pub(crate) fn after(timeout: Duration) -> Self {
        Self {
            at: Instant::now() + timeout,
            timeout,
        }
    }
}

/// Races `fut` against the cancel scope and the deadline.
///
/// * `Ok(Some(value))` - `fut` finished first.
/// * `Ok(None)` - The scope was canceled first; `fut` is dropped without being polled again.
/// * `Err(Transport(Timeout))` - The deadline expired first.
pub(crate) async fn race<F, T>(
    scope: &CancelScope,
    deadline: Option<Deadline>,
    fut: F,
) -> Result<Option<T>, CallError>
where
    F: Future<Output = Result<T, CallError>>,
{
    let bounded = async {
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline.at, fut)
                .await
                .map_err(|_| TransportError::Timeout(deadline.timeout))?,
            None => fut.await,
        }
    };

    tokio::select! {
        biased;
        _ = scope.cancelled() => Ok(None),
        result = bounded => result.map(Some),
    }
}
