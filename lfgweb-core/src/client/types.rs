use crate::cancel::CancelToken;
use bytes::Bytes;
use std::time::Duration;

/// Per-invocation state. Owned by one call and dropped with it.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// The method path (e.g., `/lfg.Lfg/CreateGroup`).
    pub method: String,
    /// Overrides the client's configured token when set.
    pub auth_token: Option<String>,
    pub cancel: CancelToken,
    /// Overrides the client's configured deadline when set.
    pub timeout: Option<Duration>,
    /// Custom metadata (headers) to attach to the request.
    pub metadata: Vec<(String, String)>,
}

impl CallContext {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            auth_token: None,
            cancel: CancelToken::never(),
            timeout: None,
            metadata: Vec::new(),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.push((key.into(), value.into()));
        self
    }
}

/// The result of a unary call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnaryOutcome<T = Bytes> {
    /// The single response message.
    Message(T),
    /// The call was canceled before a response was decoded.
    Canceled,
}

impl<T> UnaryOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> UnaryOutcome<U> {
        match self {
            UnaryOutcome::Message(message) => UnaryOutcome::Message(f(message)),
            UnaryOutcome::Canceled => UnaryOutcome::Canceled,
        }
    }

    /// Applies a fallible conversion, typically the deserializer of the response type.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<UnaryOutcome<U>, E> {
        match self {
            UnaryOutcome::Message(message) => f(message).map(UnaryOutcome::Message),
            UnaryOutcome::Canceled => Ok(UnaryOutcome::Canceled),
        }
    }

    pub fn into_message(self) -> Option<T> {
        match self {
            UnaryOutcome::Message(message) => Some(message),
            UnaryOutcome::Canceled => None,
        }
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, UnaryOutcome::Canceled)
    }
}

/// One step of a server-streaming call that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamOutcome<T = Bytes> {
    /// The next message, in wire order.
    Message(T),
    /// The server finished the stream successfully.
    End,
    /// The stream was canceled; no further reads happen.
    Canceled,
}

impl<T> StreamOutcome<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> StreamOutcome<U> {
        match self {
            StreamOutcome::Message(message) => StreamOutcome::Message(f(message)),
            StreamOutcome::End => StreamOutcome::End,
            StreamOutcome::Canceled => StreamOutcome::Canceled,
        }
    }

    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<StreamOutcome<U>, E> {
        match self {
            StreamOutcome::Message(message) => f(message).map(StreamOutcome::Message),
            StreamOutcome::End => Ok(StreamOutcome::End),
            StreamOutcome::Canceled => Ok(StreamOutcome::Canceled),
        }
    }

    /// `true` for `End` and `Canceled`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, StreamOutcome::Message(_))
    }
}
