//! # lfgweb Core
//!
//! `lfgweb-core` is a small client for the gRPC-Web wire protocol. It carries gRPC style
//! length-prefixed frames over plain HTTP/1.1 or HTTP/2 responses, so it works against
//! proxies and servers that never emit HTTP trailers.
//!
//! ## Key Components
//!
//! * **[`GrpcWebClient`]:** The main entry point. It performs unary and server-streaming calls
//!   on raw, already serialized message bytes.
//! * **[`CallContext`]:** Per-call state (method path, bearer token, cancellation, deadline).
//! * **[`ServerStream`]:** A pull-based reader over a live server-streaming response.
//!
//! ## Building blocks
//!
//! The [`grpc_web`] module exposes the pure framing pieces (frame codec, trailer parser) and the
//! incremental [`grpc_web::reader::FrameReader`]. The [`transport`] module is the thin HTTP layer.
//!
//! Message (de)serialization is left to the caller: requests go in as bytes and
//! responses come back as bytes.
//!
//! ## Re-exports
//!
//! This crate re-exports `bytes` and `tonic` so consumers use compatible versions of the
//! types that appear in its public API.
pub mod cancel;
pub mod client;
pub mod config;
pub mod grpc_web;
pub mod transport;

pub use cancel::{CancelHandle, CancelScope, CancelToken};
pub use client::{
    CallContext, CallError, GrpcWebClient, ServerStream, StreamOutcome, UnaryOutcome,
};
pub use config::{ClientConfig, ConfigError};

// Re-exports
pub use bytes;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
