//! # gRPC-Web Wire Format
//!
//! Pure building blocks for the gRPC-Web protocol. Nothing in here knows about HTTP;
//! the [`reader`] only needs something implementing `http_body::Body`.
//!
//! ```text
//! Message frame:  [flags:1][length:4][payload:length]    flags 0x00
//! Trailer frame:  [flags:1][length:4][payload:length]    flags 0x80, payload = "key: value\r\n"*
//! ```
pub mod frame;
pub mod reader;
pub mod trailer;
