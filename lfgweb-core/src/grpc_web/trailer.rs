//! # Trailer Parser
//!
//! A gRPC-Web server ends a response with a trailer frame whose payload is a small HTTP/1 style
//! header block:
//!
//! ```text
//! grpc-status: 3\r\n
//! grpc-message: bad input\r\n
//! ```
//!
//! The same two keys may also arrive as regular response headers when the server rejects a call
//! before writing any body ("trailers-only" responses). Both forms are folded into a [`GrpcStatus`].
use super::frame::FrameError;
use crate::client::CallError;
use http::HeaderMap;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;
use tonic::Code;

pub const GRPC_STATUS: &str = "grpc-status";
pub const GRPC_MESSAGE: &str = "grpc-message";

/// Final status of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrpcStatus {
    pub code: Code,
    pub message: String,
}

impl GrpcStatus {
    pub fn ok() -> Self {
        Self {
            code: Code::Ok,
            message: String::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Code::Ok
    }

    /// Folds the status into the call result.
    ///
    /// * `Ok` - the call succeeded.
    /// * `Unauthenticated` - [`CallError::Unauthenticated`], so callers can re-authenticate.
    /// * anything else - [`CallError::Rpc`].
    pub fn into_result(self) -> Result<(), CallError> {
        match self.code {
            Code::Ok => Ok(()),
            Code::Unauthenticated => Err(CallError::Unauthenticated {
                message: self.message,
            }),
            code => Err(CallError::Rpc {
                code,
                message: self.message,
            }),
        }
    }

    fn from_parts(status: Option<&str>, message: Option<&str>) -> Self {
        Self {
            code: status.map(parse_code).unwrap_or(Code::Ok),
            message: message.map(decode_message).unwrap_or_default(),
        }
    }
}

/// Decoded payload of a trailer frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trailers {
    pub status: GrpcStatus,
    /// Every key seen in the trailer, lower-cased, including the two status keys.
    pub metadata: HashMap<String, String>,
}

impl Trailers {
    /// Parses the payload of a frame flagged as trailer.
    ///
    /// A missing `grpc-status` is read as OK.
    pub fn parse(payload: &[u8]) -> Result<Self, FrameError> {
        let text = std::str::from_utf8(payload).map_err(FrameError::InvalidTrailerEncoding)?;

        let metadata: HashMap<String, String> = text
            .lines()
            .filter_map(|line| line.split_once(':'))
            .map(|(key, value)| (key.trim().to_ascii_lowercase(), value.trim().to_string()))
            .collect();

        let status = GrpcStatus::from_parts(
            metadata.get(GRPC_STATUS).map(String::as_str),
            metadata.get(GRPC_MESSAGE).map(String::as_str),
        );

        Ok(Self { status, metadata })
    }
}

/// Reads a fail-fast status carried in the response headers, if any.
pub fn status_from_headers(headers: &HeaderMap) -> Option<GrpcStatus> {
    let status = headers.get(GRPC_STATUS)?;
    let message = headers
        .get(GRPC_MESSAGE)
        .and_then(|value| value.to_str().ok());

    // A status header that is not even ASCII is as unreadable as a non-numeric one.
    let status = status.to_str().unwrap_or("?");

    Some(GrpcStatus::from_parts(Some(status), message))
}

/// Servers percent-encode `grpc-message`; anything that does not decode to UTF-8 is kept lossily.
fn decode_message(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}

fn parse_code(raw: &str) -> Code {
    raw.trim()
        .parse::<i32>()
        .map(Code::from_i32)
        .unwrap_or(Code::Unknown)
}
