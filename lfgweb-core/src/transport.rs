//! # Transport Adapter
//!
//! A thin layer over any HTTP service implementing `tonic::client::GrpcService`. It builds the
//! gRPC-Web request (headers, bearer token, framed body), waits for the response head, and hands
//! the body back untouched. It performs no framing itself.
//!
//! Two concrete services are supported out of the box:
//!
//! * `tonic::transport::Channel` - HTTP/2 (prior knowledge), see [`crate::GrpcWebClient::connect`].
//! * [`Http1Client`] - a `hyper-util` client speaking HTTP/1.1, see [`crate::GrpcWebClient::http1`].
//!
//! Any in-process tower service works as well, which is what the tests rely on.
use crate::BoxError;
use bytes::Bytes;
use futures_util::future::poll_fn;
use http::{
    HeaderMap, HeaderValue, Method, Request, Response, StatusCode, Uri,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderName, InvalidHeaderName, InvalidHeaderValue},
    uri::{InvalidUri, InvalidUriParts, PathAndQuery},
};
use http_body::Body as HttpBody;
use http_body_util::Full;
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use std::str::FromStr;
use std::time::Duration;
use tonic::client::GrpcService;

pub const GRPC_WEB_PROTO: &str = "application/grpc-web+proto";

const X_GRPC_WEB: &str = "x-grpc-web";
const X_USER_AGENT: &str = "x-user-agent";
const GRPC_TIMEOUT: &str = "grpc-timeout";
const USER_AGENT: &str = concat!("grpc-web-rust/", env!("CARGO_PKG_VERSION"));

/// HTTP/1.1 client usable as a transport.
pub type Http1Client = Client<HttpConnector, tonic::body::Body>;

/// Builds a pooled HTTP/1.1 client. Connections are opened lazily on first use.
pub fn http1_client() -> Http1Client {
    Client::builder(TokioExecutor::new()).build_http()
}

/// Network and HTTP-level failures.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid method path '{path}': '{source}'")]
    InvalidPath { path: String, source: InvalidUri },
    #[error("Failed to build request uri: '{0}'")]
    InvalidUri(#[source] InvalidUriParts),
    #[error("Invalid metadata (header) key '{key}': '{source}'")]
    InvalidMetadataKey {
        key: String,
        source: InvalidHeaderName,
    },
    #[error("Invalid metadata (header) value for key '{key}': '{source}'")]
    InvalidMetadataValue {
        key: String,
        source: InvalidHeaderValue,
    },
    #[error("Internal error, the transport was not ready: '{0}'")]
    NotReady(#[source] BoxError),
    #[error("Request failed: '{0}'")]
    RequestFailed(#[source] BoxError),
    #[error("Server answered with HTTP status {0}")]
    HttpStatus(StatusCode),
    #[error("Failed to read response body: '{0}'")]
    Body(#[source] BoxError),
    #[error("Call did not complete within {0:?}")]
    Timeout(Duration),
}

/// Everything the adapter needs to put one call on the wire.
#[derive(Debug)]
pub struct OutgoingCall<'a> {
    /// Method path, e.g. `/lfg.Lfg/CreateGroup`.
    pub method: &'a str,
    /// One encoded message frame.
    pub frame: Bytes,
    pub auth_token: Option<&'a str>,
    pub timeout: Option<Duration>,
    /// Extra headers, sent as-is.
    pub metadata: &'a [(String, String)],
}

#[derive(Debug, Clone)]
pub struct Transport<S> {
    service: S,
    base: Uri,
}

impl<S> Transport<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// `base` must be absolute; its path (if any) prefixes every method path.
    pub fn new(service: S, base: Uri) -> Self {
        Self { service, base }
    }

    /// Builds the HTTP request for one call.
    pub fn build_request(
        &self,
        call: OutgoingCall<'_>,
    ) -> Result<Request<tonic::body::Body>, TransportError> {
        let mut request = Request::new(tonic::body::Body::new(Full::new(call.frame)));
        *request.method_mut() = Method::POST;
        *request.uri_mut() = self.request_uri(call.method)?;

        let headers = request.headers_mut();
        headers.insert(X_GRPC_WEB, HeaderValue::from_static("1"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(GRPC_WEB_PROTO));
        headers.insert(ACCEPT, HeaderValue::from_static(GRPC_WEB_PROTO));
        headers.insert(X_USER_AGENT, HeaderValue::from_static(USER_AGENT));

        if let Some(timeout) = call.timeout {
            headers.insert(GRPC_TIMEOUT, grpc_timeout(timeout));
        }

        for (k, v) in call.metadata {
            insert_metadata(headers, k, v)?;
        }

        if let Some(token) = call.auth_token {
            let value = format!("Bearer {token}");
            let value = HeaderValue::from_str(&value).map_err(|source| {
                TransportError::InvalidMetadataValue {
                    key: AUTHORIZATION.to_string(),
                    source,
                }
            })?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(request)
    }

    /// Sends a request and resolves as soon as the response head arrives.
    ///
    /// The body is returned unread; the unary path buffers it up to its size limit, the
    /// streaming path reads it frame by frame.
    pub async fn send(
        &mut self,
        request: Request<tonic::body::Body>,
    ) -> Result<Response<S::ResponseBody>, TransportError> {
        poll_fn(|cx| self.service.poll_ready(cx))
            .await
            .map_err(|e| TransportError::NotReady(e.into()))?;

        self.service
            .call(request)
            .await
            .map_err(|e| TransportError::RequestFailed(e.into()))
    }

    fn request_uri(&self, method: &str) -> Result<Uri, TransportError> {
        let prefix = self.base.path().trim_end_matches('/');
        let path = if method.starts_with('/') {
            format!("{prefix}{method}")
        } else {
            format!("{prefix}/{method}")
        };

        let path_and_query =
            PathAndQuery::from_str(&path).map_err(|source| TransportError::InvalidPath {
                path: method.to_string(),
                source,
            })?;

        let mut parts = self.base.clone().into_parts();
        parts.path_and_query = Some(path_and_query);
        Uri::from_parts(parts).map_err(TransportError::InvalidUri)
    }
}

/// Rejects non-2xx responses.
pub fn ensure_success<B>(response: &Response<B>) -> Result<(), TransportError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(TransportError::HttpStatus(response.status()))
    }
}

fn insert_metadata(headers: &mut HeaderMap, k: &str, v: &str) -> Result<(), TransportError> {
    let key = HeaderName::from_str(k).map_err(|source| TransportError::InvalidMetadataKey {
        key: k.to_string(),
        source,
    })?;
    let val = HeaderValue::from_str(v).map_err(|source| TransportError::InvalidMetadataValue {
        key: k.to_string(),
        source,
    })?;
    headers.insert(key, val);
    Ok(())
}

/// Encodes a deadline as a `grpc-timeout` header (at most 8 digits plus a unit).
fn grpc_timeout(timeout: Duration) -> HeaderValue {
    const MAX_DIGITS: u128 = 99_999_999;

    let millis = timeout.as_millis();
    let value = if millis <= MAX_DIGITS {
        format!("{millis}m")
    } else {
        format!("{}S", timeout.as_secs().min(MAX_DIGITS as u64))
    };

    // Digits followed by an ASCII unit are always a valid header value.
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("99999999S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grpc_web::frame;
    use std::convert::Infallible;
    use tonic::codegen::{BoxFuture, Service};

    /// Never actually called; only here to satisfy the `GrpcService` bounds.
    #[derive(Clone)]
    struct Unreachable;

    impl Service<Request<tonic::body::Body>> for Unreachable {
        type Response = Response<tonic::body::Body>;
        type Error = Infallible;
        type Future = BoxFuture<Self::Response, Self::Error>;

        fn poll_ready(
            &mut self,
            _cx: &mut std::task::Context<'_>,
        ) -> std::task::Poll<Result<(), Self::Error>> {
            std::task::Poll::Ready(Ok(()))
        }

        fn call(&mut self, _req: Request<tonic::body::Body>) -> Self::Future {
            Box::pin(async { Ok(Response::new(tonic::body::Body::empty())) })
        }
    }

    fn transport(base: &'static str) -> Transport<Unreachable> {
        Transport::new(Unreachable, Uri::from_static(base))
    }

    fn call<'a>(method: &'a str, metadata: &'a [(String, String)]) -> OutgoingCall<'a> {
        OutgoingCall {
            method,
            frame: frame::encode(b"req"),
            auth_token: None,
            timeout: None,
            metadata,
        }
    }

    #[test]
    fn request_carries_grpc_web_headers() {
        let transport = transport("http://lfg.test:8080");
        let request = transport
            .build_request(call("/lfg.Lfg/ListGroups", &[]))
            .unwrap();

        assert_eq!(request.method(), Method::POST);
        assert_eq!(
            request.uri().to_string(),
            "http://lfg.test:8080/lfg.Lfg/ListGroups"
        );
        assert_eq!(request.headers()[X_GRPC_WEB], "1");
        assert_eq!(request.headers()[CONTENT_TYPE], GRPC_WEB_PROTO);
        assert_eq!(request.headers()[ACCEPT], GRPC_WEB_PROTO);
        assert!(request.headers().get(AUTHORIZATION).is_none());
        assert!(request.headers().get(GRPC_TIMEOUT).is_none());
    }

    #[test]
    fn base_path_prefixes_method() {
        let transport = transport("https://api.example.com/grpc/");
        let request = transport.build_request(call("lfg.Lfg/ListGroups", &[])).unwrap();
        assert_eq!(request.uri().path(), "/grpc/lfg.Lfg/ListGroups");
    }

    #[test]
    fn bearer_token_and_deadline_are_attached() {
        let transport = transport("http://lfg.test");
        let mut outgoing = call("/lfg.Lfg/ListGroups", &[]);
        outgoing.auth_token = Some("secret");
        outgoing.timeout = Some(Duration::from_secs(2));

        let request = transport.build_request(outgoing).unwrap();

        assert_eq!(request.headers()[AUTHORIZATION], "Bearer secret");
        assert_eq!(request.headers()[GRPC_TIMEOUT], "2000m");
    }

    #[test]
    fn invalid_metadata_key_is_rejected() {
        let transport = transport("http://lfg.test");
        let metadata = vec![("bad key".to_string(), "v".to_string())];

        let err = transport
            .build_request(call("/lfg.Lfg/ListGroups", &metadata))
            .unwrap_err();
        assert!(matches!(err, TransportError::InvalidMetadataKey { .. }));
    }

    #[test]
    fn huge_deadline_switches_to_seconds() {
        let value = grpc_timeout(Duration::from_secs(200_000));
        assert_eq!(value, "200000S");
    }

    #[test]
    fn non_2xx_is_rejected() {
        let response = Response::builder()
            .status(StatusCode::SERVICE_UNAVAILABLE)
            .body(())
            .unwrap();

        let err = ensure_success(&response).unwrap_err();
        assert!(matches!(
            err,
            TransportError::HttpStatus(StatusCode::SERVICE_UNAVAILABLE)
        ));
    }
}
