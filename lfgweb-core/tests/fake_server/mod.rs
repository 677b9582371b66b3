//! An in-process gRPC-Web "server": a tower service that records every request and answers with
//! a scripted response body delivered in configurable chunks.
#![allow(dead_code)]

use http::{HeaderMap, HeaderValue, Request, Response, StatusCode, Uri};
use http_body::{Body, Frame};
use http_body_util::BodyExt;
use lfgweb_core::{ClientConfig, GrpcWebClient, bytes::Bytes, grpc_web::frame};
use std::collections::VecDeque;
use std::convert::Infallible;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tonic::codegen::{BoxFuture, Service};

pub fn message(payload: &[u8]) -> Vec<u8> {
    frame::encode(payload).to_vec()
}

pub fn trailer(text: &str) -> Vec<u8> {
    let mut raw = vec![0x80];
    raw.extend_from_slice(&(text.len() as u32).to_be_bytes());
    raw.extend_from_slice(text.as_bytes());
    raw
}

pub fn ok_trailer() -> Vec<u8> {
    trailer("grpc-status: 0\r\n")
}

pub fn concat(parts: &[Vec<u8>]) -> Vec<u8> {
    parts.concat()
}

#[derive(Clone, Debug)]
pub struct ScriptedResponse {
    pub status: StatusCode,
    pub headers: Vec<(&'static str, &'static str)>,
    pub chunks: Vec<Bytes>,
    /// Stay pending forever once the chunks run out instead of ending the body.
    pub hang: bool,
}

impl ScriptedResponse {
    pub fn ok(body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: vec![("content-type", "application/grpc-web+proto")],
            chunks: vec![Bytes::from(body)],
            hang: false,
        }
    }

    /// Re-splits the body into chunks of `size` bytes.
    pub fn chunked(mut self, size: usize) -> Self {
        let whole: Vec<u8> = self.chunks.iter().flat_map(|c| c.to_vec()).collect();
        self.chunks = whole.chunks(size).map(Bytes::copy_from_slice).collect();
        self
    }

    /// Sends each of `parts` as its own chunk.
    pub fn in_chunks(parts: Vec<Vec<u8>>) -> Self {
        let mut response = Self::ok(Vec::new());
        response.chunks = parts.into_iter().map(Bytes::from).collect();
        response
    }

    pub fn then_hang(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_header(mut self, key: &'static str, value: &'static str) -> Self {
        self.headers.push((key, value));
        self
    }
}

#[derive(Clone, Debug)]
pub struct CapturedRequest {
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

type Handler = dyn Fn(&CapturedRequest) -> ScriptedResponse + Send + Sync;

#[derive(Clone)]
pub struct FakeServer {
    handler: Arc<Handler>,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    reads: Arc<AtomicUsize>,
}

impl FakeServer {
    pub fn new(handler: impl Fn(&CapturedRequest) -> ScriptedResponse + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            requests: Arc::default(),
            reads: Arc::default(),
        }
    }

    pub fn replying(response: ScriptedResponse) -> Self {
        Self::new(move |_| response.clone())
    }

    /// Number of times any response body was polled.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn client(&self) -> GrpcWebClient<FakeServer> {
        self.client_with(ClientConfig::new("http://lfg.test"))
    }

    pub fn client_with(&self, config: ClientConfig) -> GrpcWebClient<FakeServer> {
        GrpcWebClient::from_service(self.clone(), config).unwrap()
    }
}

impl Service<Request<tonic::body::Body>> for FakeServer {
    type Response = Response<ScriptedBody>;
    type Error = Infallible;
    type Future = BoxFuture<Self::Response, Self::Error>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<tonic::body::Body>) -> Self::Future {
        let this = self.clone();

        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = body.collect().await.unwrap().to_bytes();

            let captured = CapturedRequest {
                uri: parts.uri,
                headers: parts.headers,
                body,
            };
            let scripted = (this.handler)(&captured);
            this.requests.lock().unwrap().push(captured);

            let mut response = Response::new(ScriptedBody {
                chunks: scripted.chunks.into(),
                hang: scripted.hang,
                reads: this.reads.clone(),
            });
            *response.status_mut() = scripted.status;
            for (k, v) in scripted.headers {
                response
                    .headers_mut()
                    .insert(k, HeaderValue::from_static(v));
            }

            Ok(response)
        })
    }
}

pub struct ScriptedBody {
    chunks: VecDeque<Bytes>,
    hang: bool,
    reads: Arc<AtomicUsize>,
}

impl Body for ScriptedBody {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        match self.chunks.pop_front() {
            Some(chunk) => Poll::Ready(Some(Ok(Frame::data(chunk)))),
            None if self.hang => Poll::Pending,
            None => Poll::Ready(None),
        }
    }
}
