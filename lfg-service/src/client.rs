use crate::{methods, pb};
use bytes::Bytes;
use http_body::Body as HttpBody;
use lfgweb_core::{
    BoxError, CallContext, CallError, CancelToken, ClientConfig, ConfigError, GrpcWebClient,
    ServerStream, StreamOutcome, UnaryOutcome, client::ClientConnectError,
    transport::Http1Client,
};
use prost::{DecodeError, Message};
use std::time::Duration;
use tonic::{Code, client::GrpcService, transport::Channel};

#[derive(Debug, thiserror::Error)]
pub enum LfgError {
    #[error(transparent)]
    Call(#[from] CallError),
    #[error("Failed to decode response message: {0}")]
    Decode(#[from] DecodeError),
}

impl LfgError {
    pub fn code(&self) -> Code {
        match self {
            LfgError::Call(err) => err.code(),
            LfgError::Decode(_) => Code::Internal,
        }
    }

    pub fn is_unauthenticated(&self) -> bool {
        matches!(self, LfgError::Call(CallError::Unauthenticated { .. }))
    }
}

/// Per-call overrides. The method path is filled in by [`LfgClient`].
#[derive(Debug, Clone, Default)]
pub struct CallOptions {
    pub auth_token: Option<String>,
    pub cancel: CancelToken,
    pub timeout: Option<Duration>,
}

impl CallOptions {
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

    fn into_context(self, method: &str) -> CallContext {
        CallContext {
            method: method.to_string(),
            auth_token: self.auth_token,
            cancel: self.cancel,
            timeout: self.timeout,
            metadata: Vec::new(),
        }
    }
}

type Decoder<T> = fn(Bytes) -> Result<T, DecodeError>;

/// A typed view over a live server stream.
pub struct Subscription<B, T> {
    stream: ServerStream<B>,
    decode: Decoder<T>,
}

impl<B, T> Subscription<B, T>
where
    B: HttpBody<Data = Bytes>,
    B::Error: Into<BoxError>,
{
    /// Pulls and decodes the next update. See [`ServerStream::next`] for the termination rules.
    pub async fn next(&mut self) -> Result<StreamOutcome<T>, LfgError> {
        let outcome = self.stream.next().await?;
        Ok(outcome.try_map(self.decode)?)
    }

    pub fn is_canceled(&self) -> bool {
        self.stream.is_canceled()
    }
}

/// Typed client of the `lfg.Lfg` service.
#[derive(Debug, Clone)]
pub struct LfgClient<S = Channel> {
    inner: GrpcWebClient<S>,
}

impl LfgClient<Channel> {
    /// Connects over HTTP/2.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientConnectError> {
        Ok(Self::new(GrpcWebClient::connect(config).await?))
    }
}

impl LfgClient<Http1Client> {
    /// Builds a client speaking HTTP/1.1, the transport most gRPC-Web proxies expect.
    pub fn http1(config: ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(GrpcWebClient::http1(config)?))
    }
}

impl<S> LfgClient<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    pub fn new(inner: GrpcWebClient<S>) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &GrpcWebClient<S> {
        &self.inner
    }

    /// Cancels every call and subscription started through this client or its clones.
    pub fn shutdown(&self) {
        self.inner.shutdown();
    }

    pub async fn create_group(
        &mut self,
        request: pb::CreateGroupRequest,
        options: CallOptions,
    ) -> Result<UnaryOutcome<pb::Group>, LfgError> {
        self.unary(methods::CREATE_GROUP, &request, options, |b| pb::Group::decode(b))
            .await
    }

    pub async fn update_group(
        &mut self,
        request: pb::UpdateGroupRequest,
        options: CallOptions,
    ) -> Result<UnaryOutcome<pb::Group>, LfgError> {
        self.unary(methods::UPDATE_GROUP, &request, options, |b| pb::Group::decode(b))
            .await
    }

    pub async fn delete_group(
        &mut self,
        request: pb::DeleteGroupRequest,
        options: CallOptions,
    ) -> Result<UnaryOutcome<pb::DeleteGroupResponse>, LfgError> {
        self.unary(methods::DELETE_GROUP, &request, options, |b| {
            pb::DeleteGroupResponse::decode(b)
        })
        .await
    }

    pub async fn list_groups(
        &mut self,
        request: pb::ListGroupsRequest,
        options: CallOptions,
    ) -> Result<UnaryOutcome<pb::ListGroupsResponse>, LfgError> {
        self.unary(methods::LIST_GROUPS, &request, options, |b| {
            pb::ListGroupsResponse::decode(b)
        })
        .await
    }

    pub async fn subscribe_groups(
        &mut self,
        request: pb::SubscribeGroupsRequest,
        options: CallOptions,
    ) -> Result<Subscription<S::ResponseBody, pb::GroupsUpdate>, LfgError> {
        self.subscribe(methods::SUBSCRIBE_GROUPS, &request, options, |b| {
            pb::GroupsUpdate::decode(b)
        })
        .await
    }

    pub async fn create_group_application(
        &mut self,
        request: pb::CreateGroupApplicationRequest,
        options: CallOptions,
    ) -> Result<UnaryOutcome<pb::GroupApplication>, LfgError> {
        self.unary(methods::CREATE_GROUP_APPLICATION, &request, options, |b| {
            pb::GroupApplication::decode(b)
        })
        .await
    }

    pub async fn list_group_applications(
        &mut self,
        request: pb::ListGroupApplicationsRequest,
        options: CallOptions,
    ) -> Result<UnaryOutcome<pb::ListGroupApplicationsResponse>, LfgError> {
        self.unary(methods::LIST_GROUP_APPLICATIONS, &request, options, |b| {
            pb::ListGroupApplicationsResponse::decode(b)
        })
        .await
    }

    pub async fn delete_group_application(
        &mut self,
        request: pb::DeleteGroupApplicationRequest,
        options: CallOptions,
    ) -> Result<UnaryOutcome<pb::DeleteGroupApplicationResponse>, LfgError> {
        self.unary(methods::DELETE_GROUP_APPLICATION, &request, options, |b| {
            pb::DeleteGroupApplicationResponse::decode(b)
        })
        .await
    }

    pub async fn subscribe_group_applications(
        &mut self,
        request: pb::SubscribeGroupApplicationsRequest,
        options: CallOptions,
    ) -> Result<Subscription<S::ResponseBody, pb::GroupApplicationsUpdate>, LfgError> {
        self.subscribe(methods::SUBSCRIBE_GROUP_APPLICATIONS, &request, options, |b| {
            pb::GroupApplicationsUpdate::decode(b)
        })
        .await
    }

    async fn unary<Req: Message, Res>(
        &mut self,
        method: &str,
        request: &Req,
        options: CallOptions,
        decode: Decoder<Res>,
    ) -> Result<UnaryOutcome<Res>, LfgError> {
        let outcome = self
            .inner
            .unary(options.into_context(method), request.encode_to_vec())
            .await?;

        Ok(outcome.try_map(decode)?)
    }

    async fn subscribe<Req: Message, T>(
        &mut self,
        method: &str,
        request: &Req,
        options: CallOptions,
        decode: Decoder<T>,
    ) -> Result<Subscription<S::ResponseBody, T>, LfgError> {
        let stream = self
            .inner
            .server_streaming(options.into_context(method), request.encode_to_vec())
            .await?;

        Ok(Subscription { stream, decode })
    }
}
