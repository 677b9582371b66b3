//! # LFG Service
//!
//! Typed access to the `lfg.Lfg` Looking-For-Group service over gRPC-Web.
//!
//! [`LfgClient`] is a thin layer over [`lfgweb_core::GrpcWebClient`]: every method encodes its
//! request with [`prost::Message::encode_to_vec`], runs the call on raw bytes and hands the
//! response bytes to the decoder of the expected message type. The core never sees a domain type.
mod client;
pub mod pb;

pub use client::{CallOptions, LfgClient, LfgError, Subscription};

/// Method paths of the `lfg.Lfg` service.
pub mod methods {
    pub const CREATE_GROUP: &str = "/lfg.Lfg/CreateGroup";
    pub const UPDATE_GROUP: &str = "/lfg.Lfg/UpdateGroup";
    pub const DELETE_GROUP: &str = "/lfg.Lfg/DeleteGroup";
    pub const LIST_GROUPS: &str = "/lfg.Lfg/ListGroups";
    pub const SUBSCRIBE_GROUPS: &str = "/lfg.Lfg/SubscribeGroups";
    pub const CREATE_GROUP_APPLICATION: &str = "/lfg.Lfg/CreateGroupApplication";
    pub const LIST_GROUP_APPLICATIONS: &str = "/lfg.Lfg/ListGroupApplications";
    pub const DELETE_GROUP_APPLICATION: &str = "/lfg.Lfg/DeleteGroupApplication";
    pub const SUBSCRIBE_GROUP_APPLICATIONS: &str = "/lfg.Lfg/SubscribeGroupApplications";
}
