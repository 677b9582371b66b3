//! Messages of the `lfg.Lfg` service.
//!
//! Kept in sync by hand with the server's `lfg.proto`; tags must never be reused.

/// The boss whose kill proof a group requires.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum KillProofId {
    Unknown = 0,
    Li = 1,
    Ld = 2,
    Uce = 3,
    Ufe = 4,
    Boneskinner = 5,
}

impl KillProofId {
    pub fn as_str_name(&self) -> &'static str {
        match self {
            KillProofId::Unknown => "UNKNOWN",
            KillProofId::Li => "LI",
            KillProofId::Ld => "LD",
            KillProofId::Uce => "UCE",
            KillProofId::Ufe => "UFE",
            KillProofId::Boneskinner => "BONESKINNER",
        }
    }

    pub fn from_str_name(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "UNKNOWN" => Some(KillProofId::Unknown),
            "LI" => Some(KillProofId::Li),
            "LD" => Some(KillProofId::Ld),
            "UCE" => Some(KillProofId::Uce),
            "UFE" => Some(KillProofId::Ufe),
            "BONESKINNER" => Some(KillProofId::Boneskinner),
            _ => None,
        }
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Group {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub creator_id: String,
    #[prost(string, tag = "3")]
    pub title: String,
    #[prost(uint32, tag = "4")]
    pub kill_proof_minimum: u32,
    #[prost(enumeration = "KillProofId", tag = "5")]
    pub kill_proof_id: i32,
    #[prost(message, optional, tag = "6")]
    pub created_at: Option<::prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct KillProof {
    #[prost(enumeration = "KillProofId", tag = "1")]
    pub kill_proof_id: i32,
    #[prost(uint32, tag = "2")]
    pub amount: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GroupApplication {
    #[prost(string, tag = "1")]
    pub id: String,
    #[prost(string, tag = "2")]
    pub group_id: String,
    #[prost(string, tag = "3")]
    pub account_name: String,
    #[prost(message, repeated, tag = "4")]
    pub kill_proofs: Vec<KillProof>,
    #[prost(message, optional, tag = "5")]
    pub created_at: Option<::prost_types::Timestamp>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateGroupRequest {
    #[prost(string, tag = "1")]
    pub title: String,
    #[prost(uint32, tag = "2")]
    pub kill_proof_minimum: u32,
    #[prost(enumeration = "KillProofId", tag = "3")]
    pub kill_proof_id: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateGroupRequest {
    #[prost(message, optional, tag = "1")]
    pub group: Option<Group>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteGroupRequest {
    #[prost(string, tag = "1")]
    pub group_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteGroupResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListGroupsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListGroupsResponse {
    #[prost(message, repeated, tag = "1")]
    pub groups: Vec<Group>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeGroupsRequest {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GroupsUpdate {
    #[prost(oneof = "groups_update::Update", tags = "1, 2, 3")]
    pub update: Option<groups_update::Update>,
}

pub mod groups_update {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Update {
        #[prost(message, tag = "1")]
        NewGroup(super::Group),
        #[prost(message, tag = "2")]
        UpdatedGroup(super::Group),
        #[prost(string, tag = "3")]
        RemovedGroupId(String),
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct CreateGroupApplicationRequest {
    #[prost(string, tag = "1")]
    pub group_id: String,
    #[prost(string, tag = "2")]
    pub account_name: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListGroupApplicationsRequest {
    #[prost(string, tag = "1")]
    pub group_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListGroupApplicationsResponse {
    #[prost(message, repeated, tag = "1")]
    pub applications: Vec<GroupApplication>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteGroupApplicationRequest {
    #[prost(string, tag = "1")]
    pub application_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DeleteGroupApplicationResponse {}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SubscribeGroupApplicationsRequest {
    #[prost(string, tag = "1")]
    pub group_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct GroupApplicationsUpdate {
    #[prost(oneof = "group_applications_update::Update", tags = "1, 2")]
    pub update: Option<group_applications_update::Update>,
}

pub mod group_applications_update {
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Update {
        #[prost(message, tag = "1")]
        NewApplication(super::GroupApplication),
        #[prost(string, tag = "2")]
        RemovedApplicationId(String),
    }
}
