use serde::Serialize;
use serde_json::{Map, Value};

use super::Comparison;
use crate::{
    identity::{IdentityKind, ResolvedIdentity, SessionRecord},
    policy::CheckCategory,
};

/// Request coordinates attached to a divergence record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestMeta {
    pub method: String,
    pub path: String,
}

impl RequestMeta {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }

    pub fn from_request_parts(method: &http::Method, uri: &http::Uri) -> Self {
        Self::new(method.as_str(), uri.path())
    }
}

/// What the policy engine saw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentitySnapshot {
    pub kind: Option<IdentityKind>,
    pub role: Option<String>,
    pub mfa_verified: Option<bool>,
    pub mfa_pending: Option<bool>,
}

impl IdentitySnapshot {
    pub fn capture(identity: Option<&ResolvedIdentity>) -> Self {
        match identity {
            Some(identity) => Self {
                kind: Some(identity.kind()),
                role: identity.role().map(String::from),
                mfa_verified: Some(identity.mfa.verified),
                mfa_pending: Some(identity.mfa.pending),
            },
            None => Self::default(),
        }
    }
}

/// What the legacy check saw.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub user_id_present: bool,
    pub role: Option<String>,
    pub mfa_pending: Option<bool>,
    pub mfa_verified: Option<bool>,
}

impl SessionSnapshot {
    pub fn capture(session: Option<&SessionRecord>) -> Self {
        match session {
            Some(session) => Self {
                user_id_present: session.user_id.is_some(),
                role: session.user_role.clone(),
                mfa_pending: session.mfa_pending,
                mfa_verified: session.mfa_verified,
            },
            None => Self::default(),
        }
    }
}

/// One legacy/policy disagreement.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DivergenceRecord {
    pub category: CheckCategory,
    pub path: String,
    pub method: String,
    pub legacy_allowed: bool,
    pub policy_allowed: bool,
    pub identity: IdentitySnapshot,
    pub session: SessionSnapshot,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

impl DivergenceRecord {
    pub fn new(
        category: CheckCategory,
        meta: &RequestMeta,
        comparison: Comparison,
        identity: Option<&ResolvedIdentity>,
        session: Option<&SessionRecord>,
    ) -> Self {
        Self {
            category,
            path: meta.path.clone(),
            method: meta.method.clone(),
            legacy_allowed: comparison.legacy_allowed,
            policy_allowed: comparison.policy_allowed,
            identity: IdentitySnapshot::capture(identity),
            session: SessionSnapshot::capture(session),
            context: Map::new(),
        }
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }
}
