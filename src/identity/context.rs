//! Raw, already-validated request context supplied by upstream collaborators.
//!
//! None of these types perform credential verification. Token validation,
//! service-to-service authentication and session cookie handling happen
//! elsewhere; these structs only carry what those layers concluded.

use serde::{Deserialize, Serialize};

/// Identifier of an internal/service principal.
///
/// Service callers historically used both numeric and textual ids, so both
/// shapes are accepted and normalized to a string during resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrincipalId {
    Numeric(i64),
    Text(String),
}

impl std::fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PrincipalId::Numeric(n) => write!(f, "{}", n),
            PrincipalId::Text(s) => f.write_str(s),
        }
    }
}

/// An internal/service principal established by service-to-service auth.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalPrincipal {
    /// Only principals flagged as services are treated as internal.
    #[serde(default)]
    pub service: bool,

    #[serde(default)]
    pub id: Option<PrincipalId>,

    #[serde(default)]
    pub role: Option<String>,
}

impl InternalPrincipal {
    pub fn service(id: impl Into<PrincipalId>, role: impl Into<String>) -> Self {
        Self {
            service: true,
            id: Some(id.into()),
            role: Some(role.into()),
        }
    }
}

impl From<i64> for PrincipalId {
    fn from(value: i64) -> Self {
        PrincipalId::Numeric(value)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        PrincipalId::Text(value.to_string())
    }
}

impl From<String> for PrincipalId {
    fn from(value: String) -> Self {
        PrincipalId::Text(value)
    }
}

/// Claims from an externally-verified token (e.g. the veteran OIDC login).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedClaims {
    /// Subject claim, used verbatim as the identity id.
    #[serde(default)]
    pub sub: Option<String>,
}

impl VerifiedClaims {
    pub fn with_sub(sub: impl Into<String>) -> Self {
        Self {
            sub: Some(sub.into()),
        }
    }
}

/// The legacy session record as loaded from the session store.
///
/// Every field is optional: sessions written by older code paths may be
/// missing any of them, and resolution must tolerate that.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(default)]
    pub user_id: Option<i64>,

    #[serde(default)]
    pub user_role: Option<String>,

    /// Linked affiliate account, if this user also acts as an affiliate.
    #[serde(default)]
    pub vlt_affiliate_id: Option<i64>,

    #[serde(default)]
    pub mfa_pending: Option<bool>,

    #[serde(default)]
    pub mfa_verified: Option<bool>,
}

impl SessionRecord {
    pub fn for_user(user_id: i64, role: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id),
            user_role: Some(role.into()),
            ..Default::default()
        }
    }

    pub fn with_mfa(mut self, pending: bool, verified: bool) -> Self {
        self.mfa_pending = Some(pending);
        self.mfa_verified = Some(verified);
        self
    }

    pub fn with_affiliate(mut self, affiliate_id: i64) -> Self {
        self.vlt_affiliate_id = Some(affiliate_id);
        self
    }
}

/// Everything the resolver may look at for a single request.
///
/// Each source is independent; any combination may be present.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    pub internal: Option<InternalPrincipal>,
    pub claims: Option<VerifiedClaims>,
    pub session: Option<SessionRecord>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_internal(mut self, principal: InternalPrincipal) -> Self {
        self.internal = Some(principal);
        self
    }

    pub fn with_claims(mut self, claims: VerifiedClaims) -> Self {
        self.claims = Some(claims);
        self
    }

    pub fn with_session(mut self, session: SessionRecord) -> Self {
        self.session = Some(session);
        self
    }
}
