use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::identity::SessionRecord;

/// Opaque session identifier carried in the session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Server-side session data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlt_affiliate_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa_pending: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mfa_verified: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,
}

impl SessionState {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The view of this state the identity resolver consumes.
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            user_id: self.user_id,
            user_role: self.user_role.clone(),
            vlt_affiliate_id: self.vlt_affiliate_id,
            mfa_pending: self.mfa_pending,
            mfa_verified: self.mfa_verified,
        }
    }
}

/// Fields a login-type operation may set when establishing a session.
///
/// Unset fields stay empty; nothing carries over from the previous session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionFields {
    pub user_id: Option<i64>,
    pub user_role: Option<String>,
    pub vlt_affiliate_id: Option<i64>,
    pub mfa_pending: Option<bool>,
    pub mfa_verified: Option<bool>,
    pub identity_id: Option<String>,
}

impl SessionFields {
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.user_role = Some(role.into());
        self
    }

    pub fn with_affiliate(mut self, affiliate_id: i64) -> Self {
        self.vlt_affiliate_id = Some(affiliate_id);
        self
    }

    pub fn with_mfa(mut self, pending: bool, verified: bool) -> Self {
        self.mfa_pending = Some(pending);
        self.mfa_verified = Some(verified);
        self
    }

    pub fn with_identity_id(mut self, identity_id: impl Into<String>) -> Self {
        self.identity_id = Some(identity_id.into());
        self
    }

    pub(crate) fn into_state(self) -> SessionState {
        SessionState {
            user_id: self.user_id,
            user_role: self.user_role,
            vlt_affiliate_id: self.vlt_affiliate_id,
            mfa_pending: self.mfa_pending,
            mfa_verified: self.mfa_verified,
            identity_id: self.identity_id,
        }
    }
}

/// Request-scoped handle to the caller's session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub id: Option<SessionId>,
    pub state: SessionState,
}

impl Session {
    pub fn new(id: Option<SessionId>, state: SessionState) -> Self {
        Self { id, state }
    }

    /// A request that arrived without a usable session.
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_parse() {
        let id = SessionId::generate();
        assert_eq!(id.to_string().parse::<SessionId>().unwrap(), id);
        assert!("not-a-session".parse::<SessionId>().is_err());
    }

    #[test]
    fn test_state_serializes_camel_case() {
        let state = SessionFields::user(5)
            .with_role("affiliate")
            .with_affiliate(900)
            .with_mfa(true, false)
            .into_state();
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["userId"], 5);
        assert_eq!(json["userRole"], "affiliate");
        assert_eq!(json["vltAffiliateId"], 900);
        assert_eq!(json["mfaPending"], true);
        assert_eq!(json["mfaVerified"], false);
        assert!(json.get("identityId").is_none());
    }

    #[test]
    fn test_to_record_copies_resolver_fields() {
        let state = SessionFields::user(5)
            .with_role("admin")
            .with_mfa(true, true)
            .with_identity_id("canonical")
            .into_state();

        let record = state.to_record();
        assert_eq!(record.user_id, Some(5));
        assert_eq!(record.user_role.as_deref(), Some("admin"));
        assert_eq!(record.vlt_affiliate_id, None);
        assert_eq!(record.mfa_pending, Some(true));
        assert_eq!(record.mfa_verified, Some(true));
    }

    #[test]
    fn test_empty_state() {
        assert!(SessionState::default().is_empty());
        assert!(!SessionFields::user(1).into_state().is_empty());
    }
}
