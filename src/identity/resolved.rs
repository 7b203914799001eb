use serde::{Deserialize, Serialize};

/// The kind of principal an identity was resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// Internal service caller.
    Internal,
    /// Holder of externally-verified claims.
    Veteran,
    /// Session-authenticated user.
    User,
    /// Affiliate account linked to a user.
    VltAffiliate,
}

impl IdentityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentityKind::Internal => "internal",
            IdentityKind::Veteran => "veteran",
            IdentityKind::User => "user",
            IdentityKind::VltAffiliate => "vlt_affiliate",
        }
    }
}

impl std::fmt::Display for IdentityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Multi-factor step-up state.
///
/// Two independent flags rather than one enum: `pending` and `verified` can
/// both be true at once, and access decisions only ever test
/// `pending && !verified`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MfaState {
    pub pending: bool,
    pub verified: bool,
}

impl MfaState {
    pub fn new(pending: bool, verified: bool) -> Self {
        Self { pending, verified }
    }

    /// State carried by claims-based identities, which are pre-verified.
    pub fn pre_verified() -> Self {
        Self {
            pending: false,
            verified: true,
        }
    }

    /// True while a step-up challenge is outstanding.
    ///
    /// This restricts privileged access regardless of role.
    pub fn is_incomplete(&self) -> bool {
        self.pending && !self.verified
    }
}

/// One resolved principal (primary or secondary).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub kind: IdentityKind,

    /// Legacy identifier in its source system, always as a string.
    pub id: String,

    /// Numeric form of `id` when the source system uses integer keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_id: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl Principal {
    pub fn new(kind: IdentityKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
            numeric_id: None,
            role: None,
        }
    }

    pub fn numeric(kind: IdentityKind, id: i64) -> Self {
        Self {
            kind,
            id: id.to_string(),
            numeric_id: Some(id),
            role: None,
        }
    }

    pub fn with_role(mut self, role: Option<String>) -> Self {
        self.role = role;
        self
    }

    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }
}

/// The canonical identity for one request.
///
/// Exists only for the lifetime of a request; it is never persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedIdentity {
    pub primary: Principal,

    /// Non-authoritative linked principal (an affiliate account).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<Principal>,

    pub mfa: MfaState,
}

impl ResolvedIdentity {
    pub fn new(primary: Principal) -> Self {
        Self {
            primary,
            secondary: None,
            mfa: MfaState::default(),
        }
    }

    pub fn with_secondary(mut self, secondary: Principal) -> Self {
        self.secondary = Some(secondary);
        self
    }

    pub fn with_mfa(mut self, mfa: MfaState) -> Self {
        self.mfa = mfa;
        self
    }

    pub fn kind(&self) -> IdentityKind {
        self.primary.kind
    }

    pub fn role(&self) -> Option<&str> {
        self.primary.role()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mfa_incomplete_only_when_pending_and_unverified() {
        assert!(MfaState::new(true, false).is_incomplete());
        assert!(!MfaState::new(true, true).is_incomplete());
        assert!(!MfaState::new(false, false).is_incomplete());
        assert!(!MfaState::new(false, true).is_incomplete());
    }

    #[test]
    fn test_identity_serializes_kind_snake_case() {
        let identity = ResolvedIdentity::new(Principal::numeric(IdentityKind::User, 5))
            .with_secondary(Principal::numeric(IdentityKind::VltAffiliate, 9));
        let json = serde_json::to_value(&identity).unwrap();

        assert_eq!(json["primary"]["kind"], "user");
        assert_eq!(json["primary"]["id"], "5");
        assert_eq!(json["secondary"]["kind"], "vlt_affiliate");
        assert!(json["primary"].get("role").is_none());
    }
}
