use serde::{Deserialize, Serialize};

use super::CheckCategory;
use crate::identity::{IdentityKind, ResolvedIdentity};

/// Roles that grant admin access to an internal/service principal.
pub const INTERNAL_ADMIN_ROLES: &[&str] = &["master", "admin"];

/// Roles that grant admin access to a session user.
pub const ADMIN_ROLES: &[&str] = &["admin", "master"];

/// The exact role string that identifies an affiliate user.
pub const AFFILIATE_ROLE: &str = "affiliate";

/// Legal/contract status supplied by the contracts subsystem.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalStatus {
    #[serde(rename = "NDA", default)]
    pub nda: bool,

    /// `None` means no contract decision has been recorded; only an explicit
    /// `Some(false)` denies.
    #[serde(rename = "CONTRACT", default, skip_serializing_if = "Option::is_none")]
    pub contract: Option<bool>,
}

impl LegalStatus {
    pub fn new(nda: bool, contract: Option<bool>) -> Self {
        Self { nda, contract }
    }
}

pub fn is_authenticated(identity: Option<&ResolvedIdentity>) -> bool {
    identity.is_some()
}

/// Internal principals with an admin role, or session users with an admin
/// role whose MFA step-up is not outstanding.
pub fn can_access_admin(identity: Option<&ResolvedIdentity>) -> bool {
    let Some(identity) = identity else {
        return false;
    };
    let role = identity.role().unwrap_or_default();

    match identity.kind() {
        IdentityKind::Internal => INTERNAL_ADMIN_ROLES.contains(&role),
        IdentityKind::User => ADMIN_ROLES.contains(&role) && !identity.mfa.is_incomplete(),
        IdentityKind::Veteran | IdentityKind::VltAffiliate => false,
    }
}

pub fn can_access_affiliate(identity: Option<&ResolvedIdentity>) -> bool {
    let Some(identity) = identity else {
        return false;
    };

    identity.kind() == IdentityKind::User
        && identity.role() == Some(AFFILIATE_ROLE)
        && !identity.mfa.is_incomplete()
}

/// Affiliate access gated on a signed NDA and a contract that has not been
/// explicitly refused.
pub fn can_access_affiliate_with_nda(
    identity: Option<&ResolvedIdentity>,
    legal: Option<&LegalStatus>,
) -> bool {
    if !can_access_affiliate(identity) {
        return false;
    }
    match legal {
        Some(status) => status.nda && status.contract != Some(false),
        None => false,
    }
}

/// Claims access is reserved for claims-based (veteran) identities.
/// Session users never pass, whatever their role.
pub fn can_access_claims(identity: Option<&ResolvedIdentity>) -> bool {
    identity.is_some_and(|i| i.kind() == IdentityKind::Veteran)
}

pub fn requires_mfa_completion(identity: Option<&ResolvedIdentity>) -> bool {
    identity.is_some_and(|i| i.mfa.is_incomplete())
}

/// Evaluate one check category.
///
/// `legal` is only consulted for [`CheckCategory::AffiliateNda`].
pub fn evaluate(
    category: CheckCategory,
    identity: Option<&ResolvedIdentity>,
    legal: Option<&LegalStatus>,
) -> bool {
    match category {
        CheckCategory::Authenticated => is_authenticated(identity),
        CheckCategory::Admin => can_access_admin(identity),
        CheckCategory::Affiliate => can_access_affiliate(identity),
        CheckCategory::AffiliateNda => can_access_affiliate_with_nda(identity, legal),
        CheckCategory::Claims => can_access_claims(identity),
        CheckCategory::MfaRequired => requires_mfa_completion(identity),
    }
}
