use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::IdentityKind;

/// Legacy identity source a map row was recorded for.
///
/// Each [`IdentityKind`] maps to exactly one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentitySource {
    InternalService,
    VeteranOidc,
    User,
    VltAffiliate,
}

impl IdentitySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentitySource::InternalService => "internal_service",
            IdentitySource::VeteranOidc => "veteran_oidc",
            IdentitySource::User => "user",
            IdentitySource::VltAffiliate => "vlt_affiliate",
        }
    }
}

impl From<IdentityKind> for IdentitySource {
    fn from(kind: IdentityKind) -> Self {
        match kind {
            IdentityKind::Internal => IdentitySource::InternalService,
            IdentityKind::Veteran => IdentitySource::VeteranOidc,
            IdentityKind::User => IdentitySource::User,
            IdentityKind::VltAffiliate => IdentitySource::VltAffiliate,
        }
    }
}

impl fmt::Display for IdentitySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentitySource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "internal_service" => Ok(IdentitySource::InternalService),
            "veteran_oidc" => Ok(IdentitySource::VeteranOidc),
            "user" => Ok(IdentitySource::User),
            "vlt_affiliate" => Ok(IdentitySource::VltAffiliate),
            other => Err(format!("unknown identity source '{other}'")),
        }
    }
}

/// One `(source, legacy_id) -> identity_id` correlation.
///
/// Rows are created lazily on first sighting and never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityMapRow {
    pub source: IdentitySource,
    pub legacy_id: String,
    /// Opaque canonical id shared by every legacy id of one person
    pub identity_id: String,
    pub created_at: DateTime<Utc>,
}
