use serde::{Deserialize, Serialize};

/// The access-check categories that are evaluated (and shadow-compared).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckCategory {
    Authenticated,
    Admin,
    Affiliate,
    AffiliateNda,
    Claims,
    MfaRequired,
}

impl CheckCategory {
    pub const COUNT: usize = 6;

    pub const ALL: [CheckCategory; Self::COUNT] = [
        CheckCategory::Authenticated,
        CheckCategory::Admin,
        CheckCategory::Affiliate,
        CheckCategory::AffiliateNda,
        CheckCategory::Claims,
        CheckCategory::MfaRequired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckCategory::Authenticated => "authenticated",
            CheckCategory::Admin => "admin",
            CheckCategory::Affiliate => "affiliate",
            CheckCategory::AffiliateNda => "affiliate_nda",
            CheckCategory::Claims => "claims",
            CheckCategory::MfaRequired => "mfa_required",
        }
    }

    /// Stable index into per-category tables.
    pub(crate) fn index(&self) -> usize {
        match self {
            CheckCategory::Authenticated => 0,
            CheckCategory::Admin => 1,
            CheckCategory::Affiliate => 2,
            CheckCategory::AffiliateNda => 3,
            CheckCategory::Claims => 4,
            CheckCategory::MfaRequired => 5,
        }
    }
}

impl std::fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
