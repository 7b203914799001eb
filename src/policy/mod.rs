//! Policy engine: the only sanctioned authorization logic.
//!
//! Every predicate here is total and side-effect free. Each one takes
//! `Option<&ResolvedIdentity>` and returns `false` for `None`, so callers
//! never need to special-case anonymous requests.
//!
//! No other code path may re-derive equivalent decisions from raw session
//! fields. Legacy code that still does is recomputed in
//! [`crate::divergence::legacy`] purely so the two can be diffed.

mod category;
mod predicates;

pub use category::CheckCategory;
pub use predicates::{
    ADMIN_ROLES, AFFILIATE_ROLE, INTERNAL_ADMIN_ROLES, LegalStatus, can_access_admin,
    can_access_affiliate, can_access_affiliate_with_nda, can_access_claims, evaluate,
    is_authenticated, requires_mfa_completion,
};
