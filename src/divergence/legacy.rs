//! Recomputation of the legacy, per-endpoint access checks.
//!
//! These mirror what older handlers did inline against raw session fields.
//! They are never used for enforcement; they exist so the
//! [`DivergenceLogger`](super::DivergenceLogger) can diff them against the
//! policy engine while the old code paths are retired.

use crate::{
    identity::{RequestContext, SessionRecord},
    policy::{CheckCategory, LegalStatus},
};

fn session(ctx: &RequestContext) -> Option<&SessionRecord> {
    ctx.session.as_ref()
}

fn session_role(ctx: &RequestContext) -> Option<&str> {
    session(ctx).and_then(|s| s.user_role.as_deref())
}

/// Legacy handlers only looked at `mfaPending` and ignored `mfaVerified`.
fn session_mfa_pending(ctx: &RequestContext) -> bool {
    session(ctx).and_then(|s| s.mfa_pending).unwrap_or(false)
}

pub fn authenticated(ctx: &RequestContext) -> bool {
    session(ctx).is_some_and(|s| s.user_id.is_some())
}

pub fn admin(ctx: &RequestContext) -> bool {
    authenticated(ctx)
        && matches!(session_role(ctx), Some("admin") | Some("master"))
        && !session_mfa_pending(ctx)
}

pub fn affiliate(ctx: &RequestContext) -> bool {
    authenticated(ctx) && session_role(ctx) == Some("affiliate") && !session_mfa_pending(ctx)
}

/// The old NDA gate checked the NDA flag only; contract status was not
/// consulted.
pub fn affiliate_with_nda(ctx: &RequestContext, legal: Option<&LegalStatus>) -> bool {
    affiliate(ctx) && legal.is_some_and(|l| l.nda)
}

pub fn claims(ctx: &RequestContext) -> bool {
    ctx.claims.as_ref().is_some_and(|c| c.sub.is_some())
}

pub fn mfa_required(ctx: &RequestContext) -> bool {
    session(ctx).is_some_and(|s| s.mfa_pending == Some(true) && s.mfa_verified != Some(true))
}

/// Evaluate the legacy check for a category.
pub fn evaluate(
    category: CheckCategory,
    ctx: &RequestContext,
    legal: Option<&LegalStatus>,
) -> bool {
    match category {
        CheckCategory::Authenticated => authenticated(ctx),
        CheckCategory::Admin => admin(ctx),
        CheckCategory::Affiliate => affiliate(ctx),
        CheckCategory::AffiliateNda => affiliate_with_nda(ctx, legal),
        CheckCategory::Claims => claims(ctx),
        CheckCategory::MfaRequired => mfa_required(ctx),
    }
}
