//! Per-category access guards.
//!
//! Enforcement uses the policy engine only. Each guard then replays the
//! legacy check for the same category through the divergence logger, which
//! observes but never changes the outcome.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use serde_json::{Map, Value};

use super::AuthError;
use crate::{
    AppState,
    divergence::{Comparison, RequestMeta, legacy},
    identity::{RequestContext, ResolvedIdentity},
    policy::{self, CheckCategory, LegalStatus},
};

pub async fn require_authenticated(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    check(&state, CheckCategory::Authenticated, &req)?;
    Ok(next.run(req).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    check(&state, CheckCategory::Admin, &req)?;
    Ok(next.run(req).await)
}

pub async fn require_affiliate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    check(&state, CheckCategory::Affiliate, &req)?;
    Ok(next.run(req).await)
}

/// Affiliate access that also needs a signed NDA.
///
/// The legal status comes from a [`LegalStatus`] request extension
/// attached by the contracts collaborator; without one access is denied.
pub async fn require_affiliate_nda(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    check(&state, CheckCategory::AffiliateNda, &req)?;
    Ok(next.run(req).await)
}

pub async fn require_claims(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    check(&state, CheckCategory::Claims, &req)?;
    Ok(next.run(req).await)
}

fn check(state: &AppState, category: CheckCategory, req: &Request) -> Result<(), AuthError> {
    let extensions = req.extensions();
    let Some(ctx) = extensions.get::<RequestContext>() else {
        return Err(AuthError::Internal(
            "identity resolution layer is not installed".into(),
        ));
    };
    let identity = extensions.get::<ResolvedIdentity>();
    let legal = extensions.get::<LegalStatus>();
    let meta = RequestMeta::from_request_parts(req.method(), req.uri());

    let allowed = policy::evaluate(category, identity, legal);
    shadow(state, category, &meta, ctx, identity, legal, allowed);

    if allowed {
        return Ok(());
    }
    if !policy::is_authenticated(identity) {
        return Err(AuthError::Unauthenticated);
    }

    state
        .divergence
        .shadow_check(CheckCategory::MfaRequired, &meta, ctx, identity, None);
    if policy::requires_mfa_completion(identity) {
        return Err(AuthError::MfaRequired);
    }

    Err(AuthError::Forbidden(format!(
        "Access to {} resources denied",
        category
    )))
}

fn shadow(
    state: &AppState,
    category: CheckCategory,
    meta: &RequestMeta,
    ctx: &RequestContext,
    identity: Option<&ResolvedIdentity>,
    legal: Option<&LegalStatus>,
    policy_allowed: bool,
) {
    if !state.divergence.is_enabled() {
        return;
    }

    if category != CheckCategory::AffiliateNda {
        state
            .divergence
            .shadow_check(category, meta, ctx, identity, legal);
        return;
    }

    // The legacy NDA gate read the legal record directly, so pass it along.
    let comparison = Comparison {
        legacy_allowed: legacy::affiliate_with_nda(ctx, legal),
        policy_allowed,
    };
    let mut context = Map::new();
    context.insert(
        "has_nda".into(),
        legal.map_or(Value::Null, |l| Value::Bool(l.nda)),
    );
    context.insert(
        "has_contract".into(),
        legal
            .and_then(|l| l.contract)
            .map_or(Value::Null, Value::Bool),
    );
    state.divergence.log_with_context(
        category,
        meta,
        comparison,
        identity,
        ctx.session.as_ref(),
        context,
    );
}
