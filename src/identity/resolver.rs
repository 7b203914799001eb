use super::{
    IdentityKind, InternalPrincipal, MfaState, Principal, RequestContext, ResolvedIdentity,
    SessionRecord, VerifiedClaims,
};

/// Resolve the canonical identity for a request.
///
/// Pure and total: missing or partial fields fall back to safe defaults and
/// never cause a panic. Returns `None` when no source matches.
pub fn resolve(ctx: &RequestContext) -> Option<ResolvedIdentity> {
    if let Some(internal) = ctx.internal.as_ref().filter(|p| p.service) {
        return Some(from_internal(internal));
    }

    if let Some(claims) = &ctx.claims
        && let Some(identity) = from_claims(claims)
    {
        return Some(identity);
    }

    ctx.session.as_ref().and_then(from_session)
}

fn from_internal(principal: &InternalPrincipal) -> ResolvedIdentity {
    let id = principal
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();

    ResolvedIdentity::new(
        Principal::new(IdentityKind::Internal, id).with_role(principal.role.clone()),
    )
}

fn from_claims(claims: &VerifiedClaims) -> Option<ResolvedIdentity> {
    let sub = claims.sub.as_ref()?;
    Some(
        ResolvedIdentity::new(Principal::new(IdentityKind::Veteran, sub.clone()))
            .with_mfa(MfaState::pre_verified()),
    )
}

fn from_session(session: &SessionRecord) -> Option<ResolvedIdentity> {
    let user_id = session.user_id?;

    // Flags are copied independently; (pending, verified) = (true, true) is
    // preserved rather than normalized.
    let mfa = MfaState::new(
        session.mfa_pending.unwrap_or(false),
        session.mfa_verified.unwrap_or(false),
    );

    let mut identity = ResolvedIdentity::new(
        Principal::numeric(IdentityKind::User, user_id).with_role(session.user_role.clone()),
    )
    .with_mfa(mfa);

    if let Some(affiliate_id) = session.vlt_affiliate_id {
        identity = identity.with_secondary(Principal::numeric(
            IdentityKind::VltAffiliate,
            affiliate_id,
        ));
    }

    Some(identity)
}
