use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::{
    AppState,
    identity::{InternalPrincipal, RequestContext, SessionRecord, VerifiedClaims, resolve},
};

/// Resolve the canonical identity once per request.
///
/// Reads whatever identity sources upstream layers attached, inserts the
/// [`RequestContext`] and, when one matched, the
/// [`ResolvedIdentity`](crate::identity::ResolvedIdentity) for handlers and
/// guards. Identity map bookkeeping is dispatched in the background and
/// never delays or fails the request.
pub async fn resolve_identity_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let extensions = req.extensions();
    let ctx = RequestContext {
        internal: extensions.get::<InternalPrincipal>().cloned(),
        claims: extensions.get::<VerifiedClaims>().cloned(),
        session: extensions.get::<SessionRecord>().cloned(),
    };

    if let Some(identity) = resolve(&ctx) {
        tracing::trace!(
            kind = %identity.kind(),
            role = ?identity.role(),
            "Resolved request identity"
        );
        if let Some(identity_map) = &state.identity_map {
            identity_map.record_detached(identity.clone());
        }
        req.extensions_mut().insert(identity);
    }
    req.extensions_mut().insert(ctx);

    next.run(req).await
}
