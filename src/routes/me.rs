use axum::{Extension, Json, extract::State};
use serde::Serialize;

use crate::{
    AppState,
    identity::ResolvedIdentity,
    middleware::AuthError,
    policy::{self, CheckCategory},
};

/// What the caller resolved to, and what the policy engine lets it do.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub identity: ResolvedIdentity,
    /// Canonical id, when identity map bookkeeping has one
    pub identity_id: Option<String>,
    pub capabilities: Capabilities,
}

#[derive(Debug, Serialize)]
pub struct Capabilities {
    pub admin: bool,
    pub affiliate: bool,
    pub claims: bool,
    pub mfa_required: bool,
}

impl Capabilities {
    fn of(identity: &ResolvedIdentity) -> Self {
        let identity = Some(identity);
        Self {
            admin: policy::evaluate(CheckCategory::Admin, identity, None),
            affiliate: policy::evaluate(CheckCategory::Affiliate, identity, None),
            claims: policy::evaluate(CheckCategory::Claims, identity, None),
            mfa_required: policy::evaluate(CheckCategory::MfaRequired, identity, None),
        }
    }
}

/// `GET /v1/me`. Mounted behind `require_authenticated`.
#[tracing::instrument(name = "me.get", skip_all)]
pub async fn me(
    State(state): State<AppState>,
    identity: Option<Extension<ResolvedIdentity>>,
) -> Result<Json<MeResponse>, AuthError> {
    let Some(Extension(identity)) = identity else {
        return Err(AuthError::Unauthenticated);
    };

    let identity_id = match &state.identity_map {
        Some(identity_map) => identity_map.lookup(&identity).await,
        None => None,
    };

    Ok(Json(MeResponse {
        capabilities: Capabilities::of(&identity),
        identity,
        identity_id,
    }))
}
