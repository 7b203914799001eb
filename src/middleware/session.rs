use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tower_cookies::Cookies;

use crate::{
    AppState,
    session::{Session, SessionId},
};

/// Load the caller's session from the session cookie.
///
/// Always inserts a [`Session`] handle (anonymous when there is no usable
/// cookie) so login-type handlers can establish one. A
/// [`SessionRecord`](crate::identity::SessionRecord) is inserted for the
/// resolver only when the stored state carries data. Store failures are
/// treated as no session.
pub async fn session_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let session_id = req
        .extensions()
        .get::<Cookies>()
        .and_then(|cookies| cookies.get(&state.config.session.cookie_name))
        .and_then(|cookie| cookie.value().parse::<SessionId>().ok());

    let session = match session_id {
        Some(id) => match state.sessions.load(&id).await {
            Ok(Some(stored)) => Session::new(Some(id), stored),
            Ok(None) => {
                tracing::debug!(session_id = %id, "Session cookie refers to unknown or expired session");
                Session::anonymous()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load session, continuing without one");
                Session::anonymous()
            }
        },
        None => Session::anonymous(),
    };

    if !session.state.is_empty() {
        req.extensions_mut().insert(session.state.to_record());
    }
    req.extensions_mut().insert(session);

    next.run(req).await
}
