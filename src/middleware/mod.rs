mod error;
mod guard;
mod identity;
mod session;

pub use error::AuthError;
pub use guard::{
    require_admin, require_affiliate, require_affiliate_nda, require_authenticated,
    require_claims,
};
pub use identity::resolve_identity_middleware;
pub use session::session_middleware;
