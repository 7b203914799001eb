//! Server-side sessions and login-time session establishment.

mod cookie;
mod establisher;
mod state;
mod store;

pub use cookie::{issue_cookie, remove_cookie};
pub use establisher::SessionEstablisher;
pub use state::{Session, SessionFields, SessionId, SessionState};
pub use store::{MemorySessionStore, SessionError, SessionResult, SessionStore};
