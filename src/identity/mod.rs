//! Canonical identity resolution.
//!
//! A request may arrive carrying several overlapping, historically-grown
//! authentication artifacts. This module collapses them into one
//! [`ResolvedIdentity`] that the policy engine evaluates against.
//!
//! # Precedence
//!
//! ```text
//! internal/service principal  >  externally-verified claims  >  session record
//! ```
//!
//! The first matching source wins and lower sources are never consulted.
//! When nothing matches the result is `None`, which is an ordinary negative
//! outcome rather than an error.

mod context;
mod resolved;
mod resolver;

pub use context::{InternalPrincipal, PrincipalId, RequestContext, SessionRecord, VerifiedClaims};
pub use resolved::{IdentityKind, MfaState, Principal, ResolvedIdentity};
pub use resolver::resolve;
