//! Log subscriber setup.
//!
//! All emission goes through `tracing`; this module only installs the
//! subscriber the binary writes to.

mod tracing_init;

pub use tracing_init::*;
