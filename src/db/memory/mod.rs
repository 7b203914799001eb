//! In-process repository implementations for running without a database.

mod identity_map;

pub use identity_map::MemoryIdentityMapRepo;
