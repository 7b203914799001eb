//! Shared database repository test infrastructure
//!
//! The same test logic runs against every `IdentityMapRepo` backend:
//!
//! - **Unit tests (SQLite, memory)**: fast, run with every `cargo test`
//! - **Integration tests (PostgreSQL)**: testcontainers, run with `cargo test -- --ignored`
//!
//! # Running tests
//!
//! ```bash
//! cargo test                       # Run fast SQLite and memory tests only
//! cargo test -- --ignored          # Run PostgreSQL integration tests (requires Docker)
//! cargo test -- --include-ignored  # Run all tests
//! ```
