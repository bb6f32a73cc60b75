//! Common test utilities shared across test types
//!
//! - `fixtures.rs` - Test data builders
//! - `git_repo.rs` - Temporary project / git repository helper
//! - `mocks.rs` - In-memory implementations of the port traits

pub mod mocks;
