//! qualities - staged verification pipeline
//!
//! Runs an ordered list of external checks (policy scans, type checks,
//! linters, tests) as one pipeline. Lint stages can be narrowed to changed
//! files, an optional secondary test suite runs only when its inputs moved,
//! and stages bound to a configuration unit refuse to run while the unit's
//! content-addressed manifest has drifted.
//!
//! - [`core`] - Models, ports and I/O-free services
//! - [`adapters`] - git, process and filesystem implementations of the ports
//! - [`config`] - `.qualities.toml`
//! - [`output`] - Human and JSON rendering

// Deny all clippy warnings in this crate
#![deny(clippy::all, clippy::pedantic, clippy::nursery, unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unused_import_braces,
    unused_qualifications
)]
// Allow some pedantic lints that are too noisy or not applicable
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::cargo_common_metadata
)]

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod adapters;
pub mod config;
pub mod core;
pub mod output;
pub mod paths;
