//! Adapter tests
//!
//! These exercise the real adapters against temporary directories, git
//! repositories and child processes.

#[path = "../common/mod.rs"]
#[allow(dead_code)]
mod common;

mod process_test;
