//! Core domain logic for qualities
//!
//! This module contains pure business logic with no I/O dependencies.
//! All external interactions are abstracted through port traits.
//!
//! ## Architecture
//!
//! - `models/` - Domain types (stages, results, manifests, scope inputs, violations)
//! - `services/` - Scanner, manifest, scope and pipeline logic
//! - `ports/` - Trait definitions for external dependencies

pub mod models;
pub mod ports;
pub mod services;
