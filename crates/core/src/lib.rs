//! StorePulse Core - Shared types library.
//!
//! This crate provides common types used across all StorePulse components:
//! - `app` - Embedded app backend (dashboard action and webhooks)
//! - `cli` - Command-line tools for migrations and offline sync
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money amounts, emails,
//!   tenants and event types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
