//! Core types for StorePulse.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod event;
pub mod id;
pub mod money;
pub mod tenant;

pub use email::{Email, EmailError};
pub use event::{EventType, UnknownEventType};
pub use id::*;
pub use money::{parse_amount, round_money};
pub use tenant::TenantContext;
