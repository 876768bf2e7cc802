//! Core types for Shopfront.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod notice;

pub use id::*;
pub use money::format_usd;
pub use notice::{Notice, NoticeKind};
