//! Shopfront Core - Shared types library.
//!
//! This crate provides common types used across all Shopfront components:
//! - `client` - HTTP API client and cart state machinery
//! - `cli` - Command-line driver for the client
//!
//! # Architecture
//!
//! The core crate contains only types and helpers - no I/O, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, money formatting, and
//!   transient notices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
