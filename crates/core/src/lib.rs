//! Emporium Core - Shared domain types.
//!
//! This crate provides the types used across all Emporium components:
//! - `api` - JSON REST API serving the storefront and admin SPAs
//! - `cli` - Command-line tools for migrations, seeding and admin users
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no database
//! access, no HTTP. Database encoding for the newtypes is available behind
//! the `postgres` feature.
//!
//! # Modules
//!
//! - [`types`] - Type-safe IDs, emails, phones, money, addresses and statuses

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
