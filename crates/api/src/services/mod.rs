//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Password accounts and bearer tokens
//! - `cart` - In-memory per-user carts
//! - `checkout` - Order pricing and placement
//! - `analytics` - Sales and product aggregates for the admin console

pub mod analytics;
pub mod auth;
pub mod cart;
pub mod checkout;
