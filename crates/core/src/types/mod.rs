//! Core types for Emporium.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod money;
pub mod phone;
pub mod status;

pub use address::Address;
pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Currency, CurrencyError, Money, round_money};
pub use phone::{Phone, PhoneError};
pub use status::*;
