//! Domain models for the API.
//!
//! These are validated domain objects, separate from database row types and
//! from request payloads. Request payloads live next to the model they
//! produce and are turned into models through `validate`/`apply` methods.

pub mod cart;
pub mod order;
pub mod product;
pub mod settings;
pub mod user;

pub use cart::{Cart, CartItem};
pub use order::{NewOrder, Order, OrderItem, OrderStateError, PaymentResult};
pub use product::{NewProduct, Product, ProductInput, ProductPatch};
pub use settings::StoreSettings;
pub use user::{NewUser, ProfileChanges, ProfileUpdate, User, UserProfile};

use thiserror::Error;

/// A payload failed validation. The message is shown to the client as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Trim a required text field, rejecting blank input.
pub(crate) fn required_text(value: Option<String>, field: &str) -> Result<String, ValidationError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError(format!("{field} is required")))
}

/// Trim a list of tags, dropping blanks.
pub(crate) fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .collect()
}
