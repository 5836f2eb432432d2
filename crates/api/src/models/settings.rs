//! Store-wide settings edited from the admin console.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use emporium_core::{Currency, Email};

use super::ValidationError;

/// Store settings. Checkout reads the shipping and VAT fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreSettings {
    pub store_name: String,
    pub store_description: String,
    pub contact_email: String,
    pub support_phone: String,
    /// Flat shipping fee charged per order.
    pub default_shipping_fee: Decimal,
    /// Orders whose items total reaches this amount ship free. `None`
    /// disables free shipping.
    pub free_shipping_threshold: Option<Decimal>,
    /// VAT as a percentage of the items total.
    pub vat_rate: Decimal,
    pub currency: Currency,
    pub maintenance_mode: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: "e-Store".to_owned(),
            store_description: "Your premier e-commerce destination".to_owned(),
            contact_email: "contact@yourstore.com".to_owned(),
            support_phone: "+27 11 123 4567".to_owned(),
            default_shipping_fee: Decimal::new(4500, 2),
            free_shipping_threshold: None,
            vat_rate: Decimal::from(15),
            currency: Currency::Zar,
            maintenance_mode: false,
        }
    }
}

impl StoreSettings {
    /// Check ranges and normalise text fields.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank store name, an invalid contact
    /// email, a negative fee or threshold, or a VAT rate outside 0-100.
    pub fn validate(mut self) -> Result<Self, ValidationError> {
        self.store_name = self.store_name.trim().to_owned();
        if self.store_name.is_empty() {
            return Err(ValidationError::new("Store name is required"));
        }

        let contact = self.contact_email.trim();
        if !contact.is_empty() {
            self.contact_email = Email::parse(contact)
                .map_err(|_| ValidationError::new("Contact email is invalid"))?
                .into_inner();
        }

        if self.default_shipping_fee < Decimal::ZERO {
            return Err(ValidationError::new("Shipping fee cannot be negative"));
        }
        if self
            .free_shipping_threshold
            .is_some_and(|t| t < Decimal::ZERO)
        {
            return Err(ValidationError::new(
                "Free shipping threshold cannot be negative",
            ));
        }
        if self.vat_rate < Decimal::ZERO || self.vat_rate > Decimal::ONE_HUNDRED {
            return Err(ValidationError::new("VAT rate must be between 0 and 100"));
        }
        Ok(self)
    }
}
