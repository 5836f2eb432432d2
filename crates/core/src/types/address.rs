//! Postal address shared by user profiles and order shipping details.

use serde::{Deserialize, Serialize};

/// A postal address.
///
/// Every field is optional text so that partially filled profiles can be
/// stored; checkout requires [`Address::is_complete`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

impl Address {
    /// Whether street, city, postal code and country are all present.
    ///
    /// State/province is optional since many countries don't use one.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [&self.street, &self.city, &self.zip_code, &self.country]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    /// Single-line rendering for admin listings.
    #[must_use]
    pub fn full_address(&self) -> String {
        [&self.street, &self.city, &self.state, &self.zip_code, &self.country]
            .iter()
            .map(|field| field.trim())
            .filter(|field| !field.is_empty())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Returns a copy with surrounding whitespace removed from every field.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            street: self.street.trim().to_owned(),
            city: self.city.trim().to_owned(),
            state: self.state.trim().to_owned(),
            zip_code: self.zip_code.trim().to_owned(),
            country: self.country.trim().to_owned(),
        }
    }
}
