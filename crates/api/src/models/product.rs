//! Catalog product types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use emporium_core::{Currency, ProductId, round_money};

use super::{ValidationError, clean_list, required_text};

/// Stock level below which a product counts as "low stock".
pub const LOW_STOCK_THRESHOLD: i32 = 10;

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: Currency,
    pub category: String,
    pub image: String,
    pub stock: i32,
    pub rating: f64,
    pub num_reviews: i32,
    pub is_active: bool,
    /// Percentage off, 0-100. Informational; checkout charges `price`.
    pub discount: i32,
    pub features: Vec<String>,
    pub brand: Option<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated product ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub currency: Currency,
    pub category: String,
    pub image: String,
    pub stock: i32,
    pub rating: f64,
    pub num_reviews: i32,
    pub is_active: bool,
    pub discount: i32,
    pub features: Vec<String>,
    pub brand: Option<String>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
}

/// Create-product payload.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<Currency>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub stock: Option<i32>,
    pub rating: Option<f64>,
    pub num_reviews: Option<i32>,
    pub is_active: Option<bool>,
    pub discount: Option<i32>,
    pub features: Option<Vec<String>>,
    pub brand: Option<String>,
    pub colors: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
}

impl ProductInput {
    /// Validate the payload and fill in defaults.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` naming the first missing or out-of-range field.
    pub fn validate(self) -> Result<NewProduct, ValidationError> {
        let product = NewProduct {
            name: required_text(self.name, "Product name")?,
            description: required_text(self.description, "Product description")?,
            price: round_money(
                self.price
                    .ok_or_else(|| ValidationError::new("Product price is required"))?,
            ),
            currency: self.currency.unwrap_or_default(),
            category: required_text(self.category, "Product category")?,
            image: required_text(self.image, "Product image")?,
            stock: self.stock.unwrap_or(0),
            rating: self.rating.unwrap_or(0.0),
            num_reviews: self.num_reviews.unwrap_or(0),
            is_active: self.is_active.unwrap_or(true),
            discount: self.discount.unwrap_or(0),
            features: clean_list(self.features.unwrap_or_default()),
            brand: trimmed_optional(self.brand),
            colors: clean_list(self.colors.unwrap_or_default()),
            sizes: clean_list(self.sizes.unwrap_or_default()),
        };
        check_ranges(
            product.price,
            product.stock,
            product.rating,
            product.num_reviews,
            product.discount,
        )?;
        Ok(product)
    }
}

/// Partial product update. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<Currency>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub stock: Option<i32>,
    pub rating: Option<f64>,
    pub num_reviews: Option<i32>,
    pub is_active: Option<bool>,
    pub discount: Option<i32>,
    pub features: Option<Vec<String>>,
    pub brand: Option<String>,
    pub colors: Option<Vec<String>>,
    pub sizes: Option<Vec<String>>,
}

impl ProductPatch {
    /// Apply the patch to `product`, validating the result.
    ///
    /// On error `product` is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if a text field is blanked or a number is
    /// out of range.
    pub fn apply(self, product: &mut Product) -> Result<(), ValidationError> {
        let mut next = product.clone();

        if self.name.is_some() {
            next.name = required_text(self.name, "Product name")?;
        }
        if self.description.is_some() {
            next.description = required_text(self.description, "Product description")?;
        }
        if let Some(price) = self.price {
            next.price = round_money(price);
        }
        if let Some(currency) = self.currency {
            next.currency = currency;
        }
        if self.category.is_some() {
            next.category = required_text(self.category, "Product category")?;
        }
        if self.image.is_some() {
            next.image = required_text(self.image, "Product image")?;
        }
        if let Some(stock) = self.stock {
            next.stock = stock;
        }
        if let Some(rating) = self.rating {
            next.rating = rating;
        }
        if let Some(num_reviews) = self.num_reviews {
            next.num_reviews = num_reviews;
        }
        if let Some(is_active) = self.is_active {
            next.is_active = is_active;
        }
        if let Some(discount) = self.discount {
            next.discount = discount;
        }
        if let Some(features) = self.features {
            next.features = clean_list(features);
        }
        if self.brand.is_some() {
            next.brand = trimmed_optional(self.brand);
        }
        if let Some(colors) = self.colors {
            next.colors = clean_list(colors);
        }
        if let Some(sizes) = self.sizes {
            next.sizes = clean_list(sizes);
        }

        check_ranges(
            next.price,
            next.stock,
            next.rating,
            next.num_reviews,
            next.discount,
        )?;
        *product = next;
        Ok(())
    }
}

fn check_ranges(
    price: Decimal,
    stock: i32,
    rating: f64,
    num_reviews: i32,
    discount: i32,
) -> Result<(), ValidationError> {
    if price < Decimal::ZERO {
        return Err(ValidationError::new("Price cannot be negative"));
    }
    if stock < 0 {
        return Err(ValidationError::new("Stock cannot be negative"));
    }
    if !(0.0..=5.0).contains(&rating) {
        return Err(ValidationError::new("Rating must be between 0 and 5"));
    }
    if num_reviews < 0 {
        return Err(ValidationError::new("Number of reviews cannot be negative"));
    }
    if !(0..=100).contains(&discount) {
        return Err(ValidationError::new("Discount must be between 0 and 100"));
    }
    Ok(())
}

fn trimmed_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}
