//! User domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use emporium_core::{Address, Email, Phone, Role, UserId};

use super::ValidationError;

/// Country stored on a user address when none is given.
pub const DEFAULT_COUNTRY: &str = "United States";

const NAME_MIN: usize = 2;
const NAME_MAX: usize = 100;

/// A shop account (domain type).
///
/// Holds the password hash, so it is never serialised directly; responses
/// go through [`UserProfile`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    /// Argon2id PHC string.
    pub password_hash: String,
    pub role: Role,
    pub address: Option<Address>,
    pub phone: Option<Phone>,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Data needed to insert a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
}

/// Public projection of a [`User`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: Role,
    pub address: Option<Address>,
    pub phone: Option<Phone>,
    pub is_active: bool,
    pub email_verified: bool,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
            address: user.address.clone(),
            phone: user.phone.clone(),
            is_active: user.is_active,
            email_verified: user.email_verified,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// Profile fields a user may change about themselves.
///
/// Absent or blank fields are left untouched.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<Address>,
}

impl ProfileUpdate {
    /// Validate the update into the changes to store.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if the name or phone number is invalid.
    pub fn validate(self) -> Result<ProfileChanges, ValidationError> {
        let name = self
            .name
            .filter(|n| !n.trim().is_empty())
            .map(|n| validate_name(&n))
            .transpose()?;

        let phone = self
            .phone
            .filter(|p| !p.trim().is_empty())
            .map(|p| {
                Phone::parse(&p).map_err(|e| {
                    ValidationError(format!("Please provide a valid phone number: {e}"))
                })
            })
            .transpose()?;

        Ok(ProfileChanges {
            name,
            phone,
            address: self.address.as_ref().map(normalize_address),
        })
    }
}

/// Validated profile changes. `None` fields keep their stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileChanges {
    pub name: Option<String>,
    pub phone: Option<Phone>,
    pub address: Option<Address>,
}

impl ProfileChanges {
    pub fn apply(&self, user: &mut User) {
        if let Some(name) = &self.name {
            user.name.clone_from(name);
        }
        if let Some(phone) = &self.phone {
            user.phone = Some(phone.clone());
        }
        if let Some(address) = &self.address {
            user.address = Some(address.clone());
        }
    }
}

/// Trim and length-check a display name.
///
/// # Errors
///
/// Returns `ValidationError` unless the trimmed name is 2-100 characters.
pub fn validate_name(raw: &str) -> Result<String, ValidationError> {
    let name = raw.trim();
    let len = name.chars().count();
    if len < NAME_MIN {
        return Err(ValidationError::new("Name must be at least 2 characters"));
    }
    if len > NAME_MAX {
        return Err(ValidationError::new("Name cannot exceed 100 characters"));
    }
    Ok(name.to_owned())
}

/// Trim an address and fill in the default country.
#[must_use]
pub fn normalize_address(address: &Address) -> Address {
    let mut address = address.trimmed();
    if address.country.is_empty() {
        address.country = DEFAULT_COUNTRY.to_owned();
    }
    address
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: UserId::new(1),
            name: "Jane Doe".into(),
            email: Email::parse("jane@example.com").unwrap(),
            password_hash: "$argon2id$stub".into(),
            role: Role::User,
            address: None,
            phone: None,
            is_active: true,
            email_verified: false,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_validate_name_bounds() {
        assert_eq!(validate_name("  Al  ").unwrap(), "Al");
        assert!(validate_name("A").is_err());
        assert!(validate_name(&"x".repeat(101)).is_err());
    }

    #[test]
    fn test_profile_update_skips_blank_fields() {
        let mut u = user();
        let update = ProfileUpdate {
            name: Some("   ".into()),
            phone: Some("021 555 0100".into()),
            address: None,
        };
        let changes = update.validate().unwrap();
        assert_eq!(changes.name, None);
        changes.apply(&mut u);
        assert_eq!(u.name, "Jane Doe");
        assert_eq!(u.phone.unwrap().as_str(), "021 555 0100");
    }

    #[test]
    fn test_profile_update_defaults_country() {
        let mut u = user();
        let update = ProfileUpdate {
            address: Some(Address {
                street: " 1 Main Rd ".into(),
                city: "Durban".into(),
                ..Address::default()
            }),
            ..ProfileUpdate::default()
        };
        update.validate().unwrap().apply(&mut u);
        let address = u.address.unwrap();
        assert_eq!(address.street, "1 Main Rd");
        assert_eq!(address.country, DEFAULT_COUNTRY);
    }

    #[test]
    fn test_profile_update_rejects_bad_phone() {
        let update = ProfileUpdate {
            phone: Some("call me".into()),
            ..ProfileUpdate::default()
        };
        assert!(update.validate().is_err());
    }

    #[test]
    fn test_profile_never_contains_password_hash() {
        let json = serde_json::to_string(&UserProfile::from(&user())).unwrap();
        assert!(!json.contains("argon2"));
        assert!(json.contains("\"isActive\":true"));
    }
}
