//! Phone number type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Phone`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PhoneError {
    #[error("phone number cannot be empty")]
    Empty,
    #[error("phone number contains invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("phone number must have between {min} and {max} digits")]
    DigitCount { min: usize, max: usize },
}

/// A loosely validated phone number.
///
/// Accepts an optional leading `+`, digits, spaces, dashes, dots and
/// parentheses. The original formatting is preserved.
///
/// ```
/// use emporium_core::Phone;
///
/// assert!(Phone::parse("+27 (21) 555-0100").is_ok());
/// assert!(Phone::parse("call me").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct Phone(String);

impl Phone {
    pub const MIN_DIGITS: usize = 10;
    pub const MAX_DIGITS: usize = 15;

    /// Parse a `Phone` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, contains characters
    /// other than digits and separators, or has a digit count outside 10-15.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PhoneError::Empty);
        }

        let mut digits = 0;
        for (i, c) in s.chars().enumerate() {
            match c {
                '0'..='9' => digits += 1,
                '+' if i == 0 => {}
                ' ' | '-' | '.' | '(' | ')' => {}
                other => return Err(PhoneError::InvalidCharacter(other)),
            }
        }

        if !(Self::MIN_DIGITS..=Self::MAX_DIGITS).contains(&digits) {
            return Err(PhoneError::DigitCount {
                min: Self::MIN_DIGITS,
                max: Self::MAX_DIGITS,
            });
        }

        Ok(Self(s.to_owned()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Phone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Phone {
    type Error = PhoneError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Phone> for String {
    fn from(phone: Phone) -> Self {
        phone.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_common_formats() {
        assert!(Phone::parse("0215550100").is_ok());
        assert!(Phone::parse("+1 555.010.0199").is_ok());
        assert!(Phone::parse("(021) 555-0100").is_ok());
    }

    #[test]
    fn test_parse_rejects_invalid() {
        assert_eq!(Phone::parse(""), Err(PhoneError::Empty));
        assert_eq!(Phone::parse("555-01x0"), Err(PhoneError::InvalidCharacter('x')));
        assert_eq!(Phone::parse("12+3456789"), Err(PhoneError::InvalidCharacter('+')));
        assert!(matches!(
            Phone::parse("12345"),
            Err(PhoneError::DigitCount { .. })
        ));
    }
}
