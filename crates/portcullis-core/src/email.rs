//! Validated email addresses.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Error returned for a string that is not an acceptable email address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid email address '{0}'")]
pub struct InvalidEmail(pub String);

fn email_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$")
            .expect("email pattern is a valid regex")
    })
}

/// An email address that passed syntactic validation.
///
/// Only ASCII addresses are accepted since the value travels in a request
/// header.
///
/// # Example
///
/// ```
/// use portcullis_core::EmailAddress;
///
/// let email: EmailAddress = "alice@example.com".parse().unwrap();
/// assert_eq!(email.as_str(), "alice@example.com");
/// assert!("alice@localhost".parse::<EmailAddress>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Validates and wraps an address.
    pub fn parse(value: impl Into<String>) -> Result<Self, InvalidEmail> {
        let value = value.into();
        if email_pattern().is_match(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidEmail(value))
        }
    }

    /// Returns the address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part after `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.rsplit_once('@').map_or("", |(_, domain)| domain)
    }
}

impl FromStr for EmailAddress {
    type Err = InvalidEmail;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for EmailAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for EmailAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_common_addresses() {
        for raw in [
            "alice@example.com",
            "bob.smith+tag@mail.example.co.uk",
            "x_y-z@sub-domain.example.org",
        ] {
            assert!(EmailAddress::parse(raw).is_ok(), "{raw} should be valid");
        }
    }

    #[test]
    fn test_rejects_malformed_addresses() {
        for raw in [
            "",
            "alice",
            "alice@",
            "@example.com",
            "alice@example",
            "alice smith@example.com",
            "alice@@example.com",
            "алиса@example.com",
        ] {
            assert!(EmailAddress::parse(raw).is_err(), "{raw} should be invalid");
        }
    }

    #[test]
    fn test_domain() {
        let email = EmailAddress::parse("carol@corp.example.net").unwrap();
        assert_eq!(email.domain(), "corp.example.net");
    }

    #[test]
    fn test_serde_validates() {
        let ok: EmailAddress = serde_json::from_str("\"dave@example.com\"").unwrap();
        assert_eq!(ok.to_string(), "dave@example.com");
        assert!(serde_json::from_str::<EmailAddress>("\"not-an-email\"").is_err());
    }
}
