//! Shared traits and value types for ledger entities.

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainError;

/// Exposes a stable identifier for entities stored in the ledger.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Non-negative, finite monetary quantity.
///
/// The only way to obtain an `Amount` is through [`Amount::new`] (or its
/// `TryFrom`/`FromStr`/serde equivalents), so every stored amount has already
/// been checked. Balances are plain `f64` because they may go negative.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Amount(f64);

impl Amount {
    pub const ZERO: Amount = Amount(0.0);

    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() || value < 0.0 {
            return Err(DomainError::InvalidAmount(value.to_string()));
        }
        if value == 0.0 {
            return Ok(Self::ZERO);
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Amount {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Amount::new(value)
    }
}

impl From<Amount> for f64 {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl FromStr for Amount {
    type Err = DomainError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let value = trimmed
            .parse::<f64>()
            .map_err(|_| DomainError::InvalidAmount(trimmed.to_string()))?;
        Amount::new(value)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to an image: either an inline `data:` URI or a URL/path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_data_uri(&self) -> bool {
        self.0.starts_with("data:")
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_data_uri() {
            f.write_str("[inline image]")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Midnight UTC of `day`, the timestamp a bare calendar date stands for.
pub fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amount_rejects_negative_and_non_finite_values() {
        assert!(matches!(
            Amount::new(-1.0),
            Err(DomainError::InvalidAmount(_))
        ));
        assert!(Amount::new(f64::NAN).is_err());
        assert!(Amount::new(f64::INFINITY).is_err());
        assert_eq!(Amount::new(0.0).unwrap(), Amount::ZERO);
        assert_eq!(Amount::new(12.5).unwrap().value(), 12.5);
    }

    #[test]
    fn amount_parses_trimmed_text() {
        let amount: Amount = " 250.75 ".parse().unwrap();
        assert_eq!(amount.value(), 250.75);

        let err = "abc".parse::<Amount>().unwrap_err();
        assert_eq!(err, DomainError::InvalidAmount("abc".into()));
    }

    #[test]
    fn amount_deserialization_revalidates() {
        let ok: Amount = serde_json::from_str("42").unwrap();
        assert_eq!(ok.value(), 42.0);

        let err = serde_json::from_str::<Amount>("-3").unwrap_err();
        assert!(err.to_string().contains("Invalid amount"), "{err}");
    }

    #[test]
    fn image_ref_hides_inline_payloads() {
        let inline = ImageRef::new("data:image/png;base64,AAAA");
        assert!(inline.is_data_uri());
        assert_eq!(inline.to_string(), "[inline image]");

        let url = ImageRef::new("https://example.com/a.png");
        assert!(!url.is_data_uri());
        assert_eq!(url.to_string(), "https://example.com/a.png");
    }

    #[test]
    fn start_of_day_is_utc_midnight() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert_eq!(start_of_day(day).to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }
}
