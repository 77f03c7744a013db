//! Human-readable order numbers.
//!
//! Format: `ORD-<unix millis>-<9 uppercase base36 chars>`, e.g.
//! `ORD-1718035200123-K3Z9Q0A1B`. Uniqueness comes from the timestamp plus
//! ~46 bits of randomness; the database enforces it with a `UNIQUE`
//! constraint and checkout regenerates on collision.

use core::fmt;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

const PREFIX: &str = "ORD";
const TOKEN_LEN: usize = 9;
const BASE36_UPPER: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderNumberError {
    #[error("order number must start with \"ORD-\"")]
    MissingPrefix,
    #[error("order number timestamp must be digits")]
    InvalidTimestamp,
    #[error("order number token must be 9 uppercase base36 characters")]
    InvalidToken,
}

/// An order number shown to customers and stored on the order header.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Generate a new order number for the current instant.
    #[must_use]
    pub fn generate() -> Self {
        Self::generate_at(Utc::now(), &mut rand::rng())
    }

    /// Generate an order number for a given instant using the supplied RNG.
    #[must_use]
    pub fn generate_at<R: Rng>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let token: String = (0..TOKEN_LEN)
            .map(|_| {
                let idx = rng.random_range(0..BASE36_UPPER.len());
                char::from(BASE36_UPPER.get(idx).copied().unwrap_or(b'0'))
            })
            .collect();

        Self(format!("{PREFIX}-{}-{token}", now.timestamp_millis()))
    }

    /// Parse and validate an existing order number.
    ///
    /// # Errors
    ///
    /// Returns an `OrderNumberError` describing which segment is malformed.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let rest = s
            .strip_prefix(PREFIX)
            .and_then(|r| r.strip_prefix('-'))
            .ok_or(OrderNumberError::MissingPrefix)?;

        let (timestamp, token) = rest
            .split_once('-')
            .ok_or(OrderNumberError::InvalidTimestamp)?;

        if timestamp.is_empty() || !timestamp.bytes().all(|b| b.is_ascii_digit()) {
            return Err(OrderNumberError::InvalidTimestamp);
        }

        if token.len() != TOKEN_LEN || !token.bytes().all(|b| BASE36_UPPER.contains(&b)) {
            return Err(OrderNumberError::InvalidToken);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `OrderNumber` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_generated_numbers_parse() {
        for _ in 0..200 {
            let number = OrderNumber::generate();
            assert!(
                OrderNumber::parse(number.as_str()).is_ok(),
                "generated {number} failed to parse"
            );
        }
    }

    #[test]
    fn test_generate_at_embeds_millis() {
        let now = Utc.timestamp_millis_opt(1_718_035_200_123).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let number = OrderNumber::generate_at(now, &mut rng);

        assert!(number.as_str().starts_with("ORD-1718035200123-"));
        let token = number.as_str().rsplit('-').next().unwrap();
        assert_eq!(token.len(), 9);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_generate_is_random_per_call() {
        let now = Utc::now();
        let mut rng = rand::rng();
        let a = OrderNumber::generate_at(now, &mut rng);
        let b = OrderNumber::generate_at(now, &mut rng);
        assert_ne!(a, b);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(
            OrderNumber::parse("INV-1-ABCDEFGHI"),
            Err(OrderNumberError::MissingPrefix)
        );
        assert_eq!(
            OrderNumber::parse("ORD--ABCDEFGHI"),
            Err(OrderNumberError::InvalidTimestamp)
        );
        assert_eq!(
            OrderNumber::parse("ORD-12a4-ABCDEFGHI"),
            Err(OrderNumberError::InvalidTimestamp)
        );
        assert_eq!(
            OrderNumber::parse("ORD-1234-abcdefghi"),
            Err(OrderNumberError::InvalidToken)
        );
        assert_eq!(
            OrderNumber::parse("ORD-1234-ABCDEFGH"),
            Err(OrderNumberError::InvalidToken)
        );
    }

    #[test]
    fn test_parse_accepts_well_formed() {
        let number: OrderNumber = "ORD-1718035200123-K3Z9Q0A1B".parse().unwrap();
        assert_eq!(number.to_string(), "ORD-1718035200123-K3Z9Q0A1B");
    }
}
