//! Postal address captured at checkout.
//!
//! Addresses are stored on the order header as JSONB snapshots, so this
//! type's serde shape is the persisted shape.

use serde::{Deserialize, Serialize};

/// Errors that can occur when validating a [`PostalAddress`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// A required field is empty or whitespace.
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// A shipping or billing address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub full_name: String,
    pub address_line_1: String,
    pub address_line_2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: Option<String>,
}

impl PostalAddress {
    /// Build an address from raw form input.
    ///
    /// Every field is trimmed; the optional fields become `None` when blank.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::MissingField` naming the first blank required
    /// field (full name, address line 1, city, state, postal code, country).
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        full_name: &str,
        address_line_1: &str,
        address_line_2: Option<&str>,
        city: &str,
        state: &str,
        postal_code: &str,
        country: &str,
        phone: Option<&str>,
    ) -> Result<Self, AddressError> {
        Ok(Self {
            full_name: required("full name", full_name)?,
            address_line_1: required("address line 1", address_line_1)?,
            address_line_2: optional(address_line_2),
            city: required("city", city)?,
            state: required("state", state)?,
            postal_code: required("postal code", postal_code)?,
            country: required("country", country)?,
            phone: optional(phone),
        })
    }

    /// City, state and postal code on one line (e.g., "Portland, OR 97201").
    #[must_use]
    pub fn locality_line(&self) -> String {
        format!("{}, {} {}", self.city, self.state, self.postal_code)
    }
}

fn required(field: &'static str, value: &str) -> Result<String, AddressError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AddressError::MissingField(field));
    }
    Ok(trimmed.to_owned())
}

fn optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Result<PostalAddress, AddressError> {
        PostalAddress::from_parts(
            " Ada Lovelace ",
            "12 St James's Square",
            Some("  "),
            "London",
            "Greater London",
            "SW1Y 4JH",
            "United Kingdom",
            Some("+44 20 7946 0000"),
        )
    }

    #[test]
    fn test_from_parts_trims_and_normalizes_optionals() {
        let address = sample().unwrap();
        assert_eq!(address.full_name, "Ada Lovelace");
        assert_eq!(address.address_line_2, None);
        assert_eq!(address.phone.as_deref(), Some("+44 20 7946 0000"));
    }

    #[test]
    fn test_from_parts_rejects_blank_required_field() {
        let result =
            PostalAddress::from_parts("Ada", "1 Main St", None, "   ", "OR", "97201", "US", None);
        assert_eq!(result, Err(AddressError::MissingField("city")));
        assert_eq!(
            result.unwrap_err().to_string(),
            "city is required".to_string()
        );
    }

    #[test]
    fn test_locality_line() {
        let address =
            PostalAddress::from_parts("Ada", "1 Main St", None, "Portland", "OR", "97201", "US", None)
                .unwrap();
        assert_eq!(address.locality_line(), "Portland, OR 97201");
    }

    #[test]
    fn test_json_shape_is_snake_case_fields() {
        let address = sample().unwrap();
        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["full_name"], "Ada Lovelace");
        assert_eq!(json["address_line_1"], "12 St James's Square");
        assert!(json["address_line_2"].is_null());
        assert_eq!(json["postal_code"], "SW1Y 4JH");
    }
}
