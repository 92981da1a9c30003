/// Postal address model
///
/// One address row is written per provisioning (or per address change on
/// update). Rows are never updated in place.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE addresses (
///     id BIGSERIAL PRIMARY KEY,
///     postal_code VARCHAR(16) NOT NULL,
///     street VARCHAR(255) NOT NULL,
///     complement VARCHAR(255),
///     number VARCHAR(32),
///     neighborhood VARCHAR(255) NOT NULL,
///     city VARCHAR(255) NOT NULL,
///     state VARCHAR(64) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored postal address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Address {
    /// Address ID
    pub id: i64,

    /// Postal code, digits only
    pub postal_code: String,

    /// Street name resolved by the postal lookup
    pub street: String,

    /// Optional complement supplied by the caller
    pub complement: Option<String>,

    /// Optional street number supplied by the caller
    pub number: Option<String>,

    /// Neighborhood resolved by the postal lookup
    pub neighborhood: String,

    /// City resolved by the postal lookup
    pub city: String,

    /// State resolved by the postal lookup
    pub state: String,

    /// When the row was created
    pub created_at: DateTime<Utc>,

    /// When the row was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting an address
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAddress {
    pub postal_code: String,
    pub street: String,
    pub complement: Option<String>,
    pub number: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
}

/// Strips the usual `12345-678` separator and checks for exactly 8 digits
///
/// Returns the normalized code, or `None` when the input is not a postal code.
pub fn normalize_postal_code(raw: &str) -> Option<String> {
    let digits = raw.trim().replacen('-', "", 1);

    if digits.len() == 8 && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_postal_code() {
        assert_eq!(normalize_postal_code("01001000").as_deref(), Some("01001000"));
        assert_eq!(normalize_postal_code("01001-000").as_deref(), Some("01001000"));
        assert_eq!(normalize_postal_code(" 01001-000 ").as_deref(), Some("01001000"));
    }

    #[test]
    fn test_normalize_postal_code_rejects_garbage() {
        assert!(normalize_postal_code("").is_none());
        assert!(normalize_postal_code("1234567").is_none());
        assert!(normalize_postal_code("123456789").is_none());
        assert!(normalize_postal_code("0100a000").is_none());
        assert!(normalize_postal_code("01-001-000").is_none());
    }
}
