/// Role model
///
/// Roles are immutable reference data seeded by the initial migration.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE roles (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(64) NOT NULL UNIQUE
/// );
/// ```

use serde::{Deserialize, Serialize};

/// Role assigned to an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Role {
    /// Role ID
    pub id: i64,

    /// Unique role name (e.g. "admin")
    pub name: String,
}

impl Role {
    /// Returns true if the id could refer to a stored role
    pub fn is_valid_id(id: i64) -> bool {
        id > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_id() {
        assert!(Role::is_valid_id(1));
        assert!(Role::is_valid_id(999_999));
        assert!(!Role::is_valid_id(0));
        assert!(!Role::is_valid_id(-1));
    }
}
