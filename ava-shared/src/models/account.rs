/// Account model
///
/// An account always references exactly one role and one address. Accounts
/// are never physically deleted; the `active` flag is flipped instead.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id BIGSERIAL PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL UNIQUE,
///     password_hash VARCHAR(255) NOT NULL,
///     phone VARCHAR(32) NOT NULL,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     role_id BIGINT NOT NULL REFERENCES roles(id),
///     address_id BIGINT NOT NULL REFERENCES addresses(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{address::Address, role::Role};

/// Account joined with its role and address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    /// Account ID
    pub id: i64,

    /// Display name
    pub name: String,

    /// Email address, unique across accounts
    pub email: String,

    /// Argon2id password hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Contact phone
    pub phone: String,

    /// Lifecycle flag; false once deactivated
    pub active: bool,

    /// Assigned role
    pub role: Role,

    /// Postal address
    pub address: Address,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle state of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountState {
    Active,
    Inactive,
}

impl Account {
    /// Current lifecycle state
    pub fn state(&self) -> AccountState {
        if self.active {
            AccountState::Active
        } else {
            AccountState::Inactive
        }
    }
}

/// Account fields carried inside a credential token
///
/// Mirrors [`Account`] without the password hash and with only the
/// identifiers of the related rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub active: bool,
    pub role_id: i64,
    pub address_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Account> for AccountSnapshot {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            email: account.email.clone(),
            phone: account.phone.clone(),
            active: account.active,
            role_id: account.role.id,
            address_id: account.address.id,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

/// Input for inserting an account
///
/// The address must already be persisted; `password_hash` is never plaintext.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub role_id: i64,
    pub address_id: i64,
}

/// Whitelisted columns an update may touch
///
/// Only `Some` fields are written. `updated_at` is always refreshed.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub phone: Option<String>,
    pub address_id: Option<i64>,
    pub role_id: Option<i64>,
}

impl AccountChanges {
    /// True when no column would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.phone.is_none()
            && self.address_id.is_none()
            && self.role_id.is_none()
    }
}

/// Flat row produced by the account/role/address join
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AccountRow {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub phone: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub role_id: i64,
    pub role_name: String,
    pub address_id: i64,
    pub address_postal_code: String,
    pub address_street: String,
    pub address_complement: Option<String>,
    pub address_number: Option<String>,
    pub address_neighborhood: String,
    pub address_city: String,
    pub address_state: String,
    pub address_created_at: DateTime<Utc>,
    pub address_updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            phone: row.phone,
            active: row.active,
            role: Role {
                id: row.role_id,
                name: row.role_name,
            },
            address: Address {
                id: row.address_id,
                postal_code: row.address_postal_code,
                street: row.address_street,
                complement: row.address_complement,
                number: row.address_number,
                neighborhood: row.address_neighborhood,
                city: row.address_city,
                state: row.address_state,
                created_at: row.address_created_at,
                updated_at: row.address_updated_at,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn account(id: i64, email: &str) -> Account {
        let now = Utc::now();
        Account {
            id,
            name: "Maria Souza".to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            phone: "+55 11 99999-0000".to_string(),
            active: true,
            role: Role {
                id: 1,
                name: "admin".to_string(),
            },
            address: Address {
                id: 7,
                postal_code: "01001000".to_string(),
                street: "Praça da Sé".to_string(),
                complement: Some("lado ímpar".to_string()),
                number: Some("100".to_string()),
                neighborhood: "Sé".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
                created_at: now,
                updated_at: now,
            },
            created_at: now,
            updated_at: now,
        }
    }
}
