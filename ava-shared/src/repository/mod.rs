//! Storage capabilities
//!
//! Each entity gets a small async trait describing what the services may do
//! with it. [`postgres`] implements them over a shared `PgPool`; [`memory`]
//! implements them over an in-process store for tests and local runs.
//!
//! Not-found is a variant of [`RepositoryError`], never a sentinel value.

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{
    account::{Account, AccountChanges, NewAccount},
    address::{Address, NewAddress},
    class::{Class, ClassInput},
    role::Role,
};

pub mod memory;
pub mod postgres;

/// Error type for repository operations
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No row matched, or an update by id touched zero rows
    #[error("Record not found")]
    NotFound,

    /// A unique constraint was violated
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// A foreign key pointed at a missing row
    #[error("Foreign key violated: {0}")]
    ForeignKey(String),

    /// Transport or driver failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// SQLSTATE for unique_violation
const UNIQUE_VIOLATION: &str = "23505";

/// SQLSTATE for foreign_key_violation
const FOREIGN_KEY_VIOLATION: &str = "23503";

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => RepositoryError::NotFound,
            sqlx::Error::Database(ref db_err) => {
                let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                let code = db_err.code().map(|c| c.into_owned());
                match code.as_deref() {
                    Some(UNIQUE_VIOLATION) => RepositoryError::Conflict(constraint),
                    Some(FOREIGN_KEY_VIOLATION) => RepositoryError::ForeignKey(constraint),
                    _ => RepositoryError::Database(err),
                }
            }
            _ => RepositoryError::Database(err),
        }
    }
}

/// Repository result type alias
pub type RepoResult<T> = Result<T, RepositoryError>;

/// Read-only access to roles
#[async_trait]
pub trait RoleRepository: Send + Sync {
    async fn get_by_id(&self, id: i64) -> RepoResult<Role>;

    async fn list(&self) -> RepoResult<Vec<Role>>;
}

/// Insert and fetch of postal addresses
#[async_trait]
pub trait AddressRepository: Send + Sync {
    /// Inserts an address on its own, outside any account transaction
    async fn create(&self, address: NewAddress) -> RepoResult<Address>;

    async fn get_by_id(&self, id: i64) -> RepoResult<Address>;
}

/// Account persistence and lifecycle transitions
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Inserts the account and returns it joined with role and address
    async fn create(&self, account: NewAccount) -> RepoResult<Account>;

    async fn get_by_id(&self, id: i64) -> RepoResult<Account>;

    async fn get_by_email(&self, email: &str) -> RepoResult<Account>;

    async fn list(&self) -> RepoResult<Vec<Account>>;

    /// Writes the whitelisted columns; zero affected rows is `NotFound`
    async fn update(&self, id: i64, changes: AccountChanges) -> RepoResult<Account>;

    /// Sets `active = false`; zero affected rows is `NotFound`
    async fn deactivate(&self, id: i64) -> RepoResult<()>;

    /// Sets `active = true`; zero affected rows is `NotFound`
    async fn reactivate(&self, id: i64) -> RepoResult<()>;
}

/// Class persistence
#[async_trait]
pub trait ClassRepository: Send + Sync {
    async fn create(&self, class: ClassInput) -> RepoResult<Class>;

    async fn get_by_id(&self, id: i64) -> RepoResult<Class>;

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Class>>;

    async fn list(&self) -> RepoResult<Vec<Class>>;

    async fn update(&self, id: i64, class: ClassInput) -> RepoResult<Class>;

    async fn delete(&self, id: i64) -> RepoResult<()>;
}

/// Bundle of repository handles injected into the services
#[derive(Clone)]
pub struct Repositories {
    pub accounts: Arc<dyn AccountRepository>,
    pub addresses: Arc<dyn AddressRepository>,
    pub roles: Arc<dyn RoleRepository>,
    pub classes: Arc<dyn ClassRepository>,
}

impl Repositories {
    /// Postgres-backed repositories sharing one pool
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            accounts: Arc::new(postgres::PgAccountRepository::new(pool.clone())),
            addresses: Arc::new(postgres::PgAddressRepository::new(pool.clone())),
            roles: Arc::new(postgres::PgRoleRepository::new(pool.clone())),
            classes: Arc::new(postgres::PgClassRepository::new(pool)),
        }
    }

    /// Repositories backed by one in-memory store
    pub fn in_memory(store: Arc<memory::InMemoryStore>) -> Self {
        Self {
            accounts: store.clone(),
            addresses: store.clone(),
            roles: store.clone(),
            classes: store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = RepositoryError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::NotFound));
    }

    #[test]
    fn test_other_errors_map_to_database() {
        let err = RepositoryError::from(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, RepositoryError::Database(_)));
    }
}
