//! # AVA Admin Shared Library
//!
//! Domain types, storage, services and authentication primitives used by the
//! AVA administration API.
//!
//! ## Module Organization
//!
//! - `auth`: Password hashing, credential tokens, bearer middleware
//! - `db`: Connection pool and embedded migrations
//! - `error`: Service error taxonomy
//! - `models`: Accounts, roles, addresses, classes
//! - `postal`: Postal code lookup client
//! - `repository`: Storage traits with Postgres and in-memory implementations
//! - `services`: Account provisioning, login, class management

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod postal;
pub mod repository;
pub mod services;

/// Current version of the shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
