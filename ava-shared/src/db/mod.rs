/// Database plumbing
///
/// # Modules
///
/// - `pool`: Postgres connection pool with a startup health check
/// - `migrations`: Embedded schema migrations
///
/// Queries live in [`crate::repository::postgres`].

pub mod migrations;
pub mod pool;
