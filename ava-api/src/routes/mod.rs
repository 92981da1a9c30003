/// API route handlers
///
/// Organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Login
/// - `users`: Account provisioning, update and lifecycle
/// - `roles`: Role lookups
/// - `classes`: Class management

pub mod auth;
pub mod classes;
pub mod health;
pub mod roles;
pub mod users;
