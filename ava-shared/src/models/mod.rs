/// Domain models
///
/// Plain data types shared by the repositories, services and HTTP layer.
/// Database access lives in [`crate::repository`].
///
/// # Models
///
/// - `account`: Accounts joined with their role and address
/// - `address`: Postal addresses enriched by the postal lookup
/// - `role`: Immutable role reference data
/// - `class`: Classes managed by administrators

pub mod account;
pub mod address;
pub mod class;
pub mod role;
