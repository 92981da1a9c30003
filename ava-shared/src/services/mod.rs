/// Business services
///
/// Services orchestrate repositories, the postal lookup and the crypto
/// primitives. They take their collaborators by handle at construction and
/// hold no other state, so they are cheap to clone into request handlers.
///
/// # Services
///
/// - `accounts`: Provisioning, update and lifecycle of accounts
/// - `auth`: Credential verification and token issuance
/// - `classes`: Class management

pub mod accounts;
pub mod auth;
pub mod classes;

pub use accounts::{AccountService, AddressInput, CreateAccountInput, UpdateAccountInput};
pub use auth::AuthService;
pub use classes::ClassService;

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::accounts::{AccountService, AddressInput, CreateAccountInput};
    use crate::models::account::Account;
    use crate::postal::{PostalAddress, PostalError, PostalLookup};

    /// Provisions an admin account with the given credentials
    pub async fn provision(svc: &AccountService, email: &str, password: &str) -> Account {
        svc.create_account(CreateAccountInput {
            name: "Maria Souza".to_string(),
            email: email.to_string(),
            phone: "11999990000".to_string(),
            password: password.to_string(),
            password_confirmation: password.to_string(),
            address: AddressInput {
                postal_code: "01001000".to_string(),
                complement: None,
                number: None,
            },
            role_id: 1,
        })
        .await
        .unwrap()
    }

    /// Postal lookup returning a fixed São Paulo address, or failing on demand
    #[derive(Default)]
    pub struct StubPostal {
        pub fail_with_status: Option<u16>,
        pub calls: AtomicUsize,
    }

    impl StubPostal {
        pub fn failing(status: u16) -> Self {
            Self {
                fail_with_status: Some(status),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PostalLookup for StubPostal {
        async fn lookup(&self, postal_code: &str) -> Result<PostalAddress, PostalError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(status) = self.fail_with_status {
                return Err(PostalError::Status(status));
            }

            Ok(PostalAddress {
                postal_code: postal_code.to_string(),
                street: "Praça da Sé".to_string(),
                neighborhood: "Sé".to_string(),
                city: "São Paulo".to_string(),
                state: "SP".to_string(),
            })
        }
    }
}
