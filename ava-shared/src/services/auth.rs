//! Credential verification and token issuance

use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    auth::{jwt::TokenCodec, password::verify_password},
    error::{AuthFailure, ServiceError, ServiceResult},
    models::account::Account,
    repository::{AccountRepository, RepositoryError},
};

/// Issued credential
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub token: String,
    pub account: Account,
}

/// Login service
#[derive(Clone)]
pub struct AuthService {
    accounts: Arc<dyn AccountRepository>,
    codec: Arc<TokenCodec>,
}

impl AuthService {
    pub fn new(accounts: Arc<dyn AccountRepository>, codec: Arc<TokenCodec>) -> Self {
        Self { accounts, codec }
    }

    /// Verifies credentials and issues a signed token
    ///
    /// Unknown email, inactive account and wrong password all fail with the
    /// same `InvalidCredentials` so callers cannot probe which emails exist.
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<LoginOutcome> {
        let account = match self.accounts.get_by_email(email).await {
            Ok(account) => account,
            Err(RepositoryError::NotFound) => {
                warn!(email = %email, "Login failed: unknown email");
                return Err(ServiceError::Auth(AuthFailure::InvalidCredentials));
            }
            Err(e) => return Err(e.into()),
        };

        if !account.active {
            warn!(account_id = account.id, "Login failed: account inactive");
            return Err(ServiceError::Auth(AuthFailure::InvalidCredentials));
        }

        if !verify_password(&account.password_hash, password) {
            warn!(account_id = account.id, "Login failed: wrong password");
            return Err(ServiceError::Auth(AuthFailure::InvalidCredentials));
        }

        let claims = self.codec.build_claims(&account);
        let token = self.codec.encode(&claims)?;

        info!(account_id = account.id, role_id = account.role.id, "Token issued");
        Ok(LoginOutcome { token, account })
    }
}
