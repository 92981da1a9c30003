/// Account provisioning, update and lifecycle
///
/// # Provisioning order
///
/// Each step is an abort point; nothing after a failed step runs.
///
/// 1. Hash the password
/// 2. Advisory email uniqueness check
/// 3. Postal enrichment (before any write)
/// 4. Role validation
/// 5. Address insert, on its own
/// 6. Account insert inside a transaction, re-read joined with role and address
///
/// A failure in step 6 leaves the step 5 address row behind. Addresses are
/// never shared, so an orphan is harmless and is not cleaned up.

use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    auth::password::hash_password,
    error::{ServiceError, ServiceResult},
    models::{
        account::{Account, AccountChanges, AccountState, NewAccount},
        address::{normalize_postal_code, Address, NewAddress},
        role::Role,
    },
    postal::PostalLookup,
    repository::{Repositories, RepositoryError},
};

/// Caller-supplied part of an address; the rest comes from the postal lookup
#[derive(Debug, Clone, Default)]
pub struct AddressInput {
    pub postal_code: String,
    pub complement: Option<String>,
    pub number: Option<String>,
}

/// Input for provisioning an account
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub password_confirmation: String,
    pub address: AddressInput,
    pub role_id: i64,
}

/// Partial update of an account; `None` leaves the field untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateAccountInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password: Option<String>,
    pub password_confirmation: Option<String>,
    pub address: Option<AddressInput>,
    pub role_id: Option<i64>,
}

/// Account operations
#[derive(Clone)]
pub struct AccountService {
    repos: Repositories,
    postal: Arc<dyn PostalLookup>,
}

impl AccountService {
    pub fn new(repos: Repositories, postal: Arc<dyn PostalLookup>) -> Self {
        Self { repos, postal }
    }

    /// Provisions a new, active account
    ///
    /// # Errors
    ///
    /// - `Validation`: password confirmation mismatch, bad postal code, role id `<= 0`
    /// - `Hashing`: password could not be hashed
    /// - `Conflict`: email already registered
    /// - `Dependency`: postal lookup failed, or the store is unavailable
    /// - `NotFound`: role does not exist
    pub async fn create_account(&self, input: CreateAccountInput) -> ServiceResult<Account> {
        if input.password != input.password_confirmation {
            return Err(ServiceError::Validation(
                "password confirmation does not match".to_string(),
            ));
        }
        let postal_code = parse_postal_code(&input.address.postal_code)?;

        let password_hash = hash_password(&input.password)?;

        self.ensure_email_free(&input.email, None).await?;

        let resolved = self.resolve_address(&postal_code, &input.address).await?;

        let role = self.ensure_role(input.role_id).await?;

        let address = self.repos.addresses.create(resolved).await?;

        let account = self
            .repos
            .accounts
            .create(NewAccount {
                name: input.name,
                email: input.email,
                password_hash,
                phone: input.phone,
                role_id: role.id,
                address_id: address.id,
            })
            .await
            .map_err(|e| {
                if matches!(e, RepositoryError::ForeignKey(_)) {
                    warn!(address_id = address.id, "Account insert failed; address row left orphaned");
                }
                account_write_error(e)
            })?;

        info!(
            account_id = account.id,
            email = %account.email,
            role_id = account.role.id,
            "Account provisioned"
        );

        Ok(account)
    }

    /// Fetches one account joined with role and address
    pub async fn get(&self, id: i64) -> ServiceResult<Account> {
        self.repos.accounts.get_by_id(id).await.map_err(account_read_error)
    }

    /// Lists all accounts
    pub async fn list(&self) -> ServiceResult<Vec<Account>> {
        Ok(self.repos.accounts.list().await?)
    }

    /// Applies a partial update
    ///
    /// Changing the email to one owned by another account is a `Conflict`;
    /// re-submitting the account's own email is allowed. A new address is
    /// looked up and inserted as a fresh row.
    pub async fn update_account(&self, id: i64, input: UpdateAccountInput) -> ServiceResult<Account> {
        let current = self.get(id).await?;
        let mut changes = AccountChanges {
            name: input.name,
            phone: input.phone,
            ..Default::default()
        };

        if let Some(email) = input.email {
            if email != current.email {
                self.ensure_email_free(&email, Some(id)).await?;
                changes.email = Some(email);
            }
        }

        if let Some(password) = input.password {
            if input.password_confirmation.as_deref() != Some(password.as_str()) {
                return Err(ServiceError::Validation(
                    "password confirmation does not match".to_string(),
                ));
            }
            changes.password_hash = Some(hash_password(&password)?);
        }

        if let Some(role_id) = input.role_id {
            changes.role_id = Some(self.ensure_role(role_id).await?.id);
        }

        if let Some(address_input) = input.address {
            let postal_code = parse_postal_code(&address_input.postal_code)?;
            let resolved = self.resolve_address(&postal_code, &address_input).await?;
            let address: Address = self.repos.addresses.create(resolved).await?;
            changes.address_id = Some(address.id);
        }

        if changes.is_empty() {
            return Ok(current);
        }

        let account = self
            .repos
            .accounts
            .update(id, changes)
            .await
            .map_err(account_write_error)?;

        info!(account_id = account.id, "Account updated");
        Ok(account)
    }

    /// Active → Inactive
    ///
    /// An already inactive account is a `State` error and is left unchanged.
    pub async fn deactivate(&self, id: i64) -> ServiceResult<()> {
        self.transition(id, AccountState::Inactive).await
    }

    /// Inactive → Active
    ///
    /// An already active account is a `State` error and is left unchanged.
    pub async fn reactivate(&self, id: i64) -> ServiceResult<()> {
        self.transition(id, AccountState::Active).await
    }

    async fn transition(&self, id: i64, target: AccountState) -> ServiceResult<()> {
        let account = self.get(id).await?;
        if account.state() == target {
            let message = match target {
                AccountState::Active => "account is already active",
                AccountState::Inactive => "account is already inactive",
            };
            return Err(ServiceError::State(message.to_string()));
        }

        match target {
            AccountState::Active => self.repos.accounts.reactivate(id).await,
            AccountState::Inactive => self.repos.accounts.deactivate(id).await,
        }
        .map_err(account_read_error)?;

        info!(account_id = id, state = ?target, "Account state changed");
        Ok(())
    }

    /// Fails with `Conflict` when another account owns `email`
    async fn ensure_email_free(&self, email: &str, owner: Option<i64>) -> ServiceResult<()> {
        match self.repos.accounts.get_by_email(email).await {
            Ok(existing) if Some(existing.id) != owner => {
                Err(ServiceError::Conflict("email already registered".to_string()))
            }
            Ok(_) | Err(RepositoryError::NotFound) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn ensure_role(&self, role_id: i64) -> ServiceResult<Role> {
        if !Role::is_valid_id(role_id) {
            return Err(ServiceError::Validation("role id must be positive".to_string()));
        }

        match self.repos.roles.get_by_id(role_id).await {
            Ok(role) => Ok(role),
            Err(RepositoryError::NotFound) => Err(ServiceError::NotFound("role not found".to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn resolve_address(&self, postal_code: &str, input: &AddressInput) -> ServiceResult<NewAddress> {
        let resolved = self.postal.lookup(postal_code).await.map_err(|e| {
            warn!(postal_code = %postal_code, error = %e, "Postal lookup failed");
            ServiceError::from(e)
        })?;

        Ok(NewAddress {
            postal_code: postal_code.to_string(),
            street: resolved.street,
            complement: input.complement.clone(),
            number: input.number.clone(),
            neighborhood: resolved.neighborhood,
            city: resolved.city,
            state: resolved.state,
        })
    }
}

fn parse_postal_code(raw: &str) -> ServiceResult<String> {
    normalize_postal_code(raw)
        .ok_or_else(|| ServiceError::Validation("postal code must have 8 digits".to_string()))
}

fn account_read_error(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::NotFound => ServiceError::NotFound("account not found".to_string()),
        other => other.into(),
    }
}

fn account_write_error(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::NotFound => ServiceError::NotFound("account not found".to_string()),
        RepositoryError::Conflict(_) => ServiceError::Conflict("email already registered".to_string()),
        RepositoryError::ForeignKey(_) => ServiceError::NotFound("role not found".to_string()),
        other => other.into(),
    }
}
