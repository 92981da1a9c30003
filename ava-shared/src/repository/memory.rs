//! In-memory repository implementation
//!
//! Mirrors the constraints of the Postgres schema (unique email, unique class
//! name, role/address foreign keys) so service behaviour under test matches
//! behaviour against the real store. State lives behind one mutex; each
//! operation holds it for its whole duration, which gives the same
//! all-or-nothing outcome as a transaction.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};

use super::{
    AccountRepository, AddressRepository, ClassRepository, RepoResult, RepositoryError,
    RoleRepository,
};
use crate::models::{
    account::{Account, AccountChanges, NewAccount},
    address::{Address, NewAddress},
    class::{Class, ClassInput},
    role::Role,
};

/// Stored account row, related rows referenced by id
#[derive(Debug, Clone)]
struct StoredAccount {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    phone: String,
    active: bool,
    role_id: i64,
    address_id: i64,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Default)]
struct State {
    roles: Vec<Role>,
    addresses: Vec<Address>,
    accounts: Vec<StoredAccount>,
    classes: Vec<Class>,
    next_id: i64,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn join(&self, stored: &StoredAccount) -> RepoResult<Account> {
        let role = self
            .roles
            .iter()
            .find(|r| r.id == stored.role_id)
            .cloned()
            .ok_or_else(|| RepositoryError::ForeignKey("accounts_role_id_fkey".to_string()))?;
        let address = self
            .addresses
            .iter()
            .find(|a| a.id == stored.address_id)
            .cloned()
            .ok_or_else(|| RepositoryError::ForeignKey("accounts_address_id_fkey".to_string()))?;

        Ok(Account {
            id: stored.id,
            name: stored.name.clone(),
            email: stored.email.clone(),
            password_hash: stored.password_hash.clone(),
            phone: stored.phone.clone(),
            active: stored.active,
            role,
            address,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
        })
    }

    fn check_foreign_keys(&self, role_id: i64, address_id: i64) -> RepoResult<()> {
        if !self.roles.iter().any(|r| r.id == role_id) {
            return Err(RepositoryError::ForeignKey("accounts_role_id_fkey".to_string()));
        }
        if !self.addresses.iter().any(|a| a.id == address_id) {
            return Err(RepositoryError::ForeignKey("accounts_address_id_fkey".to_string()));
        }
        Ok(())
    }

    fn email_taken(&self, email: &str, except_id: Option<i64>) -> bool {
        self.accounts
            .iter()
            .any(|a| a.email == email && Some(a.id) != except_id)
    }

    fn class_name_taken(&self, name: &str, except_id: Option<i64>) -> bool {
        self.classes
            .iter()
            .any(|c| c.name == name && Some(c.id) != except_id)
    }
}

/// Process-local store implementing every repository trait
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Empty store with no roles
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the same roles as the initial migration
    pub fn seeded() -> Self {
        let store = Self::new();
        for name in ["admin", "teacher", "student"] {
            store.insert_role(name);
        }
        store
    }

    /// Adds a role and returns it
    pub fn insert_role(&self, name: &str) -> Role {
        let mut state = self.lock();
        let role = Role {
            id: state.next_id(),
            name: name.to_string(),
        };
        state.roles.push(role.clone());
        role
    }

    /// Number of stored accounts
    pub fn account_count(&self) -> usize {
        self.lock().accounts.len()
    }

    /// Number of stored addresses
    pub fn address_count(&self) -> usize {
        self.lock().addresses.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panic while holding the lock leaves plain data behind; keep serving it
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RoleRepository for InMemoryStore {
    async fn get_by_id(&self, id: i64) -> RepoResult<Role> {
        self.lock()
            .roles
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn list(&self) -> RepoResult<Vec<Role>> {
        Ok(self.lock().roles.clone())
    }
}

#[async_trait]
impl AddressRepository for InMemoryStore {
    async fn create(&self, address: NewAddress) -> RepoResult<Address> {
        let mut state = self.lock();
        let now = Utc::now();
        let address = Address {
            id: state.next_id(),
            postal_code: address.postal_code,
            street: address.street,
            complement: address.complement,
            number: address.number,
            neighborhood: address.neighborhood,
            city: address.city,
            state: address.state,
            created_at: now,
            updated_at: now,
        };
        state.addresses.push(address.clone());
        Ok(address)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Address> {
        self.lock()
            .addresses
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl AccountRepository for InMemoryStore {
    async fn create(&self, account: NewAccount) -> RepoResult<Account> {
        let mut state = self.lock();

        if state.email_taken(&account.email, None) {
            return Err(RepositoryError::Conflict("accounts_email_key".to_string()));
        }
        state.check_foreign_keys(account.role_id, account.address_id)?;

        let now = Utc::now();
        let stored = StoredAccount {
            id: state.next_id(),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            phone: account.phone,
            active: true,
            role_id: account.role_id,
            address_id: account.address_id,
            created_at: now,
            updated_at: now,
        };
        let joined = state.join(&stored)?;
        state.accounts.push(stored);
        Ok(joined)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Account> {
        let state = self.lock();
        let stored = state
            .accounts
            .iter()
            .find(|a| a.id == id)
            .ok_or(RepositoryError::NotFound)?;
        state.join(stored)
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Account> {
        let state = self.lock();
        let stored = state
            .accounts
            .iter()
            .find(|a| a.email == email)
            .ok_or(RepositoryError::NotFound)?;
        state.join(stored)
    }

    async fn list(&self) -> RepoResult<Vec<Account>> {
        let state = self.lock();
        state.accounts.iter().map(|a| state.join(a)).collect()
    }

    async fn update(&self, id: i64, changes: AccountChanges) -> RepoResult<Account> {
        let mut state = self.lock();

        let mut updated = state
            .accounts
            .iter()
            .find(|a| a.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)?;

        if let Some(ref email) = changes.email {
            if state.email_taken(email, Some(id)) {
                return Err(RepositoryError::Conflict("accounts_email_key".to_string()));
            }
        }

        if let Some(name) = changes.name {
            updated.name = name;
        }
        if let Some(email) = changes.email {
            updated.email = email;
        }
        if let Some(password_hash) = changes.password_hash {
            updated.password_hash = password_hash;
        }
        if let Some(phone) = changes.phone {
            updated.phone = phone;
        }
        if let Some(address_id) = changes.address_id {
            updated.address_id = address_id;
        }
        if let Some(role_id) = changes.role_id {
            updated.role_id = role_id;
        }
        state.check_foreign_keys(updated.role_id, updated.address_id)?;
        updated.updated_at = Utc::now();

        let joined = state.join(&updated)?;
        if let Some(slot) = state.accounts.iter_mut().find(|a| a.id == id) {
            *slot = updated;
        }
        Ok(joined)
    }

    async fn deactivate(&self, id: i64) -> RepoResult<()> {
        set_active(&mut self.lock(), id, false)
    }

    async fn reactivate(&self, id: i64) -> RepoResult<()> {
        set_active(&mut self.lock(), id, true)
    }
}

fn set_active(state: &mut State, id: i64, active: bool) -> RepoResult<()> {
    let account = state
        .accounts
        .iter_mut()
        .find(|a| a.id == id)
        .ok_or(RepositoryError::NotFound)?;
    account.active = active;
    account.updated_at = Utc::now();
    Ok(())
}

#[async_trait]
impl ClassRepository for InMemoryStore {
    async fn create(&self, class: ClassInput) -> RepoResult<Class> {
        let mut state = self.lock();

        if state.class_name_taken(&class.name, None) {
            return Err(RepositoryError::Conflict("classes_name_key".to_string()));
        }

        let now = Utc::now();
        let class = Class {
            id: state.next_id(),
            name: class.name,
            start_date: class.start_date,
            final_date: class.final_date,
            img_class: class.img_class,
            created_at: now,
            updated_at: now,
        };
        state.classes.push(class.clone());
        Ok(class)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Class> {
        self.lock()
            .classes
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Class>> {
        Ok(self.lock().classes.iter().find(|c| c.name == name).cloned())
    }

    async fn list(&self) -> RepoResult<Vec<Class>> {
        Ok(self.lock().classes.clone())
    }

    async fn update(&self, id: i64, input: ClassInput) -> RepoResult<Class> {
        let mut state = self.lock();

        if state.class_name_taken(&input.name, Some(id)) {
            return Err(RepositoryError::Conflict("classes_name_key".to_string()));
        }

        let class = state
            .classes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(RepositoryError::NotFound)?;
        class.name = input.name;
        class.start_date = input.start_date;
        class.final_date = input.final_date;
        class.img_class = input.img_class;
        class.updated_at = Utc::now();
        Ok(class.clone())
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut state = self.lock();
        let before = state.classes.len();
        state.classes.retain(|c| c.id != id);

        if state.classes.len() == before {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
