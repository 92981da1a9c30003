//! Postgres implementations of the repository traits
//!
//! Every multi-statement or state-changing account/class operation runs in
//! its own transaction. Address inserts run directly on the pool because they
//! happen before the account transaction is opened.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{
    AccountRepository, AddressRepository, ClassRepository, RepoResult, RepositoryError,
    RoleRepository,
};
use crate::models::{
    account::{Account, AccountChanges, AccountRow, NewAccount},
    address::{Address, NewAddress},
    class::{Class, ClassInput},
    role::Role,
};

/// Account columns joined with role and address, aliased to match [`AccountRow`]
const ACCOUNT_SELECT: &str = r#"
    SELECT a.id, a.name, a.email, a.password_hash, a.phone, a.active,
           a.created_at, a.updated_at,
           r.id AS role_id, r.name AS role_name,
           ad.id AS address_id,
           ad.postal_code AS address_postal_code,
           ad.street AS address_street,
           ad.complement AS address_complement,
           ad.number AS address_number,
           ad.neighborhood AS address_neighborhood,
           ad.city AS address_city,
           ad.state AS address_state,
           ad.created_at AS address_created_at,
           ad.updated_at AS address_updated_at
    FROM accounts a
    JOIN roles r ON r.id = a.role_id
    JOIN addresses ad ON ad.id = a.address_id
"#;

const ADDRESS_COLUMNS: &str =
    "id, postal_code, street, complement, number, neighborhood, city, state, created_at, updated_at";

const CLASS_COLUMNS: &str = "id, name, start_date, final_date, img_class, created_at, updated_at";

/// Role lookups
#[derive(Clone)]
pub struct PgRoleRepository {
    pool: PgPool,
}

impl PgRoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepository for PgRoleRepository {
    async fn get_by_id(&self, id: i64) -> RepoResult<Role> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        role.ok_or(RepositoryError::NotFound)
    }

    async fn list(&self) -> RepoResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }
}

/// Address inserts and lookups
#[derive(Clone)]
pub struct PgAddressRepository {
    pool: PgPool,
}

impl PgAddressRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressRepository for PgAddressRepository {
    async fn create(&self, address: NewAddress) -> RepoResult<Address> {
        let query = format!(
            r#"
            INSERT INTO addresses (postal_code, street, complement, number, neighborhood, city, state)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {}
            "#,
            ADDRESS_COLUMNS
        );

        let address = sqlx::query_as::<_, Address>(&query)
            .bind(address.postal_code)
            .bind(address.street)
            .bind(address.complement)
            .bind(address.number)
            .bind(address.neighborhood)
            .bind(address.city)
            .bind(address.state)
            .fetch_one(&self.pool)
            .await?;

        debug!(address_id = address.id, "Inserted address");
        Ok(address)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Address> {
        let query = format!("SELECT {} FROM addresses WHERE id = $1", ADDRESS_COLUMNS);

        sqlx::query_as::<_, Address>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }
}

/// Account persistence
#[derive(Clone)]
pub struct PgAccountRepository {
    pool: PgPool,
}

impl PgAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn set_active(&self, id: i64, active: bool) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("UPDATE accounts SET active = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        debug!(account_id = id, active, "Account active flag updated");
        Ok(())
    }
}

#[async_trait]
impl AccountRepository for PgAccountRepository {
    async fn create(&self, account: NewAccount) -> RepoResult<Account> {
        let mut tx = self.pool.begin().await?;

        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO accounts (name, email, password_hash, phone, role_id, address_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(account.name)
        .bind(account.email)
        .bind(account.password_hash)
        .bind(account.phone)
        .bind(account.role_id)
        .bind(account.address_id)
        .fetch_one(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, AccountRow>(&format!("{} WHERE a.id = $1", ACCOUNT_SELECT))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Account> {
        sqlx::query_as::<_, AccountRow>(&format!("{} WHERE a.id = $1", ACCOUNT_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::from)
            .ok_or(RepositoryError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> RepoResult<Account> {
        sqlx::query_as::<_, AccountRow>(&format!("{} WHERE a.email = $1", ACCOUNT_SELECT))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Account::from)
            .ok_or(RepositoryError::NotFound)
    }

    async fn list(&self) -> RepoResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, AccountRow>(&format!("{} ORDER BY a.id", ACCOUNT_SELECT))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Account::from).collect())
    }

    async fn update(&self, id: i64, changes: AccountChanges) -> RepoResult<Account> {
        // Build dynamic update over the whitelisted columns
        let mut query = String::from("UPDATE accounts SET updated_at = NOW()");
        let mut bind_count = 1;

        for (column, present) in [
            ("name", changes.name.is_some()),
            ("email", changes.email.is_some()),
            ("password_hash", changes.password_hash.is_some()),
            ("phone", changes.phone.is_some()),
            ("address_id", changes.address_id.is_some()),
            ("role_id", changes.role_id.is_some()),
        ] {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        }
        query.push_str(" WHERE id = $1");

        let mut q = sqlx::query(&query).bind(id);
        if let Some(name) = changes.name {
            q = q.bind(name);
        }
        if let Some(email) = changes.email {
            q = q.bind(email);
        }
        if let Some(password_hash) = changes.password_hash {
            q = q.bind(password_hash);
        }
        if let Some(phone) = changes.phone {
            q = q.bind(phone);
        }
        if let Some(address_id) = changes.address_id {
            q = q.bind(address_id);
        }
        if let Some(role_id) = changes.role_id {
            q = q.bind(role_id);
        }

        let mut tx = self.pool.begin().await?;

        let result = q.execute(&mut *tx).await?;
        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        let row = sqlx::query_as::<_, AccountRow>(&format!("{} WHERE a.id = $1", ACCOUNT_SELECT))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(row.into())
    }

    async fn deactivate(&self, id: i64) -> RepoResult<()> {
        self.set_active(id, false).await
    }

    async fn reactivate(&self, id: i64) -> RepoResult<()> {
        self.set_active(id, true).await
    }
}

/// Class persistence
#[derive(Clone)]
pub struct PgClassRepository {
    pool: PgPool,
}

impl PgClassRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClassRepository for PgClassRepository {
    async fn create(&self, class: ClassInput) -> RepoResult<Class> {
        let query = format!(
            r#"
            INSERT INTO classes (name, start_date, final_date, img_class)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            CLASS_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let class = sqlx::query_as::<_, Class>(&query)
            .bind(class.name)
            .bind(class.start_date)
            .bind(class.final_date)
            .bind(class.img_class)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(class)
    }

    async fn get_by_id(&self, id: i64) -> RepoResult<Class> {
        let query = format!("SELECT {} FROM classes WHERE id = $1", CLASS_COLUMNS);

        sqlx::query_as::<_, Class>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn find_by_name(&self, name: &str) -> RepoResult<Option<Class>> {
        let query = format!("SELECT {} FROM classes WHERE name = $1", CLASS_COLUMNS);

        let class = sqlx::query_as::<_, Class>(&query)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(class)
    }

    async fn list(&self) -> RepoResult<Vec<Class>> {
        let query = format!("SELECT {} FROM classes ORDER BY id", CLASS_COLUMNS);

        let classes = sqlx::query_as::<_, Class>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(classes)
    }

    async fn update(&self, id: i64, class: ClassInput) -> RepoResult<Class> {
        let query = format!(
            r#"
            UPDATE classes
            SET name = $2, start_date = $3, final_date = $4, img_class = $5, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            CLASS_COLUMNS
        );

        let mut tx = self.pool.begin().await?;
        let updated = sqlx::query_as::<_, Class>(&query)
            .bind(id)
            .bind(class.name)
            .bind(class.start_date)
            .bind(class.final_date)
            .bind(class.img_class)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        tx.commit().await?;

        Ok(updated)
    }

    async fn delete(&self, id: i64) -> RepoResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM classes WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        tx.commit().await?;
        Ok(())
    }
}
