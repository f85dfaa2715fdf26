//! Account repository

use crate::domain::{Account, AccountId, Role};
use crate::error::{AppError, Result, StorageContext};
use async_trait::async_trait;
use sqlx::MySqlPool;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Fails with `AccountAlreadyExists` when the id is taken.
    async fn create(&self, account: &Account) -> Result<()>;
    async fn get_by_id(&self, id: AccountId) -> Result<Account>;
    /// Overwrites name, phone number and link.
    async fn update(&self, account: &Account) -> Result<()>;
    /// Removes the account; its vehicles go with it.
    async fn delete(&self, id: AccountId) -> Result<()>;
    async fn list_ids_by_role(&self, role: Role) -> Result<Vec<AccountId>>;
}

pub struct AccountRepositoryImpl {
    pool: MySqlPool,
}

impl AccountRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: AccountId) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM accounts WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .storage_context("checking account existence")?;
        Ok(count > 0)
    }
}

#[async_trait]
impl AccountRepository for AccountRepositoryImpl {
    async fn create(&self, account: &Account) -> Result<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, name, phone_number, link, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.phone_number)
        .bind(&account.link)
        .bind(account.role)
        .bind(account.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(AppError::AccountAlreadyExists(account.id))
            }
            Err(e) => Err(AppError::storage("creating account", e)),
        }
    }

    async fn get_by_id(&self, id: AccountId) -> Result<Account> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, phone_number, link, role, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .storage_context("loading account")?
        .ok_or(AppError::AccountNotFound(id))
    }

    async fn update(&self, account: &Account) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET name = ?, phone_number = ?, link = ?
            WHERE id = ?
            "#,
        )
        .bind(&account.name)
        .bind(&account.phone_number)
        .bind(&account.link)
        .bind(account.id)
        .execute(&self.pool)
        .await
        .storage_context("updating account")?;

        // MySQL reports changed rows, so an unchanged row also yields 0
        if result.rows_affected() == 0 && !self.exists(account.id).await? {
            return Err(AppError::AccountNotFound(account.id));
        }

        Ok(())
    }

    async fn delete(&self, id: AccountId) -> Result<()> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .storage_context("deleting account")?;

        if result.rows_affected() == 0 {
            return Err(AppError::AccountNotFound(id));
        }

        Ok(())
    }

    async fn list_ids_by_role(&self, role: Role) -> Result<Vec<AccountId>> {
        sqlx::query_scalar::<_, AccountId>("SELECT id FROM accounts WHERE role = ? ORDER BY id")
            .bind(role)
            .fetch_all(&self.pool)
            .await
            .storage_context("listing accounts by role")
    }
}
