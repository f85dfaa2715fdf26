//! Vehicle repository
//!
//! Besides single-row primitives the trait exposes two owner-scoped
//! operations that maintain the one-selected-vehicle-per-owner rule:
//! `select_exclusive` and `delete_and_promote`. Their default bodies chain
//! the primitives and are NOT atomic: a concurrent reader can observe an
//! owner with no selected vehicle between the steps, and two concurrent
//! selections can both win. `VehicleRepositoryImpl` overrides both with a
//! transaction holding the owner's account row lock.

use crate::domain::{AccountId, NewVehicle, Vehicle, VehicleId};
use crate::error::{AppError, Result, StorageContext};
use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, Transaction};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Insert and return the vehicle with its assigned id.
    async fn create(&self, vehicle: &NewVehicle) -> Result<Vehicle>;
    async fn get_by_id(&self, id: VehicleId) -> Result<Vehicle>;
    /// Ordered by id; empty when the owner has none.
    async fn list_by_owner(&self, owner_id: AccountId) -> Result<Vec<Vehicle>>;
    async fn get_selected_by_owner(&self, owner_id: AccountId) -> Result<Vehicle>;
    /// Persists descriptive attributes. `is_selected` is left untouched.
    async fn update(&self, vehicle: &Vehicle) -> Result<()>;
    async fn delete(&self, id: VehicleId) -> Result<()>;
    async fn unselect_all_by_owner(&self, owner_id: AccountId) -> Result<()>;
    async fn mark_selected(&self, id: VehicleId) -> Result<()>;

    /// Make `vehicle_id` the owner's only selected vehicle.
    async fn select_exclusive(&self, owner_id: AccountId, vehicle_id: VehicleId) -> Result<()> {
        self.unselect_all_by_owner(owner_id).await?;
        self.mark_selected(vehicle_id).await
    }

    /// Delete a vehicle; if it was selected, select one remaining sibling.
    /// Returns the promoted sibling.
    async fn delete_and_promote(
        &self,
        owner_id: AccountId,
        vehicle_id: VehicleId,
    ) -> Result<Option<VehicleId>> {
        let vehicle = self.get_by_id(vehicle_id).await?;
        self.delete(vehicle_id).await?;

        if !vehicle.is_selected {
            return Ok(None);
        }

        match self.list_by_owner(owner_id).await?.first() {
            Some(next) => {
                self.mark_selected(next.id).await?;
                Ok(Some(next.id))
            }
            None => Ok(None),
        }
    }
}

pub struct VehicleRepositoryImpl {
    pool: MySqlPool,
}

impl VehicleRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: VehicleId) -> Result<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM vehicles WHERE id = ?")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .storage_context("checking vehicle existence")?;
        Ok(count > 0)
    }

    async fn begin(&self, context: &'static str) -> Result<Transaction<'static, MySql>> {
        self.pool.begin().await.storage_context(context)
    }
}

/// Take the owner's account row lock for the rest of the transaction.
async fn lock_owner(tx: &mut Transaction<'_, MySql>, owner_id: AccountId) -> Result<()> {
    let locked: Option<AccountId> =
        sqlx::query_scalar("SELECT id FROM accounts WHERE id = ? FOR UPDATE")
            .bind(owner_id)
            .fetch_optional(&mut **tx)
            .await
            .storage_context("locking owner")?;

    locked
        .map(|_| ())
        .ok_or(AppError::AccountNotFound(owner_id))
}

#[async_trait]
impl VehicleRepository for VehicleRepositoryImpl {
    async fn create(&self, vehicle: &NewVehicle) -> Result<Vehicle> {
        let mut tx = self.begin("starting vehicle insert").await?;
        lock_owner(&mut tx, vehicle.owner_id).await?;

        let selected_count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM vehicles WHERE owner_id = ? AND is_selected = TRUE",
        )
        .bind(vehicle.owner_id)
        .fetch_one(&mut *tx)
        .await
        .storage_context("counting selected vehicles")?;

        let is_selected = selected_count == 0;
        if is_selected != vehicle.is_selected {
            tracing::warn!(
                owner_id = %vehicle.owner_id,
                requested = vehicle.is_selected,
                stored = is_selected,
                "Selection flag corrected under owner lock"
            );
        }

        let result = sqlx::query(
            r#"
            INSERT INTO vehicles (owner_id, brand, model, license_plate, color, size, is_selected)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(vehicle.owner_id)
        .bind(&vehicle.brand)
        .bind(&vehicle.model)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.color)
        .bind(&vehicle.size)
        .bind(is_selected)
        .execute(&mut *tx)
        .await
        .storage_context("inserting vehicle")?;

        tx.commit().await.storage_context("committing vehicle insert")?;

        let id = i64::try_from(result.last_insert_id())
            .map_err(|_| AppError::Internal(anyhow::anyhow!("Vehicle id out of range")))?;

        Ok(NewVehicle {
            is_selected,
            ..vehicle.clone()
        }
        .into_vehicle(VehicleId(id)))
    }

    async fn get_by_id(&self, id: VehicleId) -> Result<Vehicle> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT id, owner_id, brand, model, license_plate, color, size, is_selected
            FROM vehicles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .storage_context("loading vehicle")?
        .ok_or(AppError::VehicleNotFound(id))
    }

    async fn list_by_owner(&self, owner_id: AccountId) -> Result<Vec<Vehicle>> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT id, owner_id, brand, model, license_plate, color, size, is_selected
            FROM vehicles
            WHERE owner_id = ?
            ORDER BY id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .storage_context("listing vehicles")
    }

    async fn get_selected_by_owner(&self, owner_id: AccountId) -> Result<Vehicle> {
        sqlx::query_as::<_, Vehicle>(
            r#"
            SELECT id, owner_id, brand, model, license_plate, color, size, is_selected
            FROM vehicles
            WHERE owner_id = ? AND is_selected = TRUE
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .storage_context("loading selected vehicle")?
        .ok_or(AppError::NoSelectedVehicle(owner_id))
    }

    async fn update(&self, vehicle: &Vehicle) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE vehicles
            SET brand = ?, model = ?, license_plate = ?, color = ?, size = ?
            WHERE id = ?
            "#,
        )
        .bind(&vehicle.brand)
        .bind(&vehicle.model)
        .bind(&vehicle.license_plate)
        .bind(&vehicle.color)
        .bind(&vehicle.size)
        .bind(vehicle.id)
        .execute(&self.pool)
        .await
        .storage_context("updating vehicle")?;

        if result.rows_affected() == 0 && !self.exists(vehicle.id).await? {
            return Err(AppError::VehicleNotFound(vehicle.id));
        }

        Ok(())
    }

    async fn delete(&self, id: VehicleId) -> Result<()> {
        let result = sqlx::query("DELETE FROM vehicles WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .storage_context("deleting vehicle")?;

        if result.rows_affected() == 0 {
            return Err(AppError::VehicleNotFound(id));
        }

        Ok(())
    }

    async fn unselect_all_by_owner(&self, owner_id: AccountId) -> Result<()> {
        sqlx::query("UPDATE vehicles SET is_selected = FALSE WHERE owner_id = ?")
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .storage_context("unselecting vehicles")?;
        Ok(())
    }

    async fn mark_selected(&self, id: VehicleId) -> Result<()> {
        let result = sqlx::query("UPDATE vehicles SET is_selected = TRUE WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .storage_context("selecting vehicle")?;

        if result.rows_affected() == 0 && !self.exists(id).await? {
            return Err(AppError::VehicleNotFound(id));
        }

        Ok(())
    }

    async fn select_exclusive(&self, owner_id: AccountId, vehicle_id: VehicleId) -> Result<()> {
        let mut tx = self.begin("starting vehicle selection").await?;
        lock_owner(&mut tx, owner_id).await?;

        let owned: Option<VehicleId> =
            sqlx::query_scalar("SELECT id FROM vehicles WHERE id = ? AND owner_id = ?")
                .bind(vehicle_id)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await
                .storage_context("loading vehicle for selection")?;
        if owned.is_none() {
            return Err(AppError::VehicleNotFound(vehicle_id));
        }

        sqlx::query("UPDATE vehicles SET is_selected = (id = ?) WHERE owner_id = ?")
            .bind(vehicle_id)
            .bind(owner_id)
            .execute(&mut *tx)
            .await
            .storage_context("switching selected vehicle")?;

        tx.commit()
            .await
            .storage_context("committing vehicle selection")
    }

    async fn delete_and_promote(
        &self,
        owner_id: AccountId,
        vehicle_id: VehicleId,
    ) -> Result<Option<VehicleId>> {
        let mut tx = self.begin("starting vehicle delete").await?;
        lock_owner(&mut tx, owner_id).await?;

        let target: Option<(bool,)> =
            sqlx::query_as("SELECT is_selected FROM vehicles WHERE id = ? AND owner_id = ?")
                .bind(vehicle_id)
                .bind(owner_id)
                .fetch_optional(&mut *tx)
                .await
                .storage_context("loading vehicle for delete")?;
        let (was_selected,) = target.ok_or(AppError::VehicleNotFound(vehicle_id))?;

        sqlx::query("DELETE FROM vehicles WHERE id = ?")
            .bind(vehicle_id)
            .execute(&mut *tx)
            .await
            .storage_context("deleting vehicle")?;

        let mut promoted = None;
        if was_selected {
            promoted = sqlx::query_scalar::<_, VehicleId>(
                "SELECT id FROM vehicles WHERE owner_id = ? ORDER BY id LIMIT 1",
            )
            .bind(owner_id)
            .fetch_optional(&mut *tx)
            .await
            .storage_context("finding vehicle to promote")?;

            if let Some(next) = promoted {
                sqlx::query("UPDATE vehicles SET is_selected = TRUE WHERE id = ?")
                    .bind(next)
                    .execute(&mut *tx)
                    .await
                    .storage_context("promoting vehicle")?;
            }
        }

        tx.commit()
            .await
            .storage_context("committing vehicle delete")?;
        Ok(promoted)
    }
}
