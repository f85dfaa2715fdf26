//! Account and vehicle business logic
//!
//! The service owns the one-selected-vehicle-per-owner rule at the
//! orchestration level. The storage-level guarantees come from
//! `VehicleRepository::select_exclusive` and `delete_and_promote`.

use crate::domain::{
    Account, AccountId, AccountWithVehicles, Caller, CreateAccountInput, CreateVehicleInput, Role,
    UpdateAccountInput, UpdateVehicleInput, Vehicle, VehicleId,
};
use crate::error::{AppError, Result};
use crate::policy::{self, PolicyAction, PolicyInput};
use crate::repository::{AccountRepository, VehicleRepository};
use chrono::{SubsecRound, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use validator::Validate;

const SELECTION_CHANGES_METRIC: &str = "motorist_vehicle_selection_changes_total";

pub struct AccountService<A: AccountRepository, V: VehicleRepository> {
    accounts: Arc<A>,
    vehicles: Arc<V>,
}

impl<A: AccountRepository, V: VehicleRepository> AccountService<A, V> {
    pub fn new(accounts: Arc<A>, vehicles: Arc<V>) -> Self {
        Self { accounts, vehicles }
    }

    #[instrument(skip(self, input), fields(account_id = %input.id))]
    pub async fn create_account(&self, input: CreateAccountInput) -> Result<Account> {
        input.validate()?;

        // Probe first; the insert still reports a duplicate if one slips in between
        match self.accounts.get_by_id(input.id).await {
            Ok(_) => return Err(AppError::AccountAlreadyExists(input.id)),
            Err(AppError::AccountNotFound(_)) => {}
            Err(e) => return Err(e),
        }

        // Stored as TIMESTAMP; keep the response identical to later reads
        let account = input.into_account(Utc::now().trunc_subsecs(0));
        self.accounts.create(&account).await?;

        info!(role = %account.role, "Account created");
        Ok(account)
    }

    pub async fn get_account(&self, id: AccountId) -> Result<Account> {
        self.accounts.get_by_id(id).await
    }

    #[instrument(skip(self, input))]
    pub async fn update_account(
        &self,
        id: AccountId,
        input: UpdateAccountInput,
    ) -> Result<Account> {
        input.validate()?;

        let mut account = self.accounts.get_by_id(id).await?;
        if input.is_empty() {
            return Ok(account);
        }

        input.apply_to(&mut account);
        self.accounts.update(&account).await?;
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn delete_account(&self, id: AccountId) -> Result<()> {
        self.accounts.delete(id).await?;
        info!("Account deleted");
        Ok(())
    }

    pub async fn get_account_with_vehicles(&self, id: AccountId) -> Result<AccountWithVehicles> {
        let account = self.accounts.get_by_id(id).await?;
        let vehicles = self.vehicles.list_by_owner(id).await?;
        Ok(AccountWithVehicles { account, vehicles })
    }

    /// Read another account's profile; clients and managers only see their own.
    pub async fn get_account_for(
        &self,
        caller: &Caller,
        owner_id: AccountId,
    ) -> Result<AccountWithVehicles> {
        policy::enforce(
            caller,
            &PolicyInput {
                action: PolicyAction::AccountRead,
                owner: owner_id,
            },
        )?;
        self.get_account_with_vehicles(owner_id).await
    }

    pub async fn list_superusers(&self) -> Result<Vec<AccountId>> {
        self.accounts.list_ids_by_role(Role::Superuser).await
    }

    #[instrument(skip(self, input))]
    pub async fn create_vehicle(
        &self,
        owner_id: AccountId,
        input: CreateVehicleInput,
    ) -> Result<Vehicle> {
        input.validate()?;

        self.accounts.get_by_id(owner_id).await?;
        let existing = self.vehicles.list_by_owner(owner_id).await?;

        let vehicle = self
            .vehicles
            .create(&input.for_owner(owner_id, existing.is_empty()))
            .await?;

        info!(
            vehicle_id = %vehicle.id,
            is_selected = vehicle.is_selected,
            "Vehicle created"
        );
        Ok(vehicle)
    }

    #[instrument(skip(self, caller, input), fields(requester = %caller.account_id))]
    pub async fn update_vehicle(
        &self,
        caller: &Caller,
        vehicle_id: VehicleId,
        input: UpdateVehicleInput,
    ) -> Result<Vehicle> {
        policy::require_role(caller)?;
        input.validate()?;

        let mut vehicle = self.vehicles.get_by_id(vehicle_id).await?;
        authorize_write(caller, &vehicle)?;

        input.apply_to(&mut vehicle);
        self.vehicles.update(&vehicle).await?;
        Ok(vehicle)
    }

    #[instrument(skip(self, caller), fields(requester = %caller.account_id))]
    pub async fn delete_vehicle(&self, caller: &Caller, vehicle_id: VehicleId) -> Result<()> {
        policy::require_role(caller)?;

        let vehicle = self.vehicles.get_by_id(vehicle_id).await?;
        authorize_write(caller, &vehicle)?;

        let promoted = self
            .vehicles
            .delete_and_promote(vehicle.owner_id, vehicle_id)
            .await?;

        if let Some(next) = promoted {
            metrics::counter!(SELECTION_CHANGES_METRIC, "operation" => "promote").increment(1);
            info!(promoted = %next, "Selected vehicle deleted, sibling promoted");
        } else {
            info!("Vehicle deleted");
        }
        Ok(())
    }

    /// Make a vehicle its owner's selected one. Selecting the already
    /// selected vehicle performs no writes.
    #[instrument(skip(self, caller), fields(requester = %caller.account_id))]
    pub async fn set_selected(&self, caller: &Caller, vehicle_id: VehicleId) -> Result<Vehicle> {
        policy::require_role(caller)?;

        let mut vehicle = self.vehicles.get_by_id(vehicle_id).await?;
        authorize_write(caller, &vehicle)?;

        if vehicle.is_selected {
            return Ok(vehicle);
        }

        self.vehicles
            .select_exclusive(vehicle.owner_id, vehicle_id)
            .await?;
        metrics::counter!(SELECTION_CHANGES_METRIC, "operation" => "select").increment(1);

        vehicle.is_selected = true;
        Ok(vehicle)
    }

    pub async fn get_selected(&self, owner_id: AccountId) -> Result<Vehicle> {
        self.vehicles.get_selected_by_owner(owner_id).await
    }
}

fn authorize_write(caller: &Caller, vehicle: &Vehicle) -> Result<()> {
    policy::enforce(
        caller,
        &PolicyInput {
            action: PolicyAction::VehicleWrite,
            owner: vehicle.owner_id,
        },
    )
}
