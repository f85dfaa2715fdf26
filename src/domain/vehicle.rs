//! Vehicle domain model

use super::common::{AccountId, VehicleId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Vehicle {
    pub id: VehicleId,
    pub owner_id: AccountId,
    pub brand: String,
    pub model: String,
    pub license_plate: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub is_selected: bool,
}

/// Vehicle about to be inserted. `is_selected` is the caller's intent;
/// storage may correct it to keep one selected vehicle per owner.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVehicle {
    pub owner_id: AccountId,
    pub brand: String,
    pub model: String,
    pub license_plate: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub is_selected: bool,
}

impl NewVehicle {
    pub fn into_vehicle(self, id: VehicleId) -> Vehicle {
        Vehicle {
            id,
            owner_id: self.owner_id,
            brand: self.brand,
            model: self.model,
            license_plate: self.license_plate,
            color: self.color,
            size: self.size,
            is_selected: self.is_selected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateVehicleInput {
    #[validate(length(min = 1, max = 100))]
    pub brand: String,
    #[validate(length(min = 1, max = 100))]
    pub model: String,
    #[validate(length(min = 1, max = 20))]
    pub license_plate: String,
    #[validate(length(max = 50))]
    pub color: Option<String>,
    #[validate(length(max = 50))]
    pub size: Option<String>,
}

impl CreateVehicleInput {
    pub fn for_owner(self, owner_id: AccountId, is_selected: bool) -> NewVehicle {
        NewVehicle {
            owner_id,
            brand: self.brand,
            model: self.model,
            license_plate: self.license_plate,
            color: self.color,
            size: self.size,
            is_selected,
        }
    }
}

/// Partial update of descriptive attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateVehicleInput {
    #[validate(length(min = 1, max = 100))]
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub model: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub license_plate: Option<String>,
    #[validate(length(max = 50))]
    pub color: Option<String>,
    #[validate(length(max = 50))]
    pub size: Option<String>,
}

impl UpdateVehicleInput {
    pub fn apply_to(self, vehicle: &mut Vehicle) {
        if let Some(brand) = self.brand {
            vehicle.brand = brand;
        }
        if let Some(model) = self.model {
            vehicle.model = model;
        }
        if let Some(license_plate) = self.license_plate {
            vehicle.license_plate = license_plate;
        }
        if let Some(color) = self.color {
            vehicle.color = Some(color);
        }
        if let Some(size) = self.size {
            vehicle.size = Some(size);
        }
    }
}
