//! Account domain model

use super::common::AccountId;
use super::role::Role;
use super::vehicle::Vehicle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

lazy_static::lazy_static! {
    /// E.164: leading '+', no leading zero, at most 15 digits
    pub static ref PHONE_NUMBER_REGEX: regex::Regex = regex::Regex::new(r"^\+[1-9]\d{1,14}$").unwrap();
}

fn validate_phone_number(phone: &str) -> Result<(), validator::ValidationError> {
    if PHONE_NUMBER_REGEX.is_match(phone) {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_phone_number"))
    }
}

fn validate_account_id(id: &AccountId) -> Result<(), validator::ValidationError> {
    if id.is_valid() {
        Ok(())
    } else {
        Err(validator::ValidationError::new("invalid_account_id"))
    }
}

/// Account holder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub phone_number: Option<String>,
    pub link: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            id: AccountId::default(),
            name: String::new(),
            phone_number: None,
            link: None,
            role: Role::default(),
            created_at: Utc::now(),
        }
    }
}

/// Input for signing up a new account
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAccountInput {
    #[validate(custom(function = "validate_account_id"))]
    pub id: AccountId,
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,
    #[validate(length(max = 255))]
    pub link: Option<String>,
    pub role: Role,
}

impl CreateAccountInput {
    pub fn into_account(self, created_at: DateTime<Utc>) -> Account {
        Account {
            id: self.id,
            name: self.name,
            phone_number: self.phone_number,
            link: self.link,
            role: self.role,
            created_at,
        }
    }
}

/// Partial update; omitted fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateAccountInput {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(custom(function = "validate_phone_number"))]
    pub phone_number: Option<String>,
    #[validate(length(max = 255))]
    pub link: Option<String>,
}

impl UpdateAccountInput {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone_number.is_none() && self.link.is_none()
    }

    pub fn apply_to(self, account: &mut Account) {
        if let Some(name) = self.name {
            account.name = name;
        }
        if let Some(phone_number) = self.phone_number {
            account.phone_number = Some(phone_number);
        }
        if let Some(link) = self.link {
            account.link = Some(link);
        }
    }
}

/// Account together with every vehicle it owns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountWithVehicles {
    #[serde(flatten)]
    pub account: Account,
    pub vehicles: Vec<Vehicle>,
}
