//! Role-based authorization for owner-scoped data.
//!
//! `can_access` and `can_modify` are pure predicates. `enforce` turns them
//! into errors for the service layer.

use crate::domain::{AccountId, Caller, Role};
use crate::error::AppError;

pub type PolicyResult<T> = std::result::Result<T, AppError>;

/// Whether `requester` may read data owned by `target_owner`.
pub fn can_access(target_owner: AccountId, requester: AccountId, role: Role) -> bool {
    match role {
        Role::Superuser => true,
        Role::Client | Role::Manager => target_owner == requester,
    }
}

/// Whether `requester` may change data owned by `target_owner`.
pub fn can_modify(target_owner: AccountId, requester: AccountId, role: Role) -> bool {
    match role {
        Role::Superuser => true,
        Role::Client | Role::Manager => target_owner == requester,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyAction {
    AccountRead,
    VehicleWrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyInput {
    pub action: PolicyAction,
    pub owner: AccountId,
}

/// Role carried by the caller. A caller without one cannot pass a
/// role-gated check.
pub fn require_role(caller: &Caller) -> PolicyResult<Role> {
    caller
        .role
        .ok_or_else(|| AppError::Unauthorized("Caller role is required".to_string()))
}

pub fn enforce(caller: &Caller, input: &PolicyInput) -> PolicyResult<()> {
    let role = require_role(caller)?;

    let allowed = match input.action {
        PolicyAction::AccountRead => can_access(input.owner, caller.account_id, role),
        PolicyAction::VehicleWrite => can_modify(input.owner, caller.account_id, role),
    };

    if allowed {
        Ok(())
    } else {
        Err(match input.action {
            PolicyAction::AccountRead => {
                AppError::Forbidden("Access denied to this account".to_string())
            }
            PolicyAction::VehicleWrite => {
                AppError::Forbidden("Access denied to this vehicle".to_string())
            }
        })
    }
}
