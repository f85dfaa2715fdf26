//! Data access layer (Repository pattern)

pub mod account;
pub mod vehicle;

pub use account::{AccountRepository, AccountRepositoryImpl};
pub use vehicle::{VehicleRepository, VehicleRepositoryImpl};
