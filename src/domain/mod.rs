//! Domain models for Motorist Core

pub mod account;
pub mod common;
pub mod role;
pub mod vehicle;

pub use account::*;
pub use common::*;
pub use role::*;
pub use vehicle::*;
