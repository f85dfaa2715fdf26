//! Motorist Core - account and vehicle registry service
//!
//! Accounts own vehicles; each owner with at least one vehicle has exactly
//! one selected vehicle. Exposed over a REST API with role-based access.

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod jwt;
pub mod middleware;
pub mod migration;
pub mod policy;
pub mod repository;
pub mod server;
pub mod service;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
