//! Concrete adapter implementations for ports.

pub mod argon2_credentials;
pub mod csv_adapter;
pub mod file_config_adapter;
pub mod jwt_tokens;
pub mod notifier;
pub mod push_hub;
pub mod quote;
pub mod sqlite_adapter;
#[cfg(feature = "web")]
pub mod web;
