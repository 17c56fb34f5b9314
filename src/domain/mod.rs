//! Core domain types and services.

pub mod access;
pub mod admin;
pub mod error;
pub mod goal;
pub mod goal_tracker;
pub mod holding;
pub mod instrument;
pub mod instrument_cache;
pub mod ledger;
pub mod notification;
pub mod portfolio;
pub mod position_book;
pub mod price_refresh;
pub mod quotes;
pub mod settings;
pub mod user;
