//! Core types for the Vantage video access gateway.
//!
//! This crate holds configuration, the unified error type, and the domain
//! models shared by the gateway, database, and API crates.

pub mod config;
pub mod error;
pub mod models;

pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
