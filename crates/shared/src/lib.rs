//! Shared types, errors, and configuration for Arqon.
//!
//! This crate provides common types used across all other crates:
//! - Money rounding helpers with decimal precision
//! - Typed IDs for type-safe document references
//! - List limits for listing endpoints
//! - Request decoding errors
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, ImportConfig, PostingConfig};
pub use error::AppError;
