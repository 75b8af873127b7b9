//! # Ruten Domain
//!
//! Domain types and models for the Ruten partner API client.
//!
//! This crate contains:
//! - Result/error value types returned to callers (`ApiResult`, `ApiError`)
//! - Domain error types and Result definitions
//! - Domain constants (upstream host, header names, timeouts)
//!
//! ## Architecture
//! - No dependencies on other workspace crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
