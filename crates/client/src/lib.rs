//! # Ruten Client
//!
//! Authenticated-request layer for the Ruten partner e-commerce API.
//!
//! This crate contains:
//! - Credential loading and validation (`credentials`)
//! - Canonical signature construction (`signature`)
//! - Request dispatch and response normalization (`dispatch`)
//! - Typed API operations (`api`)
//! - Advisory clock-skew probe (`skew`)
//!
//! ## Architecture
//! - Every dispatched call returns a normalized [`ruten_domain::ApiResult`]
//! - One attempt per call, no retries, no shared mutable state
//! - Diagnostics flow through an injected [`diagnostics::DiagnosticsSink`]
//!
//! ```no_run
//! use ruten_client::RutenClient;
//!
//! # async fn run() -> ruten_domain::Result<()> {
//! let client = RutenClient::from_env()?;
//! client.spawn_clock_check()?;
//! let products = client.list_products(Default::default()).await;
//! # let _ = products;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod credentials;
pub mod diagnostics;
pub mod dispatch;
pub mod intent;
pub mod signature;
pub mod skew;

// Re-export commonly used items
pub use api::{OrderListQuery, ProductListQuery, RutenClient, RutenClientBuilder};
pub use credentials::Credentials;
pub use diagnostics::{CapturingDiagnostics, DiagnosticsSink, DispatchRecord, TracingDiagnostics};
pub use dispatch::RequestDispatcher;
pub use intent::RequestIntent;
pub use skew::ClockSkewAdvisor;
