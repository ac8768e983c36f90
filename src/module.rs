//! Module trait for pluggable API modules.
//!
//! Each API surface (projects, buildings, data points, ...) implements
//! `Module` and registers its routes with the router.
//!
//! # Example
//!
//! ```ignore
//! use klimat::{Module, Router};
//!
//! pub struct HealthModule;
//!
//! impl Module for HealthModule {
//!     fn name(&self) -> &'static str {
//!         "health"
//!     }
//!
//!     fn routes(&self, router: &mut Router) {
//!         router.get("/health", |_ctx| async move {
//!             klimat::response::ok(&serde_json::json!({
//!                 "status": "ok"
//!             }))
//!         });
//!     }
//! }
//! ```

use crate::router::Router;

/// A pluggable API module.
///
/// Modules register their routes with the router and can hold their own
/// state, captured in closures when registering routes.
pub trait Module: Send + Sync {
    /// Module name for identification and logging.
    fn name(&self) -> &'static str;

    /// Register routes with the router.
    fn routes(&self, router: &mut Router);
}
