//! klimat - microclimate data service.
//!
//! Tracks sensor readings ("data points") for building objects grouped
//! under projects and exposes them through a CRUD API. Every request is
//! authorized by a hierarchical, string-encoded grant scheme:
//!
//! - **Resource model**: the project → building object → content tree
//!   ([`resource`])
//! - **Codec**: the codename string grammar, owned by one module
//!   ([`codename`])
//! - **Evaluator & filter**: pure allow/deny decisions and collection
//!   scoping over a caller's grant snapshot ([`access`])
//! - **Grant store boundary**: per-request snapshot of a caller's flags
//!   and raw codenames ([`grants`])
//!
//! Around that core sits the usual service plumbing: layered config, JWT
//! bearer auth, a hyper server with matchit routing, libsql persistence,
//! and the demo seeder.
//!
//! # Example
//!
//! ```ignore
//! use klimat::config::{Loader, Overrides};
//! use klimat::{Module, Router};
//!
//! #[tokio::main]
//! async fn main() -> klimat::Result<()> {
//!     let config = Loader::default().load(None, Overrides::default())?;
//!     let db = std::sync::Arc::new(klimat::db::connect(&config.database.url).await?);
//!
//!     let mut router = Router::new();
//!     for module in klimat::api_modules() {
//!         module.routes(&mut router);
//!     }
//!
//!     klimat::server::run(config, Some(db), router.into_handle()).await
//! }
//! ```

pub mod access;
pub mod api;
pub mod auth;
pub mod codename;
pub mod config;
pub mod db;
pub mod error;
pub mod grants;
pub mod module;
pub mod resource;
pub mod response;
pub mod router;
pub mod seed;
pub mod server;
pub mod store;

// Re-export main types at crate root
pub use access::{Decision, Scope};
pub use codename::Codename;
pub use config::{Config, Loader};
pub use db::Handle as DbHandle;
pub use error::{Error, Result};
pub use grants::{CallerGrants, GrantStore};
pub use module::Module;
pub use resource::{Action, ResourcePath};
pub use router::{Context, Router};

// Re-export commonly used dependencies for convenience
pub use hyper::Method;
pub use serde_json::json;

/// The full API surface as pluggable modules.
pub fn api_modules() -> Vec<Box<dyn Module>> {
    vec![
        Box::new(api::ProjectsModule),
        Box::new(api::BuildingsModule),
        Box::new(api::ContentModule),
    ]
}
