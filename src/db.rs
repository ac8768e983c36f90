//! Database connection handling.
//!
//! klimat stores its entities and grant rows in libsql. Supported URL
//! forms:
//! - local SQLite file: `klimat.db`, `file:path`, or `sqlite://path`
//! - in-memory: `:memory:` (tests, demos)
//! - remote Turso: `libsql://...` or `https://...` (needs `TURSO_AUTH_TOKEN`)

use std::sync::Arc;

use libsql::{Builder, Connection, Database};

/// Shared database handle carried in the request context.
pub type Handle = Arc<Database>;

/// Open the database named by `url`.
pub async fn connect(url: &str) -> crate::Result<Database> {
    let db = if url.starts_with("libsql://") || url.starts_with("https://") {
        let token = std::env::var("TURSO_AUTH_TOKEN").map_err(|_| {
            crate::Error::Config("TURSO_AUTH_TOKEN not set for remote database".into())
        })?;
        Builder::new_remote(url.to_string(), token).build().await?
    } else if url == ":memory:" {
        Builder::new_local(":memory:").build().await?
    } else {
        let path = url
            .strip_prefix("sqlite://")
            .or_else(|| url.strip_prefix("file:"))
            .unwrap_or(url);
        Builder::new_local(path).build().await?
    };

    Ok(db)
}

/// Get a connection from the database.
pub fn connection(db: &Database) -> crate::Result<Connection> {
    Ok(db.connect()?)
}

// Re-export commonly used libsql types for convenience
pub use libsql::{Connection as DbConnection, Database as Db, Row, params};
