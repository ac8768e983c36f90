//! Test deployment: seeded database plus a live server on a random port.

use std::net::SocketAddr;
use std::sync::Arc;

use klimat::Module;
use klimat::config::{Auth, Config, Database, Server as ServerConfig};
use klimat::seed::{self, DemoData};
use klimat::server::{self, Server};
use klimat::store::Store;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

const TEST_SECRET: &str = "test-secret-that-is-at-least-32b!";

/// A running server over a seeded temp-file database.
pub struct Deployment {
    pub server: Server,
    pub store: Store,
    pub data: DemoData,
    pub auth: Auth,
    // Keeps the database file alive for the test's duration.
    _dir: tempfile::TempDir,
}

impl Deployment {
    pub fn addr(&self) -> SocketAddr {
        self.server.addr()
    }

    /// Bearer token for the given seeded user id.
    pub fn token_for(&self, user_id: u64) -> String {
        klimat::auth::create_token(&self.auth, user_id).expect("failed to create token")
    }
}

/// Start a server on a random port with the demo dataset loaded.
pub async fn deploy() -> Deployment {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let db_path = dir.path().join("klimat.db");
    let db_url = db_path.to_str().expect("non-utf8 temp path").to_string();

    let auth = Auth {
        jwt_secret: TEST_SECRET.to_string(),
        token_expiry_days: 1,
    };
    let config = Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        database: Database {
            url: db_url.clone(),
        },
        auth: auth.clone(),
    };

    let db = Arc::new(klimat::db::connect(&db_url).await.expect("failed to open db"));
    let store = Store::new(Arc::clone(&db));
    let data = seed::demo(&store).await.expect("failed to seed demo data");

    let mut router = klimat::Router::new();
    for module in klimat::api_modules() {
        module.routes(&mut router);
    }

    let server = server::start(config, Some(db), router.into_handle())
        .await
        .expect("failed to start test server");

    Deployment {
        server,
        store,
        data,
        auth,
        _dir: dir,
    }
}

/// Send one HTTP/1.1 request with `Connection: close` and return
/// (status, body).
pub async fn request(
    addr: SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&str>,
) -> (u16, String) {
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\n");
    if let Some(token) = token {
        req.push_str(&format!("Authorization: Bearer {token}\r\n"));
    }
    match body {
        Some(body) => {
            req.push_str("Content-Type: application/json\r\n");
            req.push_str(&format!("Content-Length: {}\r\n", body.len()));
            req.push_str("Connection: close\r\n\r\n");
            req.push_str(body);
        }
        None => req.push_str("Connection: close\r\n\r\n"),
    }

    let mut stream = TcpStream::connect(addr).await.expect("failed to connect");
    stream
        .write_all(req.as_bytes())
        .await
        .expect("failed to write");

    let mut buf = Vec::new();
    tokio::time::timeout(
        std::time::Duration::from_secs(5),
        stream.read_to_end(&mut buf),
    )
    .await
    .expect("response timed out")
    .expect("failed to read");

    let raw = String::from_utf8_lossy(&buf).to_string();
    let status: u16 = raw
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0);
    let body = raw
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_default();
    (status, body)
}

/// GET shortcut.
pub async fn get(addr: SocketAddr, path: &str, token: Option<&str>) -> (u16, String) {
    request(addr, "GET", path, token, None).await
}

/// Parse a JSON array body and collect the `id` field of each element.
pub fn ids_of(body: &str) -> Vec<u64> {
    let value: serde_json::Value = serde_json::from_str(body).expect("body is not JSON");
    value
        .as_array()
        .expect("body is not a JSON array")
        .iter()
        .map(|item| item["id"].as_u64().expect("missing id"))
        .collect()
}
