//! The single shared database connection and its lifecycle.
//!
//! [`ConnectionManager`] holds at most one live [`Store`] for the whole
//! process. It is created once at startup and passed to every handler via
//! Axum state; nothing here is a global.
//!
//! # Lifecycle
//!
//! ```text
//!                connect()                ok
//! Disconnected ───────────▶ Connecting ─────────▶ Connected
//!      ▲                        │   ▲                 │
//!      │ disconnect()           │   │ connect()       │ connect()
//!      │                   err  ▼   │                 ▼
//!      └──────────────────────  Failed            Connecting ...
//! ```
//!
//! A failed attempt never tears down a connection that was already
//! working; the old store keeps serving until a new one succeeds.
//!
//! # Swapping
//!
//! Readers clone the `Arc<dyn Store>` under a short lock and query after
//! releasing it. Replacing the store is one assignment under the write
//! lock, so a reader sees either the old handle or the new one. Queries
//! already running on the old handle finish against it (or fail as an
//! ordinary request error once it is closed).

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use brainlex_core::store::Store;

use crate::config::DbConfig;
use crate::db;
use crate::error::ApiError;
use crate::pg_store::PgStore;

/// Credentials submitted through `POST /api/connect`.
#[derive(Clone, Deserialize)]
pub struct ConnectParams {
    pub host: String,
    #[serde(deserialize_with = "port_from_string_or_number")]
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
}

impl fmt::Debug for ConnectParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .finish()
    }
}

impl ConnectParams {
    /// All fields must be present; the UI form sends empty strings for
    /// untouched inputs.
    pub fn validate(&self) -> Result<(), ApiError> {
        let missing: Vec<&str> = [
            ("host", self.host.trim().is_empty()),
            ("username", self.username.is_empty()),
            ("password", self.password.is_empty()),
            ("database", self.database.trim().is_empty()),
        ]
        .into_iter()
        .filter_map(|(name, empty)| empty.then_some(name))
        .collect();

        if !missing.is_empty() {
            return Err(ApiError::Validation(format!(
                "missing connection fields: {}",
                missing.join(", ")
            )));
        }
        if self.port == 0 {
            return Err(ApiError::Validation(
                "port must be between 1 and 65535".into(),
            ));
        }
        Ok(())
    }

    /// Replaces any echo of the password in a driver message.
    pub fn redact(&self, message: &str) -> String {
        if self.password.is_empty() {
            message.to_string()
        } else {
            message.replace(&self.password, "***")
        }
    }
}

fn port_from_string_or_number<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Port {
        Number(u16),
        Text(String),
    }

    match Port::deserialize(deserializer)? {
        Port::Number(n) => Ok(n),
        Port::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid port: {s:?}"))),
    }
}

/// Opens a [`Store`] from credentials. Separated from the manager so tests
/// can hand out in-memory stores.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &ConnectParams) -> Result<Arc<dyn Store>>;
}

/// Connects to PostgreSQL and wraps the pool in a [`PgStore`].
pub struct PgConnector {
    config: DbConfig,
}

impl PgConnector {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Connector for PgConnector {
    async fn connect(&self, params: &ConnectParams) -> Result<Arc<dyn Store>> {
        let pool = db::connect(params, &self.config).await?;
        Ok(Arc::new(PgStore::new(pool)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Body of `GET /api/connection_status`. `connected` is the field the UI
/// relies on; the rest is informational.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub state: ConnectionState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connected_since: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

struct Inner {
    state: ConnectionState,
    store: Option<Arc<dyn Store>>,
    connected_since: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Settles a `Connecting` state if the connect future is dropped before
/// the connector answers (client went away, outer timeout fired).
struct PendingConnect<'a> {
    inner: &'a RwLock<Inner>,
    armed: bool,
}

impl Drop for PendingConnect<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if inner.state != ConnectionState::Connecting {
            return;
        }
        tracing::warn!("connection attempt cancelled");
        if inner.store.is_some() {
            inner.state = ConnectionState::Connected;
        } else {
            inner.state = ConnectionState::Failed;
            inner.last_error = Some("connection attempt cancelled".to_string());
        }
    }
}

pub struct ConnectionManager {
    connector: Arc<dyn Connector>,
    inner: RwLock<Inner>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            inner: RwLock::new(Inner {
                state: ConnectionState::Disconnected,
                store: None,
                connected_since: None,
                last_error: None,
            }),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attempts a new connection and, on success, swaps it in.
    pub async fn connect(&self, params: &ConnectParams) -> Result<(), ApiError> {
        params.validate()?;

        self.write().state = ConnectionState::Connecting;
        let mut pending = PendingConnect {
            inner: &self.inner,
            armed: true,
        };
        tracing::info!(
            host = %params.host,
            port = params.port,
            database = %params.database,
            username = %params.username,
            "connecting to database"
        );

        let result = self.connector.connect(params).await;
        pending.armed = false;

        match result {
            Ok(store) => {
                let previous = {
                    let mut inner = self.write();
                    inner.state = ConnectionState::Connected;
                    inner.connected_since = Some(Utc::now());
                    inner.last_error = None;
                    inner.store.replace(store)
                };
                if let Some(old) = previous {
                    tracing::debug!("closing replaced connection");
                    old.close().await;
                }
                tracing::info!(database = %params.database, "database connected");
                Ok(())
            }
            Err(e) => {
                let message = params.redact(&format!("{e:#}"));
                tracing::warn!(error = %message, "database connection failed");
                let mut inner = self.write();
                inner.last_error = Some(message.clone());
                // Keep serving from a previously working connection.
                inner.state = if inner.store.is_some() {
                    ConnectionState::Connected
                } else {
                    ConnectionState::Failed
                };
                Err(ApiError::ConnectionFailed(message))
            }
        }
    }

    /// The current store, or [`ApiError::NotConnected`]. While a reconnect
    /// is in progress this is still the previous store.
    pub fn store(&self) -> Result<Arc<dyn Store>, ApiError> {
        self.read().store.clone().ok_or(ApiError::NotConnected)
    }

    pub fn is_connected(&self) -> bool {
        self.store().is_ok()
    }

    pub fn status(&self) -> ConnectionStatus {
        let inner = self.read();
        ConnectionStatus {
            connected: inner.store.is_some(),
            state: inner.state,
            connected_since: inner.connected_since,
            last_error: inner.last_error.clone(),
        }
    }

    /// Closes and forgets the active store.
    pub async fn disconnect(&self) {
        let previous = {
            let mut inner = self.write();
            inner.state = ConnectionState::Disconnected;
            inner.connected_since = None;
            inner.store.take()
        };
        if let Some(store) = previous {
            store.close().await;
            tracing::info!("database disconnected");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use brainlex_core::store::memory::InMemoryStore;
    use std::sync::Mutex;
    use std::time::Duration;

    /// Hands out the queued stores in order; an empty queue is a failure.
    struct QueueConnector {
        stores: Mutex<Vec<Arc<InMemoryStore>>>,
    }

    #[async_trait]
    impl Connector for QueueConnector {
        async fn connect(&self, params: &ConnectParams) -> Result<Arc<dyn Store>> {
            let mut stores = self.stores.lock().unwrap();
            if stores.is_empty() {
                anyhow::bail!(
                    "password authentication failed (password={})",
                    params.password
                );
            }
            Ok(stores.remove(0))
        }
    }

    fn params() -> ConnectParams {
        ConnectParams {
            host: "localhost".into(),
            port: 5432,
            username: "neuro".into(),
            password: "s3cret".into(),
            database: "atlas".into(),
        }
    }

    fn manager(stores: Vec<Arc<InMemoryStore>>) -> ConnectionManager {
        ConnectionManager::new(Arc::new(QueueConnector {
            stores: Mutex::new(stores),
        }))
    }

    #[test]
    fn test_port_accepts_string_or_number() {
        let a: ConnectParams = serde_json::from_str(
            r#"{"host":"h","port":"5433","username":"u","password":"p","database":"d"}"#,
        )
        .unwrap();
        let b: ConnectParams = serde_json::from_str(
            r#"{"host":"h","port":5433,"username":"u","password":"p","database":"d"}"#,
        )
        .unwrap();
        assert_eq!(a.port, 5433);
        assert_eq!(b.port, 5433);
        assert!(serde_json::from_str::<ConnectParams>(
            r#"{"host":"h","port":"abc","username":"u","password":"p","database":"d"}"#,
        )
        .is_err());
    }

    #[test]
    fn test_debug_hides_password() {
        let shown = format!("{:?}", params());
        assert!(!shown.contains("s3cret"));
    }

    #[test]
    fn test_validate_lists_missing_fields() {
        let mut p = params();
        p.host = " ".into();
        p.database = String::new();
        let err = p.validate().unwrap_err();
        assert_eq!(err.to_string(), "missing connection fields: host, database");
    }

    #[tokio::test]
    async fn test_starts_disconnected() {
        let mgr = manager(vec![]);
        assert!(matches!(mgr.store(), Err(ApiError::NotConnected)));
        assert_eq!(mgr.status().state, ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_failed_connect_redacts_password() {
        let mgr = manager(vec![]);
        let err = mgr.connect(&params()).await.unwrap_err();
        assert!(!err.to_string().contains("s3cret"));
        let status = mgr.status();
        assert_eq!(status.state, ConnectionState::Failed);
        assert!(!status.connected);
        assert!(status.last_error.is_some());
    }

    #[tokio::test]
    async fn test_failed_state_is_recoverable() {
        let connector = Arc::new(QueueConnector {
            stores: Mutex::new(vec![]),
        });
        let mgr = ConnectionManager::new(connector.clone());
        assert!(mgr.connect(&params()).await.is_err());
        assert_eq!(mgr.status().state, ConnectionState::Failed);

        connector
            .stores
            .lock()
            .unwrap()
            .push(Arc::new(InMemoryStore::new()));
        assert!(mgr.connect(&params()).await.is_ok());
        assert!(mgr.status().connected);
        assert!(mgr.status().last_error.is_none());
    }

    #[tokio::test]
    async fn test_reconnect_swaps_and_closes_old_store() {
        let first = Arc::new(InMemoryStore::new());
        let second = Arc::new(InMemoryStore::new());
        let mgr = manager(vec![first.clone(), second.clone()]);

        mgr.connect(&params()).await.unwrap();
        let held = mgr.store().unwrap();
        mgr.connect(&params()).await.unwrap();

        assert!(first.is_closed());
        assert!(!second.is_closed());
        // A handle taken before the swap fails cleanly rather than panicking.
        assert!(held.ping().await.is_err());
        assert!(mgr.store().unwrap().ping().await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_reconnect_keeps_existing_store() {
        let store = Arc::new(InMemoryStore::new());
        let mgr = manager(vec![store.clone()]);
        mgr.connect(&params()).await.unwrap();
        assert!(mgr.connect(&params()).await.is_err());
        assert!(mgr.is_connected());
        assert!(!store.is_closed());
    }

    /// Hands out `first` once, then never answers.
    struct StallingConnector {
        first: Mutex<Option<Arc<InMemoryStore>>>,
    }

    #[async_trait]
    impl Connector for StallingConnector {
        async fn connect(&self, _params: &ConnectParams) -> Result<Arc<dyn Store>> {
            let first = self.first.lock().unwrap().take();
            match first {
                Some(store) => Ok(store as Arc<dyn Store>),
                None => std::future::pending().await,
            }
        }
    }

    async fn abandon_connect(mgr: &ConnectionManager) {
        let p = params();
        let attempt = tokio::time::timeout(Duration::from_millis(20), mgr.connect(&p)).await;
        assert!(attempt.is_err(), "connect should still be pending");
    }

    #[tokio::test]
    async fn test_cancelled_connect_does_not_stay_connecting() {
        let mgr = ConnectionManager::new(Arc::new(StallingConnector {
            first: Mutex::new(None),
        }));
        abandon_connect(&mgr).await;

        let status = mgr.status();
        assert_eq!(status.state, ConnectionState::Failed);
        assert!(!status.connected);
        assert!(status.last_error.is_some());
    }

    #[tokio::test]
    async fn test_cancelled_reconnect_keeps_existing_store() {
        let store = Arc::new(InMemoryStore::new());
        let mgr = ConnectionManager::new(Arc::new(StallingConnector {
            first: Mutex::new(Some(store.clone())),
        }));
        mgr.connect(&params()).await.unwrap();
        abandon_connect(&mgr).await;

        let status = mgr.status();
        assert_eq!(status.state, ConnectionState::Connected);
        assert!(status.connected);
        assert!(!store.is_closed());
    }

    #[tokio::test]
    async fn test_disconnect_closes_store() {
        let store = Arc::new(InMemoryStore::new());
        let mgr = manager(vec![store.clone()]);
        mgr.connect(&params()).await.unwrap();
        mgr.disconnect().await;
        assert!(store.is_closed());
        assert!(!mgr.is_connected());
    }
}
