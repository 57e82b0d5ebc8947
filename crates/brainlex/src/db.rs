//! PostgreSQL connection pool creation.
//!
//! A pool is opened from the credentials the user submits, not from the
//! config file. Options are set field by field rather than through a URL,
//! so passwords and usernames containing `@`, `/` or `:` need no escaping.
//!
//! # Connection Pool
//!
//! Uses `sqlx::PgPool` sized by `[db].max_connections`. Establishing the
//! pool (including a `SELECT 1` check) is bounded by
//! `[db].connect_timeout_secs`.

use anyhow::{Context, Result};
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use crate::config::DbConfig;
use crate::connection::ConnectParams;

/// Open a pool to the database described by `params` and verify it.
///
/// # Errors
///
/// Returns an error if the host is unreachable, the credentials are
/// rejected, the database does not exist, or the attempt exceeds the
/// configured connect timeout.
pub async fn connect(params: &ConnectParams, config: &DbConfig) -> Result<PgPool> {
    let options = PgConnectOptions::new()
        .host(&params.host)
        .port(params.port)
        .username(&params.username)
        .password(&params.password)
        .database(&params.database)
        .application_name("brainlex");

    let attempt = async {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect_with(options)
            .await?;
        sqlx::query("SELECT 1").execute(&pool).await?;
        Ok::<_, sqlx::Error>(pool)
    };

    let pool = tokio::time::timeout(config.connect_timeout(), attempt)
        .await
        .with_context(|| {
            format!(
                "timed out after {}s connecting to {}:{}",
                config.connect_timeout_secs, params.host, params.port
            )
        })??;

    Ok(pool)
}
