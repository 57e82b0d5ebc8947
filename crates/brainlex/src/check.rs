//! `brainlex check` and `brainlex init`: credential-driven CLI commands.

use anyhow::Result;
use brainlex_core::store::Store;

use crate::config::Config;
use crate::connection::ConnectParams;
use crate::db;
use crate::migrate;
use crate::pg_store::PgStore;

/// Connects with `params`, prints what the database offers, and closes.
pub async fn run_check(config: &Config, params: &ConnectParams) -> Result<()> {
    params.validate()?;
    let pool = db::connect(params, &config.db)
        .await
        .map_err(|e| anyhow::anyhow!(params.redact(&format!("{e:#}"))))?;
    let store = PgStore::new(pool);

    let models = store.hierarchy_models().await?;
    println!(
        "connected:        {}@{}:{}/{}",
        params.username, params.host, params.port, params.database
    );
    if models.is_empty() {
        println!("hierarchy models: (none)");
    } else {
        println!("hierarchy models: {}", models.join(", "));
    }

    store.close().await;
    Ok(())
}

/// Creates the expected tables on the database described by `params`.
pub async fn run_init(config: &Config, params: &ConnectParams) -> Result<()> {
    params.validate()?;
    let pool = db::connect(params, &config.db)
        .await
        .map_err(|e| anyhow::anyhow!(params.redact(&format!("{e:#}"))))?;
    migrate::run_migrations(&pool).await?;
    pool.close().await;
    println!("Database initialized successfully.");
    Ok(())
}
