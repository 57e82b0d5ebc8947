//! # Brainlex
//!
//! **Search and browse cognitive concepts and brain-structure anatomy from a
//! PostgreSQL database, in the browser.**
//!
//! Brainlex serves a single-page UI and a small read-only JSON API. The
//! user supplies database credentials in the page; the server opens one
//! shared connection and then answers debounced name/synonym searches and
//! detail lookups: concept definitions, classes and grouped relationships,
//! structure synonyms and parent/child lineage trees.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   HTTP/JSON   ┌──────────────┐   Store trait   ┌────────────┐
//! │  Browser UI  │──────────────▶│  Axum server │────────────────▶│ PostgreSQL │
//! │ (index.html) │               │  + retrieval │                 │  (sqlx)    │
//! └──────────────┘               └──────┬───────┘                 └────────────┘
//!                                       │
//!                                ┌──────▼───────┐
//!                                │  Connection  │
//!                                │   manager    │
//!                                └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! brainlex init --host localhost --port 5432 --username me --password pw --database atlas
//! brainlex serve                 # then open http://127.0.0.1:8000
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`connection`] | Connection lifecycle: credentials, connector trait, shared store |
//! | [`db`] | PostgreSQL pool creation |
//! | [`pg_store`] | PostgreSQL implementation of the core `Store` trait |
//! | [`server`] | Axum HTTP server and embedded UI |
//! | [`error`] | API error taxonomy and JSON error bodies |
//! | [`migrate`] | Development schema setup |
//! | [`check`] | `check` and `init` CLI commands |
//!
//! Models, grouping and lineage walking live in `brainlex-core`.

pub mod check;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod migrate;
pub mod pg_store;
pub mod server;

pub use brainlex_core::store;
pub use connection::{ConnectParams, ConnectionManager, Connector};
pub use error::ApiError;
