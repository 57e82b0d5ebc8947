//! # Brainlex Core
//!
//! Storage-agnostic logic for Brainlex: data models, the [`store::Store`]
//! trait with an in-memory backend, relationship grouping, lineage walking,
//! and the detail-retrieval functions built on top of them.
//!
//! This crate contains no tokio, sqlx, or network I/O.

pub mod grouping;
pub mod hierarchy;
pub mod models;
pub mod retrieval;
pub mod store;
