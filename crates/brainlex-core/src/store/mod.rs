//! Storage abstraction for Brainlex.
//!
//! The [`Store`] trait defines every read the retrieval layer needs, so the
//! HTTP server never touches SQL directly. The PostgreSQL implementation
//! lives in the `brainlex` crate; [`memory::InMemoryStore`] backs tests.
//!
//! Implementations must be `Send + Sync` so one handle can be shared by all
//! in-flight requests.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;

use crate::hierarchy::{breadth_first, Walk};
use crate::models::{
    ConceptHit, ConceptRecord, Relationship, StructureRecord, StructureRef, Synonym,
};

/// Read-only storage backend.
///
/// Lookups that may miss return `Ok(None)`; `Err` is reserved for backend
/// failures (connection dropped, schema mismatch, timeouts in the driver).
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`ping`](Store::ping) | Cheap liveness check |
/// | [`search_concepts`](Store::search_concepts) | Case-insensitive name substring match |
/// | [`get_concept`](Store::get_concept) | Concept joined with its class |
/// | [`concept_relationships`](Store::concept_relationships) | Edges with resolved target names |
/// | [`search_structures`](Store::search_structures) | Name-or-synonym substring match |
/// | [`get_structure`](Store::get_structure) | Single structure row |
/// | [`structure_synonyms`](Store::structure_synonyms) | Synonyms attached to a structure |
/// | [`hierarchy_models`](Store::hierarchy_models) | All model names, sorted |
/// | [`structure_hierarchy_models`](Store::structure_hierarchy_models) | Models a structure takes part in |
/// | [`parents_of`](Store::parents_of) / [`children_of`](Store::children_of) | Direct edges |
/// | [`descendants_of`](Store::descendants_of) | Transitive children |
#[async_trait]
pub trait Store: Send + Sync {
    /// Round-trip to the backend without reading any table.
    async fn ping(&self) -> Result<()>;

    /// Concepts whose name contains `query`, ignoring case, sorted by name.
    async fn search_concepts(&self, query: &str, limit: i64) -> Result<Vec<ConceptHit>>;

    async fn get_concept(&self, concept_id: &str) -> Result<Option<ConceptRecord>>;

    /// Relationships whose subject is `concept_id`. Edges whose target is
    /// neither a concept nor a task are left out.
    async fn concept_relationships(&self, concept_id: &str) -> Result<Vec<Relationship>>;

    /// Structures whose name or any synonym contains `query`, ignoring case.
    /// Each structure appears at most once.
    async fn search_structures(&self, query: &str, limit: i64) -> Result<Vec<StructureRef>>;

    async fn get_structure(&self, structure_id: &str) -> Result<Option<StructureRecord>>;

    async fn structure_synonyms(&self, structure_id: &str) -> Result<Vec<Synonym>>;

    async fn hierarchy_models(&self) -> Result<Vec<String>>;

    async fn structure_hierarchy_models(&self, structure_id: &str) -> Result<Vec<String>>;

    /// Direct parents. `model = None` means edges of every model.
    async fn parents_of(
        &self,
        structure_id: &str,
        model: Option<&str>,
    ) -> Result<Vec<StructureRef>>;

    /// Direct children. `model = None` means edges of every model.
    async fn children_of(
        &self,
        structure_id: &str,
        model: Option<&str>,
    ) -> Result<Vec<StructureRef>>;

    /// Every structure below `structure_id`, nearest first, never including
    /// `structure_id` itself.
    ///
    /// The default walks [`children_of`](Store::children_of) breadth first,
    /// one call per visited node. Backends that can walk the edge table in
    /// one round trip should override it.
    async fn descendants_of(
        &self,
        structure_id: &str,
        model: Option<&str>,
    ) -> Result<Vec<StructureRef>> {
        let children = self.children_of(structure_id, model).await?;
        breadth_first(self, structure_id, &children, model, Walk::Down).await
    }

    /// Release backend resources. Called once the handle has been swapped out.
    async fn close(&self) {}
}
