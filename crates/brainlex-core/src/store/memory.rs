//! In-memory [`Store`] implementation for tests and demos.
//!
//! Uses `HashMap` and `Vec` behind `std::sync::RwLock`. Matching follows the
//! PostgreSQL backend: case-insensitive substring, results sorted by name
//! then id.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard};

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::models::{
    ConceptClass, ConceptHit, ConceptRecord, Relationship, StructureRecord, StructureRef, Synonym,
};

use super::Store;

struct StoredConcept {
    name: String,
    definition: String,
    class_id: Option<String>,
}

struct StoredRelationship {
    subject_id: String,
    kind: String,
    direction: String,
    target_id: String,
}

struct StoredEdge {
    parent_id: String,
    child_id: String,
    model: String,
}

#[derive(Default)]
struct Tables {
    concepts: HashMap<String, StoredConcept>,
    classes: HashMap<String, ConceptClass>,
    tasks: HashMap<String, String>,
    relationships: Vec<StoredRelationship>,
    structures: HashMap<String, StructureRecord>,
    synonyms: Vec<(String, Synonym)>,
    edges: Vec<StoredEdge>,
}

/// In-memory store seeded through the `add_*` builders.
///
/// [`set_failing`](InMemoryStore::set_failing) makes every read return an
/// error, which lets callers exercise their backend-failure paths.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    failing: AtomicBool,
    closed: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_class(&self, class_id: &str, name: &str, description: &str) {
        self.write().classes.insert(
            class_id.to_string(),
            ConceptClass {
                name: name.to_string(),
                description: description.to_string(),
            },
        );
    }

    pub fn add_concept(
        &self,
        concept_id: &str,
        name: &str,
        definition: &str,
        class_id: Option<&str>,
    ) {
        self.write().concepts.insert(
            concept_id.to_string(),
            StoredConcept {
                name: name.to_string(),
                definition: definition.to_string(),
                class_id: class_id.map(str::to_string),
            },
        );
    }

    pub fn add_task(&self, task_id: &str, name: &str) {
        self.write()
            .tasks
            .insert(task_id.to_string(), name.to_string());
    }

    pub fn add_relationship(
        &self,
        subject_id: &str,
        kind: &str,
        direction: &str,
        target_id: &str,
    ) {
        self.write().relationships.push(StoredRelationship {
            subject_id: subject_id.to_string(),
            kind: kind.to_string(),
            direction: direction.to_string(),
            target_id: target_id.to_string(),
        });
    }

    pub fn add_structure(&self, record: StructureRecord) {
        self.write()
            .structures
            .insert(record.structure_id.clone(), record);
    }

    pub fn add_synonym(&self, structure_id: &str, synonym: Synonym) {
        self.write()
            .synonyms
            .push((structure_id.to_string(), synonym));
    }

    /// Record that `parent_id` is the direct parent of `child_id` under `model`.
    pub fn add_edge(&self, parent_id: &str, child_id: &str, model: &str) {
        self.write().edges.push(StoredEdge {
            parent_id: parent_id.to_string(),
            child_id: child_id.to_string(),
            model: model.to_string(),
        });
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Tables>> {
        if self.closed.load(Ordering::SeqCst) {
            bail!("store is closed");
        }
        if self.failing.load(Ordering::SeqCst) {
            bail!("simulated backend failure");
        }
        self.tables
            .read()
            .map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn structure_ref(tables: &Tables, structure_id: &str) -> Option<StructureRef> {
        tables.structures.get(structure_id).map(|s| StructureRef {
            structure_id: s.structure_id.clone(),
            name: s.name.clone(),
        })
    }
}

fn contains_ignore_case(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

fn sort_and_truncate<T>(items: &mut Vec<T>, limit: i64, key: impl Fn(&T) -> (&str, &str)) {
    items.sort_by(|a, b| key(a).cmp(&key(b)));
    items.truncate(limit.max(0) as usize);
}

fn edge_matches(edge: &StoredEdge, model: Option<&str>) -> bool {
    model.map_or(true, |m| edge.model == m)
}

#[async_trait]
impl Store for InMemoryStore {
    async fn ping(&self) -> Result<()> {
        self.read().map(|_| ())
    }

    async fn search_concepts(&self, query: &str, limit: i64) -> Result<Vec<ConceptHit>> {
        let tables = self.read()?;
        let needle = query.to_lowercase();
        let mut hits: Vec<ConceptHit> = tables
            .concepts
            .iter()
            .filter(|(_, c)| contains_ignore_case(&c.name, &needle))
            .map(|(id, c)| ConceptHit {
                concept_id: id.clone(),
                name: c.name.clone(),
            })
            .collect();
        sort_and_truncate(&mut hits, limit, |h| {
            (h.name.as_str(), h.concept_id.as_str())
        });
        Ok(hits)
    }

    async fn get_concept(&self, concept_id: &str) -> Result<Option<ConceptRecord>> {
        let tables = self.read()?;
        Ok(tables.concepts.get(concept_id).map(|c| ConceptRecord {
            concept_id: concept_id.to_string(),
            name: c.name.clone(),
            definition: c.definition.clone(),
            class: c
                .class_id
                .as_ref()
                .and_then(|id| tables.classes.get(id))
                .cloned(),
        }))
    }

    async fn concept_relationships(&self, concept_id: &str) -> Result<Vec<Relationship>> {
        let tables = self.read()?;
        Ok(tables
            .relationships
            .iter()
            .filter(|r| r.subject_id == concept_id)
            .filter_map(|r| {
                let target = tables
                    .concepts
                    .get(&r.target_id)
                    .map(|c| c.name.clone())
                    .or_else(|| tables.tasks.get(&r.target_id).cloned())?;
                Some(Relationship {
                    relationship: r.kind.clone(),
                    direction: r.direction.clone(),
                    target,
                })
            })
            .collect())
    }

    async fn search_structures(&self, query: &str, limit: i64) -> Result<Vec<StructureRef>> {
        let tables = self.read()?;
        let needle = query.to_lowercase();
        let mut ids: BTreeSet<&str> = tables
            .structures
            .values()
            .filter(|s| contains_ignore_case(&s.name, &needle))
            .map(|s| s.structure_id.as_str())
            .collect();
        for (structure_id, synonym) in &tables.synonyms {
            if contains_ignore_case(&synonym.name, &needle) {
                ids.insert(structure_id.as_str());
            }
        }
        let mut hits: Vec<StructureRef> = ids
            .into_iter()
            .filter_map(|id| Self::structure_ref(&tables, id))
            .collect();
        sort_and_truncate(&mut hits, limit, |h| {
            (h.name.as_str(), h.structure_id.as_str())
        });
        Ok(hits)
    }

    async fn get_structure(&self, structure_id: &str) -> Result<Option<StructureRecord>> {
        Ok(self.read()?.structures.get(structure_id).cloned())
    }

    async fn structure_synonyms(&self, structure_id: &str) -> Result<Vec<Synonym>> {
        Ok(self
            .read()?
            .synonyms
            .iter()
            .filter(|(id, _)| id == structure_id)
            .map(|(_, s)| s.clone())
            .collect())
    }

    async fn hierarchy_models(&self) -> Result<Vec<String>> {
        let tables = self.read()?;
        let models: BTreeSet<&str> = tables.edges.iter().map(|e| e.model.as_str()).collect();
        Ok(models.into_iter().map(str::to_string).collect())
    }

    async fn structure_hierarchy_models(&self, structure_id: &str) -> Result<Vec<String>> {
        let tables = self.read()?;
        let models: BTreeSet<&str> = tables
            .edges
            .iter()
            .filter(|e| e.parent_id == structure_id || e.child_id == structure_id)
            .map(|e| e.model.as_str())
            .collect();
        Ok(models.into_iter().map(str::to_string).collect())
    }

    async fn parents_of(
        &self,
        structure_id: &str,
        model: Option<&str>,
    ) -> Result<Vec<StructureRef>> {
        let tables = self.read()?;
        Ok(tables
            .edges
            .iter()
            .filter(|e| e.child_id == structure_id && edge_matches(e, model))
            .filter_map(|e| Self::structure_ref(&tables, &e.parent_id))
            .collect())
    }

    async fn children_of(
        &self,
        structure_id: &str,
        model: Option<&str>,
    ) -> Result<Vec<StructureRef>> {
        let tables = self.read()?;
        Ok(tables
            .edges
            .iter()
            .filter(|e| e.parent_id == structure_id && edge_matches(e, model))
            .filter_map(|e| Self::structure_ref(&tables, &e.child_id))
            .collect())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
