//! Core data models shared by every store backend and the HTTP layer.
//!
//! Two families live here: the row-shaped records a [`Store`](crate::store::Store)
//! hands back, and the response shapes serialized to the browser. Field
//! names on the response types are part of the JSON contract.

use serde::{Deserialize, Serialize};

/// A concept search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptHit {
    pub concept_id: String,
    pub name: String,
}

/// A brain-structure search hit, also used for parent/child/ancestor entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructureRef {
    pub structure_id: String,
    pub name: String,
}

/// Concept row joined with its class, before relationships are attached.
#[derive(Debug, Clone)]
pub struct ConceptRecord {
    pub concept_id: String,
    pub name: String,
    pub definition: String,
    pub class: Option<ConceptClass>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptClass {
    pub name: String,
    pub description: String,
}

impl ConceptClass {
    /// Placeholder rendered when a concept points at a missing class row.
    pub fn unknown() -> Self {
        Self {
            name: "Unknown".to_string(),
            description: String::new(),
        }
    }
}

/// One relationship edge with its target already resolved to a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub relationship: String,
    pub direction: String,
    pub target: String,
}

/// Brain-structure row. Everything but id and name is optional in the schema.
#[derive(Debug, Clone, Default)]
pub struct StructureRecord {
    pub structure_id: String,
    pub name: String,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub brain_info_url: Option<String>,
    pub structure_type: Option<String>,
    pub neuronames_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Synonym {
    pub name: String,
    pub language: Option<String>,
    pub organism: Option<String>,
    pub source: Option<String>,
    pub source_title: Option<String>,
    pub pubmed_hit_count: Option<i64>,
}

/// Full concept detail returned by `GET /api/concept/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct ConceptDetail {
    pub concept_id: String,
    pub name: String,
    pub definition: String,
    pub class: ConceptClass,
    pub relationships: Vec<Relationship>,
    pub relationship_groups: Vec<crate::grouping::RelationshipGroup>,
}

/// Ancestor and descendant lists for a structure under one hierarchy model.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Lineage {
    /// Root first, immediate parent(s) last.
    pub ancestors: Vec<StructureRef>,
    /// Nearest first.
    pub descendants: Vec<StructureRef>,
}

/// Full structure detail returned by `GET /api/brain-structure/{id}`.
#[derive(Debug, Clone, Serialize)]
pub struct StructureDetail {
    pub structure_id: String,
    pub name: String,
    pub acronym: Option<String>,
    pub description: Option<String>,
    pub brain_info_url: Option<String>,
    pub structure_type: Option<String>,
    pub neuronames_id: Option<String>,
    pub synonyms: Vec<String>,
    pub synonym_details: Vec<Synonym>,
    pub parents: Vec<StructureRef>,
    pub children: Vec<StructureRef>,
    pub hierarchy: Lineage,
    pub hierarchy_models: Vec<String>,
    pub current_hierarchy_model: Option<String>,
    pub tree: crate::hierarchy::TreeNode,
}
