//! Detail retrieval: composes [`Store`] reads into the response shapes.
//!
//! Both functions return `Ok(None)` when the requested entity does not
//! exist; the caller maps that to a not-found response.

use anyhow::Result;

use crate::grouping::group_relationships;
use crate::hierarchy::{build_tree, lineage};
use crate::models::{ConceptClass, ConceptDetail, StructureDetail, StructureRef};
use crate::store::Store;

/// Fetches a concept with its class, relationships and display groups.
pub async fn concept_detail(store: &dyn Store, concept_id: &str) -> Result<Option<ConceptDetail>> {
    let Some(record) = store.get_concept(concept_id).await? else {
        return Ok(None);
    };
    let relationships = store.concept_relationships(concept_id).await?;
    let relationship_groups = group_relationships(&relationships);

    Ok(Some(ConceptDetail {
        concept_id: record.concept_id,
        name: record.name,
        definition: record.definition,
        class: record.class.unwrap_or_else(ConceptClass::unknown),
        relationships,
        relationship_groups,
    }))
}

/// Fetches a structure with synonyms, direct edges, lineage and tree.
///
/// When `hierarchy_model` is `None`, the first model the structure takes
/// part in is used. A structure that takes part in no model is walked
/// without model filtering.
pub async fn structure_detail(
    store: &dyn Store,
    structure_id: &str,
    hierarchy_model: Option<&str>,
) -> Result<Option<StructureDetail>> {
    let Some(record) = store.get_structure(structure_id).await? else {
        return Ok(None);
    };
    let synonym_details = store.structure_synonyms(structure_id).await?;
    let hierarchy_models = store.structure_hierarchy_models(structure_id).await?;

    let current_hierarchy_model = hierarchy_model
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .or_else(|| hierarchy_models.first().cloned());
    let model = current_hierarchy_model.as_deref();

    let parents = store.parents_of(structure_id, model).await?;
    let children = store.children_of(structure_id, model).await?;
    let hierarchy = lineage(store, structure_id, &parents, model).await?;

    let current = StructureRef {
        structure_id: record.structure_id.clone(),
        name: record.name.clone(),
    };
    let tree = build_tree(&hierarchy.ancestors, &current, &children);

    Ok(Some(StructureDetail {
        structure_id: record.structure_id,
        name: record.name,
        acronym: record.acronym,
        description: record.description,
        brain_info_url: record.brain_info_url.filter(|u| is_web_link(u)),
        structure_type: record.structure_type,
        neuronames_id: record.neuronames_id,
        synonyms: synonym_details.iter().map(|s| s.name.clone()).collect(),
        synonym_details,
        parents,
        children,
        hierarchy,
        hierarchy_models,
        current_hierarchy_model,
        tree,
    }))
}

/// Only `http:` and `https:` links reach the page; anything else in
/// `brain_info_url` is dropped.
fn is_web_link(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::GroupKey;
    use crate::models::{StructureRecord, Synonym};
    use crate::store::memory::InMemoryStore;

    fn concept_store() -> InMemoryStore {
        let store = InMemoryStore::new();
        store.add_class("cls1", "Mental Process", "A process of the mind");
        store.add_concept(
            "c001",
            "Working Memory",
            "Short-term maintenance.",
            Some("cls1"),
        );
        store.add_concept("c002", "Executive Function", "", Some("cls1"));
        store.add_concept("c003", "Verbal Working Memory", "", Some("cls1"));
        store.add_task("t001", "N-back task");
        store.add_relationship("c001", "measured-by", "child", "t001");
        store.add_relationship("c001", "part-of", "parent", "c002");
        store.add_relationship("c001", "is-a", "child", "c003");
        store.add_relationship("c001", "is-a", "parent", "c002");
        store
    }

    #[tokio::test]
    async fn test_concept_detail_groups_and_class() {
        let store = concept_store();
        let detail = concept_detail(&store, "c001").await.unwrap().unwrap();
        assert_eq!(detail.class.name, "Mental Process");
        assert_eq!(detail.relationships.len(), 4);
        let keys: Vec<GroupKey> = detail.relationship_groups.iter().map(|g| g.key).collect();
        assert_eq!(
            keys,
            vec![
                GroupKey::TasksThatMeasure,
                GroupKey::TypesOfThis,
                GroupKey::ThisIsPartOf
            ]
        );
    }

    #[tokio::test]
    async fn test_concept_detail_missing_class_is_unknown() {
        let store = InMemoryStore::new();
        store.add_concept("c9", "Orphan", "", Some("nope"));
        let detail = concept_detail(&store, "c9").await.unwrap().unwrap();
        assert_eq!(detail.class, ConceptClass::unknown());
    }

    #[tokio::test]
    async fn test_concept_detail_not_found() {
        let store = concept_store();
        assert!(concept_detail(&store, "bogus").await.unwrap().is_none());
    }

    fn structure(id: &str, name: &str) -> StructureRecord {
        StructureRecord {
            structure_id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_structure_detail_defaults_to_first_model() {
        let store = InMemoryStore::new();
        store.add_structure(structure("bs001", "Brain"));
        store.add_structure(structure("bs002", "Cerebrum"));
        store.add_structure(structure("bs003", "Temporal lobe"));
        store.add_structure(structure("bs005", "Hippocampus"));
        store.add_structure(structure("bs006", "Dentate gyrus"));
        store.add_structure(structure("bs099", "Limbic system"));
        store.add_edge("bs001", "bs002", "anatomical");
        store.add_edge("bs002", "bs003", "anatomical");
        store.add_edge("bs003", "bs005", "anatomical");
        store.add_edge("bs005", "bs006", "anatomical");
        store.add_edge("bs099", "bs005", "functional");
        store.add_synonym(
            "bs005",
            Synonym {
                name: "Hippocampal Formation".into(),
                ..Default::default()
            },
        );

        let detail = structure_detail(&store, "bs005", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            detail.current_hierarchy_model.as_deref(),
            Some("anatomical")
        );
        assert_eq!(detail.hierarchy_models, vec!["anatomical", "functional"]);
        assert_eq!(detail.synonyms, vec!["Hippocampal Formation"]);
        let ancestors: Vec<&str> = detail
            .hierarchy
            .ancestors
            .iter()
            .map(|a| a.structure_id.as_str())
            .collect();
        assert_eq!(ancestors, vec!["bs001", "bs002", "bs003"]);
        assert_eq!(detail.tree.structure_id, "bs001");

        let functional = structure_detail(&store, "bs005", Some("functional"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(functional.parents[0].structure_id, "bs099");
        assert!(functional.children.is_empty());
    }

    #[tokio::test]
    async fn test_structure_detail_without_edges() {
        let store = InMemoryStore::new();
        store.add_structure(structure("bs777", "Isolated"));
        let detail = structure_detail(&store, "bs777", None)
            .await
            .unwrap()
            .unwrap();
        assert!(detail.current_hierarchy_model.is_none());
        assert!(detail.tree.current);
    }

    #[tokio::test]
    async fn test_structure_detail_keeps_only_web_links() {
        let cases = [
            ("bs801", "https://braininfo.org/ID=159", true),
            ("bs802", "javascript:alert(document.cookie)", false),
            ("bs803", "  JavaScript:void(0)", false),
            ("bs804", "data:text/html,<script>alert(1)</script>", false),
        ];
        let store = InMemoryStore::new();
        for (id, url, _) in cases {
            store.add_structure(StructureRecord {
                brain_info_url: Some(url.to_string()),
                ..structure(id, "Linked")
            });
        }

        for (id, url, kept) in cases {
            let detail = structure_detail(&store, id, None)
                .await
                .unwrap()
                .unwrap();
            assert_eq!(detail.brain_info_url.is_some(), kept, "{url}");
        }
    }

    #[test]
    fn test_web_link_schemes() {
        assert!(is_web_link("http://example.org"));
        assert!(is_web_link("HTTPS://example.org/a?b=c"));
        assert!(!is_web_link("javascript:alert(1)"));
        assert!(!is_web_link("//example.org"));
        assert!(!is_web_link(""));
    }
}
