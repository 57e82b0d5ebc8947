//! PostgreSQL-backed [`Store`] implementation.
//!
//! Expected tables:
//!
//! | Table | Columns used |
//! |-------|--------------|
//! | `cognitive_concepts` | `concept_id`, `name`, `definition_text`, `concept_class` |
//! | `concept_classes` | `concept_class_id`, `name`, `description` |
//! | `relationships` | `concept_id`, `related_concept_id`, `relationship`, `direction` |
//! | `tasks` | `task_id`, `name` |
//! | `brain_structures` | `id`, `standard_name`, `standard_acronym`, `definition`, `brain_info_url`, `structure_type`, `neuronames_id` |
//! | `synonyms` | `brain_structure_id`, `synonym_name`, `synonym_language`, `organism`, `synonym_source`, `source_title`, `pubmed_hit_count` |
//! | `structure_parents` | `parent_id`, `child_id`, `hierarchy_model_name` |
//!
//! Identifiers are compared as text (`id::text = $1`) so the same queries
//! work whether a deployment keys its tables by integer or by string.
//! See [`crate::migrate`] for DDL matching these expectations.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use brainlex_core::models::{
    ConceptClass, ConceptHit, ConceptRecord, Relationship, StructureRecord, StructureRef, Synonym,
};
use brainlex_core::store::Store;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// `%query%` with LIKE metacharacters escaped, for use with `ESCAPE '\'`.
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn structure_ref(row: &PgRow) -> Result<StructureRef, sqlx::Error> {
    Ok(StructureRef {
        structure_id: row.try_get("structure_id")?,
        name: row.try_get("name")?,
    })
}

const PARENTS_SQL: &str = r#"
    SELECT p.id::text AS structure_id, p.standard_name AS name
    FROM brain_structures p
    JOIN structure_parents sp ON p.id = sp.parent_id
    WHERE sp.child_id::text = $1
      AND ($2::text IS NULL OR sp.hierarchy_model_name = $2)
    ORDER BY p.standard_name, p.id
"#;

const CHILDREN_SQL: &str = r#"
    SELECT c.id::text AS structure_id, c.standard_name AS name
    FROM brain_structures c
    JOIN structure_parents sp ON c.id = sp.child_id
    WHERE sp.parent_id::text = $1
      AND ($2::text IS NULL OR sp.hierarchy_model_name = $2)
    ORDER BY c.standard_name, c.id
"#;

// Paths carry the ids already on the branch so a cycle stops the recursion.
const DESCENDANTS_SQL: &str = r#"
    WITH RECURSIVE walk(structure_id, depth, path) AS (
        SELECT sp.child_id::text, 1, ARRAY[sp.parent_id::text, sp.child_id::text]
        FROM structure_parents sp
        WHERE sp.parent_id::text = $1
          AND ($2::text IS NULL OR sp.hierarchy_model_name = $2)
      UNION ALL
        SELECT sp.child_id::text, w.depth + 1, w.path || sp.child_id::text
        FROM walk w
        JOIN structure_parents sp ON sp.parent_id::text = w.structure_id
        WHERE ($2::text IS NULL OR sp.hierarchy_model_name = $2)
          AND NOT sp.child_id::text = ANY(w.path)
    )
    SELECT bs.id::text AS structure_id, bs.standard_name AS name
    FROM (
        SELECT structure_id, MIN(depth) AS depth
        FROM walk
        WHERE structure_id <> $1
        GROUP BY structure_id
    ) d
    JOIN brain_structures bs ON bs.id::text = d.structure_id
    ORDER BY d.depth, bs.standard_name, bs.id
"#;

impl PgStore {
    async fn edge_query(
        &self,
        sql: &str,
        structure_id: &str,
        model: Option<&str>,
    ) -> Result<Vec<StructureRef>> {
        let rows = sqlx::query(sql)
            .bind(structure_id)
            .bind(model)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(structure_ref).collect::<Result<_, _>>()?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn search_concepts(&self, query: &str, limit: i64) -> Result<Vec<ConceptHit>> {
        let rows = sqlx::query(
            r#"
            SELECT concept_id::text AS concept_id, name
            FROM cognitive_concepts
            WHERE name ILIKE $1 ESCAPE '\'
            ORDER BY name, concept_id
            LIMIT $2
            "#,
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let hits = rows
            .iter()
            .map(|row| {
                Ok(ConceptHit {
                    concept_id: row.try_get("concept_id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(hits)
    }

    async fn get_concept(&self, concept_id: &str) -> Result<Option<ConceptRecord>> {
        let row = sqlx::query(
            r#"
            SELECT c.concept_id::text AS concept_id,
                   c.name,
                   COALESCE(c.definition_text, '') AS definition,
                   cc.concept_class_id IS NOT NULL AS has_class,
                   COALESCE(cc.name, '') AS class_name,
                   COALESCE(cc.description, '') AS class_description
            FROM cognitive_concepts c
            LEFT JOIN concept_classes cc ON cc.concept_class_id = c.concept_class
            WHERE c.concept_id::text = $1
            "#,
        )
        .bind(concept_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let has_class: bool = row.try_get("has_class")?;
        let class = if has_class {
            Some(ConceptClass {
                name: row.try_get("class_name")?,
                description: row.try_get("class_description")?,
            })
        } else {
            None
        };

        Ok(Some(ConceptRecord {
            concept_id: row.try_get("concept_id")?,
            name: row.try_get("name")?,
            definition: row.try_get("definition")?,
            class,
        }))
    }

    async fn concept_relationships(&self, concept_id: &str) -> Result<Vec<Relationship>> {
        // A target id may name a concept or a task; unresolved ones are dropped.
        let rows = sqlx::query(
            r#"
            SELECT COALESCE(r.relationship, '') AS relationship,
                   COALESCE(r.direction, '') AS direction,
                   COALESCE(c.name, t.name) AS target
            FROM relationships r
            LEFT JOIN cognitive_concepts c ON r.related_concept_id = c.concept_id
            LEFT JOIN tasks t ON r.related_concept_id = t.task_id
            WHERE r.concept_id::text = $1
              AND COALESCE(c.name, t.name) IS NOT NULL
            ORDER BY relationship, target
            "#,
        )
        .bind(concept_id)
        .fetch_all(&self.pool)
        .await?;

        let rels = rows
            .iter()
            .map(|row| {
                Ok(Relationship {
                    relationship: row.try_get("relationship")?,
                    direction: row.try_get("direction")?,
                    target: row.try_get("target")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(rels)
    }

    async fn search_structures(&self, query: &str, limit: i64) -> Result<Vec<StructureRef>> {
        let rows = sqlx::query(
            r#"
            SELECT bs.id::text AS structure_id, bs.standard_name AS name
            FROM brain_structures bs
            WHERE bs.standard_name ILIKE $1 ESCAPE '\'
               OR EXISTS (
                   SELECT 1 FROM synonyms s
                   WHERE s.brain_structure_id = bs.id
                     AND s.synonym_name ILIKE $1 ESCAPE '\'
               )
            ORDER BY bs.standard_name, bs.id
            LIMIT $2
            "#,
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(structure_ref).collect::<Result<_, _>>()?)
    }

    async fn get_structure(&self, structure_id: &str) -> Result<Option<StructureRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id::text AS structure_id,
                   standard_name AS name,
                   standard_acronym::text AS acronym,
                   definition::text AS description,
                   brain_info_url::text AS brain_info_url,
                   structure_type::text AS structure_type,
                   neuronames_id::text AS neuronames_id
            FROM brain_structures
            WHERE id::text = $1
            "#,
        )
        .bind(structure_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(StructureRecord {
            structure_id: row.try_get("structure_id")?,
            name: row.try_get("name")?,
            acronym: row.try_get("acronym")?,
            description: row.try_get("description")?,
            brain_info_url: row.try_get("brain_info_url")?,
            structure_type: row.try_get("structure_type")?,
            neuronames_id: row.try_get("neuronames_id")?,
        }))
    }

    async fn structure_synonyms(&self, structure_id: &str) -> Result<Vec<Synonym>> {
        let rows = sqlx::query(
            r#"
            SELECT synonym_name,
                   synonym_language::text AS synonym_language,
                   organism::text AS organism,
                   synonym_source::text AS synonym_source,
                   source_title::text AS source_title,
                   pubmed_hit_count::bigint AS pubmed_hit_count
            FROM synonyms
            WHERE brain_structure_id::text = $1
            ORDER BY synonym_name
            "#,
        )
        .bind(structure_id)
        .fetch_all(&self.pool)
        .await?;

        let synonyms = rows
            .iter()
            .map(|row| {
                Ok(Synonym {
                    name: row.try_get("synonym_name")?,
                    language: row.try_get("synonym_language")?,
                    organism: row.try_get("organism")?,
                    source: row.try_get("synonym_source")?,
                    source_title: row.try_get("source_title")?,
                    pubmed_hit_count: row.try_get("pubmed_hit_count")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;
        Ok(synonyms)
    }

    async fn hierarchy_models(&self) -> Result<Vec<String>> {
        let models = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT hierarchy_model_name
            FROM structure_parents
            WHERE hierarchy_model_name IS NOT NULL
            ORDER BY hierarchy_model_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(models)
    }

    async fn structure_hierarchy_models(&self, structure_id: &str) -> Result<Vec<String>> {
        let models = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT hierarchy_model_name
            FROM structure_parents
            WHERE (child_id::text = $1 OR parent_id::text = $1)
              AND hierarchy_model_name IS NOT NULL
            ORDER BY hierarchy_model_name
            "#,
        )
        .bind(structure_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(models)
    }

    async fn parents_of(
        &self,
        structure_id: &str,
        model: Option<&str>,
    ) -> Result<Vec<StructureRef>> {
        self.edge_query(PARENTS_SQL, structure_id, model).await
    }

    async fn children_of(
        &self,
        structure_id: &str,
        model: Option<&str>,
    ) -> Result<Vec<StructureRef>> {
        self.edge_query(CHILDREN_SQL, structure_id, model).await
    }

    async fn descendants_of(
        &self,
        structure_id: &str,
        model: Option<&str>,
    ) -> Result<Vec<StructureRef>> {
        self.edge_query(DESCENDANTS_SQL, structure_id, model).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_wraps_query() {
        assert_eq!(like_pattern("Working Memory"), "%Working Memory%");
    }

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern("100%"), r"%100\%%");
        assert_eq!(like_pattern("a_b"), r"%a\_b%");
        assert_eq!(like_pattern(r"c:\x"), r"%c:\\x%");
    }
}
