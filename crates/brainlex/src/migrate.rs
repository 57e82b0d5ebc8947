//! Schema setup for development databases.
//!
//! The server itself only reads. `brainlex init` creates the tables the
//! [`PgStore`](crate::pg_store::PgStore) queries expect, so a fresh
//! PostgreSQL database can be loaded with data and browsed. Every statement
//! is `IF NOT EXISTS`; running it twice is harmless.
//!
//! All keys are `TEXT`. The queries compare ids as text, so databases keyed
//! by integers work as well, but a fresh one accepts ids such as `bs005`.

use anyhow::{Context, Result};
use sqlx::PgPool;

const SCHEMA: &[(&str, &str)] = &[
    (
        "concept_classes",
        r#"
        CREATE TABLE IF NOT EXISTS concept_classes (
            concept_class_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT
        )
        "#,
    ),
    (
        "cognitive_concepts",
        r#"
        CREATE TABLE IF NOT EXISTS cognitive_concepts (
            concept_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            definition_text TEXT,
            concept_class TEXT REFERENCES concept_classes(concept_class_id)
        )
        "#,
    ),
    (
        "tasks",
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            task_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT
        )
        "#,
    ),
    (
        "relationships",
        r#"
        CREATE TABLE IF NOT EXISTS relationships (
            id BIGSERIAL PRIMARY KEY,
            concept_id TEXT NOT NULL,
            related_concept_id TEXT NOT NULL,
            relationship TEXT NOT NULL,
            direction TEXT
        )
        "#,
    ),
    (
        "brain_structures",
        r#"
        CREATE TABLE IF NOT EXISTS brain_structures (
            id TEXT PRIMARY KEY,
            neuronames_id INTEGER,
            standard_name TEXT NOT NULL,
            standard_acronym TEXT,
            definition TEXT,
            brain_info_url TEXT,
            structure_type TEXT
        )
        "#,
    ),
    (
        "synonyms",
        r#"
        CREATE TABLE IF NOT EXISTS synonyms (
            id BIGSERIAL PRIMARY KEY,
            brain_structure_id TEXT NOT NULL REFERENCES brain_structures(id),
            synonym_name TEXT NOT NULL,
            synonym_language TEXT,
            organism TEXT,
            synonym_source TEXT,
            source_title TEXT,
            pubmed_hit_count INTEGER
        )
        "#,
    ),
    (
        "structure_parents",
        r#"
        CREATE TABLE IF NOT EXISTS structure_parents (
            child_id TEXT NOT NULL REFERENCES brain_structures(id),
            parent_id TEXT NOT NULL REFERENCES brain_structures(id),
            hierarchy_model_name TEXT NOT NULL DEFAULT 'default',
            PRIMARY KEY (child_id, parent_id, hierarchy_model_name)
        )
        "#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_structure_parents_child ON structure_parents(child_id)",
    "CREATE INDEX IF NOT EXISTS idx_relationships_concept ON relationships(concept_id)",
    "CREATE INDEX IF NOT EXISTS idx_synonyms_structure ON synonyms(brain_structure_id)",
    "CREATE INDEX IF NOT EXISTS idx_structure_parents_parent ON structure_parents(parent_id)",
];

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    for (table, ddl) in SCHEMA {
        sqlx::query(ddl)
            .execute(pool)
            .await
            .with_context(|| format!("failed to create table {table}"))?;
        tracing::debug!(table, "table ready");
    }
    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }
    tracing::info!(tables = SCHEMA.len(), "schema initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ddl(table: &str) -> &'static str {
        SCHEMA
            .iter()
            .find(|(name, _)| *name == table)
            .map(|(_, ddl)| *ddl)
            .unwrap()
    }

    #[test]
    fn test_structure_keys_are_text() {
        assert!(ddl("brain_structures").contains("id TEXT PRIMARY KEY"));
        assert!(ddl("synonyms").contains("brain_structure_id TEXT NOT NULL"));
        assert!(ddl("structure_parents").contains("child_id TEXT NOT NULL"));
        assert!(ddl("structure_parents").contains("parent_id TEXT NOT NULL"));
    }

    #[test]
    fn test_every_statement_is_idempotent() {
        for (table, ddl) in SCHEMA {
            assert!(ddl.contains("IF NOT EXISTS"), "{table}");
        }
        assert!(INDEXES.iter().all(|ddl| ddl.contains("IF NOT EXISTS")));
    }
}
