//! Display grouping for concept relationships.
//!
//! Relationships are bucketed by `(kind, direction)` into four fixed groups,
//! emitted in a fixed order. A relationship that matches none of the pairs
//! is left out of every group; it still appears in the concept's flat
//! relationship list. Empty groups are omitted.
//!
//! | Group | Kind | Direction |
//! |-------|------|-----------|
//! | Tasks that measure this | measured-by | any |
//! | Types of this | is-a | child |
//! | Parts of this | part-of | child |
//! | This is part of | part-of | parent |

use serde::Serialize;

use crate::models::Relationship;

/// Relation kinds the grouping understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationKind {
    IsA,
    PartOf,
    MeasuredBy,
}

impl RelationKind {
    /// Parses a stored kind label. Case, spaces and underscores are ignored
    /// so `"Part of"`, `"part_of"` and `"part-of"` are the same kind.
    pub fn parse(label: &str) -> Option<Self> {
        match normalize(label).as_str() {
            "is-a" | "kind-of" => Some(Self::IsA),
            "part-of" => Some(Self::PartOf),
            "measured-by" | "measuredby" => Some(Self::MeasuredBy),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Parent,
    Child,
}

impl Direction {
    pub fn parse(label: &str) -> Option<Self> {
        match normalize(label).as_str() {
            "parent" => Some(Self::Parent),
            "child" => Some(Self::Child),
            _ => None,
        }
    }
}

fn normalize(label: &str) -> String {
    label
        .trim()
        .chars()
        .map(|c| match c {
            ' ' | '_' => '-',
            c => c.to_ascii_lowercase(),
        })
        .collect()
}

/// The four display groups, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    TasksThatMeasure,
    TypesOfThis,
    PartsOfThis,
    ThisIsPartOf,
}

impl GroupKey {
    pub const ORDER: [GroupKey; 4] = [
        GroupKey::TasksThatMeasure,
        GroupKey::TypesOfThis,
        GroupKey::PartsOfThis,
        GroupKey::ThisIsPartOf,
    ];

    pub fn label(self) -> &'static str {
        match self {
            GroupKey::TasksThatMeasure => "Tasks that measure this",
            GroupKey::TypesOfThis => "Types of this",
            GroupKey::PartsOfThis => "Parts of this",
            GroupKey::ThisIsPartOf => "This is part of",
        }
    }

    /// Group for a relationship, or `None` when it matches no pair.
    pub fn classify(rel: &Relationship) -> Option<Self> {
        let kind = RelationKind::parse(&rel.relationship)?;
        let direction = Direction::parse(&rel.direction);
        match (kind, direction) {
            (RelationKind::MeasuredBy, _) => Some(GroupKey::TasksThatMeasure),
            (RelationKind::IsA, Some(Direction::Child)) => Some(GroupKey::TypesOfThis),
            (RelationKind::PartOf, Some(Direction::Child)) => Some(GroupKey::PartsOfThis),
            (RelationKind::PartOf, Some(Direction::Parent)) => Some(GroupKey::ThisIsPartOf),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationshipGroup {
    pub key: GroupKey,
    pub label: &'static str,
    pub targets: Vec<String>,
}

/// Buckets `relationships` into the non-empty display groups.
pub fn group_relationships(relationships: &[Relationship]) -> Vec<RelationshipGroup> {
    let mut buckets: [Vec<String>; 4] = Default::default();
    for rel in relationships {
        if let Some(key) = GroupKey::classify(rel) {
            buckets[key as usize].push(rel.target.clone());
        }
    }

    GroupKey::ORDER
        .into_iter()
        .zip(buckets)
        .filter(|(_, targets)| !targets.is_empty())
        .map(|(key, targets)| RelationshipGroup {
            key,
            label: key.label(),
            targets,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rel(kind: &str, direction: &str, target: &str) -> Relationship {
        Relationship {
            relationship: kind.to_string(),
            direction: direction.to_string(),
            target: target.to_string(),
        }
    }

    #[test]
    fn test_groups_in_fixed_order() {
        let rels = vec![
            rel("part-of", "parent", "Executive Function"),
            rel("is-a", "child", "Verbal Working Memory"),
            rel("measured-by", "child", "N-back"),
            rel("part-of", "child", "Phonological Loop"),
        ];
        let groups = group_relationships(&rels);
        let keys: Vec<GroupKey> = groups.iter().map(|g| g.key).collect();
        assert_eq!(keys, GroupKey::ORDER.to_vec());
        assert_eq!(groups[0].targets, vec!["N-back"]);
        assert_eq!(groups[3].targets, vec!["Executive Function"]);
    }

    #[test]
    fn test_empty_groups_omitted() {
        let groups = group_relationships(&[rel("measured-by", "parent", "Stroop")]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].label, "Tasks that measure this");
    }

    #[test]
    fn test_unmatched_pairs_dropped() {
        let rels = vec![
            rel("is-a", "parent", "Memory"),
            rel("precedes", "child", "Recall"),
            rel("part-of", "sideways", "Nowhere"),
        ];
        assert!(group_relationships(&rels).is_empty());
    }

    #[test]
    fn test_groups_partition_matching_relationships() {
        let rels = vec![
            rel("measured-by", "child", "A"),
            rel("is-a", "child", "B"),
            rel("is-a", "parent", "C"),
            rel("part-of", "child", "D"),
            rel("part-of", "parent", "E"),
            rel("related-to", "child", "F"),
        ];
        let groups = group_relationships(&rels);
        let mut grouped: Vec<&str> = groups
            .iter()
            .flat_map(|g| g.targets.iter().map(String::as_str))
            .collect();
        grouped.sort();
        assert_eq!(grouped, vec!["A", "B", "D", "E"]);
    }

    #[test]
    fn test_kind_labels_normalized() {
        assert_eq!(RelationKind::parse("Kind of"), Some(RelationKind::IsA));
        assert_eq!(RelationKind::parse("PART_OF"), Some(RelationKind::PartOf));
        assert_eq!(
            RelationKind::parse("measuredBy"),
            Some(RelationKind::MeasuredBy)
        );
        assert_eq!(RelationKind::parse("causes"), None);
        assert_eq!(Direction::parse(" Child "), Some(Direction::Child));
    }
}
