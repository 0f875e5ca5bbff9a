//! Relation deduplication and canonicalization
//!
//! Relations are keyed by (identifier key, counterpart key). Within a key
//! the survivor has the highest confidence; ties go to the earlier page,
//! then the shorter distance, then whichever was seen first.

use std::cmp::Ordering;
use std::collections::HashMap;

use panlink_core::Relation;

use crate::normalizer::collapse_whitespace;

/// Identifier key: uppercase, whitespace removed
pub fn identifier_key(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Counterpart key: whitespace collapsed, compared case-insensitively
pub fn counterpart_key(value: &str) -> String {
    collapse_whitespace(value).to_lowercase()
}

/// Grouping key of a relation
pub fn relation_key(relation: &Relation) -> (String, String) {
    (
        identifier_key(&relation.identifier_value),
        counterpart_key(&relation.counterpart_value),
    )
}

/// `true` if `challenger` should replace `incumbent`
fn outranks(challenger: &Relation, incumbent: &Relation) -> bool {
    challenger
        .confidence
        .total_cmp(&incumbent.confidence)
        .then_with(|| incumbent.page_index.cmp(&challenger.page_index))
        .then_with(|| incumbent.distance.cmp(&challenger.distance))
        == Ordering::Greater
}

/// Collapse relations sharing a key down to one survivor each.
///
/// Output is ordered by confidence (descending), then by key, so running
/// this on its own output is a no-op.
pub fn deduplicate(relations: impl IntoIterator<Item = Relation>) -> Vec<Relation> {
    let mut survivors: HashMap<(String, String), Relation> = HashMap::new();

    for relation in relations {
        let key = relation_key(&relation);
        match survivors.get_mut(&key) {
            Some(existing) => {
                if outranks(&relation, existing) {
                    *existing = relation;
                }
            }
            None => {
                survivors.insert(key, relation);
            }
        }
    }

    let mut result: Vec<((String, String), Relation)> = survivors.into_iter().collect();
    result.sort_by(|(a_key, a), (b_key, b)| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| a_key.cmp(b_key))
    });

    result.into_iter().map(|(_, relation)| relation).collect()
}
