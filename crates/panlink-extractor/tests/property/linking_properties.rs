use std::collections::{BTreeMap, HashSet};

use panlink_core::{
    ConfidenceThresholds, EntityType, RawEntity, Relation, SourceMethod, CONTEXT_PROXIMITY,
    RELATION_KIND,
};
use panlink_extractor::dedup::{deduplicate, relation_key};
use panlink_extractor::{
    detect_identifiers, validate_identifier, ConfidenceScorer, ProximityLinker,
};
use proptest::prelude::*;

fn relation_strategy() -> impl Strategy<Value = Relation> {
    (
        prop::sample::select(vec!["AAAAA1111A", "aaaaa1111a", "BBBBB 2222B", "CCCCC3333C"]),
        prop::sample::select(vec!["Ravi Kumar", "ravi  kumar", "Acme Ltd", "ACME LTD"]),
        0.0f32..=1.0,
        0usize..4,
        0usize..200,
    )
        .prop_map(|(pan, who, confidence, page_index, distance)| Relation {
            identifier_value: pan.to_string(),
            relation_kind: RELATION_KIND.to_string(),
            counterpart_value: who.to_string(),
            counterpart_type: EntityType::Person,
            confidence,
            method: CONTEXT_PROXIMITY.to_string(),
            page_index,
            distance,
        })
}

fn span_strategy() -> impl Strategy<Value = RawEntity> {
    (
        prop::bool::ANY,
        0usize..600,
        1usize..30,
    )
        .prop_map(|(is_person, start, len)| {
            let entity_type = if is_person {
                EntityType::Person
            } else {
                EntityType::Organization
            };
            RawEntity::new(entity_type, "span", start, start + len, SourceMethod::Model, 0)
        })
}

fn identifier_strategy() -> impl Strategy<Value = RawEntity> {
    (0usize..600).prop_map(|start| {
        RawEntity::new(
            EntityType::Identifier,
            "AAUFM6247N",
            start,
            start + 10,
            SourceMethod::Pattern,
            0,
        )
    })
}

proptest! {
    #[test]
    fn detected_identifiers_are_well_formed(text in "[A-Za-z0-9 .,:()]{0,120}") {
        let chars: Vec<char> = text.chars().collect();

        for found in detect_identifiers(&text, 0) {
            prop_assert_eq!(found.text.chars().count(), 10);
            prop_assert!(validate_identifier(&found.text).is_valid);

            let before = found.start.checked_sub(1).map(|i| chars[i]);
            let after = chars.get(found.end).copied();
            prop_assert!(!before.is_some_and(|c| c.is_alphanumeric()));
            prop_assert!(!after.is_some_and(|c| c.is_alphanumeric()));

            let slice: String = chars[found.start..found.end].iter().collect();
            prop_assert_eq!(slice, found.text);
        }
    }

    #[test]
    fn embedded_identifiers_are_detected(prefix in "[ .,:]{0,10}", suffix in "[ .,:]{0,10}") {
        let text = format!("{prefix}ABCDE1234F{suffix}");
        let found: Vec<RawEntity> = detect_identifiers(&text, 0).collect();

        prop_assert_eq!(found.len(), 1);
        prop_assert_eq!(found[0].start, prefix.chars().count());
    }

    #[test]
    fn score_matches_formula(
        base in 0.0f32..=1.0,
        window in 1usize..500,
        distance in 0usize..1_000,
    ) {
        let scorer = ConfidenceScorer::new(
            BTreeMap::from([(CONTEXT_PROXIMITY.to_string(), base)]),
            window,
            ConfidenceThresholds::default(),
        );

        let score = scorer.score(CONTEXT_PROXIMITY, distance).unwrap();
        let expected = (base * (1.0 - distance as f32 / window as f32).max(0.0)).clamp(0.0, 1.0);

        prop_assert!((0.0..=1.0).contains(&score));
        prop_assert_eq!(score, expected);
    }

    #[test]
    fn dedup_is_idempotent_with_unique_keys(
        relations in prop::collection::vec(relation_strategy(), 0..40),
    ) {
        let once = deduplicate(relations.clone());
        let twice = deduplicate(once.clone());
        prop_assert_eq!(&once, &twice);

        let keys: HashSet<(String, String)> = once.iter().map(relation_key).collect();
        prop_assert_eq!(keys.len(), once.len());

        // Every survivor carries the maximum confidence of its group
        for survivor in &once {
            let key = relation_key(survivor);
            let best = relations
                .iter()
                .filter(|r| relation_key(r) == key)
                .map(|r| r.confidence)
                .fold(f32::MIN, f32::max);
            prop_assert_eq!(survivor.confidence, best);
        }
    }

    #[test]
    fn linker_is_deterministic_and_scores_match(
        identifiers in prop::collection::vec(identifier_strategy(), 0..8),
        spans in prop::collection::vec(span_strategy(), 0..12),
        window in 1usize..400,
    ) {
        let linker = ProximityLinker::new(window);
        let first = linker.link(&identifiers, &spans);
        let second = linker.link(&identifiers, &spans);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.len() <= identifiers.len());

        let scorer = ConfidenceScorer::new(
            BTreeMap::from([(CONTEXT_PROXIMITY.to_string(), 0.9)]),
            window,
            ConfidenceThresholds::default(),
        );

        for candidate in first {
            prop_assert_eq!(candidate.distance, candidate.identifier.distance_to(&candidate.counterpart));

            let nearest = linker
                .candidates(&candidate.identifier, &spans)
                .map(|c| candidate.identifier.distance_to(c))
                .min();
            prop_assert_eq!(nearest, Some(candidate.distance));

            let scored = scorer.score_candidate(candidate.clone()).unwrap();
            let expected = 0.9 * (1.0 - candidate.distance as f32 / window as f32).max(0.0);
            prop_assert_eq!(scored.confidence, expected.clamp(0.0, 1.0));
        }
    }
}
