//! Document-level aggregation
//!
//! Per-page results are reduced into one report. Statistics are a plain
//! accumulator: each page contributes its own counts and pages are merged
//! by addition; document-wide counts are added once relations have been
//! deduplicated.

use std::collections::{BTreeMap, HashSet};
use std::ops::{Add, AddAssign};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use panlink_core::{
    CandidateRelation, ConfidenceBucket, ConfidenceThresholds, EntityType, RawEntity, Relation,
    ValidationResult,
};

use crate::dedup::{counterpart_key, identifier_key};

// ============================================================================
// Page results
// ============================================================================

/// Everything produced for a single page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageResult {
    pub page_index: usize,
    pub identifiers: Vec<RawEntity>,
    pub counterparts: Vec<RawEntity>,
    /// Scored candidates, one per linked identifier occurrence
    pub candidates: Vec<CandidateRelation>,
    /// A span source failed on this page
    pub degraded: bool,
}

// ============================================================================
// Statistics
// ============================================================================

/// Summary counters for a document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub total_pages: usize,
    pub degraded_pages: usize,
    pub candidate_relations: usize,
    /// Distinct entities per type
    pub entity_counts: BTreeMap<String, usize>,
    /// Final relations per confidence bucket
    pub confidence_buckets: BTreeMap<String, usize>,
    /// Occurrences per `<source_method>_<entity_type>` and relations per
    /// `relation_<method>`
    pub extraction_methods: BTreeMap<String, usize>,
    pub valid_identifiers: usize,
    pub invalid_identifiers: usize,
}

impl ExtractionStats {
    /// Contribution of a single page
    pub fn for_page(page: &PageResult) -> Self {
        let mut stats = Self {
            total_pages: 1,
            degraded_pages: usize::from(page.degraded),
            candidate_relations: page.candidates.len(),
            ..Default::default()
        };

        for entity in page.identifiers.iter().chain(&page.counterparts) {
            let key = format!("{}_{}", entity.source_method, entity.entity_type);
            *stats.extraction_methods.entry(key).or_default() += 1;
        }

        stats
    }

    /// Total number of final relations counted in the buckets
    pub fn relations_found(&self) -> usize {
        self.confidence_buckets.values().sum()
    }

    /// Total number of distinct entities
    pub fn entities_found(&self) -> usize {
        self.entity_counts.values().sum()
    }
}

fn merge_counts(into: &mut BTreeMap<String, usize>, from: &BTreeMap<String, usize>) {
    for (key, count) in from {
        *into.entry(key.clone()).or_default() += count;
    }
}

impl AddAssign<&ExtractionStats> for ExtractionStats {
    fn add_assign(&mut self, other: &ExtractionStats) {
        self.total_pages += other.total_pages;
        self.degraded_pages += other.degraded_pages;
        self.candidate_relations += other.candidate_relations;
        merge_counts(&mut self.entity_counts, &other.entity_counts);
        merge_counts(&mut self.confidence_buckets, &other.confidence_buckets);
        merge_counts(&mut self.extraction_methods, &other.extraction_methods);
        self.valid_identifiers += other.valid_identifiers;
        self.invalid_identifiers += other.invalid_identifiers;
    }
}

impl Add for ExtractionStats {
    type Output = ExtractionStats;

    fn add(mut self, other: ExtractionStats) -> ExtractionStats {
        self += &other;
        self
    }
}

// ============================================================================
// Report
// ============================================================================

/// Final per-document output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub document_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub generated_at: DateTime<Utc>,
    pub entities: Vec<RawEntity>,
    pub relations: Vec<Relation>,
    pub validation: Vec<ValidationResult>,
    pub stats: ExtractionStats,
}

/// Page results merged in page order
#[derive(Debug, Clone, Default)]
pub struct MergedPages {
    pub identifiers: Vec<RawEntity>,
    pub counterparts: Vec<RawEntity>,
    pub candidates: Vec<CandidateRelation>,
    pub stats: ExtractionStats,
}

/// Single-threaded reduction of page results
pub fn merge_pages(mut pages: Vec<PageResult>) -> MergedPages {
    pages.sort_by_key(|page| page.page_index);

    let mut merged = MergedPages::default();
    for page in pages {
        merged.stats += &ExtractionStats::for_page(&page);
        merged.identifiers.extend(page.identifiers);
        merged.counterparts.extend(page.counterparts);
        merged.candidates.extend(page.candidates);
    }

    merged
}

/// Entity list deduplicated by (type, canonical value); first occurrence kept
pub fn distinct_entities<'a>(entities: impl IntoIterator<Item = &'a RawEntity>) -> Vec<RawEntity> {
    let mut seen: HashSet<(EntityType, String)> = HashSet::new();

    entities
        .into_iter()
        .filter(|entity| {
            let key = match entity.entity_type {
                EntityType::Identifier => identifier_key(&entity.text),
                EntityType::Person | EntityType::Organization => counterpart_key(&entity.text),
            };
            seen.insert((entity.entity_type, key))
        })
        .cloned()
        .collect()
}

/// Document-wide counts added after deduplication and validation
pub fn document_stats(
    entities: &[RawEntity],
    relations: &[Relation],
    validation: &[ValidationResult],
    thresholds: &ConfidenceThresholds,
) -> ExtractionStats {
    let mut stats = ExtractionStats::default();

    for entity in entities {
        *stats
            .entity_counts
            .entry(entity.entity_type.to_string())
            .or_default() += 1;
    }

    for bucket in [ConfidenceBucket::High, ConfidenceBucket::Medium, ConfidenceBucket::Low] {
        stats.confidence_buckets.insert(bucket.to_string(), 0);
    }
    for relation in relations {
        let bucket = ConfidenceBucket::classify(relation.confidence, thresholds);
        *stats.confidence_buckets.entry(bucket.to_string()).or_default() += 1;
        *stats
            .extraction_methods
            .entry(format!("relation_{}", relation.method))
            .or_default() += 1;
    }

    stats.valid_identifiers = validation.iter().filter(|v| v.is_valid).count();
    stats.invalid_identifiers = validation.len() - stats.valid_identifiers;

    stats
}
