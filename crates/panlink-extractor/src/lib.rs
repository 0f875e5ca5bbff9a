//! PANLINK Extractor - Identifier-to-name linking pipeline
//!
//! Detects PAN identifiers in page text, links each one to the nearest
//! person or organization span, scores and deduplicates the resulting
//! relations, and validates every identifier's structure.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use panlink_core::{Result, SourceMethod};

/// A raw span as produced by an entity-span extractor (NER model or rules).
///
/// Labels and text come in the producer's own vocabulary and formatting;
/// see [`normalizer::SpanNormalizer`]. Offsets are character offsets and
/// may be absent when the producer cannot locate its spans. Offsets that
/// are not non-negative integers deserialize as absent, so a malformed span
/// degrades its page instead of rejecting the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NerSpan {
    #[serde(rename = "type", alias = "label", alias = "entity_group")]
    pub label: String,
    #[serde(alias = "word")]
    pub text: String,
    #[serde(default, deserialize_with = "lenient_offset")]
    pub start: Option<usize>,
    #[serde(default, deserialize_with = "lenient_offset")]
    pub end: Option<usize>,
}

/// Accept any JSON value for an offset; only non-negative integers count
fn lenient_offset<'de, D>(deserializer: D) -> std::result::Result<Option<usize>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawOffset {
        Index(u64),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<RawOffset>::deserialize(deserializer)? {
        Some(RawOffset::Index(index)) => usize::try_from(index).ok(),
        Some(RawOffset::Other(_)) | None => None,
    })
}

impl NerSpan {
    /// Create a span with known offsets
    pub fn new(label: impl Into<String>, text: impl Into<String>, start: usize, end: usize) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
            start: Some(start),
            end: Some(end),
        }
    }

    /// Create a span without position information
    pub fn unpositioned(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            text: text.into(),
            start: None,
            end: None,
        }
    }
}

/// One page of extracted document text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub text: String,
    /// Spans supplied alongside the text by an upstream NER run
    #[serde(default)]
    pub ner_spans: Vec<NerSpan>,
}

impl Page {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ner_spans: Vec::new(),
        }
    }

    pub fn with_spans(mut self, spans: Vec<NerSpan>) -> Self {
        self.ner_spans = spans;
        self
    }
}

/// A whole document as handed to the engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    #[serde(default)]
    pub document_id: Option<Uuid>,
    /// Where the text came from (file name, URL)
    #[serde(default)]
    pub source: Option<String>,
    pub pages: Vec<Page>,
}

impl DocumentInput {
    pub fn new(pages: Vec<Page>) -> Self {
        Self {
            document_id: None,
            source: None,
            pages,
        }
    }
}

/// Capability: entity-span extraction.
///
/// Implementations must not influence linking, scoring or deduplication
/// beyond the spans they return.
pub trait SpanSource: Send + Sync {
    /// Human-readable source identifier (e.g. "precomputed", "rules")
    fn source_id(&self) -> &str;

    /// How the returned spans were produced
    fn source_method(&self) -> SourceMethod;

    /// Extract raw spans for a page
    fn spans(&self, page: &Page) -> Result<Vec<NerSpan>>;
}

pub mod aggregate;
pub mod dedup;
pub mod detector;
pub mod engine;
pub mod linker;
pub mod ner;
pub mod normalizer;
pub mod scoring;
pub mod validator;

pub use aggregate::{DocumentReport, ExtractionStats, PageResult};
pub use detector::detect_identifiers;
pub use engine::LinkingEngine;
pub use linker::ProximityLinker;
pub use ner::{PrecomputedSpans, RuleBasedSpans};
pub use normalizer::SpanNormalizer;
pub use scoring::ConfidenceScorer;
pub use validator::{validate_identifier, FormatValidator};
