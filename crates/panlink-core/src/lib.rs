//! PANLINK Core - Domain models, errors and shared types
//!
//! This crate defines the abstractions shared by the linking engine and
//! the command-line front end:
//! - Entity and relation models (identifiers, people, organizations)
//! - Format validation verdicts
//! - Common error types
//! - Configuration management

pub mod config;

pub use config::{AppConfig, ConfidenceThresholds, ConfigError, LinkingConfig, LoggingConfig};

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for PANLINK operations
#[derive(Error, Debug)]
pub enum PanlinkError {
    #[error("Span '{text}' ({label}) has no position information")]
    MissingPosition { label: String, text: String },

    #[error("No base score configured for link method: {0}")]
    UnknownMethod(String),

    #[error("Span source failed: {0}")]
    SpanSource(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, PanlinkError>;

// ============================================================================
// Constants
// ============================================================================

/// Relation kind attached to every emitted relation
pub const RELATION_KIND: &str = "identifier_of";

/// Link method used by the proximity linker
pub const CONTEXT_PROXIMITY: &str = "context_proximity";

/// Reserved for a linker that only accepts directly adjacent spans
pub const DIRECT_ADJACENCY: &str = "direct_adjacency";

/// Heuristic fallback linking; always scored low
pub const NER_FALLBACK: &str = "ner_fallback";

/// Length of a structurally valid identifier
pub const IDENTIFIER_LEN: usize = 10;

// ============================================================================
// Entity Models
// ============================================================================

/// Kinds of entities handled by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Identifier,
    Person,
    Organization,
}

impl EntityType {
    /// Get the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Identifier => "identifier",
            Self::Person => "person",
            Self::Organization => "organization",
        }
    }

    /// Rank used when two counterparts sit at the same distance.
    /// People win over organizations.
    pub fn counterpart_rank(&self) -> u8 {
        match self {
            Self::Person => 0,
            Self::Organization => 1,
            Self::Identifier => 2,
        }
    }
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an entity occurrence was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceMethod {
    /// Regex or rule based matching
    Pattern,
    /// External NER model output
    Model,
}

impl SourceMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pattern => "pattern",
            Self::Model => "model",
        }
    }
}

impl std::fmt::Display for SourceMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single entity occurrence on a page.
///
/// Offsets are character offsets into the page text, `start` inclusive and
/// `end` exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEntity {
    pub entity_type: EntityType,
    pub text: String,
    pub start: usize,
    pub end: usize,
    pub source_method: SourceMethod,
    pub page_index: usize,
}

impl RawEntity {
    /// Create a new entity occurrence
    pub fn new(
        entity_type: EntityType,
        text: impl Into<String>,
        start: usize,
        end: usize,
        source_method: SourceMethod,
        page_index: usize,
    ) -> Self {
        Self {
            entity_type,
            text: text.into(),
            start,
            end,
            source_method,
            page_index,
        }
    }

    /// Twice the midpoint of the offset range, kept integral and wide
    /// enough that no pair of offsets overflows
    pub fn doubled_midpoint(&self) -> u128 {
        self.start as u128 + self.end as u128
    }

    /// Midpoint-to-midpoint distance in characters (floored)
    pub fn distance_to(&self, other: &RawEntity) -> usize {
        let distance = self.doubled_midpoint().abs_diff(other.doubled_midpoint()) / 2;
        usize::try_from(distance).unwrap_or(usize::MAX)
    }

    /// Number of characters covered by the offset range
    pub fn span_len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }
}

// ============================================================================
// Relation Models
// ============================================================================

/// A proposed identifier-to-counterpart link, before deduplication
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRelation {
    pub identifier: RawEntity,
    pub counterpart: RawEntity,
    /// Midpoint-to-midpoint distance in characters
    pub distance: usize,
    pub method: String,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
}

impl CandidateRelation {
    /// Create an unscored candidate
    pub fn new(
        identifier: RawEntity,
        counterpart: RawEntity,
        distance: usize,
        method: impl Into<String>,
    ) -> Self {
        Self {
            identifier,
            counterpart,
            distance,
            method: method.into(),
            confidence: 0.0,
        }
    }

    /// Return a copy of this candidate carrying the given score
    pub fn scored(self, confidence: f32) -> Self {
        Self {
            confidence: confidence.clamp(0.0, 1.0),
            ..self
        }
    }
}

/// A final (identifier, identifier_of, counterpart) triple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub identifier_value: String,
    pub relation_kind: String,
    pub counterpart_value: String,
    pub counterpart_type: EntityType,
    /// Confidence score (0.0 - 1.0)
    pub confidence: f32,
    pub method: String,
    /// Page the surviving occurrence was found on
    pub page_index: usize,
    /// Distance recorded for the surviving occurrence
    pub distance: usize,
}

impl From<&CandidateRelation> for Relation {
    fn from(candidate: &CandidateRelation) -> Self {
        Self {
            identifier_value: candidate.identifier.text.clone(),
            relation_kind: RELATION_KIND.to_string(),
            counterpart_value: candidate.counterpart.text.clone(),
            counterpart_type: candidate.counterpart.entity_type,
            confidence: candidate.confidence,
            method: candidate.method.clone(),
            page_index: candidate.identifier.page_index,
            distance: candidate.distance,
        }
    }
}

/// Reporting-only classification of a confidence score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
}

impl ConfidenceBucket {
    /// Classify a score against the configured thresholds
    pub fn classify(confidence: f32, thresholds: &ConfidenceThresholds) -> Self {
        if confidence >= thresholds.high {
            Self::High
        } else if confidence >= thresholds.medium {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for ConfidenceBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Validation Models
// ============================================================================

/// Structural verdict for one distinct identifier value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub identifier_value: String,
    pub is_valid: bool,
    pub reason: String,
}

impl ValidationResult {
    pub fn valid(identifier_value: impl Into<String>) -> Self {
        Self {
            identifier_value: identifier_value.into(),
            is_valid: true,
            reason: "matches structural pattern".to_string(),
        }
    }

    pub fn invalid(identifier_value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            identifier_value: identifier_value.into(),
            is_valid: false,
            reason: reason.into(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
