//! Entity-span sources
//!
//! Provides two implementations of [`SpanSource`]:
//! - Precomputed: spans delivered with the page by an upstream NER model
//! - Rule-based: honorific, "Name:" and corporate-suffix patterns, for
//!   documents processed without a model

use regex::Regex;

use panlink_core::{Result, SourceMethod};

use crate::detector::CharCursor;
use crate::{NerSpan, Page, SpanSource};

// ============================================================================
// Precomputed spans
// ============================================================================

/// Returns the spans attached to each page as-is
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecomputedSpans;

impl SpanSource for PrecomputedSpans {
    fn source_id(&self) -> &str {
        "precomputed"
    }

    fn source_method(&self) -> SourceMethod {
        SourceMethod::Model
    }

    fn spans(&self, page: &Page) -> Result<Vec<NerSpan>> {
        Ok(page.ner_spans.clone())
    }
}

// ============================================================================
// Rule-based spans
// ============================================================================

/// A single extraction rule
struct SpanRule {
    regex: Regex,
    label: &'static str,
    /// Capture group holding the span (0 = whole match)
    group: usize,
    /// Accepted span length in characters
    min_len: usize,
    max_len: usize,
}

/// Rule-based person/organization extractor using regex patterns
pub struct RuleBasedSpans {
    rules: Vec<SpanRule>,
}

impl RuleBasedSpans {
    /// Create an extractor with the default name and organization rules
    pub fn new() -> Self {
        let mut spans = Self { rules: Vec::new() };
        spans.init_person_rules();
        spans.init_organization_rules();
        spans
    }

    fn init_person_rules(&mut self) {
        // Honorific followed by one to four capitalized words; the title is
        // part of the span.
        self.add_rule(
            r"\b(?:Mrs|Mr|Ms|Dr|Prof|Smt)\.?[ \t]+[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+){0,3}\b",
            "PER",
            0,
            4,
            50,
        );
        self.add_rule(
            r"\bShri[ \t]+[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+){0,3}\b",
            "PER",
            0,
            4,
            50,
        );

        // "Name: Ravi Kumar", "NAME - Ravi Kumar", "Name Ravi Kumar"
        self.add_rule(
            r"\b(?i:name)(?:[ \t]*[:\-][ \t]*|[ \t]+)([A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+){1,3})\b",
            "PER",
            1,
            4,
            50,
        );
    }

    fn init_organization_rules(&mut self) {
        self.add_rule(
            r"\b[A-Z][A-Za-z&]*(?:[ \t]+[A-Z&][A-Za-z&]*)*[ \t]+(?:Ltd|Limited|Pvt|Private|Corporation|Corp|Inc|LLC|LLP|Company|Co|Bank|Insurance|Industries|Systems|Solutions|Technologies|Services)\b\.?",
            "ORG",
            0,
            5,
            100,
        );
    }

    fn add_rule(
        &mut self,
        pattern: &str,
        label: &'static str,
        group: usize,
        min_len: usize,
        max_len: usize,
    ) {
        if let Ok(regex) = Regex::new(pattern) {
            self.rules.push(SpanRule {
                regex,
                label,
                group,
                min_len,
                max_len,
            });
        }
    }

    /// Number of active rules
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    fn extract_by_rules(&self, text: &str) -> Vec<NerSpan> {
        let mut spans = Vec::new();

        for rule in &self.rules {
            let mut cursor = CharCursor::new(text);

            for caps in rule.regex.captures_iter(text) {
                let Some(mat) = caps.get(rule.group) else {
                    continue;
                };

                let len = mat.as_str().chars().count();
                if len < rule.min_len || len > rule.max_len {
                    continue;
                }

                let start = cursor.advance_to(mat.start());
                let end = cursor.advance_to(mat.end());
                spans.push(NerSpan::new(rule.label, mat.as_str(), start, end));
            }
        }

        deduplicate(spans)
    }
}

impl Default for RuleBasedSpans {
    fn default() -> Self {
        Self::new()
    }
}

impl SpanSource for RuleBasedSpans {
    fn source_id(&self) -> &str {
        "rules"
    }

    fn source_method(&self) -> SourceMethod {
        SourceMethod::Pattern
    }

    fn spans(&self, page: &Page) -> Result<Vec<NerSpan>> {
        Ok(self.extract_by_rules(&page.text))
    }
}

/// Remove overlapping spans, keeping the earliest and then the longest
fn deduplicate(mut spans: Vec<NerSpan>) -> Vec<NerSpan> {
    spans.sort_by_key(|s| {
        let start = s.start.unwrap_or_default();
        let end = s.end.unwrap_or_default();
        (start, std::cmp::Reverse(end))
    });

    let mut result: Vec<NerSpan> = Vec::with_capacity(spans.len());
    let mut covered_until = 0;

    for span in spans {
        let start = span.start.unwrap_or_default();
        if !result.is_empty() && start < covered_until {
            continue;
        }
        covered_until = span.end.unwrap_or_default();
        result.push(span);
    }

    result
}

// ============================================================================
// Tests
// ============================================================================
