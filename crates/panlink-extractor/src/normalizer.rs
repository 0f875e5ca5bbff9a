//! Span normalization
//!
//! Maps spans from an external extractor's vocabulary onto the engine's
//! Person/Organization entities. Everything else is dropped.

use panlink_core::{EntityType, PanlinkError, RawEntity, Result, SourceMethod};

use crate::NerSpan;

/// Converts raw spans into [`RawEntity`] values for one source
#[derive(Debug, Clone, Copy)]
pub struct SpanNormalizer {
    source_method: SourceMethod,
}

impl SpanNormalizer {
    pub fn new(source_method: SourceMethod) -> Self {
        Self { source_method }
    }

    /// Normalize every span of a page whose text is `text_len` characters.
    ///
    /// Fails with [`PanlinkError::MissingPosition`] as soon as a kept span
    /// lacks offsets, and with [`PanlinkError::InvalidInput`] when its
    /// offsets fall outside the page; callers treat either as "no
    /// counterparts on this page".
    pub fn normalize(
        &self,
        spans: &[NerSpan],
        page_index: usize,
        text_len: usize,
    ) -> Result<Vec<RawEntity>> {
        let mut entities = Vec::with_capacity(spans.len());

        for span in spans {
            let Some(entity_type) = map_label(&span.label) else {
                continue;
            };

            let text = collapse_whitespace(&span.text);
            if text.is_empty() {
                continue;
            }

            let (Some(start), Some(end)) = (span.start, span.end) else {
                return Err(PanlinkError::MissingPosition {
                    label: span.label.clone(),
                    text,
                });
            };

            if end < start {
                return Err(PanlinkError::InvalidInput(format!(
                    "span '{text}' ends ({end}) before it starts ({start})"
                )));
            }
            if end > text_len {
                return Err(PanlinkError::InvalidInput(format!(
                    "span '{text}' ends ({end}) past the page ({text_len} characters)"
                )));
            }

            entities.push(RawEntity::new(
                entity_type,
                text,
                start,
                end,
                self.source_method,
                page_index,
            ));
        }

        Ok(entities)
    }
}

/// Map an external label onto a counterpart type.
///
/// Accepts CoNLL style tags with or without BIO prefixes.
pub fn map_label(label: &str) -> Option<EntityType> {
    let label = label.trim().to_uppercase();
    let bare = ["B-", "I-", "E-", "S-"]
        .iter()
        .find_map(|prefix| label.strip_prefix(prefix))
        .unwrap_or(&label);

    match bare {
        "PER" | "PERSON" => Some(EntityType::Person),
        "ORG" | "ORGANIZATION" | "ORGANISATION" => Some(EntityType::Organization),
        _ => None,
    }
}

/// Trim and collapse internal whitespace runs to a single space
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
