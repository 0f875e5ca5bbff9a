//! Identifier detection
//!
//! Scans page text for PAN-shaped identifiers: five uppercase letters,
//! four digits and one uppercase letter, never embedded in a longer
//! alphanumeric run.

use once_cell::sync::Lazy;
use regex::{Matches, Regex};

use panlink_core::{EntityType, RawEntity, SourceMethod};

static IDENTIFIER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z]{5}[0-9]{4}[A-Z]\b").expect("identifier pattern must compile")
});

/// Lazily scan `text` for identifiers, in document order.
pub fn detect_identifiers(text: &str, page_index: usize) -> Identifiers<'_> {
    Identifiers {
        matches: IDENTIFIER_PATTERN.find_iter(text),
        cursor: CharCursor::new(text),
        page_index,
    }
}

/// Iterator returned by [`detect_identifiers`]
pub struct Identifiers<'t> {
    matches: Matches<'static, 't>,
    cursor: CharCursor<'t>,
    page_index: usize,
}

impl Iterator for Identifiers<'_> {
    type Item = RawEntity;

    fn next(&mut self) -> Option<Self::Item> {
        let mat = self.matches.next()?;
        let start = self.cursor.advance_to(mat.start());
        let end = self.cursor.advance_to(mat.end());

        Some(RawEntity::new(
            EntityType::Identifier,
            mat.as_str(),
            start,
            end,
            SourceMethod::Pattern,
            self.page_index,
        ))
    }
}

/// Converts monotonically increasing byte offsets into character offsets
/// without rescanning the text from the beginning each time.
pub(crate) struct CharCursor<'t> {
    text: &'t str,
    byte: usize,
    chars: usize,
}

impl<'t> CharCursor<'t> {
    pub(crate) fn new(text: &'t str) -> Self {
        Self {
            text,
            byte: 0,
            chars: 0,
        }
    }

    /// Character offset of `byte`. Offsets must be passed in
    /// non-decreasing order and lie on char boundaries.
    pub(crate) fn advance_to(&mut self, byte: usize) -> usize {
        if byte > self.byte {
            self.chars += self.text[self.byte..byte].chars().count();
            self.byte = byte;
        }
        self.chars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(text: &str) -> Vec<String> {
        detect_identifiers(text, 0).map(|e| e.text).collect()
    }

    #[test]
    fn test_detects_identifier_with_offsets() {
        let text = "PAN: AAUFM6247N issued";
        let found: Vec<RawEntity> = detect_identifiers(text, 3).collect();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "AAUFM6247N");
        assert_eq!((found[0].start, found[0].end), (5, 15));
        assert_eq!(found[0].page_index, 3);
        assert_eq!(found[0].entity_type, EntityType::Identifier);
        assert_eq!(found[0].source_method, SourceMethod::Pattern);
    }

    #[test]
    fn test_document_order() {
        assert_eq!(
            values("ABCDE1234F then BCDEF2345G, finally CDEFG3456H."),
            vec!["ABCDE1234F", "BCDEF2345G", "CDEFG3456H"]
        );
    }

    #[test]
    fn test_rejects_wrong_layout() {
        assert!(values("AAUF12345N").is_empty());
        assert!(values("AAUFM624N").is_empty());
        assert!(values("aaufm6247n").is_empty());
    }

    #[test]
    fn test_respects_alphanumeric_boundaries() {
        assert!(values("XAAUFM6247N").is_empty());
        assert!(values("AAUFM6247N9").is_empty());
        assert!(values("AAUFM6247NA").is_empty());
        assert_eq!(values("(AAUFM6247N)"), vec!["AAUFM6247N"]);
    }

    #[test]
    fn test_offsets_are_characters_not_bytes() {
        let text = "Śrī Rāma – AAUFM6247N";
        let found: Vec<RawEntity> = detect_identifiers(text, 0).collect();

        let expected_start = text.chars().count() - 10;
        assert_eq!(found[0].start, expected_start);
        assert_eq!(found[0].end, expected_start + 10);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(detect_identifiers("", 0).count(), 0);
    }
}
