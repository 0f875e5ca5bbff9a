//! Identifier format validation
//!
//! Re-checks every distinct identifier value against the structural
//! layout independently of how the value was detected.

use std::collections::HashSet;

use panlink_core::{ValidationResult, IDENTIFIER_LEN};

/// Check one value: 5 uppercase letters, 4 digits, 1 uppercase letter
pub fn validate_identifier(value: &str) -> ValidationResult {
    let len = value.chars().count();
    if len != IDENTIFIER_LEN {
        return ValidationResult::invalid(value, format!("length != {IDENTIFIER_LEN}"));
    }

    let offending = value.chars().enumerate().find(|&(position, c)| match position {
        0..=4 | 9 => !c.is_ascii_uppercase(),
        _ => !c.is_ascii_digit(),
    });

    match offending {
        Some((position, _)) => ValidationResult::invalid(
            value,
            format!("invalid character class at position {position}"),
        ),
        None => ValidationResult::valid(value),
    }
}

/// Produces one verdict per distinct identifier value
#[derive(Debug, Clone, Copy, Default)]
pub struct FormatValidator;

impl FormatValidator {
    /// Validate values in first-seen order, skipping repeats
    pub fn validate_all<'a, I>(&self, values: I) -> Vec<ValidationResult>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        values
            .into_iter()
            .filter(|value| seen.insert(*value))
            .map(validate_identifier)
            .collect()
    }
}
