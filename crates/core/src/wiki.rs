//! Wiki input validation and tag normalization.
//!
//! Field-level length rules live on the DTOs as `validator` attributes; this
//! module turns their failures into [`CoreError::InvalidParam`] and handles the
//! free-form tag string.

use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Maximum number of distinct tags on a wiki.
pub const MAX_TAGS: usize = 20;

/// Maximum length of a single tag, in characters.
pub const MAX_TAG_LENGTH: usize = 50;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Run the DTO's `validator` rules, reporting the first offending field
/// (alphabetically) as an invalid parameter.
pub fn validate_input<T: Validate>(input: &T) -> Result<(), CoreError> {
    input.validate().map_err(|errors| {
        let mut fields: Vec<String> = errors
            .field_errors()
            .keys()
            .map(|field| field.to_string())
            .collect();
        fields.sort();
        CoreError::InvalidParam(fields.into_iter().next().unwrap_or_else(|| "input".into()))
    })
}

/// Normalize a raw comma-separated tag string.
///
/// Splits on ASCII and full-width commas, trims each tag, drops empties, and
/// removes case-insensitive duplicates (first spelling wins). Fails with
/// `InvalidParam("tags")` when more than [`MAX_TAGS`] remain or any tag is
/// longer than [`MAX_TAG_LENGTH`].
pub fn format_tags(raw: &str) -> Result<String, CoreError> {
    let mut tags: Vec<&str> = Vec::new();
    for tag in raw.split([',', '，']).map(str::trim) {
        if tag.is_empty() {
            continue;
        }
        if tag.chars().count() > MAX_TAG_LENGTH {
            return Err(CoreError::invalid_param("tags"));
        }
        if !tags.iter().any(|t| t.to_lowercase() == tag.to_lowercase()) {
            tags.push(tag);
        }
    }
    if tags.len() > MAX_TAGS {
        return Err(CoreError::invalid_param("tags"));
    }
    Ok(tags.join(","))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::models::{CreateWiki, UpdateWiki};

    // -- format_tags ---------------------------------------------------------

    #[test]
    fn tags_trimmed_and_joined() {
        assert_eq!(format_tags(" rust , wiki,docs ").unwrap(), "rust,wiki,docs");
    }

    #[test]
    fn tags_deduplicated_case_insensitively() {
        assert_eq!(format_tags("Rust,rust,RUST,Go").unwrap(), "Rust,Go");
    }

    #[test]
    fn tags_empty_input_yields_empty_string() {
        assert_eq!(format_tags("").unwrap(), "");
        assert_eq!(format_tags(" , ,").unwrap(), "");
    }

    #[test]
    fn tags_full_width_comma_splits() {
        assert_eq!(format_tags("a，b").unwrap(), "a,b");
    }

    #[test]
    fn tags_too_many_rejected() {
        let raw: Vec<String> = (0..=MAX_TAGS).map(|i| format!("tag-{i}")).collect();
        assert_matches!(format_tags(&raw.join(",")), Err(CoreError::InvalidParam(p)) if p == "tags");
    }

    #[test]
    fn tags_too_long_rejected() {
        let long = "t".repeat(MAX_TAG_LENGTH + 1);
        assert_matches!(format_tags(&long), Err(CoreError::InvalidParam(_)));
    }

    // -- validate_input ------------------------------------------------------

    #[test]
    fn create_wiki_with_empty_name_names_the_field() {
        let input = CreateWiki {
            name: String::new(),
            description: "d".into(),
            content: "c".into(),
            tags: None,
        };
        assert_matches!(validate_input(&input), Err(CoreError::InvalidParam(p)) if p == "name");
    }

    #[test]
    fn update_wiki_absent_fields_pass() {
        assert!(validate_input(&UpdateWiki::default()).is_ok());
    }

    #[test]
    fn update_wiki_empty_description_rejected() {
        let input = UpdateWiki {
            description: Some(String::new()),
            ..Default::default()
        };
        assert_matches!(
            validate_input(&input),
            Err(CoreError::InvalidParam(p)) if p == "description"
        );
    }
}
