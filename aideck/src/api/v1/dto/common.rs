//! Shared DTO pieces: custom validators and query helpers.

use std::borrow::Cow;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::ValidationError;

use crate::models::DateRange;

pub const MAX_TAGS: usize = 20;
pub const MAX_TAG_CHARS: usize = 50;
pub const MAX_PALETTE_COLORS: usize = 16;

/// Acknowledges a delete or deactivate of the record `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct DeletedResponse {
    pub id: String,
}

fn hex_color_regex() -> Option<&'static Regex> {
    static HEX_COLOR: OnceLock<Option<Regex>> = OnceLock::new();
    HEX_COLOR
        .get_or_init(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").ok())
        .as_ref()
}

pub fn is_hex_color(value: &str) -> bool {
    hex_color_regex().is_some_and(|re| re.is_match(value))
}

fn failure(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Owned(message));
    err
}

/// At most 20 tags, each 1..=50 characters.
pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(failure(
            "tags",
            format!("must contain at most {MAX_TAGS} tags"),
        ));
    }
    for tag in tags {
        let len = tag.trim().chars().count();
        if len == 0 || len > MAX_TAG_CHARS {
            return Err(failure(
                "tags",
                format!("each tag must be 1 to {MAX_TAG_CHARS} characters"),
            ));
        }
    }
    Ok(())
}

/// At most 16 colors, each `#RGB` or `#RRGGBB`.
pub fn validate_color_palette(colors: &[String]) -> Result<(), ValidationError> {
    if colors.len() > MAX_PALETTE_COLORS {
        return Err(failure(
            "color_palette",
            format!("must contain at most {MAX_PALETTE_COLORS} colors"),
        ));
    }
    if let Some(bad) = colors.iter().find(|c| !is_hex_color(c)) {
        return Err(failure(
            "hex_color",
            format!("'{bad}' is not a #RGB or #RRGGBB color"),
        ));
    }
    Ok(())
}

/// A bare file name: no path separators, no `.`/`..`, no control characters.
pub fn validate_filename(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(failure("filename", "must be a file name".to_string()));
    }
    if name.contains(['/', '\\']) {
        return Err(failure(
            "filename",
            "must not contain path separators".to_string(),
        ));
    }
    if name.chars().any(char::is_control) {
        return Err(failure(
            "filename",
            "must not contain control characters".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(failure("blank", "must not be blank".to_string()));
    }
    Ok(())
}

/// Trim tags and drop duplicates, keeping first occurrence order.
pub fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

pub fn date_range(from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> DateRange {
    DateRange { from, to }
}

/// Blank query strings behave as if absent.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
