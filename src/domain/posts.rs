//! Post text rules and date formatting shared by listings and detail pages.

use time::{OffsetDateTime, format_description::FormatItem, macros::format_description};

use crate::domain::error::DomainError;

pub const HUMAN_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[month repr:long] [day padding:none], [year]");
pub const ISO_DATE_FORMAT: &[FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Length of the preview rendered on listing cards.
pub const PREVIEW_CHARS: usize = 120;

/// Normalize a submitted post body: trims surrounding whitespace and rejects
/// empty input.
pub fn normalize_body(input: &str) -> Result<String, DomainError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation("post body must not be empty"));
    }
    Ok(trimmed.to_string())
}

/// Shorten a post body for listing cards, cutting at a character boundary.
pub fn preview(body: &str) -> String {
    if body.chars().count() <= PREVIEW_CHARS {
        return body.to_string();
    }
    let cut: String = body.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut.trim_end())
}

pub fn format_human_date(when: OffsetDateTime) -> String {
    when.format(HUMAN_DATE_FORMAT)
        .unwrap_or_else(|_| when.date().to_string())
}

pub fn format_iso_date(when: OffsetDateTime) -> String {
    when.format(ISO_DATE_FORMAT)
        .unwrap_or_else(|_| when.date().to_string())
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;

    #[test]
    fn normalize_body_trims_whitespace() {
        let body = normalize_body("  hello world \n").expect("valid body");
        assert_eq!(body, "hello world");
    }

    #[test]
    fn normalize_body_rejects_blank_input() {
        let err = normalize_body(" \t\n ").expect_err("blank body rejected");
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn preview_keeps_short_bodies_intact() {
        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn preview_truncates_long_bodies_with_ellipsis() {
        let body = "x".repeat(PREVIEW_CHARS * 2);
        let shortened = preview(&body);
        assert!(shortened.ends_with('…'));
        assert!(shortened.chars().count() <= PREVIEW_CHARS + 1);
    }

    #[test]
    fn human_date_format_reads_naturally() {
        let when = datetime!(2025-03-07 12:00 UTC);
        assert_eq!(format_human_date(when), "March 7, 2025");
        assert_eq!(format_iso_date(when), "2025-03-07");
    }
}
