//! Application services sitting between the HTTP handlers and the ports.

mod comment;
mod essay;

pub use comment::CommentService;
pub use essay::{CreateEssayRequest, EssayService, ReviewRequest};

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{AppError, ErrorCode};
use crate::models::{Essay, User};

static EXAM_YEAR: OnceLock<Regex> = OnceLock::new();

fn exam_year_pattern() -> &'static Regex {
    EXAM_YEAR.get_or_init(|| Regex::new(r"^(19|20)\d{2}$").expect("exam year pattern is valid"))
}

/// Trims `value` and checks it has between 1 and `max` characters.
pub(crate) fn required_text(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field, "must not be blank"));
    }
    if trimmed.chars().count() > max {
        return Err(AppError::validation(
            field,
            format!("must be at most {max} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn exam_year(value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if exam_year_pattern().is_match(trimmed) {
        Ok(trimmed.to_string())
    } else {
        Err(AppError::validation(
            "examYear",
            format!("{trimmed:?} is not a four digit year"),
        ))
    }
}

pub(crate) fn ensure_participant(essay: &Essay, user: &User) -> Result<(), AppError> {
    if essay.is_participant(user) {
        Ok(())
    } else {
        Err(AppError::Forbidden(ErrorCode::NotEssayParticipant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_text_trims_and_bounds() {
        assert_eq!(required_text("univ", "  홍익대 ", 10).unwrap(), "홍익대");
        assert!(required_text("univ", "   ", 10).is_err());
        assert!(required_text("univ", "가나다라", 3).is_err());
        assert!(required_text("univ", "가나다", 3).is_ok());
    }

    #[test]
    fn exam_year_accepts_four_digit_years() {
        assert_eq!(exam_year("2022").unwrap(), "2022");
        assert_eq!(exam_year(" 1999 ").unwrap(), "1999");
        assert!(exam_year("22").is_err());
        assert!(exam_year("2022년").is_err());
        assert!(exam_year("3022").is_err());
    }
}
