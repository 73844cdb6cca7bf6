//! Field-level validation shared by all create/patch payloads.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Upper bound for short text columns.
pub const MAX_CHAR_LEN: usize = 255;

/// Validation failure naming the offending field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Required field is absent or blank.
    Missing { field: &'static str },
    /// Text field exceeds its maximum length in characters.
    TooLong { field: &'static str, max: usize },
    /// Field is present but its value is not acceptable.
    Invalid { field: &'static str, reason: String },
}

impl ValidationError {
    /// Name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Missing { field } | Self::TooLong { field, .. } | Self::Invalid { field, .. } => {
                field
            }
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing { field } => write!(f, "{field}: this field is required"),
            Self::TooLong { field, max } => {
                write!(f, "{field}: ensure this field has no more than {max} characters")
            }
            Self::Invalid { field, reason } => write!(f, "{field}: {reason}"),
        }
    }
}

impl Error for ValidationError {}

pub type ValidationResult = Result<(), ValidationError>;

/// Rejects blank values and values longer than [`MAX_CHAR_LEN`].
pub fn required(field: &'static str, value: &str) -> ValidationResult {
    if value.trim().is_empty() {
        return Err(ValidationError::Missing { field });
    }
    max_len(field, value)
}

/// Accepts blank values but still enforces [`MAX_CHAR_LEN`].
pub fn max_len(field: &'static str, value: &str) -> ValidationResult {
    if value.chars().count() > MAX_CHAR_LEN {
        return Err(ValidationError::TooLong {
            field,
            max: MAX_CHAR_LEN,
        });
    }
    Ok(())
}

/// Parses a comma-separated id list such as `"1,2,3"`.
///
/// Whitespace around items is ignored; empty items and non-integers are
/// rejected so that a malformed filter never silently widens a query.
pub fn parse_id_list(field: &'static str, raw: &str) -> Result<Vec<i64>, ValidationError> {
    let mut ids = Vec::new();
    for item in raw.split(',') {
        let trimmed = item.trim();
        let id = trimmed
            .parse::<i64>()
            .map_err(|_| ValidationError::Invalid {
                field,
                reason: format!("`{trimmed}` is not a valid id"),
            })?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::{max_len, parse_id_list, required, ValidationError, MAX_CHAR_LEN};

    #[test]
    fn required_rejects_blank_values() {
        assert_eq!(
            required("title", "   "),
            Err(ValidationError::Missing { field: "title" })
        );
        assert!(required("title", "Algebra").is_ok());
    }

    #[test]
    fn max_len_counts_characters_not_bytes() {
        let exact = "é".repeat(MAX_CHAR_LEN);
        assert!(max_len("nickname", &exact).is_ok());

        let over = "a".repeat(MAX_CHAR_LEN + 1);
        let err = max_len("nickname", &over).unwrap_err();
        assert_eq!(err.field(), "nickname");
    }

    #[test]
    fn parse_id_list_trims_and_deduplicates() {
        assert_eq!(parse_id_list("books", " 1, 2 ,1").unwrap(), vec![1, 2]);
    }

    #[test]
    fn parse_id_list_rejects_garbage() {
        let err = parse_id_list("tasks", "4,x").unwrap_err();
        assert_eq!(err.field(), "tasks");
        assert!(err.to_string().contains("`x`"));

        assert!(parse_id_list("tasks", "4,,5").is_err());
    }
}
