//! Book catalog model.

use crate::model::projection::{select_fields, Project, Projection, View};
use crate::model::user::UserId;
use crate::model::validation::{max_len, required, ValidationResult};
use serde::{Deserialize, Serialize};

pub type BookId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    pub id: BookId,
    /// User whose request created the row.
    pub user_id: UserId,
    pub title: String,
    pub sub_title: String,
    pub author: String,
    pub image_url: String,
    pub isbn: String,
    pub publisher: String,
    pub published_date: String,
}

const FIELDS: &[&str] = &[
    "id",
    "title",
    "sub_title",
    "author",
    "image_url",
    "isbn",
    "publisher",
    "published_date",
];

impl Project for Book {
    fn project(&self, _view: View) -> Projection {
        select_fields(self, FIELDS)
    }
}

/// Create payload, also used as the get-or-create key for nested books.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookInput {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sub_title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub publisher: String,
    #[serde(default)]
    pub published_date: String,
}

impl BookInput {
    pub fn validate(&self) -> ValidationResult {
        required("title", &self.title)?;
        max_len("sub_title", &self.sub_title)?;
        required("author", &self.author)?;
        max_len("image_url", &self.image_url)?;
        required("isbn", &self.isbn)?;
        required("publisher", &self.publisher)?;
        max_len("published_date", &self.published_date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub author: Option<String>,
    pub image_url: Option<String>,
    pub isbn: Option<String>,
    pub publisher: Option<String>,
    pub published_date: Option<String>,
}

impl Book {
    pub fn apply(&self, patch: BookPatch) -> BookInput {
        BookInput {
            title: patch.title.unwrap_or_else(|| self.title.clone()),
            sub_title: patch.sub_title.unwrap_or_else(|| self.sub_title.clone()),
            author: patch.author.unwrap_or_else(|| self.author.clone()),
            image_url: patch.image_url.unwrap_or_else(|| self.image_url.clone()),
            isbn: patch.isbn.unwrap_or_else(|| self.isbn.clone()),
            publisher: patch.publisher.unwrap_or_else(|| self.publisher.clone()),
            published_date: patch
                .published_date
                .unwrap_or_else(|| self.published_date.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::BookInput;
    use crate::model::validation::ValidationError;

    #[test]
    fn validate_names_first_missing_required_field() {
        let input = BookInput {
            title: "Calculus".to_string(),
            author: "Spivak".to_string(),
            ..BookInput::default()
        };
        assert_eq!(
            input.validate(),
            Err(ValidationError::Missing { field: "isbn" })
        );
    }
}
