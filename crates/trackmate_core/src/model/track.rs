//! Track model: the aggregate root tying a leader's profile, books and tasks.
//!
//! # Invariants
//! - `followers_num` and `rating_avg` are stored values, never recomputed.
//! - Nested book/task payloads are resolved with get-or-create per caller.
//! - In a patch, an absent nested payload keeps the current links; a present
//!   one (even empty) replaces them.

use crate::model::book::{Book, BookId, BookInput};
use crate::model::profile::{Profile, ProfileId};
use crate::model::projection::{select_fields, Project, Projection, View};
use crate::model::task::{Task, TaskId, TaskInput};
use crate::model::user::UserId;
use crate::model::validation::{max_len, parse_id_list, required, ValidationError, ValidationResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub type TrackId = i64;

/// `rating_avg` holds at most five digits with two decimals.
pub const MAX_RATING_AVG: f64 = 999.99;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Track {
    pub id: TrackId,
    pub leader_id: UserId,
    pub profile_id: Option<ProfileId>,
    pub subject_major: String,
    pub subject_minor: String,
    pub target_test: String,
    pub target_grade: String,
    pub track_name: String,
    pub description: String,
    pub link: String,
    pub followers_num: i64,
    pub rating_avg: f64,
    /// Relative media reference, e.g. `uploads/track/<uuid>.png`.
    pub image: Option<String>,
    /// Unix epoch milliseconds.
    pub published_date: i64,
}

/// Track together with its embedded profile, books and tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackAggregate {
    pub track: Track,
    pub profile: Option<Profile>,
    pub books: Vec<Book>,
    pub tasks: Vec<Task>,
}

const LIST_FIELDS: &[&str] = &[
    "id",
    "profile",
    "subject_major",
    "subject_minor",
    "target_test",
    "target_grade",
    "track_name",
    "book",
    "link",
    "followers_num",
    "rating_avg",
    "task",
    "image",
    "published_date",
];

impl Project for TrackAggregate {
    fn project(&self, view: View) -> Projection {
        let mut out = Projection::new();
        let mut plain = select_fields(&self.track, LIST_FIELDS);
        let description = Value::String(self.track.description.clone());
        for field in LIST_FIELDS {
            let value = match *field {
                "profile" => self
                    .profile
                    .as_ref()
                    .map_or(Value::Null, |p| Value::Object(p.project(View::Detail))),
                "book" => Value::Array(
                    self.books
                        .iter()
                        .map(|b| Value::Object(b.project(View::Detail)))
                        .collect(),
                ),
                "task" => Value::Array(
                    self.tasks
                        .iter()
                        .map(|t| Value::Object(t.project(View::Detail)))
                        .collect(),
                ),
                other => plain.remove(other).unwrap_or(Value::Null),
            };
            out.insert((*field).to_string(), value);
        }
        if view == View::Detail {
            out.insert("description".to_string(), description);
        }
        out
    }
}

/// Narrow projection returned by image upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackImage {
    pub id: TrackId,
    pub image: String,
}

impl Project for TrackImage {
    fn project(&self, _view: View) -> Projection {
        select_fields(self, &["id", "image"])
    }
}

/// File submitted for a track image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Client-side file name; only its extension is kept.
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrackInput {
    #[serde(default)]
    pub subject_major: String,
    #[serde(default)]
    pub subject_minor: String,
    #[serde(default)]
    pub target_test: String,
    #[serde(default)]
    pub target_grade: String,
    #[serde(default)]
    pub track_name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub link: String,
    #[serde(default)]
    pub followers_num: i64,
    #[serde(default)]
    pub rating_avg: f64,
    /// Defaults to creation time.
    #[serde(default)]
    pub published_date: Option<i64>,
    #[serde(default, rename = "book")]
    pub books: Vec<BookInput>,
    #[serde(default, rename = "task")]
    pub tasks: Vec<TaskInput>,
}

impl TrackInput {
    /// Validates plain fields and every nested payload.
    pub fn validate(&self) -> ValidationResult {
        required("subject_major", &self.subject_major)?;
        required("subject_minor", &self.subject_minor)?;
        required("target_test", &self.target_test)?;
        required("target_grade", &self.target_grade)?;
        required("track_name", &self.track_name)?;
        max_len("link", &self.link)?;
        validate_counters(self.followers_num, self.rating_avg)?;
        for book in &self.books {
            book.validate()?;
        }
        for task in &self.tasks {
            task.validate()?;
        }
        Ok(())
    }
}

/// Partial update. Nested `book`/`task` follow replace-if-present semantics.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TrackPatch {
    pub subject_major: Option<String>,
    pub subject_minor: Option<String>,
    pub target_test: Option<String>,
    pub target_grade: Option<String>,
    pub track_name: Option<String>,
    pub description: Option<String>,
    pub link: Option<String>,
    pub followers_num: Option<i64>,
    pub rating_avg: Option<f64>,
    pub published_date: Option<i64>,
    #[serde(default, rename = "book")]
    pub books: Option<Vec<BookInput>>,
    #[serde(default, rename = "task")]
    pub tasks: Option<Vec<TaskInput>>,
}

impl Track {
    /// Merges the plain fields of `patch`; nested payloads are left to the
    /// caller since they touch link tables, not this row.
    pub fn apply(&self, patch: &TrackPatch) -> TrackInput {
        TrackInput {
            subject_major: pick(&patch.subject_major, &self.subject_major),
            subject_minor: pick(&patch.subject_minor, &self.subject_minor),
            target_test: pick(&patch.target_test, &self.target_test),
            target_grade: pick(&patch.target_grade, &self.target_grade),
            track_name: pick(&patch.track_name, &self.track_name),
            description: pick(&patch.description, &self.description),
            link: pick(&patch.link, &self.link),
            followers_num: patch.followers_num.unwrap_or(self.followers_num),
            rating_avg: patch.rating_avg.unwrap_or(self.rating_avg),
            published_date: Some(patch.published_date.unwrap_or(self.published_date)),
            books: Vec::new(),
            tasks: Vec::new(),
        }
    }
}

fn pick(patched: &Option<String>, current: &str) -> String {
    patched.clone().unwrap_or_else(|| current.to_string())
}

fn validate_counters(followers_num: i64, rating_avg: f64) -> ValidationResult {
    if followers_num < 0 {
        return Err(ValidationError::Invalid {
            field: "followers_num",
            reason: "must not be negative".to_string(),
        });
    }
    if !rating_avg.is_finite() || !(0.0..=MAX_RATING_AVG).contains(&rating_avg) {
        return Err(ValidationError::Invalid {
            field: "rating_avg",
            reason: format!("must be between 0 and {MAX_RATING_AVG}"),
        });
    }
    Ok(())
}

/// Exact-match and related-id filters for the owner-scoped track list.
///
/// All set fields compose conjunctively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackFilter {
    pub subject_major: Option<String>,
    pub subject_minor: Option<String>,
    pub target_test: Option<String>,
    pub target_grade: Option<String>,
    /// Keep tracks linked to at least one of these books.
    pub books: Option<Vec<BookId>>,
    /// Keep tracks linked to at least one of these tasks.
    pub tasks: Option<Vec<TaskId>>,
}

/// Raw query-string form of [`TrackFilter`], ids as comma-separated text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TrackQuery {
    pub subject_major: Option<String>,
    pub subject_minor: Option<String>,
    pub target_test: Option<String>,
    pub target_grade: Option<String>,
    pub books: Option<String>,
    pub tasks: Option<String>,
}

impl TryFrom<TrackQuery> for TrackFilter {
    type Error = ValidationError;

    fn try_from(query: TrackQuery) -> Result<Self, Self::Error> {
        let ids = |field: &'static str, raw: Option<String>| -> Result<Option<Vec<i64>>, ValidationError> {
            match raw.as_deref().map(str::trim) {
                None | Some("") => Ok(None),
                Some(value) => parse_id_list(field, value).map(Some),
            }
        };
        Ok(Self {
            books: ids("books", query.books)?,
            tasks: ids("tasks", query.tasks)?,
            subject_major: query.subject_major,
            subject_minor: query.subject_minor,
            target_test: query.target_test,
            target_grade: query.target_grade,
        })
    }
}

/// Exact-match filters for unscoped track discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DiscoveryFilter {
    pub subject_major: Option<String>,
    pub subject_minor: Option<String>,
    pub target_test: Option<String>,
    pub target_grade: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{Track, TrackAggregate, TrackFilter, TrackInput, TrackQuery};
    use crate::model::projection::{Project, View};
    use crate::model::validation::ValidationError;

    fn track() -> Track {
        Track {
            id: 1,
            leader_id: 1,
            profile_id: None,
            subject_major: "math".to_string(),
            subject_minor: "algebra".to_string(),
            target_test: "sat".to_string(),
            target_grade: "A".to_string(),
            track_name: "Algebra in 30 days".to_string(),
            description: "long text".to_string(),
            link: String::new(),
            followers_num: 0,
            rating_avg: 4.5,
            image: None,
            published_date: 1_700_000_000_000,
        }
    }

    #[test]
    fn list_view_embeds_collections_and_hides_description() {
        let aggregate = TrackAggregate {
            track: track(),
            profile: None,
            books: Vec::new(),
            tasks: Vec::new(),
        };
        let list = aggregate.project(View::List);
        assert!(list["book"].is_array());
        assert!(list["task"].is_array());
        assert!(list["profile"].is_null());
        assert!(!list.contains_key("description"));
        assert!(!list.contains_key("leader_id"));

        let detail = aggregate.project(View::Detail);
        assert_eq!(detail["description"], "long text");
    }

    #[test]
    fn query_parses_comma_separated_ids() {
        let filter = TrackFilter::try_from(TrackQuery {
            books: Some("1,2,3".to_string()),
            tasks: Some(" ".to_string()),
            ..TrackQuery::default()
        })
        .unwrap();
        assert_eq!(filter.books, Some(vec![1, 2, 3]));
        assert_eq!(filter.tasks, None);
    }

    #[test]
    fn validate_rejects_out_of_range_rating() {
        let input = TrackInput {
            subject_major: "math".to_string(),
            subject_minor: "algebra".to_string(),
            target_test: "sat".to_string(),
            target_grade: "A".to_string(),
            track_name: "t".to_string(),
            rating_avg: 1000.0,
            ..TrackInput::default()
        };
        let err = input.validate().unwrap_err();
        assert!(matches!(err, ValidationError::Invalid { field: "rating_avg", .. }));
    }
}
