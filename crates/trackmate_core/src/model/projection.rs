//! Per-view field projections.
//!
//! One record type serves every view; a view only decides which fields are
//! exposed. Hiding a field is a presentation choice, not an access check.

use serde::Serialize;
use serde_json::{Map, Value};

/// Which representation a caller asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Detail,
}

/// JSON object holding exactly the fields of one view.
pub type Projection = Map<String, Value>;

/// Implemented by every record exposed to the access layer.
pub trait Project {
    fn project(&self, view: View) -> Projection;
}

/// Serializes `value` and keeps only `fields`.
///
/// Fields missing from the serialized form are skipped.
pub fn select_fields<T: Serialize>(value: &T, fields: &[&str]) -> Projection {
    let mut full = match serde_json::to_value(value) {
        Ok(Value::Object(map)) => map,
        _ => return Projection::new(),
    };
    fields
        .iter()
        .filter_map(|field| full.remove(*field).map(|v| ((*field).to_string(), v)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::select_fields;
    use serde::Serialize;

    #[derive(Serialize)]
    struct Sample {
        id: i64,
        name: &'static str,
        secret: &'static str,
    }

    #[test]
    fn select_fields_drops_everything_else() {
        let sample = Sample {
            id: 7,
            name: "n",
            secret: "s",
        };
        let projected = select_fields(&sample, &["id", "name", "absent"]);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected["id"], 7);
        assert!(!projected.contains_key("secret"));
    }
}
