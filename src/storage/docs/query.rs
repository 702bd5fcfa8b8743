//! Filters and updates over JSON documents.
//!
//! Both backends evaluate `Update` in Rust; only filtering is pushed down
//! into SQL by the Postgres store.

use serde_json::{Map, Value as JsonValue};

pub type Document = Map<String, JsonValue>;

/// A conjunction of equality conditions.
///
/// A condition on an array field matches when the array contains the value,
/// the way document databases treat `{field: value}` queries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<(String, JsonValue)>,
}

impl Filter {
    /// Matches every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn eq(field: &str, value: impl Into<JsonValue>) -> Self {
        Self::all().and(field, value)
    }

    pub fn by_id(id: &str) -> Self {
        Self::eq("id", id)
    }

    pub fn and(mut self, field: &str, value: impl Into<JsonValue>) -> Self {
        self.conditions.push((field.to_string(), value.into()));
        self
    }

    pub fn conditions(&self) -> &[(String, JsonValue)] {
        &self.conditions
    }

    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| match doc.get(field) {
                Some(actual) if actual == expected => true,
                Some(JsonValue::Array(items)) => items.contains(expected),
                _ => false,
            })
    }
}

/// A field-level mutation applied to each matched document.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Set(String, JsonValue),
    Unset(String),
    PushAll(String, Vec<JsonValue>),
    /// Push only when the value is not already present.
    AddToSet(String, JsonValue),
    /// Remove every occurrence of the value.
    Pull(String, JsonValue),
    /// Swap `from` for `to` inside an array, without creating duplicates.
    ReplaceElement {
        field: String,
        from: JsonValue,
        to: JsonValue,
    },
    Many(Vec<Update>),
}

impl Update {
    pub fn set(field: &str, value: impl Into<JsonValue>) -> Self {
        Update::Set(field.to_string(), value.into())
    }

    pub fn unset(field: &str) -> Self {
        Update::Unset(field.to_string())
    }

    pub fn push_all<V: Into<JsonValue>>(field: &str, values: impl IntoIterator<Item = V>) -> Self {
        Update::PushAll(field.to_string(), values.into_iter().map(Into::into).collect())
    }

    pub fn add_to_set(field: &str, value: impl Into<JsonValue>) -> Self {
        Update::AddToSet(field.to_string(), value.into())
    }

    pub fn pull(field: &str, value: impl Into<JsonValue>) -> Self {
        Update::Pull(field.to_string(), value.into())
    }

    pub fn replace_element(
        field: &str,
        from: impl Into<JsonValue>,
        to: impl Into<JsonValue>,
    ) -> Self {
        Update::ReplaceElement {
            field: field.to_string(),
            from: from.into(),
            to: to.into(),
        }
    }

    /// Applies the update in place. The `id` field is never modified.
    pub fn apply(&self, doc: &mut Document) {
        match self {
            Update::Set(field, value) => {
                if field != "id" {
                    doc.insert(field.clone(), value.clone());
                }
            }
            Update::Unset(field) => {
                if field != "id" {
                    doc.remove(field);
                }
            }
            Update::PushAll(field, values) => {
                with_array(doc, field, |items| items.extend(values.iter().cloned()))
            }
            Update::AddToSet(field, value) => with_array(doc, field, |items| {
                if !items.contains(value) {
                    items.push(value.clone());
                }
            }),
            Update::Pull(field, value) => {
                if let Some(JsonValue::Array(items)) = doc.get_mut(field) {
                    items.retain(|item| item != value);
                }
            }
            Update::ReplaceElement { field, from, to } => {
                let Some(JsonValue::Array(items)) = doc.get_mut(field) else {
                    return;
                };
                let Some(pos) = items.iter().position(|item| item == from) else {
                    return;
                };
                if items.contains(to) {
                    items.retain(|item| item != from);
                } else {
                    items[pos] = to.clone();
                    items.retain(|item| item != from);
                }
            }
            Update::Many(updates) => {
                for update in updates {
                    update.apply(doc);
                }
            }
        }
    }
}

/// Runs `f` on the array stored under `field`, created (or replacing a
/// scalar) if needed.
fn with_array(doc: &mut Document, field: &str, f: impl FnOnce(&mut Vec<JsonValue>)) {
    let mut items = match doc.remove(field) {
        Some(JsonValue::Array(items)) => items,
        None | Some(JsonValue::Null) => Vec::new(),
        Some(JsonValue::String(s)) if s.is_empty() => Vec::new(),
        Some(other) => vec![other],
    };
    f(&mut items);
    doc.insert(field.to_string(), JsonValue::Array(items));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: JsonValue) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn eq_matches_scalars_and_array_members() {
        let d = doc(json!({"id": "a1", "name": "Ann", "movies": ["Up", "Heat"]}));
        assert!(Filter::eq("name", "Ann").matches(&d));
        assert!(Filter::eq("movies", "Heat").matches(&d));
        assert!(!Filter::eq("movies", "Alien").matches(&d));
        assert!(!Filter::eq("missing", "x").matches(&d));
        assert!(Filter::all().matches(&d));
        assert!(!Filter::eq("name", "Ann").and("movies", "Alien").matches(&d));
    }

    #[test]
    fn add_to_set_keeps_values_unique() {
        let mut d = doc(json!({"id": "m1"}));
        Update::add_to_set("flagNames", "gore").apply(&mut d);
        Update::add_to_set("flagNames", "gore").apply(&mut d);
        assert_eq!(d["flagNames"], json!(["gore"]));
    }

    #[test]
    fn pull_removes_every_occurrence() {
        let mut d = doc(json!({"id": "f", "movieTitles": ["Up", "Heat", "Up"]}));
        Update::pull("movieTitles", "Up").apply(&mut d);
        assert_eq!(d["movieTitles"], json!(["Heat"]));
    }

    #[test]
    fn replace_element_keeps_position_and_uniqueness() {
        let mut d = doc(json!({"id": "a", "movies": ["Up", "Heat"]}));
        Update::replace_element("movies", "Up", "Up 2").apply(&mut d);
        assert_eq!(d["movies"], json!(["Up 2", "Heat"]));

        let mut d = doc(json!({"id": "a", "movies": ["Up", "Heat"]}));
        Update::replace_element("movies", "Up", "Heat").apply(&mut d);
        assert_eq!(d["movies"], json!(["Heat"]));
    }

    #[test]
    fn unset_then_push_all_replaces_a_list() {
        let mut d = doc(json!({"id": "a", "movies": ["Old"]}));
        Update::Many(vec![Update::unset("movies"), Update::push_all("movies", ["A", "B"])])
            .apply(&mut d);
        assert_eq!(d["movies"], json!(["A", "B"]));
    }

    #[test]
    fn add_to_set_onto_a_cleared_string_field_starts_a_new_list() {
        let mut d = doc(json!({"id": "f", "movieTitles": ""}));
        Update::add_to_set("movieTitles", "Up").apply(&mut d);
        assert_eq!(d["movieTitles"], json!(["Up"]));
    }

    #[test]
    fn id_is_immutable() {
        let mut d = doc(json!({"id": "a"}));
        Update::Many(vec![Update::set("id", "b"), Update::unset("id")]).apply(&mut d);
        assert_eq!(d["id"], json!("a"));
    }
}
