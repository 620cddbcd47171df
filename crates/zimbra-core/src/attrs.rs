//! Attribute maps and their wire form.
//!
//! Zimbra carries directory attributes as an array of `{"n": key, "_content": value}`
//! entries. Multi-valued attributes repeat the key once per value. [`AttributeMap`]
//! is the in-memory form: an insertion-ordered map from key to a single value or a
//! sequence of values.
//!
//! A key that occurs exactly once on the wire decodes to [`AttributeValue::Single`],
//! so a one-element sequence encodes and decodes back as a scalar.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

/// Value of a single attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// One value
    Single(String),
    /// Several values, in wire order
    Multi(Vec<String>),
}

impl AttributeValue {
    /// Returns the first value.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value),
            Self::Multi(values) => values.first().map(String::as_str),
        }
    }

    /// Returns every value, a scalar counting as a one-element sequence.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            Self::Single(value) => std::slice::from_ref(value),
            Self::Multi(values) => values,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            Self::Single(existing) => {
                let first = std::mem::take(existing);
                *self = Self::Multi(vec![first, value]);
            }
            Self::Multi(values) => values.push(value),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_string).collect())
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Single(if value { "TRUE" } else { "FALSE" }.to_string())
    }
}

impl From<u64> for AttributeValue {
    fn from(value: u64) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Single(value.to_string())
    }
}

/// Insertion-ordered attribute map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<(String, AttributeValue)>,
}

impl AttributeMap {
    /// Creates an empty map.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Adds or replaces an attribute, builder style.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Inserts an attribute. Replacing keeps the original position.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Appends one value, turning a scalar into a sequence on the second occurrence.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => slot.push(value),
            None => self.entries.push((key, AttributeValue::Single(value))),
        }
    }

    /// Removes an attribute.
    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        let position = self.entries.iter().position(|(existing, _)| existing == key)?;
        Some(self.entries.remove(position).1)
    }

    /// Returns the value for a key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }

    /// Returns the first value for a key as a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(AttributeValue::first)
    }

    /// Returns every value for a key; missing keys yield an empty slice.
    #[must_use]
    pub fn values(&self, key: &str) -> &[String] {
        self.get(key)
            .map(AttributeValue::as_slice)
            .unwrap_or_default()
    }

    /// Returns true if the key is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Number of distinct keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over attributes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Encodes the map into the `{n, _content}` wire array.
    #[must_use]
    pub fn to_array(&self) -> Vec<Value> {
        attributes_to_array(self)
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeMap
where
    K: Into<String>,
    V: Into<AttributeValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for AttributeMap {
    type Item = (String, AttributeValue);
    type IntoIter = std::vec::IntoIter<(String, AttributeValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Encodes attributes as `[{n: key, _content: value}]`, one entry per value.
#[must_use]
pub fn attributes_to_array(attrs: &AttributeMap) -> Vec<Value> {
    attrs
        .iter()
        .flat_map(|(key, value)| {
            value
                .as_slice()
                .iter()
                .map(move |item| json!({ "n": key, "_content": item }))
        })
        .collect()
}

/// Decodes a `{n, _content}` array. Missing or non-array input yields an empty map.
#[must_use]
pub fn build_attrs_map(entries: Option<&Value>) -> AttributeMap {
    let mut map = AttributeMap::new();
    let Some(entries) = entries.and_then(Value::as_array) else {
        return map;
    };

    for entry in entries {
        let Some(key) = entry.get("n").and_then(Value::as_str) else {
            continue;
        };
        let value = match entry.get("_content") {
            Some(Value::String(text)) => text.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        map.append(key, value);
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_scalars_and_sequences_in_order() {
        let attrs = AttributeMap::new()
            .with("size", "20")
            .with("zimbraMailAlias", vec!["a@example.test", "b@example.test"])
            .with("age", "30");

        assert_eq!(
            attributes_to_array(&attrs),
            vec![
                json!({"n": "size", "_content": "20"}),
                json!({"n": "zimbraMailAlias", "_content": "a@example.test"}),
                json!({"n": "zimbraMailAlias", "_content": "b@example.test"}),
                json!({"n": "age", "_content": "30"}),
            ]
        );
    }

    #[test]
    fn empty_map_encodes_to_empty_array() {
        assert!(attributes_to_array(&AttributeMap::new()).is_empty());
    }

    #[test]
    fn repeated_keys_accumulate() {
        let wire = json!([
            {"n": "zimbraACE", "_content": "a usr sendToDistList"},
            {"n": "description", "_content": "sales"},
            {"n": "zimbraACE", "_content": "b usr sendToDistList"},
        ]);
        let attrs = build_attrs_map(Some(&wire));

        assert_eq!(attrs.len(), 2);
        assert_eq!(
            attrs.values("zimbraACE"),
            ["a usr sendToDistList", "b usr sendToDistList"]
        );
        assert_eq!(
            attrs.get("description"),
            Some(&AttributeValue::Single("sales".to_string()))
        );
    }

    #[test]
    fn missing_input_is_empty() {
        assert!(build_attrs_map(None).is_empty());
        assert!(build_attrs_map(Some(&json!({"n": "x"}))).is_empty());
    }

    #[test]
    fn round_trip_normalizes_single_element_sequences() {
        let attrs = AttributeMap::new()
            .with("zimbraMailAlias", vec!["only@example.test"])
            .with("zimbraMailStatus", "enabled");
        let decoded = build_attrs_map(Some(&Value::Array(attributes_to_array(&attrs))));

        assert_eq!(
            decoded.get("zimbraMailAlias"),
            Some(&AttributeValue::Single("only@example.test".to_string()))
        );
        assert_eq!(decoded.get_str("zimbraMailStatus"), Some("enabled"));
    }

    #[test]
    fn insert_replaces_in_place() {
        let mut attrs = AttributeMap::new().with("a", "1").with("b", "2");
        attrs.insert("a", "3");
        let keys: Vec<&str> = attrs.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["a", "b"]);
        assert_eq!(attrs.get_str("a"), Some("3"));
        assert_eq!(attrs.remove("b"), Some(AttributeValue::from("2")));
        assert!(!attrs.contains_key("b"));
    }

    #[test]
    fn booleans_use_zimbra_spelling() {
        let attrs = AttributeMap::new().with("zimbraIsDelegatedAdminAccount", true);
        assert_eq!(attrs.get_str("zimbraIsDelegatedAdminAccount"), Some("TRUE"));
    }

    #[test]
    fn serializes_as_object() {
        let attrs = AttributeMap::new()
            .with("description", "x")
            .with("zimbraMailAlias", vec!["a", "b"]);
        assert_eq!(
            serde_json::to_value(&attrs).unwrap(),
            json!({"description": "x", "zimbraMailAlias": ["a", "b"]})
        );
    }
}
