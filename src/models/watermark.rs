use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The persisted record: feed key -> id of the last notified item.
///
/// Serialized as a flat JSON object. Only string values are read as
/// watermarks; keys written by other tools keep whatever JSON value they
/// hold and are written back untouched on every save.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct WatermarkState {
    marks: BTreeMap<String, Value>,
}

impl WatermarkState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, feed_key: &str) -> Option<&str> {
        self.marks
            .get(feed_key)
            .and_then(Value::as_str)
            .filter(|mark| !mark.is_empty())
    }

    /// Moves the watermark for `feed_key` forward to `id`.
    ///
    /// Returns false and leaves the record alone when `id` does not compare
    /// greater than the stored value. A non-string value under `feed_key`
    /// counts as no watermark and is replaced.
    pub fn advance(&mut self, feed_key: &str, id: &str) -> bool {
        match self.get(feed_key) {
            Some(current) if id <= current => false,
            _ => {
                self.marks
                    .insert(feed_key.to_string(), Value::String(id.to_string()));
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for WatermarkState {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        WatermarkState {
            marks: iter
                .into_iter()
                .map(|(k, v)| (k.into(), Value::String(v.into())))
                .collect(),
        }
    }
}
