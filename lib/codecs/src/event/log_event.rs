use std::iter::FromIterator;

use serde::{ser::SerializeMap, Serialize, Serializer};

use super::{ObjectMap, Value};

/// The field holding the raw text of an event.
pub const MESSAGE_KEY: &str = "message";

/// The field holding the event's tag list.
pub const TAGS_KEY: &str = "tags";

/// The tag added to events whose payload could not be parsed as JSON.
pub const JSON_PARSE_FAILURE_TAG: &str = "_jsonparsefailure";

/// A structured log record: an ordered set of named fields.
///
/// Field order follows insertion order, which for decoded events is the order
/// in which keys appeared in the source document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LogEvent {
    fields: ObjectMap,
}

impl LogEvent {
    /// Builds an event from a parsed JSON value.
    ///
    /// Objects contribute their top-level fields. Any other value is placed
    /// under the `message` field.
    pub fn from_parsed(value: Value) -> Self {
        match value {
            Value::Object(fields) => Self { fields },
            other => Self::from_iter([(MESSAGE_KEY, other)]),
        }
    }

    /// Builds the plain-text event used when a payload is not valid JSON.
    pub fn json_parse_failure(message: impl Into<Value>) -> Self {
        Self::from_iter([
            (MESSAGE_KEY, message.into()),
            (TAGS_KEY, Value::from(vec![JSON_PARSE_FAILURE_TAG])),
        ])
    }

    /// Returns the value of a top-level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the event has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over the top-level field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The string entries of the `tags` field.
    pub fn tags(&self) -> Vec<String> {
        self.get(TAGS_KEY)
            .and_then(Value::as_array)
            .map(|tags| {
                tags.iter()
                    .filter_map(|tag| tag.as_str().map(|tag| tag.into_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether `tags` contains `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.get(TAGS_KEY)
            .and_then(Value::as_array)
            .is_some_and(|tags| tags.iter().any(|t| t.as_str().as_deref() == Some(tag)))
    }
}

impl<K, V> FromIterator<(K, V)> for LogEvent
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

impl Serialize for LogEvent {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
