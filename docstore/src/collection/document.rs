use crate::common::{Value, DOC_CREATED_AT, DOC_ID, DOC_UPDATED_AT};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Debug, Display};
use std::hash::{Hash, Hasher};

/// Separator of embedded field paths, e.g. `address.city`.
pub const FIELD_SEPARATOR: char = '.';

/// A schema-less record: an insertion-ordered map of field names to [Value]s.
///
/// Documents can be nested. A value inside a nested document is addressed
/// with a `.` separated path, so for `{"address": {"city": "Pune"}}` the call
/// `document.get("address.city")` returns the city. Array elements can be
/// addressed by position (`"grades.0"`) when reading.
///
/// Field names are validated when a document enters a collection:
///
/// * they must not be empty,
/// * they must not start with `$` (operators and the date encoding use it),
/// * they must not contain the field separator.
///
/// The store maintains three system fields:
///
/// * `_id` - identifier, unique within the collection and stable for the
///   document's lifetime. Generated at insert time when absent.
/// * `createdAt` - set once at insert time.
/// * `updatedAt` - refreshed by every successful mutation.
///
/// Equality is field-wise and ignores field order.
#[derive(Clone, Default)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top-level fields.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`.
    ///
    /// A key containing the field separator is treated as an embedded path:
    /// missing intermediate documents are created. Putting through a field
    /// that holds a non-document value fails with
    /// [ErrorKind::InvalidDocument].
    ///
    /// ```ignore
    /// let mut doc = Document::new();
    /// doc.put("name", "Alice")?;
    /// doc.put("address.city", "Pune")?;
    /// assert_eq!(doc.get("address.city"), Some(&Value::from("Pune")));
    /// ```
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> StoreResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(StoreError::new(
                "Document does not support empty key",
                ErrorKind::InvalidDocument,
            ));
        }

        let value = value.into();
        if key.contains(FIELD_SEPARATOR) {
            let splits: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
            self.deep_put(&splits, value)
        } else {
            self.data.insert(key.to_string(), value);
            Ok(())
        }
    }

    fn deep_put(&mut self, splits: &[&str], value: Value) -> StoreResult<()> {
        let (head, rest) = match splits.split_first() {
            Some(parts) => parts,
            None => return Ok(()),
        };

        if head.is_empty() {
            log::error!("Embedded field path contains an empty segment");
            return Err(StoreError::new(
                "Embedded field path contains an empty segment",
                ErrorKind::InvalidDocument,
            ));
        }

        if rest.is_empty() {
            self.data.insert(head.to_string(), value);
            return Ok(());
        }

        let entry = self
            .data
            .entry(head.to_string())
            .or_insert_with(|| Value::Document(Document::new()));

        match entry {
            Value::Document(sub_doc) => sub_doc.deep_put(rest, value),
            Value::Null => {
                let mut sub_doc = Document::new();
                sub_doc.deep_put(rest, value)?;
                *entry = Value::Document(sub_doc);
                Ok(())
            }
            other => {
                log::error!("Cannot put embedded field into {} field {}", other.type_name(), head);
                Err(StoreError::new(
                    &format!("Cannot put embedded field into {} field {}", other.type_name(), head),
                    ErrorKind::InvalidDocument,
                ))
            }
        }
    }

    /// Returns the value at `key`, or `None` when the field is absent.
    ///
    /// An explicit `null` is returned as `Some(&Value::Null)`, which is how
    /// `$exists` tells a null field from a missing one.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(key) {
            return Some(value);
        }
        if !key.contains(FIELD_SEPARATOR) {
            return None;
        }

        let mut splits = key.split(FIELD_SEPARATOR);
        let first = splits.next()?;
        let mut current = self.data.get(first)?;
        for part in splits {
            current = match current {
                Value::Document(doc) => doc.data.get(part)?,
                Value::Array(items) => {
                    let index = part.parse::<usize>().ok()?;
                    items.get(index)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Top-level lookup that never interprets the field separator.
    pub(crate) fn get_raw(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Top-level insert that skips path handling and validation, used while
    /// decoding persisted data.
    pub(crate) fn insert_raw(&mut self, key: String, value: Value) {
        self.data.insert(key, value);
    }

    pub fn contains_field(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Removes the value at `key`, returning it. Embedded paths are supported;
    /// the order of the remaining fields is preserved.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if let Some(value) = self.data.shift_remove(key) {
            return Some(value);
        }
        if !key.contains(FIELD_SEPARATOR) {
            return None;
        }

        let (parent, leaf) = key.rsplit_once(FIELD_SEPARATOR)?;
        match self.get_mut(parent)? {
            Value::Document(doc) => doc.data.shift_remove(leaf),
            _ => None,
        }
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        let mut splits = key.split(FIELD_SEPARATOR);
        let first = splits.next()?;
        let mut current = self.data.get_mut(first)?;
        for part in splits {
            current = match current {
                Value::Document(doc) => doc.data.get_mut(part)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Top-level field names in insertion order.
    pub fn fields(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// The `_id` of the document, if present.
    pub fn id(&self) -> Option<&Value> {
        self.data.get(DOC_ID)
    }

    pub fn has_id(&self) -> bool {
        self.data.contains_key(DOC_ID)
    }

    pub fn created_at(&self) -> Option<&DateTime<Utc>> {
        self.data.get(DOC_CREATED_AT).and_then(|v| v.as_datetime())
    }

    pub fn updated_at(&self) -> Option<&DateTime<Utc>> {
        self.data.get(DOC_UPDATED_AT).and_then(|v| v.as_datetime())
    }

    /// Checks every field name, recursively through nested documents and
    /// arrays of documents. Floats must be finite, since the log format has
    /// no representation for NaN or infinity.
    pub fn validate_field_names(&self) -> StoreResult<()> {
        for (key, value) in self.data.iter() {
            validate_field_name(key)?;
            validate_nested(key, value)?;
        }
        Ok(())
    }
}

fn validate_nested(key: &str, value: &Value) -> StoreResult<()> {
    match value {
        Value::Document(doc) => doc.validate_field_names(),
        Value::Array(items) => items.iter().try_for_each(|item| validate_nested(key, item)),
        Value::Float(f) if !f.is_finite() => {
            log::error!("Document field {} holds a non-finite number {}", key, f);
            Err(StoreError::new(
                &format!("Document field {} holds a non-finite number {}", key, f),
                ErrorKind::InvalidDocument,
            ))
        }
        _ => Ok(()),
    }
}

/// Validates a single field name.
pub fn validate_field_name(key: &str) -> StoreResult<()> {
    if key.is_empty() {
        log::error!("Document field name cannot be empty");
        return Err(StoreError::new(
            "Document field name cannot be empty",
            ErrorKind::InvalidDocument,
        ));
    }
    if key.starts_with('$') {
        log::error!("Document field name {} starts with a reserved '$'", key);
        return Err(StoreError::new(
            &format!("Document field name {} starts with a reserved '$'", key),
            ErrorKind::InvalidDocument,
        ));
    }
    if key.contains(FIELD_SEPARATOR) {
        log::error!("Document field name {} contains the field separator", key);
        return Err(StoreError::new(
            &format!("Document field name {} contains the field separator", key),
            ErrorKind::InvalidDocument,
        ));
    }
    Ok(())
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    // field order is irrelevant to equality, so compare sorted entries
    fn cmp(&self, other: &Self) -> Ordering {
        let mut left: Vec<(&String, &Value)> = self.data.iter().collect();
        let mut right: Vec<(&String, &Value)> = other.data.iter().collect();
        left.sort_by(|a, b| a.0.cmp(b.0));
        right.sort_by(|a, b| a.0.cmp(b.0));
        left.cmp(&right)
    }
}

impl Hash for Document {
    fn hash<H: Hasher>(&self, state: &mut H) {
        Value::Document(self.clone()).canonical_key().hash(state)
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.data.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Document, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Document(doc) => Ok(doc),
            other => Err(serde::de::Error::custom(format!(
                "expected a document, found {}",
                other.type_name()
            ))),
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self)
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "<document>"),
        }
    }
}

impl FromIterator<(String, Value)> for Document {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Document {
            data: iter.into_iter().collect(),
        }
    }
}

pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// ```rust
/// use docstore::doc;
///
/// let empty = doc!{};
/// let employee = doc!{
///     "employeeNo": "E1",
///     "annualSalary": 72000,
///     "address": { "city": "Pune" },
///     "tags": ["manager", "onsite"],
/// };
/// assert_eq!(employee.size(), 4);
/// ```
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value))
                .expect(&format!("Failed to put value {} in document", stringify!($value)));
            )*
            doc
        }
    };
}

/// Helper macro to convert values for the doc! macro.
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        {
            $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
        }
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
