use indexmap::IndexMap;
use itertools::Itertools;

use crate::collection::{validate_field_name, Document};
use crate::common::{Value, DOC_ID};
use crate::errors::StoreResult;

use super::accumulator::{field_ref, AccumulatorState};
use super::{invalid_pipeline, Accumulator};

/// The `_id` of a `$group` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    /// `null`: every document falls into one bucket.
    Single,
    /// A single field; the bucket id is its value.
    Field(String),
    /// Named sub-keys, each taken from a field; the bucket id is a document.
    Composite(Vec<(String, String)>),
}

impl GroupKey {
    pub(crate) fn parse(definition: &Value) -> StoreResult<GroupKey> {
        match definition {
            Value::Null => Ok(GroupKey::Single),
            Value::String(field) if !field_ref(field).is_empty() => Ok(GroupKey::Field(field_ref(field))),
            Value::Document(doc) if !doc.is_empty() => {
                let mut parts = Vec::with_capacity(doc.size());
                for (name, source) in doc.iter() {
                    match source {
                        Value::String(field) if !field_ref(field).is_empty() => {
                            parts.push((name.clone(), field_ref(field)))
                        }
                        other => {
                            return Err(invalid_pipeline(format!(
                                "Group key part {} must be a field name, got {}",
                                name, other
                            )))
                        }
                    }
                }
                Ok(GroupKey::Composite(parts))
            }
            other => Err(invalid_pipeline(format!(
                "Group _id must be null, a field name or a document of field names, got {}",
                other
            ))),
        }
    }

    /// The bucket id of `document` and its identity string.
    fn key_of(&self, document: &Document) -> (Value, String) {
        match self {
            GroupKey::Single => (Value::Null, String::new()),
            GroupKey::Field(field) => {
                let value = document.get(field).cloned().unwrap_or(Value::Null);
                let identity = value.canonical_key();
                (value, identity)
            }
            GroupKey::Composite(parts) => {
                let mut key = Document::new();
                for (name, field) in parts {
                    key.insert_raw(name.clone(), document.get(field).cloned().unwrap_or(Value::Null));
                }
                let identity = key.iter().map(|(_, v)| v.canonical_key()).join("\u{1f}");
                (Value::Document(key), identity)
            }
        }
    }
}

/// A `$group` stage: a key and named accumulators.
///
/// ```rust
/// use docstore::aggregate::{Accumulator, GroupStage};
///
/// let by_department = GroupStage::by_field("department")
///     .accumulate("total", Accumulator::sum("annualSalary"))
///     .accumulate("average", Accumulator::avg("annualSalary"));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct GroupStage {
    key: GroupKey,
    accumulators: Vec<(String, Accumulator)>,
}

impl GroupStage {
    pub fn new(key: GroupKey) -> GroupStage {
        GroupStage {
            key,
            accumulators: Vec::new(),
        }
    }

    pub fn by_field(field: &str) -> GroupStage {
        GroupStage::new(GroupKey::Field(field_ref(field)))
    }

    /// One bucket over the whole input.
    pub fn single() -> GroupStage {
        GroupStage::new(GroupKey::Single)
    }

    pub fn accumulate(mut self, output: &str, accumulator: Accumulator) -> GroupStage {
        self.accumulators.push((output.to_string(), accumulator));
        self
    }

    pub fn key(&self) -> &GroupKey {
        &self.key
    }

    pub fn accumulators(&self) -> &[(String, Accumulator)] {
        &self.accumulators
    }

    pub(crate) fn parse(definition: &Value) -> StoreResult<GroupStage> {
        let definition = match definition {
            Value::Document(doc) => doc,
            other => return Err(invalid_pipeline(format!("$group takes a document, got {}", other))),
        };

        let key = match definition.get_raw(DOC_ID) {
            Some(key) => GroupKey::parse(key)?,
            None => return Err(invalid_pipeline("$group requires an _id".to_string())),
        };

        let mut stage = GroupStage::new(key);
        for (output, accumulator) in definition.iter().filter(|(name, _)| name.as_str() != DOC_ID) {
            if validate_field_name(output).is_err() {
                return Err(invalid_pipeline(format!("Invalid $group output field {}", output)));
            }
            stage = stage.accumulate(output, Accumulator::parse(output, accumulator)?);
        }
        Ok(stage)
    }

    /// Buckets `documents`; buckets come out in the order their first
    /// document was seen.
    pub(crate) fn apply(&self, documents: Vec<Document>) -> Vec<Document> {
        let mut buckets: IndexMap<String, (Value, Vec<AccumulatorState>)> = IndexMap::new();

        for document in &documents {
            let (key, identity) = self.key.key_of(document);
            let (_, states) = buckets.entry(identity).or_insert_with(|| {
                let states = self.accumulators.iter().map(|(_, acc)| acc.start()).collect();
                (key, states)
            });
            for (state, (_, accumulator)) in states.iter_mut().zip(&self.accumulators) {
                state.accumulate(accumulator, document);
            }
        }

        buckets
            .into_values()
            .map(|(key, states)| {
                let mut out = Document::new();
                out.insert_raw(DOC_ID.to_string(), key);
                for (state, (output, _)) in states.into_iter().zip(&self.accumulators) {
                    out.insert_raw(output.clone(), state.finish());
                }
                out
            })
            .collect()
    }
}
