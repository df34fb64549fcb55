use std::fmt::Display;

use crate::collection::{validate_field_name, Document, FIELD_SEPARATOR};
use crate::common::{Value, RESERVED_FIELDS};
use crate::errors::{ErrorKind, StoreError, StoreResult};

/// One field-level change of an [UpdatePatch].
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOperation {
    Set(String, Value),
    Unset(String),
    Inc(String, Value),
}

impl UpdateOperation {
    pub fn path(&self) -> &str {
        match self {
            UpdateOperation::Set(path, _) => path,
            UpdateOperation::Unset(path) => path,
            UpdateOperation::Inc(path, _) => path,
        }
    }
}

/// A merge patch applied to matched documents by
/// [DocStore::update](crate::DocStore::update).
///
/// Documents are merged in place, never replaced. Patches can be built
/// fluently or parsed from a Mongo-shaped document:
///
/// ```rust
/// use docstore::doc;
/// use docstore::collection::UpdatePatch;
///
/// let fluent = UpdatePatch::new()
///     .set("status", "inactive")
///     .unset("deletedAt")
///     .inc("revision", 1);
///
/// let parsed = UpdatePatch::parse(&doc! {
///     "$set": { "status": "inactive" },
///     "$inc": { "revision": 1 },
/// }).unwrap();
///
/// assert_eq!(parsed.operations().len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdatePatch {
    operations: Vec<UpdateOperation>,
}

impl UpdatePatch {
    pub fn new() -> Self {
        UpdatePatch {
            operations: Vec::new(),
        }
    }

    pub fn set<T: Into<Value>>(mut self, path: &str, value: T) -> Self {
        self.operations
            .push(UpdateOperation::Set(path.to_string(), value.into()));
        self
    }

    pub fn unset(mut self, path: &str) -> Self {
        self.operations.push(UpdateOperation::Unset(path.to_string()));
        self
    }

    pub fn inc<T: Into<Value>>(mut self, path: &str, amount: T) -> Self {
        self.operations
            .push(UpdateOperation::Inc(path.to_string(), amount.into()));
        self
    }

    pub fn operations(&self) -> &[UpdateOperation] {
        &self.operations
    }

    /// Parses `{ field: value, .. }` (a plain `$set`) or an operator document
    /// using `$set`, `$unset` and `$inc`.
    pub fn parse(patch: &Document) -> StoreResult<UpdatePatch> {
        if patch.is_empty() {
            return Err(invalid("Update patch is empty".to_string()));
        }

        let operator_keys = patch.iter().filter(|(k, _)| k.starts_with('$')).count();
        let mut result = UpdatePatch::new();

        if operator_keys == 0 {
            for (path, value) in patch.iter() {
                result = result.set(path, value.clone());
            }
        } else if operator_keys == patch.size() {
            for (operator, operand) in patch.iter() {
                let fields = match operand {
                    Value::Document(fields) if !fields.is_empty() => fields,
                    other => {
                        return Err(invalid(format!(
                            "{} requires a non-empty document, found {}",
                            operator, other
                        )))
                    }
                };

                for (path, value) in fields.iter() {
                    result = match operator.as_str() {
                        "$set" => result.set(path, value.clone()),
                        "$unset" => result.unset(path),
                        "$inc" => result.inc(path, value.clone()),
                        unknown => {
                            return Err(invalid(format!("Unknown update operator {}", unknown)))
                        }
                    };
                }
            }
        } else {
            return Err(invalid(format!(
                "Update patch mixes operators with plain fields: {}",
                patch
            )));
        }

        result.validate()?;
        Ok(result)
    }

    /// Checks that the patch can be applied to any document: it is not
    /// empty, it does not touch a system field, every path is a valid field
    /// path and every `$inc` operand is a number.
    pub fn validate(&self) -> StoreResult<()> {
        if self.operations.is_empty() {
            return Err(invalid("Update patch is empty".to_string()));
        }

        for operation in &self.operations {
            let path = operation.path();
            validate_path(path)?;

            match operation {
                UpdateOperation::Set(_, value) => validate_value(path, value)?,
                UpdateOperation::Inc(_, amount) if !amount.is_number() => {
                    return Err(invalid(format!(
                        "$inc on {} requires a numeric operand, found {}",
                        path, amount
                    )));
                }
                UpdateOperation::Inc(_, Value::Float(f)) if !f.is_finite() => {
                    return Err(invalid(format!("$inc on {} by a non-finite number {}", path, f)));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Applies every operation to `document` in order.
    pub(crate) fn apply(&self, document: &mut Document) -> StoreResult<()> {
        for operation in &self.operations {
            match operation {
                UpdateOperation::Set(path, value) => {
                    document.put(path, value.clone()).map_err(|e| {
                        log::error!("Cannot set {}: {}", path, e);
                        StoreError::new_with_cause(
                            &format!("Cannot set {}", path),
                            ErrorKind::InvalidUpdate,
                            e,
                        )
                    })?;
                }
                UpdateOperation::Unset(path) => {
                    document.remove(path);
                }
                UpdateOperation::Inc(path, amount) => {
                    let current = document.get(path).cloned().unwrap_or(Value::Int(0));
                    let next = increment(path, &current, amount)?;
                    document.put(path, next).map_err(|e| {
                        log::error!("Cannot increment {}: {}", path, e);
                        StoreError::new_with_cause(
                            &format!("Cannot increment {}", path),
                            ErrorKind::InvalidUpdate,
                            e,
                        )
                    })?;
                }
            }
        }
        Ok(())
    }
}

impl Display for UpdatePatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .operations
            .iter()
            .map(|operation| match operation {
                UpdateOperation::Set(path, value) => format!("set {} = {}", path, value),
                UpdateOperation::Unset(path) => format!("unset {}", path),
                UpdateOperation::Inc(path, amount) => format!("inc {} by {}", path, amount),
            })
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

fn invalid(message: String) -> StoreError {
    log::error!("{}", message);
    StoreError::new(&message, ErrorKind::InvalidUpdate)
}

fn validate_path(path: &str) -> StoreResult<()> {
    let root = path.split(FIELD_SEPARATOR).next().unwrap_or(path);
    if RESERVED_FIELDS.contains(&root) {
        return Err(invalid(format!(
            "Field {} is maintained by the store and cannot be updated",
            root
        )));
    }

    for segment in path.split(FIELD_SEPARATOR) {
        validate_field_name(segment)
            .map_err(|e| StoreError::new_with_cause(
                &format!("Invalid update path {}", path),
                ErrorKind::InvalidUpdate,
                e,
            ))?;
    }
    Ok(())
}

fn validate_value(path: &str, value: &Value) -> StoreResult<()> {
    let result = match value {
        Value::Document(doc) => doc.validate_field_names(),
        Value::Array(items) => items.iter().try_for_each(|item| validate_value(path, item)),
        Value::Float(f) if !f.is_finite() => {
            return Err(invalid(format!("Value for {} is a non-finite number {}", path, f)))
        }
        _ => Ok(()),
    };
    result.map_err(|e| {
        StoreError::new_with_cause(
            &format!("Invalid value for {}", path),
            ErrorKind::InvalidUpdate,
            e,
        )
    })
}

fn increment(path: &str, current: &Value, amount: &Value) -> StoreResult<Value> {
    match (current, amount) {
        (Value::Int(a), Value::Int(b)) => Ok(match a.checked_add(*b) {
            Some(sum) => Value::Int(sum),
            None => Value::Float(*a as f64 + *b as f64),
        }),
        (a, b) if a.is_number() && b.is_number() => {
            let (a, b) = (a.as_f64().unwrap_or_default(), b.as_f64().unwrap_or_default());
            let sum = a + b;
            if !sum.is_finite() {
                return Err(invalid(format!("$inc on {} overflows to {}", path, sum)));
            }
            Ok(Value::Float(sum))
        }
        (other, _) => Err(invalid(format!(
            "$inc on {} requires a numeric field, found {}",
            path,
            other.type_name()
        ))),
    }
}
