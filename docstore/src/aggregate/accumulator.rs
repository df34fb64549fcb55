use std::fmt::{Display, Formatter};

use crate::collection::Document;
use crate::common::Value;
use crate::errors::StoreResult;

use super::invalid_pipeline;

/// What a `$sum` adds up per document.
#[derive(Debug, Clone, PartialEq)]
pub enum SumOperand {
    /// The value of a field; missing or non-numeric counts as 0.
    Field(String),
    /// A constant, so `{"$sum": 1}` counts documents.
    Literal(Value),
}

/// A per-bucket reduction of a `$group` stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Accumulator {
    Sum(SumOperand),
    Avg(String),
    Min(String),
    Max(String),
    Count,
}

impl Accumulator {
    pub fn sum(field: &str) -> Accumulator {
        Accumulator::Sum(SumOperand::Field(field_ref(field)))
    }

    pub fn avg(field: &str) -> Accumulator {
        Accumulator::Avg(field_ref(field))
    }

    pub fn min(field: &str) -> Accumulator {
        Accumulator::Min(field_ref(field))
    }

    pub fn max(field: &str) -> Accumulator {
        Accumulator::Max(field_ref(field))
    }

    /// Parses `{"$sum": "$salary"}` and the like.
    pub(crate) fn parse(output: &str, definition: &Value) -> StoreResult<Accumulator> {
        let definition = match definition {
            Value::Document(doc) if doc.size() == 1 => doc,
            _ => {
                return Err(invalid_pipeline(format!(
                    "Accumulator {} must be a document with exactly one operator, got {}",
                    output, definition
                )))
            }
        };

        let (operator, operand) = match definition.iter().next() {
            Some(entry) => entry,
            None => return Err(invalid_pipeline(format!("Accumulator {} is empty", output))),
        };

        match operator.as_str() {
            "$sum" => match operand {
                Value::String(field) => Ok(Accumulator::Sum(SumOperand::Field(field_ref(field)))),
                value if value.is_number() => Ok(Accumulator::Sum(SumOperand::Literal(value.clone()))),
                other => Err(invalid_pipeline(format!(
                    "$sum of {} takes a field name or a number, got {}",
                    output, other
                ))),
            },
            "$avg" => Ok(Accumulator::Avg(field_operand(output, operator, operand)?)),
            "$min" => Ok(Accumulator::Min(field_operand(output, operator, operand)?)),
            "$max" => Ok(Accumulator::Max(field_operand(output, operator, operand)?)),
            "$count" => match operand {
                Value::Document(doc) if doc.is_empty() => Ok(Accumulator::Count),
                other => Err(invalid_pipeline(format!(
                    "$count of {} takes an empty document, got {}",
                    output, other
                ))),
            },
            other => Err(invalid_pipeline(format!(
                "Unknown accumulator {} for {}",
                other, output
            ))),
        }
    }

    pub(crate) fn start(&self) -> AccumulatorState {
        match self {
            Accumulator::Sum(_) => AccumulatorState::Sum(Number::Int(0)),
            Accumulator::Avg(_) => AccumulatorState::Avg { sum: 0.0, count: 0 },
            Accumulator::Min(_) => AccumulatorState::Min(None),
            Accumulator::Max(_) => AccumulatorState::Max(None),
            Accumulator::Count => AccumulatorState::Count(0),
        }
    }
}

impl Display for Accumulator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Accumulator::Sum(SumOperand::Field(field)) => write!(f, "{{$sum: ${}}}", field),
            Accumulator::Sum(SumOperand::Literal(value)) => write!(f, "{{$sum: {}}}", value),
            Accumulator::Avg(field) => write!(f, "{{$avg: ${}}}", field),
            Accumulator::Min(field) => write!(f, "{{$min: ${}}}", field),
            Accumulator::Max(field) => write!(f, "{{$max: ${}}}", field),
            Accumulator::Count => write!(f, "{{$count: {{}}}}"),
        }
    }
}

/// Strips the optional `$` of a field reference.
pub(crate) fn field_ref(field: &str) -> String {
    field.strip_prefix('$').unwrap_or(field).to_string()
}

fn field_operand(output: &str, operator: &str, operand: &Value) -> StoreResult<String> {
    match operand {
        Value::String(field) if !field_ref(field).is_empty() => Ok(field_ref(field)),
        other => Err(invalid_pipeline(format!(
            "{} of {} takes a field name, got {}",
            operator, output, other
        ))),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn add(self, value: &Value) -> Number {
        match (self, value) {
            (Number::Int(acc), Value::Int(i)) => match acc.checked_add(*i) {
                Some(sum) => Number::Int(sum),
                None => Number::Float(acc as f64 + *i as f64),
            },
            (Number::Int(acc), Value::Float(f)) => Number::Float(acc as f64 + f),
            (Number::Float(acc), Value::Int(i)) => Number::Float(acc + *i as f64),
            (Number::Float(acc), Value::Float(f)) => Number::Float(acc + f),
            (number, _) => number,
        }
    }

    fn into_value(self) -> Value {
        match self {
            Number::Int(i) => Value::Int(i),
            Number::Float(f) => Value::Float(f),
        }
    }
}

/// Running state of one accumulator inside one bucket.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AccumulatorState {
    Sum(Number),
    Avg { sum: f64, count: usize },
    Min(Option<Value>),
    Max(Option<Value>),
    Count(i64),
}

impl AccumulatorState {
    pub(crate) fn accumulate(&mut self, accumulator: &Accumulator, document: &Document) {
        match (self, accumulator) {
            (AccumulatorState::Sum(total), Accumulator::Sum(operand)) => {
                let value = match operand {
                    SumOperand::Field(field) => document.get(field),
                    SumOperand::Literal(value) => Some(value),
                };
                if let Some(value) = value {
                    *total = total.add(value);
                }
            }
            (AccumulatorState::Avg { sum, count }, Accumulator::Avg(field)) => {
                *sum += document.get(field).and_then(|v| v.as_f64()).unwrap_or(0.0);
                *count += 1;
            }
            (AccumulatorState::Min(current), Accumulator::Min(field)) => {
                if let Some(value) = present(document, field) {
                    if current.as_ref().is_none_or(|c| value < c) {
                        *current = Some(value.clone());
                    }
                }
            }
            (AccumulatorState::Max(current), Accumulator::Max(field)) => {
                if let Some(value) = present(document, field) {
                    if current.as_ref().is_none_or(|c| value > c) {
                        *current = Some(value.clone());
                    }
                }
            }
            (AccumulatorState::Count(count), Accumulator::Count) => *count += 1,
            _ => {}
        }
    }

    pub(crate) fn finish(self) -> Value {
        match self {
            AccumulatorState::Sum(total) => total.into_value(),
            AccumulatorState::Avg { count: 0, .. } => Value::Null,
            AccumulatorState::Avg { sum, count } => Value::Float(sum / count as f64),
            AccumulatorState::Min(value) | AccumulatorState::Max(value) => value.unwrap_or(Value::Null),
            AccumulatorState::Count(count) => Value::Int(count),
        }
    }
}

fn present<'a>(document: &'a Document, field: &str) -> Option<&'a Value> {
    document.get(field).filter(|v| !v.is_null())
}
