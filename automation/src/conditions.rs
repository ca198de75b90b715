// Condition evaluation - field/operator/value tests against a ticket snapshot

use serde::{Deserialize, Serialize};

/// Comparison operator for a condition.
///
/// The set is closed: an unknown operator string fails deserialization at
/// rule-save time instead of silently evaluating to false at firing time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    GreaterThan,
    LessThan,
    IsEmpty,
    IsNotEmpty,
}

/// A single field/operator/value test. Owned by exactly one rule, either
/// as a trigger-scoped condition or a top-level one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    #[serde(default)]
    pub value: serde_json::Value,
}

impl Condition {
    pub fn new(field: &str, operator: ConditionOperator, value: serde_json::Value) -> Self {
        Self {
            field: field.to_string(),
            operator,
            value,
        }
    }

    pub fn equals(field: &str, value: serde_json::Value) -> Self {
        Self::new(field, ConditionOperator::Equals, value)
    }

    pub fn not_equals(field: &str, value: serde_json::Value) -> Self {
        Self::new(field, ConditionOperator::NotEquals, value)
    }

    pub fn contains(field: &str, value: &str) -> Self {
        Self::new(
            field,
            ConditionOperator::Contains,
            serde_json::Value::String(value.to_string()),
        )
    }

    pub fn greater_than(field: &str, value: f64) -> Self {
        Self::new(field, ConditionOperator::GreaterThan, serde_json::json!(value))
    }

    pub fn less_than(field: &str, value: f64) -> Self {
        Self::new(field, ConditionOperator::LessThan, serde_json::json!(value))
    }

    pub fn is_empty(field: &str) -> Self {
        Self::new(field, ConditionOperator::IsEmpty, serde_json::Value::Null)
    }

    pub fn is_not_empty(field: &str) -> Self {
        Self::new(field, ConditionOperator::IsNotEmpty, serde_json::Value::Null)
    }

    /// Evaluates this condition against a resolved field value.
    pub fn matches(&self, field_value: Option<&serde_json::Value>) -> bool {
        evaluate(field_value, self.operator, &self.value)
    }
}

/// Evaluates one operator. Total over its inputs, never panics.
pub fn evaluate(
    field_value: Option<&serde_json::Value>,
    operator: ConditionOperator,
    condition_value: &serde_json::Value,
) -> bool {
    use ConditionOperator::*;

    match operator {
        Equals => field_value.is_some_and(|v| values_equal(v, condition_value)),
        NotEquals => !field_value.is_some_and(|v| values_equal(v, condition_value)),
        Contains => substring_match(field_value, condition_value),
        NotContains => !substring_match(field_value, condition_value),
        GreaterThan => numeric_pair(field_value, condition_value)
            .map(|(a, b)| a > b)
            .unwrap_or(false),
        LessThan => numeric_pair(field_value, condition_value)
            .map(|(a, b)| a < b)
            .unwrap_or(false),
        IsEmpty => is_empty(field_value),
        IsNotEmpty => !is_empty(field_value),
    }
}

/// Strict equality, except numbers compare numerically across integer and
/// float representations.
fn values_equal(a: &serde_json::Value, b: &serde_json::Value) -> bool {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x == y;
    }
    a == b
}

/// Case-insensitive substring test on the string representation of the
/// field value. Non-string condition values never match.
fn substring_match(
    field_value: Option<&serde_json::Value>,
    condition_value: &serde_json::Value,
) -> bool {
    let Some(needle) = condition_value.as_str() else {
        return false;
    };
    let Some(value) = field_value else {
        return false;
    };
    let haystack = match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => return false,
        other => other.to_string(),
    };
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Both sides as f64, or None. Non-numeric operands make both comparisons
/// false.
fn numeric_pair(
    field_value: Option<&serde_json::Value>,
    condition_value: &serde_json::Value,
) -> Option<(f64, f64)> {
    let a = field_value?.as_f64()?;
    let b = condition_value.as_f64()?;
    Some((a, b))
}

fn is_empty(field_value: Option<&serde_json::Value>) -> bool {
    match field_value {
        None => true,
        Some(serde_json::Value::Null) => true,
        Some(serde_json::Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}
