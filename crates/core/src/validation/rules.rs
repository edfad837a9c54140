//! Validation rule and result types.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single declarative check applied to one form field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRule {
    /// Value must be present (non-null, non-blank, non-empty list).
    Required,
    /// Value must be a list with at least one non-blank string or number.
    NonEmptyList,
    /// String value must have at least this many characters (trimmed).
    MinLength(usize),
    /// String value must have at most this many characters (trimmed).
    MaxLength(usize),
    /// Numeric value (number or numeric string) must be at least this.
    MinValue(f64),
    /// Value must be one of the listed strings.
    OneOf(&'static [&'static str]),
    /// String value must match the regular expression.
    Pattern(&'static str),
    /// `YYYY-MM-DD` date strictly after today.
    FutureDate,
    /// Numeric value must be >= the numeric value at another field path.
    /// Passes when either side is absent.
    NotLessThan {
        field: &'static str,
        label: &'static str,
    },
}

impl FieldRule {
    /// Stable identifier reported in [`FieldViolation::rule_type`].
    pub fn rule_type(&self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::NonEmptyList => "non_empty_list",
            Self::MinLength(_) => "min_length",
            Self::MaxLength(_) => "max_length",
            Self::MinValue(_) => "min_value",
            Self::OneOf(_) => "enum_values",
            Self::Pattern(_) => "regex_pattern",
            Self::FutureDate => "future_date",
            Self::NotLessThan { .. } => "not_less_than",
        }
    }

    /// Whether the rule enforces presence. Other rules skip blank values.
    pub fn checks_presence(&self) -> bool {
        matches!(self, Self::Required | Self::NonEmptyList)
    }

    /// Human-readable message for a violation of this rule on `label`.
    pub fn message(&self, label: &str) -> String {
        match self {
            Self::Required => format!("{label} is required"),
            Self::NonEmptyList => format!("Please select at least one {label}"),
            Self::MinLength(n) => format!("{label} must be at least {n} characters"),
            Self::MaxLength(n) => format!("{label} must be at most {n} characters"),
            Self::MinValue(v) => format!("{label} must be at least {v}"),
            Self::OneOf(values) => format!("{label} must be one of: {}", values.join(", ")),
            Self::Pattern(_) => format!("{label} is not in a valid format"),
            Self::FutureDate => format!("{label} must be a date in the future"),
            Self::NotLessThan { label: other, .. } => {
                format!("{label} must be greater than or equal to {other}")
            }
        }
    }
}

/// The rules attached to one field path.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub field: &'static str,
    /// Display name used in messages, e.g. `"Description"`.
    pub label: &'static str,
    pub rules: Vec<FieldRule>,
}

impl FieldSpec {
    pub fn new(field: &'static str, label: &'static str, rules: Vec<FieldRule>) -> Self {
        Self {
            field,
            label,
            rules,
        }
    }
}

/// Aggregated result of evaluating a set of field specs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<FieldViolation>,
}

impl ValidationResult {
    /// Field path to message, one entry per failing field.
    pub fn errors_by_field(&self) -> BTreeMap<String, String> {
        self.errors
            .iter()
            .map(|v| (v.field.clone(), v.message.clone()))
            .collect()
    }

    /// Message for the first failing field, if any.
    pub fn first_message(&self) -> Option<&str> {
        self.errors.first().map(|v| v.message.as_str())
    }
}

/// A single field-level rule violation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub rule_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}
