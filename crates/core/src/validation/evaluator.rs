//! Rule evaluator. Pure logic, no network access.

use regex::Regex;
use serde_json::Value;

use super::rules::{FieldRule, FieldSpec, FieldViolation, ValidationResult};
use crate::form::{is_blank, FormValues};
use crate::types::Date;

/// Evaluate every spec against the form values.
///
/// At most one violation is reported per field: the first rule that fails.
/// `today` anchors [`FieldRule::FutureDate`].
pub fn evaluate_fields(specs: &[FieldSpec], values: &FormValues, today: Date) -> ValidationResult {
    let errors: Vec<FieldViolation> = specs
        .iter()
        .filter_map(|spec| evaluate_spec(spec, values, today))
        .collect();

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}

fn evaluate_spec(spec: &FieldSpec, values: &FormValues, today: Date) -> Option<FieldViolation> {
    let value = values.get(spec.field);
    let blank = is_blank(value);

    spec.rules.iter().find_map(|rule| {
        if blank && !rule.checks_presence() {
            return None;
        }
        if passes(rule, value, values, today) {
            None
        } else {
            Some(FieldViolation {
                field: spec.field.to_string(),
                rule_type: rule.rule_type().to_string(),
                message: rule.message(spec.label),
                value: value.cloned(),
            })
        }
    })
}

fn passes(rule: &FieldRule, value: Option<&Value>, values: &FormValues, today: Date) -> bool {
    match rule {
        FieldRule::Required => !is_blank(value),
        FieldRule::NonEmptyList => value.and_then(Value::as_array).is_some_and(|items| {
            items.iter().any(|v| match v {
                Value::String(s) => !s.trim().is_empty(),
                Value::Number(_) => true,
                _ => false,
            })
        }),
        FieldRule::MinLength(min) => value
            .and_then(Value::as_str)
            .is_some_and(|s| s.trim().chars().count() >= *min),
        FieldRule::MaxLength(max) => value
            .and_then(Value::as_str)
            .is_some_and(|s| s.trim().chars().count() <= *max),
        FieldRule::MinValue(min) => value.and_then(parse_number).is_some_and(|n| n >= *min),
        FieldRule::OneOf(allowed) => value
            .and_then(Value::as_str)
            .is_some_and(|s| allowed.iter().any(|a| *a == s)),
        FieldRule::Pattern(pattern) => {
            let Some(s) = value.and_then(Value::as_str) else {
                return false;
            };
            match Regex::new(pattern) {
                Ok(re) => re.is_match(s.trim()),
                // Invalid patterns never block the user.
                Err(e) => {
                    tracing::warn!(pattern, error = %e, "Invalid validation pattern");
                    true
                }
            }
        }
        FieldRule::FutureDate => value.and_then(parse_date).is_some_and(|d| d > today),
        FieldRule::NotLessThan { field, .. } => {
            let Some(other) = values.get(field).filter(|v| !is_blank(Some(*v))) else {
                return true;
            };
            match (value.and_then(parse_number), parse_number(other)) {
                (Some(this), Some(other)) => this >= other,
                // Non-numeric operands are reported by the MinValue rules.
                _ => true,
            }
        }
    }
}

/// Read a number from a JSON number or a numeric string.
pub fn parse_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    }
}

/// Read a calendar date from `YYYY-MM-DD` or an RFC 3339 timestamp.
pub fn parse_date(value: &Value) -> Option<Date> {
    let s = value.as_str()?.trim();
    Date::parse_from_str(s, "%Y-%m-%d").ok().or_else(|| {
        chrono::DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.date_naive())
    })
}
