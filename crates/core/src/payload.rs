//! Create-job request body.
//!
//! [`SubmissionPayload::from_values`] is the single place where the flat
//! wizard form is reshaped into what `POST /repair-jobs` expects.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::error::CoreError;
use crate::form::*;
use crate::types::Date;
use crate::validation::evaluator::{parse_date, parse_number};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    #[validate(length(min = 1, message = "At least one service must be selected"))]
    pub services: Vec<String>,
    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: String,
    #[validate(nested)]
    pub device: DeviceInfo,
    pub urgency: String,
    #[validate(nested)]
    pub budget: BudgetRange,
    #[validate(nested)]
    pub location: JobLocation,
    pub service_preference: String,
    pub preferred_date: Date,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[validate(length(min = 1, message = "Warranty status is required"))]
    pub warranty_status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_budget_order"))]
pub struct BudgetRange {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Minimum budget cannot be negative"))]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Maximum budget cannot be negative"))]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JobLocation {
    #[validate(length(min = 1, message = "Country is required"))]
    pub country: String,
    #[validate(length(min = 1, message = "State is required"))]
    pub state: String,
    #[validate(length(min = 1, message = "City is required"))]
    pub city: String,
    #[validate(length(min = 1, message = "Street address is required"))]
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

fn validate_budget_order(budget: &BudgetRange) -> Result<(), ValidationError> {
    match (budget.min, budget.max) {
        (Some(min), Some(max)) if max < min => Err(ValidationError::new("budget_order")
            .with_message("Maximum budget must be greater than or equal to minimum budget".into())),
        _ => Ok(()),
    }
}

impl SubmissionPayload {
    /// Flatten the wizard's form values into the request body and run the
    /// structural checks.
    pub fn from_values(values: &FormValues) -> Result<Self, CoreError> {
        let services = values
            .get(FIELD_SERVICES)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| match v {
                        Value::String(s) => Some(s.clone()),
                        Value::Number(n) => Some(n.to_string()),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let preferred_date = values
            .get(FIELD_PREFERRED_DATE)
            .and_then(parse_date)
            .ok_or_else(|| CoreError::Validation("Preferred date is required".to_string()))?;

        let payload = Self {
            services,
            description: owned(values, FIELD_DESCRIPTION).unwrap_or_default(),
            device: DeviceInfo {
                brand: owned(values, FIELD_DEVICE_BRAND),
                model: owned(values, FIELD_DEVICE_MODEL),
                warranty_status: owned(values, FIELD_WARRANTY_STATUS).unwrap_or_default(),
            },
            urgency: owned(values, FIELD_URGENCY).unwrap_or_default(),
            budget: BudgetRange {
                min: values.get(FIELD_BUDGET_MIN).and_then(parse_number),
                max: values.get(FIELD_BUDGET_MAX).and_then(parse_number),
            },
            location: JobLocation {
                country: owned(values, FIELD_COUNTRY).unwrap_or_default(),
                state: owned(values, FIELD_STATE).unwrap_or_default(),
                city: owned(values, FIELD_CITY).unwrap_or_default(),
                address: owned(values, FIELD_ADDRESS).unwrap_or_default(),
                district: owned(values, FIELD_DISTRICT),
                postal_code: owned(values, FIELD_POSTAL_CODE),
            },
            service_preference: owned(values, FIELD_SERVICE_PREFERENCE).unwrap_or_default(),
            preferred_date,
            preferred_time: owned(values, FIELD_PREFERRED_TIME),
        };

        payload
            .validate()
            .map_err(|e| CoreError::Validation(first_message(&e).unwrap_or_else(|| e.to_string())))?;

        Ok(payload)
    }
}

/// First human-readable message anywhere in a (possibly nested) error tree.
fn first_message(errors: &ValidationErrors) -> Option<String> {
    errors.errors().values().find_map(|kind| match kind {
        ValidationErrorsKind::Field(errs) => errs
            .iter()
            .find_map(|e| e.message.as_ref().map(|m| m.to_string())),
        ValidationErrorsKind::Struct(inner) => first_message(inner),
        ValidationErrorsKind::List(items) => items.values().find_map(|inner| first_message(inner)),
    })
}

fn owned(values: &FormValues, path: &str) -> Option<String> {
    values.get_str(path).map(str::to_string)
}
