//! Repair-job wizard steps, step gates and state machine.
//!
//! The wizard is a four-state machine over step indices. Forward moves are
//! guarded by the current step's gate; backward moves are not. The final
//! step hands off to submission, which re-runs every gate before a
//! [`SubmissionPayload`] is built.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::CoreError;
use crate::form::*;
use crate::payload::SubmissionPayload;
use crate::types::Date;
use crate::validation::{evaluate_fields, FieldRule, FieldSpec, ValidationResult};

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// The four steps of the repair-job wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobWizardStep {
    ServiceSelection,
    JobDetails,
    Location,
    Review,
}

/// Total number of steps in the wizard.
pub const TOTAL_STEPS: u8 = 4;

/// Minimum step number (1-based).
pub const MIN_STEP: u8 = 1;

/// Maximum step number (1-based).
pub const MAX_STEP: u8 = 4;

/// Accepted warranty status values.
pub const WARRANTY_STATUSES: &[&str] = &["in_warranty", "out_of_warranty", "unknown"];

/// Accepted urgency levels.
pub const URGENCY_LEVELS: &[&str] = &["low", "medium", "high", "urgent"];

/// Accepted service preferences.
pub const SERVICE_PREFERENCES: &[&str] = &["home_service", "shop_visit", "pickup_delivery"];

/// Postal codes: 4 to 10 letters, digits, spaces or dashes.
const POSTAL_CODE_PATTERN: &str = r"^[A-Za-z0-9][A-Za-z0-9 \-]{2,8}[A-Za-z0-9]$";

impl JobWizardStep {
    /// Convert a 1-based step number to a `JobWizardStep`.
    pub fn from_number(n: u8) -> Result<Self, CoreError> {
        match n {
            1 => Ok(Self::ServiceSelection),
            2 => Ok(Self::JobDetails),
            3 => Ok(Self::Location),
            4 => Ok(Self::Review),
            _ => Err(CoreError::Validation(format!(
                "Invalid step number {n}. Must be between {MIN_STEP} and {MAX_STEP}"
            ))),
        }
    }

    /// Convert to a 1-based step number.
    pub fn to_number(self) -> u8 {
        match self {
            Self::ServiceSelection => 1,
            Self::JobDetails => 2,
            Self::Location => 3,
            Self::Review => 4,
        }
    }

    /// Human-readable label for the step.
    pub fn label(self) -> &'static str {
        match self {
            Self::ServiceSelection => "Select Services",
            Self::JobDetails => "Job Details",
            Self::Location => "Location & Schedule",
            Self::Review => "Review & Submit",
        }
    }

    pub fn next(self) -> Option<Self> {
        Self::from_number(self.to_number() + 1).ok()
    }

    pub fn previous(self) -> Option<Self> {
        self.to_number()
            .checked_sub(1)
            .and_then(|n| Self::from_number(n).ok())
    }

    pub fn is_last(self) -> bool {
        self.to_number() == MAX_STEP
    }

    /// The field specs this step's gate evaluates.
    pub fn fields(self, config: &WizardConfig) -> Vec<FieldSpec> {
        match self {
            Self::ServiceSelection => vec![FieldSpec::new(
                FIELD_SERVICES,
                "service",
                vec![FieldRule::NonEmptyList],
            )],
            Self::JobDetails => vec![
                FieldSpec::new(
                    FIELD_DESCRIPTION,
                    "Description",
                    vec![
                        FieldRule::Required,
                        FieldRule::MinLength(config.description_min_length),
                        FieldRule::MaxLength(MAX_DESCRIPTION_LENGTH),
                    ],
                ),
                FieldSpec::new(
                    FIELD_WARRANTY_STATUS,
                    "Warranty status",
                    vec![FieldRule::Required, FieldRule::OneOf(WARRANTY_STATUSES)],
                ),
                FieldSpec::new(
                    FIELD_URGENCY,
                    "Urgency level",
                    vec![FieldRule::Required, FieldRule::OneOf(URGENCY_LEVELS)],
                ),
            ],
            Self::Location => vec![
                FieldSpec::new(FIELD_COUNTRY, "Country", vec![FieldRule::Required]),
                FieldSpec::new(FIELD_STATE, "State", vec![FieldRule::Required]),
                FieldSpec::new(FIELD_CITY, "City", vec![FieldRule::Required]),
                FieldSpec::new(FIELD_ADDRESS, "Street address", vec![FieldRule::Required]),
                FieldSpec::new(
                    FIELD_POSTAL_CODE,
                    "Postal code",
                    vec![FieldRule::Pattern(POSTAL_CODE_PATTERN)],
                ),
                FieldSpec::new(
                    FIELD_PREFERRED_DATE,
                    "Preferred date",
                    vec![FieldRule::Required, FieldRule::FutureDate],
                ),
                FieldSpec::new(
                    FIELD_SERVICE_PREFERENCE,
                    "Service preference",
                    vec![FieldRule::Required, FieldRule::OneOf(SERVICE_PREFERENCES)],
                ),
            ],
            Self::Review => vec![
                FieldSpec::new(
                    FIELD_BUDGET_MIN,
                    "Minimum budget",
                    vec![FieldRule::MinValue(0.0)],
                ),
                FieldSpec::new(
                    FIELD_BUDGET_MAX,
                    "Maximum budget",
                    vec![
                        FieldRule::MinValue(0.0),
                        FieldRule::NotLessThan {
                            field: FIELD_BUDGET_MIN,
                            label: "minimum budget",
                        },
                    ],
                ),
            ],
        }
    }
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Per-variant knobs. The customer and quick-post variants differ only in
/// how long the description must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WizardConfig {
    pub description_min_length: usize,
}

/// Default minimum description length.
pub const DEFAULT_DESCRIPTION_MIN_LENGTH: usize = 20;

/// Shortest description any variant accepts.
pub const MIN_DESCRIPTION_MIN_LENGTH: usize = 10;

/// Longest description the create-job endpoint accepts.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            description_min_length: DEFAULT_DESCRIPTION_MIN_LENGTH,
        }
    }
}

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Run `step`'s gate against the form values.
pub fn validate_step(
    step: JobWizardStep,
    values: &FormValues,
    config: &WizardConfig,
    today: Date,
) -> ValidationResult {
    evaluate_fields(&step.fields(config), values, today)
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Result of a forward move attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The gate passed and the wizard moved to this step.
    Advanced(JobWizardStep),
    /// The gate passed on the final step; the caller should submit.
    ReadyToSubmit,
    /// The gate failed; field path to message.
    Blocked(BTreeMap<String, String>),
}

/// One wizard instance: current step, accumulated values, and the errors
/// from the most recent validation pass.
#[derive(Debug, Clone)]
pub struct WizardState {
    id: Uuid,
    config: WizardConfig,
    current_step: JobWizardStep,
    values: FormValues,
    errors: BTreeMap<String, String>,
    /// Highest step number whose gate has passed since the last reset.
    highest_passed: u8,
}

impl WizardState {
    pub fn new(config: WizardConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            current_step: JobWizardStep::ServiceSelection,
            values: FormValues::new(),
            errors: BTreeMap::new(),
            highest_passed: 0,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &WizardConfig {
        &self.config
    }

    pub fn current_step(&self) -> JobWizardStep {
        self.current_step
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    pub fn error_for(&self, path: &str) -> Option<&str> {
        self.errors.get(path).map(String::as_str)
    }

    /// Set a field and clear any error displayed for it.
    pub fn set_field(&mut self, path: &str, value: impl Into<serde_json::Value>) {
        self.values.set(path, value);
        self.errors.remove(path);
    }

    /// Remove a field (downstream invalidation) and its error.
    pub fn clear_field(&mut self, path: &str) {
        self.values.remove(path);
        self.errors.remove(path);
    }

    /// Toggle a service id in the step-1 selection.
    pub fn toggle_service(&mut self, service_id: &str) -> bool {
        self.errors.remove(FIELD_SERVICES);
        self.values.toggle_in_list(FIELD_SERVICES, service_id)
    }

    /// Validate the current step and advance if it passes.
    ///
    /// On failure the step is unchanged and [`errors`](Self::errors) holds
    /// one message per failing field.
    pub fn next(&mut self, today: Date) -> StepOutcome {
        let step = self.current_step;
        let result = validate_step(step, &self.values, &self.config, today);
        self.errors = result.errors_by_field();

        if !result.is_valid {
            tracing::debug!(
                wizard_id = %self.id,
                step = step.to_number(),
                failing = self.errors.len(),
                "Step gate blocked",
            );
            return StepOutcome::Blocked(self.errors.clone());
        }

        self.highest_passed = self.highest_passed.max(step.to_number());

        match step.next() {
            Some(next) => {
                self.current_step = next;
                tracing::debug!(wizard_id = %self.id, step = next.to_number(), "Advanced");
                StepOutcome::Advanced(next)
            }
            None => StepOutcome::ReadyToSubmit,
        }
    }

    /// Go back one step. Never blocked; floored at step 1.
    pub fn previous(&mut self) -> JobWizardStep {
        if let Some(prev) = self.current_step.previous() {
            self.current_step = prev;
        }
        self.current_step
    }

    /// Re-check every gate and assemble the payload.
    ///
    /// Only valid on the final step, after every earlier gate has passed
    /// at least once. A failing gate repopulates [`errors`](Self::errors)
    /// and leaves the step unchanged.
    pub fn build_payload(&mut self, today: Date) -> Result<SubmissionPayload, CoreError> {
        if !self.current_step.is_last() {
            return Err(CoreError::Validation(format!(
                "Cannot submit from step {}: must be on step {MAX_STEP} ({})",
                self.current_step.to_number(),
                JobWizardStep::Review.label(),
            )));
        }
        if self.highest_passed < MAX_STEP - 1 {
            return Err(CoreError::Validation(
                "Every step must be completed before submitting".to_string(),
            ));
        }

        for n in MIN_STEP..=MAX_STEP {
            let step = JobWizardStep::from_number(n)?;
            let result = validate_step(step, &self.values, &self.config, today);
            if !result.is_valid {
                self.errors = result.errors_by_field();
                let message = result.first_message().unwrap_or("Invalid input").to_string();
                return Err(CoreError::Validation(format!(
                    "Step {n} ({}): {message}",
                    step.label()
                )));
            }
        }
        self.errors.clear();

        SubmissionPayload::from_values(&self.values)
    }

    /// Discard all progress after a successful submission.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
