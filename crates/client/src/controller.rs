//! Wizard controller.
//!
//! [`JobWizard`] owns one repair-job wizard instance end to end: the form
//! state machine, the location resolver, the category list, and the
//! network calls that feed them. Every failure is converted into
//! user-visible state here; nothing is propagated to the caller as an
//! error except misuse of the API (wrong field path, unknown option id).

use std::future::Future;
use std::sync::Arc;

use chrono::Local;
use serde_json::Value;

use repairhub_core::error::CoreError;
use repairhub_core::form::*;
use repairhub_core::location::{CommitResult, FetchOutcome, FetchTicket, OptionList};
use repairhub_core::option_cache::{OptionCache, SessionStore};
use repairhub_core::types::Date;
use repairhub_core::wizard::{JobWizardStep, StepOutcome, WizardConfig, WizardState};

use crate::api::{Category, RepairApi};
use crate::error::ClientError;
use crate::geocode::Geocoder;
use crate::resolver::LocationResolver;

/// Shown when the server gives no usable reason for a failed submission.
pub const GENERIC_SUBMIT_ERROR: &str = "Failed to create repair job. Please try again.";

/// Shown on success when the server sends no message of its own.
pub const DEFAULT_SUCCESS_MESSAGE: &str = "Your repair job has been posted.";

/// Result of [`JobWizard::submit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The job was created; the wizard has been reset.
    Created {
        job_id: Option<String>,
        message: String,
        redirect_to: String,
    },
    /// Nothing was created; all form values are kept for a retry.
    Failed { message: String },
}

pub struct JobWizard {
    api: Arc<dyn RepairApi>,
    geocoder: Option<Arc<dyn Geocoder>>,
    state: WizardState,
    resolver: LocationResolver,
    categories: Vec<Category>,
    banner: Option<String>,
    submission_error: Option<String>,
    confirmation_route: String,
}

impl JobWizard {
    /// Create a wizard for `route`, sharing `store` with every other form
    /// mounted in the same session.
    pub fn new(
        api: Arc<dyn RepairApi>,
        store: Arc<dyn SessionStore>,
        route: &str,
        config: WizardConfig,
        confirmation_route: impl Into<String>,
    ) -> Self {
        let cache = OptionCache::for_route(store, route);
        Self {
            resolver: LocationResolver::new(Arc::clone(&api), cache),
            api,
            geocoder: None,
            state: WizardState::new(config),
            categories: Vec::new(),
            banner: None,
            submission_error: None,
            confirmation_route: confirmation_route.into(),
        }
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocoder>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    // ---- read access ----

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> JobWizardStep {
        self.state.current_step()
    }

    pub fn values(&self) -> &FormValues {
        self.state.values()
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// The most recent transient error: a failed category, location or
    /// geocoding lookup.
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref().or_else(|| self.resolver.banner())
    }

    pub fn dismiss_banner(&mut self) {
        self.banner = None;
        self.resolver.dismiss_banner();
    }

    pub fn submission_error(&self) -> Option<&str> {
        self.submission_error.as_deref()
    }

    // ---- lifecycle ----

    /// Load categories and location options. The two lookups write to
    /// disjoint state and run concurrently; cached location options are
    /// applied before any request is made.
    pub async fn mount(&mut self) {
        self.resolver.rehydrate();

        let api = Arc::clone(&self.api);
        let (categories, ()) = futures::join!(api.list_categories(), self.resolver.load_missing());

        match categories {
            Ok(categories) => self.categories = categories,
            Err(e) => {
                tracing::warn!(wizard_id = %self.state.id(), error = %e, "Failed to load categories");
                self.banner = Some("Could not load service categories. Please try again.".into());
            }
        }

        // Restore the selections a cached record carries.
        let cascade = self.resolver.cascade();
        let restored = [
            (FIELD_COUNTRY, cascade.selected_country().map(str::to_string)),
            (FIELD_STATE, cascade.selected_state().map(str::to_string)),
        ];
        for (path, id) in restored {
            if let Some(id) = id {
                if !self.state.values().is_present(path) {
                    self.state.set_field(path, id);
                }
            }
        }
    }

    // ---- editing ----

    /// Set any field that is not part of the location cascade.
    ///
    /// Country, state and city must go through the `select_*` methods so the
    /// dependent fields and option lists are invalidated together.
    pub fn set_field(&mut self, path: &str, value: impl Into<Value>) -> Result<(), ClientError> {
        if matches!(path, FIELD_COUNTRY | FIELD_STATE | FIELD_CITY) {
            return Err(CoreError::Validation(format!(
                "'{path}' is set through the location selectors"
            ))
            .into());
        }
        self.state.set_field(path, value);
        Ok(())
    }

    /// Toggle a category in the step-1 selection.
    pub fn toggle_service(&mut self, category_id: &str) -> Result<bool, ClientError> {
        if !self.categories.is_empty() && !self.categories.iter().any(|c| c.id == category_id) {
            return Err(CoreError::NotFound {
                entity: "category",
                id: category_id.to_string(),
            }
            .into());
        }
        Ok(self.state.toggle_service(category_id))
    }

    /// Synchronous half of a country change: updates the form and the
    /// cascade and returns the ticket for the state lookup.
    pub fn choose_country(&mut self, id: &str) -> Option<FetchTicket> {
        let id = id.trim();
        if id.is_empty() {
            self.state.clear_field(FIELD_COUNTRY);
        } else {
            self.state.set_field(FIELD_COUNTRY, id);
        }
        self.state.clear_field(FIELD_STATE);
        self.state.clear_field(FIELD_CITY);
        self.state.clear_field(FIELD_DISTRICT);
        self.resolver.select_country(id)
    }

    /// Synchronous half of a state change. A non-empty id must be in the
    /// loaded state list.
    pub fn choose_state(&mut self, id: &str) -> Result<Option<FetchTicket>, ClientError> {
        let id = id.trim();
        if id.is_empty() {
            self.state.clear_field(FIELD_STATE);
        } else {
            if self.resolver.cascade().find(OptionList::States, id).is_none() {
                return Err(CoreError::NotFound {
                    entity: "state",
                    id: id.to_string(),
                }
                .into());
            }
            self.state.set_field(FIELD_STATE, id);
        }
        self.state.clear_field(FIELD_CITY);
        self.state.clear_field(FIELD_DISTRICT);
        Ok(self.resolver.select_state(id))
    }

    /// Lookup for a ticket from [`choose_country`](Self::choose_country) or
    /// [`choose_state`](Self::choose_state).
    pub fn fetch(&self, ticket: FetchTicket) -> impl Future<Output = FetchOutcome> + Send + 'static {
        self.resolver.fetch(ticket)
    }

    pub fn apply(&mut self, outcome: FetchOutcome) -> CommitResult {
        self.resolver.apply(outcome)
    }

    /// Select a country and load its states.
    pub async fn select_country(&mut self, id: &str) -> Option<CommitResult> {
        let ticket = self.choose_country(id)?;
        let outcome = self.fetch(ticket).await;
        Some(self.apply(outcome))
    }

    /// Select a state and load its cities.
    pub async fn select_state(&mut self, id: &str) -> Result<Option<CommitResult>, ClientError> {
        let Some(ticket) = self.choose_state(id)? else {
            return Ok(None);
        };
        let outcome = self.fetch(ticket).await;
        Ok(Some(self.apply(outcome)))
    }

    /// Select a city from the loaded list. An empty id clears the field.
    pub fn select_city(&mut self, id: &str) -> Result<(), ClientError> {
        let id = id.trim();
        if id.is_empty() {
            self.state.clear_field(FIELD_CITY);
            return Ok(());
        }
        if self.resolver.cascade().find(OptionList::Cities, id).is_none() {
            return Err(CoreError::NotFound {
                entity: "city",
                id: id.to_string(),
            }
            .into());
        }
        self.state.set_field(FIELD_CITY, id);
        Ok(())
    }

    /// Fill address fields from the device position.
    ///
    /// On success every part the lookup returned is written (a city only
    /// when it matches a loaded option by name). On failure no field is
    /// touched and a banner is shown.
    pub async fn use_current_location(&mut self, latitude: f64, longitude: f64) -> bool {
        let Some(geocoder) = self.geocoder.clone() else {
            self.banner = Some("Location lookup is not available.".into());
            return false;
        };
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            self.banner = Some("Invalid coordinates.".into());
            return false;
        }

        let address = match geocoder.reverse(latitude, longitude).await {
            Ok(address) if !address.is_empty() => address,
            Ok(_) => {
                self.banner = Some("No address found for your location.".into());
                return false;
            }
            Err(e) => {
                tracing::warn!(wizard_id = %self.state.id(), error = %e, "Reverse geocoding failed");
                self.banner =
                    Some("Could not determine your address. Please enter it manually.".into());
                return false;
            }
        };

        if let Some(street) = address.street {
            self.state.set_field(FIELD_ADDRESS, street);
        }
        if let Some(district) = address.district {
            self.state.set_field(FIELD_DISTRICT, district);
        }
        if let Some(postal_code) = address.postal_code {
            self.state.set_field(FIELD_POSTAL_CODE, postal_code);
        }
        if let Some(city) = address.city {
            let matched = self
                .resolver
                .cascade()
                .cities()
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(city.trim()))
                .map(|c| c.id.clone());
            if let Some(id) = matched {
                self.state.set_field(FIELD_CITY, id);
            }
        }
        true
    }

    // ---- navigation ----

    pub fn next(&mut self) -> StepOutcome {
        self.next_on(Local::now().date_naive())
    }

    /// Validate the current step against `today` and advance if it passes.
    pub fn next_on(&mut self, today: Date) -> StepOutcome {
        self.state.next(today)
    }

    pub fn previous(&mut self) -> JobWizardStep {
        self.state.previous()
    }

    // ---- submission ----

    pub async fn submit(&mut self) -> SubmitOutcome {
        self.submit_on(Local::now().date_naive()).await
    }

    /// Build the payload and issue the create-job request.
    ///
    /// Local validation failures never reach the network. On any failure the
    /// form values are left exactly as they were.
    pub async fn submit_on(&mut self, today: Date) -> SubmitOutcome {
        let wizard_id = self.state.id();

        let payload = match self.state.build_payload(today) {
            Ok(payload) => payload,
            Err(e) => {
                let message = match e {
                    CoreError::Validation(msg) => msg,
                    other => other.to_string(),
                };
                tracing::debug!(%wizard_id, %message, "Submission blocked locally");
                return self.fail(message);
            }
        };

        match self.api.create_job(&payload).await {
            Ok(response) => {
                let job_id = response.job_id().map(str::to_string);
                tracing::info!(
                    %wizard_id,
                    job_id = job_id.as_deref().unwrap_or(""),
                    services = payload.services.len(),
                    "Repair job created",
                );

                self.state.reset();
                self.resolver.reset_selection();
                self.submission_error = None;
                self.banner = None;

                SubmitOutcome::Created {
                    job_id,
                    message: response
                        .message
                        .filter(|m| !m.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_SUCCESS_MESSAGE.to_string()),
                    redirect_to: self.confirmation_route.clone(),
                }
            }
            Err(e) => {
                tracing::warn!(%wizard_id, error = %e, "Repair job submission failed");
                let message = e
                    .user_message()
                    .unwrap_or(GENERIC_SUBMIT_ERROR)
                    .to_string();
                self.fail(message)
            }
        }
    }

    fn fail(&mut self, message: String) -> SubmitOutcome {
        self.submission_error = Some(message.clone());
        SubmitOutcome::Failed { message }
    }
}
