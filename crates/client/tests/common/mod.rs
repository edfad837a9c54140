//! Shared fakes for the client integration tests.
//!
//! [`FakeApi`] serves a small fixed catalogue of categories and regions,
//! records every call it receives, and can be told to fail individual
//! lookups or the final submission.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use repairhub_client::api::{Category, CreateJobResponse, CreatedJob, RepairApi};
use repairhub_client::error::ApiError;
use repairhub_client::geocode::{Geocoder, PartialAddress};
use repairhub_client::JobWizard;
use repairhub_core::form::*;
use repairhub_core::location::RegionOption;
use repairhub_core::option_cache::{MemorySessionStore, SessionStore};
use repairhub_core::payload::SubmissionPayload;
use repairhub_core::wizard::WizardConfig;

pub const ROUTE: &str = "/customer/post-job";
pub const CONFIRMATION_ROUTE: &str = "/customer/my-jobs";

/// Fixed "today" so preferred-date checks are deterministic.
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
}

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    create_error: Mutex<Option<(u16, String)>>,
    submitted: Mutex<Vec<SubmissionPayload>>,
    states: HashMap<String, Vec<RegionOption>>,
    cities: HashMap<String, Vec<RegionOption>>,
}

impl FakeApi {
    pub fn new() -> Arc<Self> {
        let states = HashMap::from([
            (
                "PK".to_string(),
                vec![
                    RegionOption::new("PB", "Punjab"),
                    RegionOption::new("SD", "Sindh"),
                ],
            ),
            (
                "IN".to_string(),
                vec![
                    RegionOption::new("MH", "Maharashtra"),
                    RegionOption::new("DL", "Delhi"),
                ],
            ),
        ]);
        let cities = HashMap::from([
            (
                "PB".to_string(),
                vec![
                    RegionOption::new("LHR", "Lahore"),
                    RegionOption::new("RWP", "Rawalpindi"),
                ],
            ),
            ("SD".to_string(), vec![RegionOption::new("KHI", "Karachi")]),
            ("MH".to_string(), vec![RegionOption::new("BOM", "Mumbai")]),
        ]);
        Arc::new(Self {
            states,
            cities,
            ..Self::default()
        })
    }

    /// Make lookups of `list` ("categories", "countries", "states",
    /// "cities") fail until [`recover`](Self::recover) is called.
    pub fn fail(&self, list: &'static str) {
        self.failing.lock().unwrap().insert(list);
    }

    pub fn recover(&self, list: &'static str) {
        self.failing.lock().unwrap().remove(list);
    }

    /// Make the next submissions fail with `status` and a JSON `message`.
    pub fn reject_submissions(&self, status: u16, message: &str) {
        *self.create_error.lock().unwrap() = Some((status, message.to_string()));
    }

    pub fn accept_submissions(&self) {
        *self.create_error.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of location lookups (countries, states or cities) received.
    pub fn location_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| {
                c.starts_with("countries") || c.starts_with("states") || c.starts_with("cities")
            })
            .count()
    }

    pub fn submitted(&self) -> Vec<SubmissionPayload> {
        self.submitted.lock().unwrap().clone()
    }

    fn record(&self, call: String, list: &'static str) -> Result<(), ApiError> {
        self.calls.lock().unwrap().push(call);
        if self.failing.lock().unwrap().contains(list) {
            return Err(ApiError::Status {
                status: 503,
                message: None,
                body: "service unavailable".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RepairApi for FakeApi {
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.record("categories".into(), "categories")?;
        Ok(vec![
            Category {
                id: "screen-repair".into(),
                name: "Screen Repair".into(),
            },
            Category {
                id: "battery".into(),
                name: "Battery Replacement".into(),
            },
        ])
    }

    async fn list_countries(&self) -> Result<Vec<RegionOption>, ApiError> {
        self.record("countries".into(), "countries")?;
        Ok(vec![
            RegionOption::new("PK", "Pakistan"),
            RegionOption::new("IN", "India"),
        ])
    }

    async fn list_states(&self, country_id: &str) -> Result<Vec<RegionOption>, ApiError> {
        self.record(format!("states:{country_id}"), "states")?;
        Ok(self.states.get(country_id).cloned().unwrap_or_default())
    }

    async fn list_cities(&self, state_id: &str) -> Result<Vec<RegionOption>, ApiError> {
        self.record(format!("cities:{state_id}"), "cities")?;
        Ok(self.cities.get(state_id).cloned().unwrap_or_default())
    }

    async fn create_job(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<CreateJobResponse, ApiError> {
        self.calls.lock().unwrap().push("create".into());
        if let Some((status, message)) = self.create_error.lock().unwrap().clone() {
            return Err(ApiError::Status {
                status,
                message: Some(message.clone()),
                body: serde_json::json!({ "success": false, "message": message }).to_string(),
            });
        }
        self.submitted.lock().unwrap().push(payload.clone());
        Ok(CreateJobResponse {
            success: true,
            message: Some("Repair job posted".into()),
            data: Some(CreatedJob {
                id: "job-1".into(),
            }),
        })
    }
}

/// Geocoder returning a canned answer, or an error when `address` is `None`.
pub struct FakeGeocoder {
    pub address: Option<PartialAddress>,
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn reverse(&self, _latitude: f64, _longitude: f64) -> Result<PartialAddress, ApiError> {
        self.address.clone().ok_or_else(|| ApiError::Status {
            status: 500,
            message: None,
            body: "geocoder down".into(),
        })
    }
}

pub fn new_store() -> Arc<dyn SessionStore> {
    Arc::new(MemorySessionStore::new())
}

pub fn new_wizard(api: &Arc<FakeApi>, store: &Arc<dyn SessionStore>) -> JobWizard {
    JobWizard::new(
        api.clone(),
        Arc::clone(store),
        ROUTE,
        WizardConfig::default(),
        CONFIRMATION_ROUTE,
    )
}

pub fn fill_job_details(wizard: &mut JobWizard) {
    wizard
        .set_field(FIELD_DESCRIPTION, "Screen cracked after a drop, touch still works")
        .unwrap();
    wizard.set_field(FIELD_DEVICE_BRAND, "Samsung").unwrap();
    wizard.set_field(FIELD_DEVICE_MODEL, "Galaxy S21").unwrap();
    wizard
        .set_field(FIELD_WARRANTY_STATUS, "out_of_warranty")
        .unwrap();
    wizard.set_field(FIELD_URGENCY, "high").unwrap();
}

pub fn fill_location_details(wizard: &mut JobWizard) {
    wizard.set_field(FIELD_ADDRESS, "12 Mall Road").unwrap();
    wizard.set_field(FIELD_POSTAL_CODE, "54000").unwrap();
    wizard.set_field(FIELD_PREFERRED_DATE, "2026-03-12").unwrap();
    wizard
        .set_field(FIELD_SERVICE_PREFERENCE, "home_service")
        .unwrap();
}
