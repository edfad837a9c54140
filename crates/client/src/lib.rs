//! Repair-job wizard client.
//!
//! Drives the pure wizard logic from `repairhub-core` against the
//! marketplace REST API: category and location lookups, the cascading
//! location resolver with its session cache, reverse geocoding, and final
//! job submission.

pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod geocode;
pub mod resolver;
pub mod telemetry;

pub use api::{Category, CreateJobResponse, HttpRepairApi, RepairApi};
pub use config::ClientConfig;
pub use controller::{JobWizard, SubmitOutcome};
pub use error::{ApiError, ClientError, ClientResult};
pub use geocode::{Geocoder, NominatimGeocoder, PartialAddress};
pub use resolver::LocationResolver;
