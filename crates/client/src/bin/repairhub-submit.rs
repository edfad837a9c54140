//! Post a repair job from a JSON answers file.
//!
//! ```text
//! repairhub-submit answers.json
//! ```
//!
//! The answers file mirrors what a customer would enter in the wizard:
//!
//! ```json
//! {
//!   "route": "/customer/post-job",
//!   "services": ["screen-repair"],
//!   "fields": { "description": "...", "urgency": "high" },
//!   "location": { "country": "PK", "state": "PB", "city": "LHR" },
//!   "coordinates": { "latitude": 31.52, "longitude": 74.35 }
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use anyhow::{bail, Context};
use serde::Deserialize;

use repairhub_client::telemetry::init_tracing;
use repairhub_client::{
    ClientConfig, HttpRepairApi, JobWizard, NominatimGeocoder, RepairApi, SubmitOutcome,
};
use repairhub_core::option_cache::{MemorySessionStore, SessionStore};
use repairhub_core::wizard::StepOutcome;

#[derive(Debug, Deserialize)]
struct Answers {
    #[serde(default = "default_route")]
    route: String,
    #[serde(default)]
    services: Vec<String>,
    #[serde(default)]
    fields: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    location: LocationAnswers,
    coordinates: Option<Coordinates>,
}

#[derive(Debug, Default, Deserialize)]
struct LocationAnswers {
    country: Option<String>,
    state: Option<String>,
    city: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Coordinates {
    latitude: f64,
    longitude: f64,
}

fn default_route() -> String {
    "/customer/post-job".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::load()?;
    init_tracing(config.log_format)?;

    let path = std::env::args()
        .nth(1)
        .context("usage: repairhub-submit <answers.json>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let answers: Answers =
        serde_json::from_str(&raw).with_context(|| format!("parsing {path}"))?;

    tracing::info!(api_url = %config.api_url, route = %answers.route, "Starting repair job submission");

    let api: Arc<dyn RepairApi> = Arc::new(HttpRepairApi::new(&config)?);
    let store: Arc<dyn SessionStore> = Arc::new(MemorySessionStore::new());

    let mut wizard = JobWizard::new(
        api,
        store,
        &answers.route,
        config.wizard_config(),
        config.confirmation_route.clone(),
    );
    if let Some(geocoder) = NominatimGeocoder::from_config(&config)? {
        wizard = wizard.with_geocoder(Arc::new(geocoder));
    }

    wizard.mount().await;
    if let Some(banner) = wizard.banner() {
        bail!("{banner}");
    }

    for service in &answers.services {
        wizard.toggle_service(service)?;
    }

    if let Some(country) = answers.location.country.as_deref() {
        wizard.select_country(country).await;
        if let Some(banner) = wizard.banner() {
            bail!("{banner}");
        }
    }
    if let Some(state) = answers.location.state.as_deref() {
        wizard.select_state(state).await?;
        if let Some(banner) = wizard.banner() {
            bail!("{banner}");
        }
    }
    if let Some(city) = answers.location.city.as_deref() {
        wizard.select_city(city)?;
    }

    if let Some(coords) = &answers.coordinates {
        if !wizard.use_current_location(coords.latitude, coords.longitude).await {
            if let Some(banner) = wizard.banner() {
                tracing::warn!(%banner, "Continuing without current location");
            }
            wizard.dismiss_banner();
        }
    }

    // Explicit answers win over anything the geocoder filled in.
    for (path, value) in answers.fields {
        wizard.set_field(&path, value)?;
    }

    loop {
        match wizard.next() {
            StepOutcome::Advanced(step) => {
                tracing::info!(step = step.to_number(), label = step.label(), "Step passed");
            }
            StepOutcome::ReadyToSubmit => break,
            StepOutcome::Blocked(errors) => {
                for (field, message) in &errors {
                    eprintln!("  {field}: {message}");
                }
                bail!(
                    "step {} ({}) is incomplete",
                    wizard.current_step().to_number(),
                    wizard.current_step().label()
                );
            }
        }
    }

    match wizard.submit().await {
        SubmitOutcome::Created {
            job_id,
            message,
            redirect_to,
        } => {
            println!("{message}");
            if let Some(id) = job_id {
                println!("job id: {id}");
            }
            println!("next: {redirect_to}");
            Ok(())
        }
        SubmitOutcome::Failed { message } => bail!("{message}"),
    }
}
