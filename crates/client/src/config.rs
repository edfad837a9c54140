use repairhub_core::wizard::{WizardConfig, DEFAULT_DESCRIPTION_MIN_LENGTH, MIN_DESCRIPTION_MIN_LENGTH};

use crate::error::ClientError;

/// Log output format for [`crate::telemetry::init_tracing`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the marketplace REST API.
    pub api_url: String,
    /// Optional bearer token attached to every API request.
    pub api_token: Option<String>,
    /// Base URL of the reverse-geocoding service. `None` disables lookups.
    pub geocoder_url: Option<String>,
    /// HTTP request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Minimum description length enforced by the step-2 gate.
    pub description_min_length: usize,
    /// Where the user is sent after a successful submission.
    pub confirmation_route: String,
    pub log_format: LogFormat,
}

impl ClientConfig {
    /// Load `.env` (if present) and then read the environment.
    pub fn load() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                               |
    /// |--------------------------|---------------------------------------|
    /// | `REPAIRHUB_API_URL`      | `http://localhost:5000/api`           |
    /// | `REPAIRHUB_API_TOKEN`    | unset                                 |
    /// | `REPAIRHUB_GEOCODER_URL` | `https://nominatim.openstreetmap.org` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                                  |
    /// | `DESCRIPTION_MIN_LENGTH` | `20`                                  |
    /// | `CONFIRMATION_ROUTE`     | `/customer/my-jobs`                   |
    /// | `LOG_FORMAT`             | `text`                                |
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ClientError> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let api_url = var("REPAIRHUB_API_URL", "http://localhost:5000/api")
            .trim_end_matches('/')
            .to_string();

        let api_token = lookup("REPAIRHUB_API_TOKEN").filter(|t| !t.trim().is_empty());

        let geocoder_url = Some(var(
            "REPAIRHUB_GEOCODER_URL",
            "https://nominatim.openstreetmap.org",
        ))
        .map(|u| u.trim_end_matches('/').to_string())
        .filter(|u| !u.is_empty());

        let request_timeout_secs: u64 = var("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|_| ClientError::Config("REQUEST_TIMEOUT_SECS must be a valid u64".into()))?;

        let description_min_length: usize = var(
            "DESCRIPTION_MIN_LENGTH",
            &DEFAULT_DESCRIPTION_MIN_LENGTH.to_string(),
        )
        .parse()
        .map_err(|_| ClientError::Config("DESCRIPTION_MIN_LENGTH must be a valid usize".into()))?;

        if description_min_length < MIN_DESCRIPTION_MIN_LENGTH {
            return Err(ClientError::Config(format!(
                "DESCRIPTION_MIN_LENGTH must be at least {MIN_DESCRIPTION_MIN_LENGTH}"
            )));
        }

        let confirmation_route = var("CONFIRMATION_ROUTE", "/customer/my-jobs");

        let log_format = match var("LOG_FORMAT", "text").to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "text" => LogFormat::Text,
            other => {
                return Err(ClientError::Config(format!(
                    "LOG_FORMAT must be 'text' or 'json', got '{other}'"
                )))
            }
        };

        Ok(Self {
            api_url,
            api_token,
            geocoder_url,
            request_timeout_secs,
            description_min_length,
            confirmation_route,
            log_format,
        })
    }

    pub fn wizard_config(&self) -> WizardConfig {
        WizardConfig {
            description_min_length: self.description_min_length,
        }
    }
}
