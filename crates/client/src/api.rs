//! REST API client for the repair marketplace.
//!
//! [`RepairApi`] is the seam the wizard talks through; [`HttpRepairApi`]
//! implements it over [`reqwest`]. Only the endpoints the job-posting
//! wizard needs are covered.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use repairhub_core::location::RegionOption;
use repairhub_core::payload::SubmissionPayload;

use crate::config::ClientConfig;
use crate::error::ApiError;

/// A repair service category offered in step 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
}

/// Body returned by `POST /repair-jobs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateJobResponse {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<CreatedJob>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedJob {
    #[serde(alias = "_id")]
    pub id: String,
}

fn default_success() -> bool {
    true
}

impl CreateJobResponse {
    pub fn job_id(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.id.as_str())
    }
}

/// The marketplace endpoints used by the job-posting wizard.
#[async_trait]
pub trait RepairApi: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError>;

    async fn list_countries(&self) -> Result<Vec<RegionOption>, ApiError>;

    async fn list_states(&self, country_id: &str) -> Result<Vec<RegionOption>, ApiError>;

    async fn list_cities(&self, state_id: &str) -> Result<Vec<RegionOption>, ApiError>;

    async fn create_job(&self, payload: &SubmissionPayload)
        -> Result<CreateJobResponse, ApiError>;
}

/// HTTP implementation of [`RepairApi`].
pub struct HttpRepairApi {
    client: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

/// Location lookups come back as `{ id | _id | isoCode, name }`.
#[derive(Debug, Deserialize)]
struct RegionDto {
    #[serde(alias = "_id", alias = "isoCode")]
    id: String,
    name: String,
}

impl From<RegionDto> for RegionOption {
    fn from(dto: RegionDto) -> Self {
        RegionOption::new(dto.id, dto.name)
    }
}

/// List endpoints answer either with a bare array or `{ "data": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ListBody<T> {
    Bare(Vec<T>),
    Wrapped { data: Vec<T> },
}

impl<T> ListBody<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) | Self::Wrapped { data: items } => items,
        }
    }
}

impl HttpRepairApi {
    /// Create a client for the configured API base URL.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Self::with_client(client, &config.api_url, config.api_token.clone())
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        api_url: &str,
        token: Option<String>,
    ) -> Result<Self, ApiError> {
        let base_url =
            Url::parse(api_url).map_err(|e| ApiError::InvalidUrl(format!("{api_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!("{api_url}: not a base URL")));
        }
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Build `<base>/<segments...>`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_list<T, D>(&self, segments: &[&str]) -> Result<Vec<T>, ApiError>
    where
        T: Send,
        D: DeserializeOwned + Into<T> + Send,
    {
        let url = self.endpoint(segments)?;
        tracing::debug!(%url, "GET");
        let response = self.authorized(self.client.get(url)).send().await?;
        let body: ListBody<D> = Self::parse_response(response).await?;
        Ok(body.into_vec().into_iter().map(Into::into).collect())
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    // ---- private helpers ----

    /// Ensure the response has a success status code. On failure, extract
    /// the server's message from the JSON body when present.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: extract_message(&body),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl RepairApi for HttpRepairApi {
    async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        self.get_list::<Category, Category>(&["repair-jobs", "categories"])
            .await
    }

    async fn list_countries(&self) -> Result<Vec<RegionOption>, ApiError> {
        self.get_list::<RegionOption, RegionDto>(&["locations", "countries"])
            .await
    }

    async fn list_states(&self, country_id: &str) -> Result<Vec<RegionOption>, ApiError> {
        self.get_list::<RegionOption, RegionDto>(&["locations", "countries", country_id, "states"])
            .await
    }

    async fn list_cities(&self, state_id: &str) -> Result<Vec<RegionOption>, ApiError> {
        self.get_list::<RegionOption, RegionDto>(&["locations", "states", state_id, "cities"])
            .await
    }

    async fn create_job(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<CreateJobResponse, ApiError> {
        let url = self.endpoint(&["repair-jobs"])?;
        tracing::debug!(%url, services = payload.services.len(), "POST");

        let response = self
            .authorized(self.client.post(url))
            .json(payload)
            .send()
            .await?;
        let body: CreateJobResponse = Self::parse_response(response).await?;

        if !body.success {
            return Err(ApiError::Rejected(body.message.unwrap_or_default()));
        }
        Ok(body)
    }
}

/// Pull a user-facing message out of an error body:
/// `message`, then `error`, then the first entry of `errors`.
pub fn extract_message(body: &str) -> Option<String> {
    let json: serde_json::Value = serde_json::from_str(body).ok()?;
    let obj = json.as_object()?;

    let direct = ["message", "error"]
        .iter()
        .find_map(|key| obj.get(*key).and_then(|v| v.as_str()));

    let from_list = || {
        obj.get("errors")
            .and_then(|v| v.as_array())
            .and_then(|errs| errs.first())
            .and_then(|first| {
                first
                    .as_str()
                    .or_else(|| first.get("message").and_then(|m| m.as_str()))
                    .or_else(|| first.get("msg").and_then(|m| m.as_str()))
            })
    };

    direct
        .or_else(from_list)
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(base: &str) -> HttpRepairApi {
        HttpRepairApi::with_client(reqwest::Client::new(), base, None).unwrap()
    }

    #[test]
    fn endpoint_appends_and_encodes_segments() {
        let api = api("http://localhost:5000/api");
        let url = api
            .endpoint(&["locations", "countries", "New Zealand", "states"])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:5000/api/locations/countries/New%20Zealand/states"
        );
    }

    #[test]
    fn endpoint_handles_trailing_slash_base() {
        let api = api("http://localhost:5000/api/");
        let url = api.endpoint(&["repair-jobs"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/api/repair-jobs");
    }

    #[test]
    fn rejects_non_base_url() {
        assert!(HttpRepairApi::with_client(reqwest::Client::new(), "mailto:x@y.z", None).is_err());
        assert!(HttpRepairApi::with_client(reqwest::Client::new(), "not a url", None).is_err());
    }

    #[test]
    fn extract_message_variants() {
        assert_eq!(
            extract_message(r#"{"success":false,"message":"Invalid category"}"#).as_deref(),
            Some("Invalid category")
        );
        assert_eq!(
            extract_message(r#"{"error":"Unauthorized"}"#).as_deref(),
            Some("Unauthorized")
        );
        assert_eq!(
            extract_message(r#"{"errors":[{"msg":"Budget must be positive"}]}"#).as_deref(),
            Some("Budget must be positive")
        );
        assert_eq!(extract_message(r#"{"message":"  "}"#), None);
        assert_eq!(extract_message("<html>oops</html>"), None);
    }

    #[test]
    fn list_body_accepts_bare_and_wrapped() {
        let bare: ListBody<RegionDto> =
            serde_json::from_str(r#"[{"isoCode":"PK","name":"Pakistan"}]"#).unwrap();
        let wrapped: ListBody<RegionDto> =
            serde_json::from_str(r#"{"data":[{"_id":"PB","name":"Punjab"}]}"#).unwrap();

        let bare: Vec<RegionOption> = bare.into_vec().into_iter().map(Into::into).collect();
        let wrapped: Vec<RegionOption> = wrapped.into_vec().into_iter().map(Into::into).collect();
        assert_eq!(bare, vec![RegionOption::new("PK", "Pakistan")]);
        assert_eq!(wrapped, vec![RegionOption::new("PB", "Punjab")]);
    }

    #[test]
    fn create_response_defaults_to_success() {
        let body: CreateJobResponse =
            serde_json::from_str(r#"{"message":"Job posted","data":{"_id":"job-42"}}"#).unwrap();
        assert!(body.success);
        assert_eq!(body.job_id(), Some("job-42"));

        let body: CreateJobResponse =
            serde_json::from_str(r#"{"success":false,"message":"Invalid category"}"#).unwrap();
        assert!(!body.success);
    }
}
