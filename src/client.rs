use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response, header};
use serde::Deserialize;
use url::Url;

use crate::credential::Credential;
use crate::error::{Error, Result};
use crate::observability::{CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS};
use crate::types::{GenerateContentRequest, GenerateContentResponse, Model, ModelListResponse};

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Marker the API places in errors caused by a bad key.
const API_KEY_INVALID: &str = "API_KEY_INVALID";

/// Client for the Gemini API.
#[derive(Debug, Clone)]
pub struct Gemini {
    credential: Credential,
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
}

impl Gemini {
    /// Create a new Gemini client.
    pub fn new(credential: Credential) -> Result<Self> {
        Self::with_options(credential, None, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `base_url` must end with a slash for endpoint paths to resolve under it;
    /// one is appended if missing.
    pub fn with_options(
        credential: Credential,
        base_url: Option<String>,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {}", e),
                    Some(Box::new(e)),
                )
            })?;

        let mut base_url = base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)?;

        Ok(Self {
            credential,
            client,
            base_url,
            timeout,
        })
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Create and return default headers for API requests.
    fn default_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        let mut key = HeaderValue::from_str(self.credential.as_str())
            .map_err(|_| Error::credential("API key contains characters not allowed in a header"))?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);
        Ok(headers)
    }

    /// Sends a request, counting it and mapping transport and HTTP failures.
    async fn execute(&self, request: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        let result = request.headers(self.default_headers()?).send().await;
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());

        let response = result.map_err(|e| {
            CLIENT_REQUEST_ERRORS.click();
            if e.is_timeout() {
                Error::timeout(
                    format!("Request timed out: {}", e),
                    Some(self.timeout.as_secs_f64()),
                )
            } else if e.is_connect() {
                Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
            } else {
                Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
            }
        })?;

        tracing::debug!(status = %response.status(), url = %response.url().path(), "gemini response");
        if !response.status().is_success() {
            CLIENT_REQUEST_ERRORS.click();
            return Err(Self::process_error_response(response).await);
        }
        Ok(response)
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|val| val.to_str().ok())
            .and_then(|val| val.parse::<u64>().ok());

        match response.text().await {
            Ok(body) => classify_error(status_code, retry_after, &body),
            Err(e) => Error::http_client(
                format!("Failed to read error response: {}", e),
                Some(Box::new(e)),
            ),
        }
    }

    /// Lists one page of the models available to this key.
    ///
    /// Pass the previous page's `next_page_token` to continue a listing.
    pub async fn list_models(&self, page_token: Option<&str>) -> Result<ModelListResponse> {
        let mut url = self.base_url.join("models")?;
        if let Some(token) = page_token {
            url.query_pairs_mut().append_pair("pageToken", token);
        }
        tracing::debug!(%url, "listing models");
        let response = self.execute(self.client.get(url)).await?;
        response.json::<ModelListResponse>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse model list: {}", e),
                Some(Box::new(e)),
            )
        })
    }

    /// Generates the next turn for `request` with `model`.
    pub async fn generate_content(
        &self,
        model: &Model,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self
            .base_url
            .join(&format!("models/{}:generateContent", model.as_str()))?;
        tracing::debug!(%url, turns = request.contents.len(), "generating content");
        let response = self.execute(self.client.post(url).json(request)).await?;
        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| {
                Error::serialization(
                    format!("Failed to parse response: {}", e),
                    Some(Box::new(e)),
                )
            })
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: Option<ErrorDetail>,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: Option<String>,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorInfo>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorInfo {
    reason: Option<String>,
    retry_delay: Option<String>,
}

/// Maps an error body from the API onto an [`Error`].
///
/// The API reports a bad key as `400 INVALID_ARGUMENT` with reason
/// `API_KEY_INVALID`, so the reason and status strings take precedence
/// over the HTTP status code.
pub(crate) fn classify_error(status_code: u16, retry_after: Option<u64>, body: &str) -> Error {
    let detail = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.error);
    let message = detail
        .as_ref()
        .and_then(|d| d.message.clone())
        .unwrap_or_else(|| body.to_string());
    let status = detail.as_ref().and_then(|d| d.status.clone());
    let reasons: Vec<&str> = detail
        .iter()
        .flat_map(|d| d.details.iter())
        .filter_map(|info| info.reason.as_deref())
        .collect();
    let retry_after = retry_after.or_else(|| {
        detail
            .iter()
            .flat_map(|d| d.details.iter())
            .filter_map(|info| info.retry_delay.as_deref())
            .find_map(parse_retry_delay)
    });

    let key_invalid = reasons.contains(&API_KEY_INVALID) || message.contains(API_KEY_INVALID);
    match (status.as_deref(), status_code) {
        _ if key_invalid => Error::authentication(message),
        (Some("UNAUTHENTICATED"), _) | (_, 401) => Error::authentication(message),
        (Some("PERMISSION_DENIED"), _) | (_, 403) => Error::permission(message),
        (Some("RESOURCE_EXHAUSTED"), _) | (_, 429) => Error::quota_exhausted(message, retry_after),
        (_, 400) => Error::bad_request(message),
        (_, 404) => Error::not_found(message),
        (_, 500) => Error::internal_server(message),
        (_, 502..=504) => Error::service_unavailable(message, retry_after),
        _ => Error::api(status_code, status.clone(), message),
    }
}

/// Parses a protobuf duration such as `"38s"` or `"1.5s"` into whole seconds.
fn parse_retry_delay(delay: &str) -> Option<u64> {
    let seconds: f64 = delay.strip_suffix('s')?.parse().ok()?;
    (seconds.is_finite() && seconds >= 0.0).then(|| seconds.ceil() as u64)
}
