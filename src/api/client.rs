//! APIC REST API client
//!
//! Provides async GET/POST/DELETE on managed objects with session handling
//! and back-off on rate limiting.

use reqwest::{Method, Url};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::auth::AuthManager;
use super::body_preview;
use super::endpoints::{paths, MoQuery};
use crate::config::ConnectionOptions;
use crate::error::{ApiError, ApiResult};
use crate::models::ImData;

/// Wait applied when a 429 carries no usable Retry-After
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;
/// Upper bound on a single Retry-After wait
const MAX_RETRY_AFTER_SECS: u64 = 60;

/// A successful controller response
#[derive(Debug, Clone)]
pub struct ApicResponse {
    /// HTTP status code
    pub status: u16,
    /// Reason phrase, e.g. "OK"
    pub reason: String,
    /// Parsed body
    pub data: ImData,
}

/// APIC API client
#[derive(Clone)]
pub struct ApicClient {
    /// HTTP client
    http: reqwest::Client,
    /// Base URL (e.g., "https://apic.example.com")
    base_url: Url,
    /// Authentication manager
    auth: Arc<AuthManager>,
    /// Max retries for rate limited requests
    max_retries: u32,
}

impl ApicClient {
    /// Create a new client
    pub fn new(options: &ConnectionOptions) -> ApiResult<Self> {
        let base_url = Url::parse(&options.base_url())
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", options.base_url(), e)))?;
        let cookie_store = Arc::new(reqwest::cookie::Jar::default());

        let mut builder = reqwest::Client::builder()
            .cookie_provider(cookie_store.clone())
            .timeout(Duration::from_secs(options.timeout_secs))
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .danger_accept_invalid_certs(!options.validate_certs);
        if !options.use_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        if !options.validate_certs {
            tracing::warn!("TLS certificate validation disabled for {}", base_url);
        }

        Ok(Self {
            auth: Arc::new(AuthManager::new(base_url.clone(), http.clone(), cookie_store)),
            http,
            base_url,
            max_retries: 3,
        })
    }

    /// Log in with username and password
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<()> {
        self.auth.login(username, password).await
    }

    /// End the controller session
    pub async fn logout(&self) {
        self.auth.logout().await
    }

    /// Check if authenticated
    pub async fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated().await
    }

    /// Build a full URL for a path and query options
    ///
    /// Path segments and query values are percent-encoded here; callers pass
    /// names through verbatim.
    pub fn url(&self, path: &str, query: &MoQuery) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.pairs());
        }
        url
    }

    /// GET a URL
    pub async fn get(&self, url: &Url) -> ApiResult<ApicResponse> {
        self.request_full::<()>(Method::GET, url, None).await
    }

    /// POST a JSON body to a URL
    pub async fn post<B>(&self, url: &Url, body: &B) -> ApiResult<ApicResponse>
    where
        B: Serialize + ?Sized,
    {
        self.request_full(Method::POST, url, Some(body)).await
    }

    /// DELETE a URL
    pub async fn delete(&self, url: &Url) -> ApiResult<ApicResponse> {
        self.request_full::<()>(Method::DELETE, url, None).await
    }

    /// Full request handler with session check and rate limit retries
    async fn request_full<B>(&self, method: Method, url: &Url, body: Option<&B>) -> ApiResult<ApicResponse>
    where
        B: Serialize + ?Sized,
    {
        let mut retries = 0;

        loop {
            self.auth.ensure_session().await?;

            let mut request = self.http.request(method.clone(), url.clone());
            if let Some(body) = body {
                request = request.json(body);
            }

            tracing::debug!("{} {}", method, url);
            let response = request.send().await?;
            let status = response.status();

            // Handle rate limiting
            if status.as_u16() == 429 {
                let retry_after = response
                    .headers()
                    .get("Retry-After")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
                    .min(MAX_RETRY_AFTER_SECS);

                if retries >= self.max_retries {
                    return Err(ApiError::RateLimited {
                        retry_after_secs: retry_after,
                    });
                }

                tracing::warn!("Rate limited, retrying after {} seconds", retry_after);
                sleep(Duration::from_secs(retry_after)).await;
                retries += 1;
                continue;
            }

            let body_text = response.text().await.map_err(|e| {
                ApiError::InvalidResponse(format!("Failed to read response body: {}", e))
            })?;

            if !status.is_success() {
                let apic_error = serde_json::from_str::<ImData>(&body_text)
                    .ok()
                    .and_then(|data| data.error());

                tracing::debug!("{} {} failed with {}: {}", method, url, status, body_text);
                return Err(match (apic_error, status.as_u16()) {
                    (Some(err), code) => ApiError::Apic {
                        status: code,
                        code: err.code,
                        text: err.text,
                    },
                    (None, 401 | 403) => ApiError::Authentication(body_text),
                    (None, 404) => ApiError::NotFound(url.path().to_string()),
                    (None, code) => ApiError::Server {
                        status: code,
                        message: body_text,
                    },
                });
            }

            // Parse JSON, logging body on error
            let data: ImData = serde_json::from_str(&body_text).map_err(|e| {
                tracing::error!(
                    "JSON parse error for {} {}: {}. Body: {}",
                    method,
                    url,
                    e,
                    body_preview(&body_text, 1000)
                );
                ApiError::InvalidResponse(format!("Failed to parse response: {}", e))
            })?;

            return Ok(ApicResponse {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
                data,
            });
        }
    }

    // ==================== API Methods ====================

    /// Get the running controller firmware version
    pub async fn get_version(&self) -> ApiResult<Option<String>> {
        let url = self.url(paths::FIRMWARE_RUNNING, &MoQuery::new());
        let response = self.get(&url).await?;
        Ok(response
            .data
            .imdata
            .iter()
            .find(|mo| mo.class == "firmwareCtrlrRunning")
            .and_then(|mo| mo.attribute("version"))
            .map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_encodes_reserved_characters() {
        let client = ApicClient::new(&ConnectionOptions::new("apic.example.com")).unwrap();
        let url = client.url("/api/mo/uni/infra/funcprof/accportgrp-my pg#1.json", &MoQuery::new());
        assert_eq!(
            url.as_str(),
            "https://apic.example.com/api/mo/uni/infra/funcprof/accportgrp-my%20pg%231.json"
        );
    }

    #[test]
    fn test_url_query_is_encoded() {
        let client = ApicClient::new(&ConnectionOptions::new("apic.example.com")).unwrap();
        let query = MoQuery::new().target_filter(Some(r#"eq(infraAccBndlGrp.lagT,"node")"#.into()));
        let url = client.url("/api/class/infraAccBndlGrp.json", &query);
        assert_eq!(
            url.query(),
            Some("query-target-filter=eq%28infraAccBndlGrp.lagT%2C%22node%22%29")
        );
    }
}
