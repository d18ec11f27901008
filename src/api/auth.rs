//! Authentication manager for the APIC REST API
//!
//! Handles aaaLogin, session refresh and the `APIC-cookie` session cookie.

use reqwest::cookie::Jar;
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::body_preview;
use super::endpoints::paths;
use crate::error::{ApiError, ApiResult};
use crate::models::{AuthState, ImData, LoginRequest};

const SESSION_COOKIE: &str = "APIC-cookie";

/// Username/password pair used for (re-)login
#[derive(Clone)]
struct Credentials {
    username: String,
    password: String,
}

/// Manages authentication state and session refresh
pub struct AuthManager {
    /// Current auth state
    state: RwLock<Option<AuthState>>,
    /// Credentials kept for re-login once the session cannot be refreshed
    credentials: RwLock<Option<Credentials>>,
    /// Base URL for auth endpoints
    base_url: Url,
    /// HTTP client for auth requests, shared with the API client
    http: reqwest::Client,
    /// Cookie store the session cookie is written to
    cookies: Arc<Jar>,
}

impl AuthManager {
    /// Create a new auth manager
    pub fn new(base_url: Url, http: reqwest::Client, cookies: Arc<Jar>) -> Self {
        Self {
            state: RwLock::new(None),
            credentials: RwLock::new(None),
            base_url,
            http,
            cookies,
        }
    }

    fn url(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    /// Log in with username and password
    pub async fn login(&self, username: &str, password: &str) -> ApiResult<()> {
        let response = self
            .http
            .post(self.url(paths::AAA_LOGIN))
            .json(&LoginRequest::new(username, password))
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_str::<ImData>(&body)
                .ok()
                .and_then(|data| data.error())
                .map(|err| format!("APIC Error {}: {}", err.code, err.text))
                .unwrap_or(body);

            return Err(match status {
                401 | 403 => ApiError::Authentication(message),
                429 => ApiError::RateLimited { retry_after_secs: 60 },
                _ => ApiError::Server { status, message },
            });
        }

        let data: ImData = serde_json::from_str(&body).map_err(|e| {
            ApiError::InvalidResponse(format!(
                "JSON parse error: {}. Body: {}",
                e,
                body_preview(&body, 500)
            ))
        })?;

        let state = AuthState::from_response(&data, username)
            .ok_or_else(|| ApiError::InvalidResponse("Login response carries no token".into()))?;

        tracing::info!("Logged in to {} as {}", self.base_url, username);
        self.set_session(state).await;
        *self.credentials.write().await = Some(Credentials {
            username: username.to_string(),
            password: password.to_string(),
        });

        Ok(())
    }

    async fn set_session(&self, state: AuthState) {
        self.cookies.add_cookie_str(
            &format!("{}={}; Path=/", SESSION_COOKIE, state.token),
            &self.base_url,
        );
        *self.state.write().await = Some(state);
    }

    /// Make sure a usable session exists, refreshing or re-logging in if needed
    pub async fn ensure_session(&self) -> ApiResult<()> {
        let expired = match &*self.state.read().await {
            None => return Err(ApiError::Authentication("Not authenticated".into())),
            Some(state) => state.is_expired(),
        };

        if !expired {
            return Ok(());
        }

        tracing::debug!("Session close to expiry, refreshing");
        match self.refresh().await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!("Session refresh failed ({}), logging in again", e);
                let creds = self.credentials.read().await.clone().ok_or(ApiError::TokenExpired)?;
                self.login(&creds.username, &creds.password).await
            }
        }
    }

    /// Refresh the current session token
    async fn refresh(&self) -> ApiResult<()> {
        let username = match &*self.state.read().await {
            Some(s) => s.username.clone(),
            None => return Err(ApiError::Authentication("No session to refresh".into())),
        };

        let response = self.http.get(self.url(paths::AAA_REFRESH)).send().await?;

        let status = response.status().as_u16();
        if status == 401 || status == 403 {
            return Err(ApiError::TokenExpired);
        }
        if !(200..300).contains(&status) {
            let message = response.text().await.unwrap_or_default();
            return Err(ApiError::Server { status, message });
        }

        let data: ImData = response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))?;
        let state = AuthState::from_response(&data, &username)
            .ok_or_else(|| ApiError::InvalidResponse("Refresh response carries no token".into()))?;

        self.set_session(state).await;
        Ok(())
    }

    /// Check if we're currently authenticated
    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// End the session on the controller and clear local state
    pub async fn logout(&self) {
        let username = match self.state.write().await.take() {
            Some(state) => state.username,
            None => return,
        };
        *self.credentials.write().await = None;

        let body = serde_json::json!({"aaaUser": {"attributes": {"name": username}}});
        if let Err(e) = self.http.post(self.url(paths::AAA_LOGOUT)).json(&body).send().await {
            tracing::debug!("Logout request failed: {}", e);
        }
    }
}
