//! Authentication models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::ImData;

/// Request body for /api/aaaLogin.json
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub aaa_user: LoginUser,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginUser {
    pub attributes: LoginAttributes,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginAttributes {
    pub name: String,
    pub pwd: String,
}

impl LoginRequest {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            aaa_user: LoginUser {
                attributes: LoginAttributes {
                    name: username.to_string(),
                    pwd: password.to_string(),
                },
            },
        }
    }
}

fn default_refresh_timeout() -> i64 {
    600 // APIC default session lifetime
}

/// Session state held after a successful login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthState {
    pub token: String,
    pub username: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthState {
    /// Build session state from an aaaLogin / aaaRefresh response
    pub fn from_response(response: &ImData, username: &str) -> Option<Self> {
        let login = response.imdata.iter().find(|mo| mo.class == "aaaLogin")?;
        let token = login.attribute("token")?.to_string();
        let timeout = login
            .attribute("refreshTimeoutSeconds")
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(default_refresh_timeout);

        Some(Self {
            token,
            username: username.to_string(),
            expires_at: Utc::now() + chrono::Duration::seconds(timeout),
        })
    }

    /// Check if the session token is expired (with 30 second buffer)
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at - chrono::Duration::seconds(30)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_body_shape() {
        let body = serde_json::to_value(LoginRequest::new("admin", "secret")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"aaaUser": {"attributes": {"name": "admin", "pwd": "secret"}}})
        );
    }

    #[test]
    fn test_state_from_login_response() {
        let body = r#"{"totalCount":"1","imdata":[{"aaaLogin":{"attributes":{"token":"abc","refreshTimeoutSeconds":"300","userName":"admin"}}}]}"#;
        let data: ImData = serde_json::from_str(body).unwrap();
        let state = AuthState::from_response(&data, "admin").unwrap();

        assert_eq!(state.token, "abc");
        assert!(!state.is_expired());
        assert!(state.expires_at <= Utc::now() + chrono::Duration::seconds(300));
    }

    #[test]
    fn test_state_requires_token() {
        let data: ImData = serde_json::from_str(r#"{"totalCount":"0","imdata":[]}"#).unwrap();
        assert!(AuthState::from_response(&data, "admin").is_none());
    }
}
