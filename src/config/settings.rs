//! Application settings and profiles

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

/// How to reach and talk to an APIC
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionOptions {
    /// Controller hostname or IP address
    pub host: String,
    /// Port, defaults to 443 (https) or 80 (http)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Use https
    #[serde(default = "default_true")]
    pub use_ssl: bool,
    /// Verify the controller's TLS certificate
    #[serde(default = "default_true")]
    pub validate_certs: bool,
    /// Honour system proxy settings
    #[serde(default = "default_true")]
    pub use_proxy: bool,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl ConnectionOptions {
    pub fn new(host: &str) -> Self {
        Self {
            host: host.to_string(),
            port: None,
            use_ssl: true,
            validate_certs: true,
            use_proxy: true,
            timeout_secs: default_timeout(),
        }
    }

    /// Get the base URL for API requests
    pub fn base_url(&self) -> String {
        let scheme = if self.use_ssl { "https" } else { "http" };
        let host = self
            .host
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        match self.port {
            Some(port) => format!("{}://{}:{}", scheme, host, port),
            None => format!("{}://{}", scheme, host),
        }
    }
}

/// A controller profile configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Profile name (e.g., "lab", "production")
    pub name: String,
    /// Username used to log in
    pub username: String,
    /// Connection details
    #[serde(flatten)]
    pub connection: ConnectionOptions,
    /// Last used timestamp
    #[serde(default)]
    pub last_used: Option<String>,
}

impl Profile {
    /// Create a new profile
    pub fn new(name: &str, host: &str, username: &str) -> Self {
        Self {
            name: name.to_string(),
            username: username.to_string(),
            connection: ConnectionOptions::new(host),
            last_used: None,
        }
    }

    /// Record that the profile was just used
    pub fn touch(&mut self) {
        self.last_used = Some(chrono::Utc::now().to_rfc3339());
    }
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// List of saved profiles
    #[serde(default)]
    pub profiles: Vec<Profile>,
    /// Name of the active profile
    pub active_profile: Option<String>,
}

impl Settings {
    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("com", "fraziersystems", "aci-policy-group")
            .ok_or_else(|| AppError::Config("Could not determine config directory".into()))?;

        Ok(dirs.config_dir().join("settings.json"))
    }

    /// Load settings from disk
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load settings from a specific file, defaulting when it does not exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Save settings to disk
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save settings to a specific file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        tracing::debug!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Get a profile by name
    pub fn get_profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Get the active profile
    pub fn get_active_profile(&self) -> Option<&Profile> {
        self.active_profile
            .as_ref()
            .and_then(|name| self.get_profile(name))
    }

    /// Add a new profile
    pub fn add_profile(&mut self, profile: Profile) {
        // Remove existing profile with same name
        self.profiles.retain(|p| p.name != profile.name);
        self.profiles.push(profile);
    }

    /// Delete a profile by name
    pub fn delete_profile(&mut self, name: &str) {
        self.profiles.retain(|p| p.name != name);

        // Clear active profile if it was deleted
        if self.active_profile.as_deref() == Some(name) {
            self.active_profile = self.profiles.first().map(|p| p.name.clone());
        }
    }

    /// Set the active profile
    pub fn set_active_profile(&mut self, name: &str) -> Result<()> {
        if self.get_profile(name).is_none() {
            return Err(AppError::Config(format!("Profile '{}' not found", name)));
        }
        self.active_profile = Some(name.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_base_url() {
        let mut options = ConnectionOptions::new("apic.example.com");
        assert_eq!(options.base_url(), "https://apic.example.com");

        options.use_ssl = false;
        options.port = Some(8080);
        assert_eq!(options.base_url(), "http://apic.example.com:8080");

        let options = ConnectionOptions::new("https://10.0.0.1/");
        assert_eq!(options.base_url(), "https://10.0.0.1");
    }

    #[test]
    fn test_settings_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = Settings::default();
        let mut lab = Profile::new("lab", "apic-lab", "admin");
        lab.connection.validate_certs = false;
        settings.add_profile(lab);
        settings.add_profile(Profile::new("prod", "apic-prod", "automation"));
        settings.set_active_profile("lab").unwrap();
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        let active = loaded.get_active_profile().unwrap();
        assert_eq!(active.name, "lab");
        assert!(!active.connection.validate_certs);
        assert_eq!(loaded.profiles.len(), 2);
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load_from(&dir.path().join("absent.json")).unwrap();
        assert!(settings.profiles.is_empty());
        assert!(settings.active_profile.is_none());
    }

    #[test]
    fn test_profile_defaults_when_fields_missing() {
        let json = r#"{"profiles":[{"name":"lab","username":"admin","host":"apic"}],"activeProfile":"lab"}"#;
        let settings: Settings = serde_json::from_str(json).unwrap();
        let profile = settings.get_active_profile().unwrap();
        assert!(profile.connection.use_ssl);
        assert!(profile.connection.validate_certs);
        assert_eq!(profile.connection.timeout_secs, 30);
    }

    #[test]
    fn test_delete_active_profile_moves_active() {
        let mut settings = Settings::default();
        settings.add_profile(Profile::new("a", "h1", "u"));
        settings.add_profile(Profile::new("b", "h2", "u"));
        settings.set_active_profile("a").unwrap();

        settings.delete_profile("a");
        assert_eq!(settings.active_profile.as_deref(), Some("b"));
        assert!(settings.set_active_profile("a").is_err());
    }
}
