//! OS-native credential storage with file-based fallback
//!
//! APIC passwords are kept in the system keychain, keyed by profile name:
//! - Windows: Credential Manager
//! - macOS: Keychain
//! - Linux: Secret Service (GNOME Keyring, KWallet)
//!
//! Falls back to an obfuscated file if the system keyring fails.

use crate::error::{AppError, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::PathBuf;

const SERVICE_NAME: &str = "aci-policy-group";

/// Get the credentials file path
fn get_creds_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("com", "fraziersystems", "aci-policy-group")
        .map(|dirs| dirs.data_dir().join("credentials.json"))
}

/// Obfuscation key. This is NOT encryption, it only prevents casual viewing.
fn get_obfuscation_key() -> String {
    format!("{}-password-store-key", SERVICE_NAME)
}

/// Obfuscate a string (simple XOR + base64)
fn obfuscate(data: &str) -> String {
    let key = get_obfuscation_key();
    let key_bytes = key.as_bytes();
    let obfuscated: Vec<u8> = data
        .bytes()
        .enumerate()
        .map(|(i, b)| b ^ key_bytes[i % key_bytes.len()])
        .collect();
    BASE64.encode(&obfuscated)
}

/// Deobfuscate a string
fn deobfuscate(data: &str) -> Option<String> {
    let key = get_obfuscation_key();
    let key_bytes = key.as_bytes();
    let decoded = BASE64.decode(data).ok()?;
    let deobfuscated: Vec<u8> = decoded
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ key_bytes[i % key_bytes.len()])
        .collect();
    String::from_utf8(deobfuscated).ok()
}

/// Load credentials from file
fn load_file_creds() -> HashMap<String, String> {
    get_creds_file()
        .and_then(|path| fs::read_to_string(&path).ok())
        .and_then(|content| serde_json::from_str(&content).ok())
        .unwrap_or_default()
}

/// Save credentials to file, returning its path
fn save_file_creds(creds: &HashMap<String, String>) -> Result<PathBuf> {
    let path = get_creds_file()
        .ok_or_else(|| AppError::Credential("Could not determine data directory".into()))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            AppError::Credential(format!("Failed to create credentials directory: {}", e))
        })?;
    }
    let json = serde_json::to_string_pretty(creds)
        .map_err(|e| AppError::Credential(format!("Failed to serialize credentials: {}", e)))?;
    fs::write(&path, json)
        .map_err(|e| AppError::Credential(format!("Failed to write credentials file: {}", e)))?;
    tracing::debug!("Saved credentials to file: {:?}", path);
    Ok(path)
}

/// Where a stored password ended up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialBackend {
    /// System keychain
    Keyring,
    /// Obfuscated (not encrypted) file at the given path
    File(PathBuf),
}

impl fmt::Display for CredentialBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialBackend::Keyring => f.write_str("system keyring"),
            CredentialBackend::File(path) => write!(
                f,
                "{} (system keyring unavailable; obfuscated, NOT encrypted)",
                path.display()
            ),
        }
    }
}

/// Credential manager using OS keychain with file fallback
pub struct CredentialStore;

impl CredentialStore {
    /// Store the APIC password for a profile (tries keyring first, then file fallback)
    ///
    /// Returns where the password was written so callers can tell the user.
    pub fn store_password(profile_name: &str, password: &str) -> Result<CredentialBackend> {
        tracing::debug!(
            "Storing password for profile '{}' (trying keyring first)",
            profile_name
        );

        match Self::store_password_keyring(profile_name, password) {
            Ok(()) => {
                // Some backends accept writes they cannot read back
                if let Ok(Some(stored)) = Self::get_password_keyring(profile_name) {
                    if stored == password {
                        tracing::info!("Password stored in system keyring");
                        return Ok(CredentialBackend::Keyring);
                    }
                }
                tracing::warn!("Keyring store succeeded but verification failed, using file fallback");
            }
            Err(e) => tracing::warn!("Keyring store failed, using file fallback: {}", e),
        }

        Self::store_password_file(profile_name, password)
    }

    fn store_password_keyring(profile_name: &str, password: &str) -> Result<()> {
        let entry = keyring::Entry::new(SERVICE_NAME, profile_name)
            .map_err(|e| AppError::Credential(format!("Failed to create keyring entry: {}", e)))?;

        entry.set_password(password).map_err(|e| {
            AppError::Credential(format!("Failed to store password in keyring: {}", e))
        })
    }

    fn store_password_file(profile_name: &str, password: &str) -> Result<CredentialBackend> {
        tracing::warn!(
            "Storing password in FILE FALLBACK for '{}'. The system keychain is unavailable; \
             the password is only obfuscated.",
            profile_name
        );
        let mut creds = load_file_creds();
        creds.insert(profile_name.to_string(), obfuscate(password));
        let path = save_file_creds(&creds)?;
        Ok(CredentialBackend::File(path))
    }

    /// Retrieve the APIC password for a profile (tries keyring first, then file fallback)
    pub fn get_password(profile_name: &str) -> Result<Option<String>> {
        tracing::debug!("Retrieving password for profile '{}'", profile_name);

        if let Ok(Some(password)) = Self::get_password_keyring(profile_name) {
            tracing::debug!("Found password in system keyring");
            return Ok(Some(password));
        }

        Ok(Self::get_password_file(profile_name))
    }

    fn get_password_keyring(profile_name: &str) -> Result<Option<String>> {
        let entry = keyring::Entry::new(SERVICE_NAME, profile_name)
            .map_err(|e| AppError::Credential(format!("Failed to create keyring entry: {}", e)))?;

        match entry.get_password() {
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::Credential(format!(
                "Failed to retrieve password: {}",
                e
            ))),
        }
    }

    fn get_password_file(profile_name: &str) -> Option<String> {
        let found = load_file_creds()
            .get(profile_name)
            .and_then(|obfuscated| deobfuscate(obfuscated));
        if found.is_some() {
            tracing::debug!("Found password in file fallback for '{}'", profile_name);
        }
        found
    }

    /// Delete the password for a profile (from both keyring and file)
    pub fn delete_password(profile_name: &str) -> Result<()> {
        if let Err(e) = Self::delete_password_keyring(profile_name) {
            tracing::debug!("Keyring delete failed for '{}': {}", profile_name, e);
        }

        let mut creds = load_file_creds();
        if creds.remove(profile_name).is_some() {
            save_file_creds(&creds)?;
            tracing::debug!("Deleted password from file fallback for '{}'", profile_name);
        }
        Ok(())
    }

    fn delete_password_keyring(profile_name: &str) -> Result<()> {
        let entry = keyring::Entry::new(SERVICE_NAME, profile_name)
            .map_err(|e| AppError::Credential(format!("Failed to create keyring entry: {}", e)))?;

        match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(AppError::Credential(format!("Failed to delete password: {}", e))),
        }
    }

    /// Check if a password exists for a profile
    pub fn has_password(profile_name: &str) -> bool {
        matches!(Self::get_password(profile_name), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obfuscation_hides_plaintext() {
        let hidden = obfuscate("s3cret-pass");
        assert!(!hidden.contains("s3cret"));
        assert_eq!(deobfuscate(&hidden).as_deref(), Some("s3cret-pass"));
    }

    #[test]
    fn test_file_backend_is_named_with_warning() {
        let backend = CredentialBackend::File(PathBuf::from("/tmp/aci/credentials.json"));
        let shown = backend.to_string();
        assert!(shown.contains("/tmp/aci/credentials.json"));
        assert!(shown.contains("NOT encrypted"));
        assert_eq!(CredentialBackend::Keyring.to_string(), "system keyring");
    }

    #[test]
    fn test_deobfuscate_rejects_garbage() {
        assert!(deobfuscate("not base64!!").is_none());
    }
}
