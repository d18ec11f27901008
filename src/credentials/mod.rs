//! Credential storage

pub mod keyring;

pub use self::keyring::{CredentialBackend, CredentialStore};
