//! Persistent configuration

pub mod settings;

pub use settings::{ConnectionOptions, Profile, Settings};
