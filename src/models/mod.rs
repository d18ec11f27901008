//! Data models for APIC requests and responses

pub mod auth;
pub mod common;
pub mod mo;
pub mod policy_group;

pub use auth::*;
pub use common::*;
pub use mo::*;
pub use policy_group::*;
