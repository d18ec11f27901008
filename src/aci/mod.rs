//! Controller-side reconciliation
//!
//! [`Reconciler`] is the contract the policy group logic drives: address an
//! object, read what exists, stage the desired document, diff it, then write or
//! delete. [`AciModule`] implements it against a live APIC.

pub mod diff;
pub mod module;
pub mod result;

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::error::ApiResult;
use crate::models::State;

pub use module::{AciModule, ModuleOptions};
pub use result::{AciResult, FailureReport, OutputLevel, ResultDiff};

/// Desired attributes of an object. `None` values are left out of the payload.
pub type ConfigAttributes = BTreeMap<String, Option<String>>;

/// Desired configuration of one child relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildConfig {
    pub class: String,
    pub attributes: ConfigAttributes,
}

impl ChildConfig {
    /// Child with a single attribute
    pub fn single(class: &str, key: &str, value: Option<String>) -> Self {
        let mut attributes = ConfigAttributes::new();
        attributes.insert(key.to_string(), value);
        Self {
            class: class.to_string(),
            attributes,
        }
    }

    /// True when at least one attribute has a value
    pub fn has_value(&self) -> bool {
        self.attributes.values().any(Option::is_some)
    }
}

/// Description of the root object being managed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootClass {
    /// Class name, e.g. `infraAccPortGrp`
    pub aci_class: String,
    /// Relative name below `uni/`, when the object is named
    pub aci_rn: Option<String>,
    /// Filter for class-level queries
    pub filter_target: Option<String>,
    /// Name of the object, `None` when querying all objects of the class
    pub module_object: Option<String>,
}

/// Reconciliation steps against the controller
#[async_trait]
pub trait Reconciler: Send {
    /// Address the root object and the child classes eligible for comparison
    ///
    /// `state` is the desired state of this invocation; it decides how the
    /// object is read and what the result reports.
    fn construct_url(&mut self, root: RootClass, child_classes: &[&str], state: State);

    /// Fetch the current state of the addressed object
    async fn get_existing(&mut self) -> ApiResult<()>;

    /// Stage the desired document
    fn payload(&mut self, aci_class: &str, class_config: &ConfigAttributes, child_configs: &[ChildConfig]);

    /// Compute the delta between the staged document and the existing state
    fn get_diff(&mut self, aci_class: &str);

    /// Submit the delta, if any
    async fn post_config(&mut self) -> ApiResult<()>;

    /// Remove the addressed object
    async fn delete_config(&mut self) -> ApiResult<()>;
}
