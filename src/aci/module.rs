//! APIC-backed reconciler

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde_json::json;

use super::diff::{build_proposed, compute_diff};
use super::result::{AciResult, OutputLevel, ResultDiff};
use super::{ChildConfig, ConfigAttributes, Reconciler, RootClass};
use crate::api::endpoints::{class_path, mo_path};
use crate::api::{ApicClient, ApicResponse, MoQuery};
use crate::error::{ApiError, ApiResult};
use crate::models::{ManagedObject, State};

/// Invocation-wide switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModuleOptions {
    /// Report would-be changes without writing
    pub check_mode: bool,
    /// Include before/after in the result
    pub diff_mode: bool,
    pub output_level: OutputLevel,
}

/// Reconciler that talks to a live controller
pub struct AciModule {
    client: ApicClient,
    options: ModuleOptions,
    /// Desired state, set when the object is addressed
    state: State,
    /// Object URL used for writes
    url: Option<Url>,
    /// URL including the read filter
    query_url: Option<Url>,
    /// Object state as last read from the controller
    existing: Vec<ManagedObject>,
    /// Object state before any change
    previous: Vec<ManagedObject>,
    proposed: Option<ManagedObject>,
    config: Option<ManagedObject>,
    method: Option<Method>,
    response: Option<String>,
    status: Option<u16>,
    changed: bool,
}

impl AciModule {
    pub fn new(client: ApicClient, options: ModuleOptions) -> Self {
        Self {
            client,
            options,
            state: State::default(),
            url: None,
            query_url: None,
            existing: Vec::new(),
            previous: Vec::new(),
            proposed: None,
            config: None,
            method: None,
            response: None,
            status: None,
            changed: false,
        }
    }

    fn object_url(&self) -> ApiResult<&Url> {
        self.url
            .as_ref()
            .ok_or_else(|| ApiError::InvalidUrl("no object addressed, call construct_url first".into()))
    }

    fn record(&mut self, method: Method, response: &ApicResponse) {
        self.method = Some(method);
        self.status = Some(response.status);
        self.response = Some(format!("{} ({})", response.reason, response.status));
    }

    async fn fetch(&mut self) -> ApiResult<Vec<ManagedObject>> {
        let url = self
            .query_url
            .clone()
            .ok_or_else(|| ApiError::InvalidUrl("no object addressed, call construct_url first".into()))?;

        let response = self.client.get(&url).await?;
        self.record(Method::GET, &response);
        Ok(response.data.imdata)
    }

    /// Object state the controller would hold if a dry run had been applied
    fn predicted(&self) -> Vec<ManagedObject> {
        match self.state {
            State::Absent => Vec::new(),
            _ => self.proposed.iter().cloned().collect(),
        }
    }

    /// Build the invocation result
    pub fn exit_json(self) -> AciResult {
        let as_value = |mo: &Option<ManagedObject>| {
            mo.as_ref()
                .map(|mo| serde_json::to_value(mo).unwrap_or_default())
                .unwrap_or_else(|| json!({}))
        };

        let mut result = AciResult {
            changed: self.changed,
            current: self.existing.clone(),
            ..Default::default()
        };

        if self.state.is_change() {
            if self.options.output_level != OutputLevel::Normal {
                result.previous = Some(self.previous.clone());
            }
            result.proposed = Some(as_value(&self.proposed));
            result.sent = Some(as_value(&self.config));
        }

        if self.options.output_level == OutputLevel::Debug {
            result.filter_string = self
                .query_url
                .as_ref()
                .and_then(Url::query)
                .map(|q| format!("?{}", q));
            result.method = self.method.as_ref().map(|m| m.as_str().to_string());
            result.response = self.response.clone();
            result.status = self.status;
            result.url = self.url.as_ref().map(|u| u.as_str().to_string());
        }

        if self.options.diff_mode && self.changed {
            let after = if self.options.check_mode {
                self.predicted()
            } else {
                self.existing.clone()
            };
            result.diff = Some(ResultDiff {
                before: self.previous.clone(),
                after,
            });
        }

        result
    }
}

#[async_trait]
impl Reconciler for AciModule {
    fn construct_url(&mut self, root: RootClass, child_classes: &[&str], state: State) {
        self.state = state;

        let path = match (&root.module_object, &root.aci_rn) {
            (Some(_), Some(rn)) => mo_path(rn),
            _ => class_path(&root.aci_class),
        };

        let mut query = MoQuery::new().subtree_classes(child_classes);
        if state.is_change() {
            query = query.config_only();
        } else if root.module_object.is_none() {
            query = query.target_filter(root.filter_target.clone());
        }

        let url = self.client.url(&path, &MoQuery::new());
        let query_url = self.client.url(&path, &query);
        tracing::debug!("Addressing {} (read via {})", url, query_url);

        self.url = Some(url);
        self.query_url = Some(query_url);
    }

    async fn get_existing(&mut self) -> ApiResult<()> {
        let existing = self.fetch().await?;
        tracing::info!("Found {} existing object(s)", existing.len());
        self.previous = existing.clone();
        self.existing = existing;
        Ok(())
    }

    fn payload(&mut self, aci_class: &str, class_config: &ConfigAttributes, child_configs: &[ChildConfig]) {
        self.proposed = Some(build_proposed(aci_class, class_config, child_configs));
    }

    fn get_diff(&mut self, aci_class: &str) {
        let existing = self.existing.iter().find(|mo| mo.class == aci_class);
        self.config = self
            .proposed
            .as_ref()
            .and_then(|proposed| compute_diff(proposed, existing));
    }

    async fn post_config(&mut self) -> ApiResult<()> {
        let Some(config) = self.config.clone() else {
            tracing::info!("Object is up to date, nothing to post");
            return Ok(());
        };

        self.changed = true;
        if self.options.check_mode {
            tracing::info!("Check mode: skipping POST");
            self.method = Some(Method::POST);
            return Ok(());
        }

        let url = self.object_url()?.clone();
        let response = self.client.post(&url, &config).await?;
        tracing::info!("Posted changes to {}", url);

        let current = self.fetch().await?;
        self.existing = current;
        // Report the write, not the follow-up read
        self.record(Method::POST, &response);
        Ok(())
    }

    async fn delete_config(&mut self) -> ApiResult<()> {
        self.proposed = None;
        if self.existing.is_empty() {
            tracing::info!("Object does not exist, nothing to delete");
            return Ok(());
        }

        self.changed = true;
        if self.options.check_mode {
            tracing::info!("Check mode: skipping DELETE");
            self.method = Some(Method::DELETE);
            return Ok(());
        }

        let url = self.object_url()?.clone();
        let response = self.client.delete(&url).await?;
        self.record(Method::DELETE, &response);
        tracing::info!("Deleted {}", url);
        self.existing.clear();
        Ok(())
    }
}
