//! Leaf interface policy group translation
//!
//! Maps the flat [`PolicyGroupParams`] onto one of two controller classes:
//!
//! | lag_type       | class             | rn prefix    | extra attribute |
//! |----------------|-------------------|--------------|-----------------|
//! | `leaf`         | `infraAccPortGrp` | `accportgrp` | none            |
//! | `link`, `node` | `infraAccBndlGrp` | `accbundle`  | `lagT`          |
//!
//! and drives a [`Reconciler`] through the steps required by the desired state.

use crate::aci::{ChildConfig, ConfigAttributes, Reconciler, RootClass};
use crate::error::Result;
use crate::models::{LagType, PolicyGroupParams, State, SubPolicy};

/// Container of all interface policy groups
pub const FUNCPROF_RN: &str = "infra/funcprof";

/// Which of the two controller classes a policy group maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyGroupKind {
    /// Single-port access policy group
    Leaf,
    /// Port channel or virtual port channel; carries the aggregation type
    Bundle(LagType),
}

impl PolicyGroupKind {
    pub fn from_lag_type(lag_type: LagType) -> Self {
        match lag_type {
            LagType::Leaf => PolicyGroupKind::Leaf,
            LagType::Link | LagType::Node => PolicyGroupKind::Bundle(lag_type),
        }
    }

    pub fn aci_class(&self) -> &'static str {
        match self {
            PolicyGroupKind::Leaf => "infraAccPortGrp",
            PolicyGroupKind::Bundle(_) => "infraAccBndlGrp",
        }
    }

    pub fn rn_prefix(&self) -> &'static str {
        match self {
            PolicyGroupKind::Leaf => "accportgrp",
            PolicyGroupKind::Bundle(_) => "accbundle",
        }
    }
}

/// Translated form of one policy group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyGroupPlan {
    pub kind: PolicyGroupKind,
    /// Policy group name; absent only when querying every policy group
    pub name: Option<String>,
    pub description: Option<String>,
    /// Target of each sub-policy relation, in payload order
    pub sub_policies: Vec<(SubPolicy, Option<String>)>,
}

impl PolicyGroupPlan {
    /// Translate parameters
    ///
    /// Fails with `InvalidLagType` for any discriminator other than
    /// leaf/link/node, and with `MissingParameter` when the state needs a
    /// name or lag type that was not given. A query also needs the lag type
    /// to pick the class.
    pub fn from_params(params: &PolicyGroupParams) -> Result<Self> {
        params.validate()?;

        let lag_type: LagType = match params.lag_type.as_deref() {
            Some(value) => value.parse()?,
            None => {
                return Err(crate::AppError::MissingParameter {
                    state: params.state().to_string(),
                    missing: "lag_type".into(),
                })
            }
        };

        let sub_policies = SubPolicy::ALL
            .iter()
            .map(|policy| (*policy, params.sub_policy(*policy).map(str::to_string)))
            .collect();

        Ok(Self {
            kind: PolicyGroupKind::from_lag_type(lag_type),
            name: params.policy_group.clone(),
            description: params.description.clone(),
            sub_policies,
        })
    }

    pub fn aci_class(&self) -> &'static str {
        self.kind.aci_class()
    }

    /// Relative name of the policy group within its container, e.g. `accportgrp-pg1`
    pub fn rn(&self) -> Option<String> {
        self.name
            .as_ref()
            .map(|name| format!("{}-{}", self.kind.rn_prefix(), name))
    }

    /// Relative name below `uni/`, e.g. `infra/funcprof/accportgrp-pg1`
    pub fn full_rn(&self) -> Option<String> {
        self.rn().map(|rn| format!("{}/{}", FUNCPROF_RN, rn))
    }

    /// Distinguished name, e.g. `uni/infra/funcprof/accportgrp-pg1`
    pub fn dn(&self) -> Option<String> {
        self.full_rn().map(|rn| format!("uni/{}", rn))
    }

    /// Filter used when reading by class rather than by dn
    ///
    /// Named lookups match on name; an unnamed bundle query narrows to the
    /// requested aggregation type.
    pub fn filter_target(&self) -> Option<String> {
        let class = self.aci_class();
        match (&self.name, self.kind) {
            (Some(name), _) => Some(format!("eq({}.name, \"{}\")", class, name)),
            (None, PolicyGroupKind::Bundle(lag_type)) => {
                Some(format!("eq({}.lagT, \"{}\")", class, lag_type))
            }
            (None, PolicyGroupKind::Leaf) => None,
        }
    }

    pub fn root_class(&self) -> RootClass {
        RootClass {
            aci_class: self.aci_class().to_string(),
            aci_rn: self.full_rn(),
            filter_target: self.filter_target(),
            module_object: self.name.clone(),
        }
    }

    /// Attributes of the policy group itself
    pub fn class_config(&self) -> ConfigAttributes {
        let mut config = ConfigAttributes::new();
        config.insert("name".into(), self.name.clone());
        config.insert("descr".into(), self.description.clone());
        if let PolicyGroupKind::Bundle(lag_type) = self.kind {
            config.insert("lagT".into(), Some(lag_type.to_string()));
        }
        config
    }

    /// One entry per sub-policy relation, unset targets included
    pub fn child_configs(&self) -> Vec<ChildConfig> {
        self.sub_policies
            .iter()
            .map(|(policy, target)| {
                ChildConfig::single(
                    policy.relation_class(),
                    policy.target_attribute(),
                    target.as_deref().map(|name| policy.target_value(name)),
                )
            })
            .collect()
    }
}

/// Converge the controller towards the parameters
///
/// Reads the existing object for every state; `present` then stages, diffs
/// and posts, `absent` deletes, and `query` stops after the read.
pub async fn apply<R: Reconciler>(params: &PolicyGroupParams, aci: &mut R) -> Result<()> {
    let plan = PolicyGroupPlan::from_params(params)?;
    let aci_class = plan.aci_class();

    tracing::debug!(
        "Managing {} {:?} (state={})",
        aci_class,
        plan.name,
        params.state()
    );

    aci.construct_url(plan.root_class(), &SubPolicy::relation_classes(), params.state());
    aci.get_existing().await?;

    match params.state() {
        State::Present => {
            aci.payload(aci_class, &plan.class_config(), &plan.child_configs());
            aci.get_diff(aci_class);
            aci.post_config().await?;
        }
        State::Absent => {
            aci.delete_config().await?;
        }
        State::Query => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApiResult, AppError};
    use async_trait::async_trait;

    fn params(lag_type: &str) -> PolicyGroupParams {
        PolicyGroupParams {
            policy_group: Some("pg1".into()),
            lag_type: Some(lag_type.into()),
            link_level_policy: Some("llp1".into()),
            state: Some(State::Present),
            ..Default::default()
        }
    }

    #[test]
    fn test_leaf_variant() {
        let plan = PolicyGroupPlan::from_params(&params("leaf")).unwrap();

        assert_eq!(plan.kind, PolicyGroupKind::Leaf);
        assert_eq!(plan.aci_class(), "infraAccPortGrp");
        assert_eq!(plan.rn().as_deref(), Some("accportgrp-pg1"));

        let config = plan.class_config();
        assert_eq!(config.len(), 2);
        assert_eq!(config["name"].as_deref(), Some("pg1"));
        assert_eq!(config["descr"], None);
        assert!(!config.contains_key("lagT"));

        let set: Vec<_> = plan.child_configs().into_iter().filter(ChildConfig::has_value).collect();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].class, "infraRsHIfPol");
        assert_eq!(set[0].attributes["tnFabricHIfPolName"].as_deref(), Some("llp1"));
    }

    #[test]
    fn test_bundle_variants() {
        for lag in ["link", "node"] {
            let plan = PolicyGroupPlan::from_params(&params(lag)).unwrap();
            assert_eq!(plan.aci_class(), "infraAccBndlGrp");
            assert_eq!(plan.rn().as_deref(), Some("accbundle-pg1"));
            assert_eq!(plan.class_config()["lagT"].as_deref(), Some(lag));
        }
    }

    #[test]
    fn test_invalid_lag_type_is_rejected() {
        let err = PolicyGroupPlan::from_params(&params("vpc")).unwrap_err();
        assert!(matches!(err, AppError::InvalidLagType(t) if t == "vpc"));
    }

    #[test]
    fn test_paths_keep_name_verbatim() {
        let mut p = params("leaf");
        p.policy_group = Some("web servers/1".into());
        let plan = PolicyGroupPlan::from_params(&p).unwrap();
        assert_eq!(plan.rn().as_deref(), Some("accportgrp-web servers/1"));
        assert_eq!(
            plan.dn().as_deref(),
            Some("uni/infra/funcprof/accportgrp-web servers/1")
        );
    }

    #[test]
    fn test_aep_is_referenced_by_dn() {
        for lag in ["leaf", "link", "node"] {
            let mut p = params(lag);
            p.aep = Some("aep1".into());
            let plan = PolicyGroupPlan::from_params(&p).unwrap();
            let aep = plan
                .child_configs()
                .into_iter()
                .find(|c| c.class == "infraRsAttEntP")
                .unwrap();
            assert_eq!(aep.attributes["tDn"].as_deref(), Some("uni/infra/attentp-aep1"));
        }
    }

    #[test]
    fn test_all_sub_policies_omitted() {
        let p = PolicyGroupParams {
            policy_group: Some("pg1".into()),
            lag_type: Some("leaf".into()),
            ..Default::default()
        };
        let plan = PolicyGroupPlan::from_params(&p).unwrap();
        let children = plan.child_configs();
        assert_eq!(children.len(), 16);
        assert!(children.iter().all(|c| !c.has_value()));
    }

    #[test]
    fn test_root_class() {
        let root = PolicyGroupPlan::from_params(&params("node")).unwrap().root_class();
        assert_eq!(root.aci_rn.as_deref(), Some("infra/funcprof/accbundle-pg1"));
        assert_eq!(
            root.filter_target.as_deref(),
            Some(r#"eq(infraAccBndlGrp.name, "pg1")"#)
        );
        assert_eq!(root.module_object.as_deref(), Some("pg1"));

        let query_all = PolicyGroupParams {
            lag_type: Some("link".into()),
            state: Some(State::Query),
            ..Default::default()
        };
        let root = PolicyGroupPlan::from_params(&query_all).unwrap().root_class();
        assert_eq!(root.aci_rn, None);
        assert_eq!(root.filter_target.as_deref(), Some(r#"eq(infraAccBndlGrp.lagT, "link")"#));
    }

    #[test]
    fn test_query_needs_lag_type() {
        let p = PolicyGroupParams {
            policy_group: Some("pg1".into()),
            state: Some(State::Query),
            ..Default::default()
        };
        assert!(matches!(
            PolicyGroupPlan::from_params(&p),
            Err(AppError::MissingParameter { .. })
        ));
    }

    /// Records which reconciliation steps were taken
    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        state: Option<State>,
        root: Option<RootClass>,
        child_classes: Vec<String>,
        class_config: Option<ConfigAttributes>,
        child_configs: Vec<ChildConfig>,
    }

    #[async_trait]
    impl Reconciler for Recorder {
        fn construct_url(&mut self, root: RootClass, child_classes: &[&str], state: State) {
            self.calls.push("construct_url");
            self.state = Some(state);
            self.root = Some(root);
            self.child_classes = child_classes.iter().map(|c| c.to_string()).collect();
        }

        async fn get_existing(&mut self) -> ApiResult<()> {
            self.calls.push("get_existing");
            Ok(())
        }

        fn payload(&mut self, _aci_class: &str, class_config: &ConfigAttributes, child_configs: &[ChildConfig]) {
            self.calls.push("payload");
            self.class_config = Some(class_config.clone());
            self.child_configs = child_configs.to_vec();
        }

        fn get_diff(&mut self, _aci_class: &str) {
            self.calls.push("get_diff");
        }

        async fn post_config(&mut self) -> ApiResult<()> {
            self.calls.push("post_config");
            Ok(())
        }

        async fn delete_config(&mut self) -> ApiResult<()> {
            self.calls.push("delete_config");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_present_posts_and_never_deletes() {
        let mut recorder = Recorder::default();
        apply(&params("leaf"), &mut recorder).await.unwrap();

        assert_eq!(
            recorder.calls,
            vec!["construct_url", "get_existing", "payload", "get_diff", "post_config"]
        );
        assert_eq!(recorder.child_classes.len(), 16);
        assert_eq!(
            recorder.root.unwrap().aci_rn.as_deref(),
            Some("infra/funcprof/accportgrp-pg1")
        );
        assert_eq!(recorder.child_configs.len(), 16);
    }

    #[tokio::test]
    async fn test_present_bundle_payload() {
        let mut recorder = Recorder::default();
        let mut p = params("node");
        p.link_level_policy = None;
        apply(&p, &mut recorder).await.unwrap();

        let config = recorder.class_config.unwrap();
        assert_eq!(config["lagT"].as_deref(), Some("node"));
        assert!(recorder.child_configs.iter().all(|c| !c.has_value()));
    }

    #[tokio::test]
    async fn test_absent_deletes_and_never_posts() {
        let p = PolicyGroupParams {
            policy_group: Some("pg1".into()),
            lag_type: Some("leaf".into()),
            state: Some(State::Absent),
            ..Default::default()
        };
        let mut recorder = Recorder::default();
        apply(&p, &mut recorder).await.unwrap();

        assert_eq!(recorder.calls, vec!["construct_url", "get_existing", "delete_config"]);
        assert_eq!(recorder.state, Some(State::Absent));
    }

    #[tokio::test]
    async fn test_query_only_reads() {
        let p = PolicyGroupParams {
            lag_type: Some("leaf".into()),
            state: Some(State::Query),
            ..Default::default()
        };
        let mut recorder = Recorder::default();
        apply(&p, &mut recorder).await.unwrap();

        assert_eq!(recorder.calls, vec!["construct_url", "get_existing"]);
        assert_eq!(recorder.state, Some(State::Query));
    }

    #[tokio::test]
    async fn test_invalid_input_touches_nothing() {
        let mut recorder = Recorder::default();
        assert!(apply(&params("bogus"), &mut recorder).await.is_err());
        assert!(recorder.calls.is_empty());
    }
}
