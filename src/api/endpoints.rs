//! REST API endpoints for APIC

/// API endpoint paths
pub mod paths {
    // Authentication
    pub const AAA_LOGIN: &str = "/api/aaaLogin.json";
    pub const AAA_REFRESH: &str = "/api/aaaRefresh.json";
    pub const AAA_LOGOUT: &str = "/api/aaaLogout.json";

    // Controller firmware
    pub const FIRMWARE_RUNNING: &str = "/api/node/class/firmwareCtrlrRunning.json";
}

/// Build path for a managed object below `uni/`
pub fn mo_path(rn: &str) -> String {
    format!("/api/mo/uni/{}.json", rn)
}

/// Build path for a class query
pub fn class_path(aci_class: &str) -> String {
    format!("/api/class/{}.json", aci_class)
}

/// Query string options for object and class reads
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MoQuery {
    pub rsp_prop_include: Option<String>,
    pub rsp_subtree: Option<String>,
    pub rsp_subtree_class: Option<String>,
    pub query_target_filter: Option<String>,
}

impl MoQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only return configurable properties
    pub fn config_only(mut self) -> Self {
        self.rsp_prop_include = Some("config-only".into());
        self
    }

    /// Include the full subtree restricted to the given child classes
    pub fn subtree_classes(mut self, classes: &[&str]) -> Self {
        if !classes.is_empty() {
            self.rsp_subtree = Some("full".into());
            self.rsp_subtree_class = Some(classes.join(","));
        }
        self
    }

    /// Filter class query results
    pub fn target_filter(mut self, filter: Option<String>) -> Self {
        self.query_target_filter = filter;
        self
    }

    /// Query pairs in the order APIC documents them
    pub fn pairs(&self) -> Vec<(&'static str, &str)> {
        [
            ("rsp-prop-include", &self.rsp_prop_include),
            ("query-target-filter", &self.query_target_filter),
            ("rsp-subtree", &self.rsp_subtree),
            ("rsp-subtree-class", &self.rsp_subtree_class),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.as_deref().map(|v| (key, v)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(
            mo_path("infra/funcprof/accportgrp-pg1"),
            "/api/mo/uni/infra/funcprof/accportgrp-pg1.json"
        );
        assert_eq!(class_path("infraAccBndlGrp"), "/api/class/infraAccBndlGrp.json");
    }

    #[test]
    fn test_query_pairs() {
        let query = MoQuery::new()
            .config_only()
            .subtree_classes(&["infraRsHIfPol", "infraRsCdpIfPol"]);

        assert_eq!(
            query.pairs(),
            vec![
                ("rsp-prop-include", "config-only"),
                ("rsp-subtree", "full"),
                ("rsp-subtree-class", "infraRsHIfPol,infraRsCdpIfPol"),
            ]
        );
        assert!(MoQuery::new().subtree_classes(&[]).is_empty());
    }
}
