//! Policy group parameters and vocabulary
//!
//! The flat option set accepted for a leaf interface policy group, along with
//! the discriminator (`lag_type`), the desired state, and the table of the 16
//! sub-policy relations a policy group may carry.

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, Result};

/// Link aggregation type selecting the policy group variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LagType {
    /// Leaf access port policy group (`infraAccPortGrp`)
    Leaf,
    /// Port channel (`infraAccBndlGrp`, lagT=link)
    Link,
    /// Virtual port channel (`infraAccBndlGrp`, lagT=node)
    Node,
}

impl LagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LagType::Leaf => "leaf",
            LagType::Link => "link",
            LagType::Node => "node",
        }
    }
}

impl FromStr for LagType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "leaf" => Ok(LagType::Leaf),
            "link" => Ok(LagType::Link),
            "node" => Ok(LagType::Node),
            other => Err(AppError::InvalidLagType(other.to_string())),
        }
    }
}

impl fmt::Display for LagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired state of the policy group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum State {
    /// Create or update
    #[default]
    Present,
    /// Delete
    Absent,
    /// Read only
    Query,
}

impl State {
    pub fn as_str(&self) -> &'static str {
        match self {
            State::Present => "present",
            State::Absent => "absent",
            State::Query => "query",
        }
    }

    /// True for the states that may change the controller
    pub fn is_change(&self) -> bool {
        matches!(self, State::Present | State::Absent)
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sub-policy relation of the policy group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubPolicy {
    Monitoring,
    Lldp,
    FibreChannel,
    PortChannel,
    PortSecurity,
    LinkLevel,
    PriorityFlowControl,
    Stp,
    IngressDataPlanePolicing,
    StormControl,
    EgressDataPlanePolicing,
    SlowDrain,
    Mcp,
    Cdp,
    L2Interface,
    AttachedEntityProfile,
}

impl SubPolicy {
    /// All relations in payload order
    pub const ALL: [SubPolicy; 16] = [
        SubPolicy::Monitoring,
        SubPolicy::Lldp,
        SubPolicy::FibreChannel,
        SubPolicy::PortChannel,
        SubPolicy::PortSecurity,
        SubPolicy::LinkLevel,
        SubPolicy::PriorityFlowControl,
        SubPolicy::Stp,
        SubPolicy::IngressDataPlanePolicing,
        SubPolicy::StormControl,
        SubPolicy::EgressDataPlanePolicing,
        SubPolicy::SlowDrain,
        SubPolicy::Mcp,
        SubPolicy::Cdp,
        SubPolicy::L2Interface,
        SubPolicy::AttachedEntityProfile,
    ];

    /// Relation class on the controller
    pub fn relation_class(&self) -> &'static str {
        match self {
            SubPolicy::Monitoring => "infraRsMonIfInfraPol",
            SubPolicy::Lldp => "infraRsLldpIfPol",
            SubPolicy::FibreChannel => "infraRsFcIfPol",
            SubPolicy::PortChannel => "infraRsLacpPol",
            SubPolicy::PortSecurity => "infraRsL2PortSecurityPol",
            SubPolicy::LinkLevel => "infraRsHIfPol",
            SubPolicy::PriorityFlowControl => "infraRsQosPfcIfPol",
            SubPolicy::Stp => "infraRsStpIfPol",
            SubPolicy::IngressDataPlanePolicing => "infraRsQosIngressDppIfPol",
            SubPolicy::StormControl => "infraRsStormctrlIfPol",
            SubPolicy::EgressDataPlanePolicing => "infraRsQosEgressDppIfPol",
            SubPolicy::SlowDrain => "infraRsQosSdIfPol",
            SubPolicy::Mcp => "infraRsMcpIfPol",
            SubPolicy::Cdp => "infraRsCdpIfPol",
            SubPolicy::L2Interface => "infraRsL2IfPol",
            SubPolicy::AttachedEntityProfile => "infraRsAttEntP",
        }
    }

    /// Attribute of the relation that names its target
    pub fn target_attribute(&self) -> &'static str {
        match self {
            SubPolicy::Monitoring => "tnMonInfraPolName",
            SubPolicy::Lldp => "tnLldpIfPolName",
            SubPolicy::FibreChannel => "tnFcIfPolName",
            SubPolicy::PortChannel => "tnLacpLagPolName",
            SubPolicy::PortSecurity => "tnL2PortSecurityPolName",
            SubPolicy::LinkLevel => "tnFabricHIfPolName",
            SubPolicy::PriorityFlowControl => "tnQosPfcIfPolName",
            SubPolicy::Stp => "tnStpIfPolName",
            SubPolicy::IngressDataPlanePolicing | SubPolicy::EgressDataPlanePolicing => {
                "tnQosDppPolName"
            }
            SubPolicy::StormControl => "tnStormctrlIfPolName",
            SubPolicy::SlowDrain => "tnQosSdIfPolName",
            SubPolicy::Mcp => "tnMcpIfPolName",
            SubPolicy::Cdp => "tnCdpIfPolName",
            SubPolicy::L2Interface => "tnL2IfPolName",
            SubPolicy::AttachedEntityProfile => "tDn",
        }
    }

    /// Value of the target attribute for the given policy name
    ///
    /// The attached entity profile is referenced by dn, every other relation
    /// by bare name.
    pub fn target_value(&self, name: &str) -> String {
        match self {
            SubPolicy::AttachedEntityProfile => format!("uni/infra/attentp-{}", name),
            _ => name.to_string(),
        }
    }

    /// Relation classes of all sub-policies, in payload order
    pub fn relation_classes() -> Vec<&'static str> {
        Self::ALL.iter().map(SubPolicy::relation_class).collect()
    }
}

/// Flat parameters describing one policy group
///
/// Usable both as CLI flags and as a JSON params file. Option aliases follow
/// the `<option>_name` convention of the controller's other tooling.
#[derive(Args, Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PolicyGroupParams {
    /// Name of the leaf policy group
    #[arg(long, aliases = ["name", "policy-group-name"])]
    #[serde(default, alias = "name", alias = "policy_group_name")]
    pub policy_group: Option<String>,

    /// Description of the leaf policy group
    #[arg(long, alias = "descr")]
    #[serde(default, alias = "descr")]
    pub description: Option<String>,

    /// Policy group type: leaf (access port), link (PC) or node (VPC)
    #[arg(long, alias = "lag-type-name")]
    #[serde(default, alias = "lag_type_name")]
    pub lag_type: Option<String>,

    /// Link level policy
    #[arg(long, alias = "link-level-policy-name")]
    #[serde(default, alias = "link_level_policy_name")]
    pub link_level_policy: Option<String>,

    /// CDP interface policy
    #[arg(long, alias = "cdp-policy-name")]
    #[serde(default, alias = "cdp_policy_name")]
    pub cdp_policy: Option<String>,

    /// MCP interface policy
    #[arg(long, alias = "mcp-policy-name")]
    #[serde(default, alias = "mcp_policy_name")]
    pub mcp_policy: Option<String>,

    /// LLDP interface policy
    #[arg(long, alias = "lldp-policy-name")]
    #[serde(default, alias = "lldp_policy_name")]
    pub lldp_policy: Option<String>,

    /// Spanning tree interface policy
    #[arg(long, alias = "stp-interface-policy-name")]
    #[serde(default, alias = "stp_interface_policy_name")]
    pub stp_interface_policy: Option<String>,

    /// Egress data plane policing policy
    #[arg(long, alias = "egress-data-plane-policing-policy-name")]
    #[serde(default, alias = "egress_data_plane_policing_policy_name")]
    pub egress_data_plane_policing_policy: Option<String>,

    /// Ingress data plane policing policy
    #[arg(long, alias = "ingress-data-plane-policing-policy-name")]
    #[serde(default, alias = "ingress_data_plane_policing_policy_name")]
    pub ingress_data_plane_policing_policy: Option<String>,

    /// Priority flow control policy
    #[arg(long, alias = "priority-flow-control-policy-name")]
    #[serde(default, alias = "priority_flow_control_policy_name")]
    pub priority_flow_control_policy: Option<String>,

    /// Fibre channel interface policy
    #[arg(long, alias = "fibre-channel-interface-policy-name")]
    #[serde(default, alias = "fibre_channel_interface_policy_name")]
    pub fibre_channel_interface_policy: Option<String>,

    /// Slow drain policy
    #[arg(long, alias = "slow-drain-policy-name")]
    #[serde(default, alias = "slow_drain_policy_name")]
    pub slow_drain_policy: Option<String>,

    /// Port channel (LACP) policy
    #[arg(long, alias = "port-channel-policy-name")]
    #[serde(default, alias = "port_channel_policy_name")]
    pub port_channel_policy: Option<String>,

    /// Monitoring policy
    #[arg(long, alias = "monitoring-policy-name")]
    #[serde(default, alias = "monitoring_policy_name")]
    pub monitoring_policy: Option<String>,

    /// Storm control interface policy
    #[arg(long, alias = "storm-control-interface-policy-name")]
    #[serde(default, alias = "storm_control_interface_policy_name")]
    pub storm_control_interface_policy: Option<String>,

    /// L2 interface policy
    #[arg(long, alias = "l2-interface-policy-name")]
    #[serde(default, alias = "l2_interface_policy_name")]
    pub l2_interface_policy: Option<String>,

    /// Port security policy
    #[arg(long, alias = "port-security-policy-name")]
    #[serde(default, alias = "port_security_policy_name")]
    pub port_security_policy: Option<String>,

    /// Attached entity profile (AEP)
    #[arg(long, alias = "aep-name")]
    #[serde(default, alias = "aep_name")]
    pub aep: Option<String>,

    /// Desired state [default: present]
    #[arg(long, value_enum)]
    #[serde(default)]
    pub state: Option<State>,
}

impl PolicyGroupParams {
    /// Effective state (defaults to present)
    pub fn state(&self) -> State {
        self.state.unwrap_or_default()
    }

    /// Configured target name for a sub-policy relation
    pub fn sub_policy(&self, policy: SubPolicy) -> Option<&str> {
        let value = match policy {
            SubPolicy::Monitoring => &self.monitoring_policy,
            SubPolicy::Lldp => &self.lldp_policy,
            SubPolicy::FibreChannel => &self.fibre_channel_interface_policy,
            SubPolicy::PortChannel => &self.port_channel_policy,
            SubPolicy::PortSecurity => &self.port_security_policy,
            SubPolicy::LinkLevel => &self.link_level_policy,
            SubPolicy::PriorityFlowControl => &self.priority_flow_control_policy,
            SubPolicy::Stp => &self.stp_interface_policy,
            SubPolicy::IngressDataPlanePolicing => &self.ingress_data_plane_policing_policy,
            SubPolicy::StormControl => &self.storm_control_interface_policy,
            SubPolicy::EgressDataPlanePolicing => &self.egress_data_plane_policing_policy,
            SubPolicy::SlowDrain => &self.slow_drain_policy,
            SubPolicy::Mcp => &self.mcp_policy,
            SubPolicy::Cdp => &self.cdp_policy,
            SubPolicy::L2Interface => &self.l2_interface_policy,
            SubPolicy::AttachedEntityProfile => &self.aep,
        };
        value.as_deref()
    }

    /// Overlay `overrides` on top of these parameters (set values win)
    pub fn merge(self, overrides: PolicyGroupParams) -> PolicyGroupParams {
        PolicyGroupParams {
            policy_group: overrides.policy_group.or(self.policy_group),
            description: overrides.description.or(self.description),
            lag_type: overrides.lag_type.or(self.lag_type),
            link_level_policy: overrides.link_level_policy.or(self.link_level_policy),
            cdp_policy: overrides.cdp_policy.or(self.cdp_policy),
            mcp_policy: overrides.mcp_policy.or(self.mcp_policy),
            lldp_policy: overrides.lldp_policy.or(self.lldp_policy),
            stp_interface_policy: overrides.stp_interface_policy.or(self.stp_interface_policy),
            egress_data_plane_policing_policy: overrides
                .egress_data_plane_policing_policy
                .or(self.egress_data_plane_policing_policy),
            ingress_data_plane_policing_policy: overrides
                .ingress_data_plane_policing_policy
                .or(self.ingress_data_plane_policing_policy),
            priority_flow_control_policy: overrides
                .priority_flow_control_policy
                .or(self.priority_flow_control_policy),
            fibre_channel_interface_policy: overrides
                .fibre_channel_interface_policy
                .or(self.fibre_channel_interface_policy),
            slow_drain_policy: overrides.slow_drain_policy.or(self.slow_drain_policy),
            port_channel_policy: overrides.port_channel_policy.or(self.port_channel_policy),
            monitoring_policy: overrides.monitoring_policy.or(self.monitoring_policy),
            storm_control_interface_policy: overrides
                .storm_control_interface_policy
                .or(self.storm_control_interface_policy),
            l2_interface_policy: overrides.l2_interface_policy.or(self.l2_interface_policy),
            port_security_policy: overrides.port_security_policy.or(self.port_security_policy),
            aep: overrides.aep.or(self.aep),
            state: overrides.state.or(self.state),
        }
    }

    /// Check the options required by the selected state
    ///
    /// `present` and `absent` need both a name and a lag type.
    pub fn validate(&self) -> Result<()> {
        let state = self.state();
        if !state.is_change() {
            return Ok(());
        }

        let mut missing = Vec::new();
        if self.policy_group.is_none() {
            missing.push("policy_group");
        }
        if self.lag_type.is_none() {
            missing.push("lag_type");
        }

        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::MissingParameter {
                state: state.to_string(),
                missing: missing.join(", "),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lag_type_parse() {
        assert_eq!("leaf".parse::<LagType>().unwrap(), LagType::Leaf);
        assert_eq!("link".parse::<LagType>().unwrap(), LagType::Link);
        assert_eq!("node".parse::<LagType>().unwrap(), LagType::Node);
        assert!(matches!(
            "vpc".parse::<LagType>(),
            Err(AppError::InvalidLagType(t)) if t == "vpc"
        ));
        // Case matters, as on the controller
        assert!("Leaf".parse::<LagType>().is_err());
    }

    #[test]
    fn test_relation_table_is_complete() {
        let classes = SubPolicy::relation_classes();
        assert_eq!(classes.len(), 16);

        let mut unique = classes.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 16);
    }

    #[test]
    fn test_aep_target_is_dn() {
        let aep = SubPolicy::AttachedEntityProfile;
        assert_eq!(aep.target_attribute(), "tDn");
        assert_eq!(aep.target_value("aep1"), "uni/infra/attentp-aep1");
        assert_eq!(SubPolicy::Cdp.target_value("cdp1"), "cdp1");
    }

    #[test]
    fn test_validate_required_if() {
        let params = PolicyGroupParams {
            lag_type: Some("leaf".into()),
            ..Default::default()
        };
        let err = params.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "state is present but all of the following are missing: policy_group"
        );

        let query = PolicyGroupParams {
            state: Some(State::Query),
            ..Default::default()
        };
        assert!(query.validate().is_ok());

        let absent = PolicyGroupParams {
            state: Some(State::Absent),
            ..Default::default()
        };
        assert!(matches!(
            absent.validate(),
            Err(AppError::MissingParameter { missing, .. }) if missing == "policy_group, lag_type"
        ));
    }

    #[test]
    fn test_params_file_aliases() {
        let json = r#"{"name": "pg1", "descr": "web", "lag_type_name": "node", "aep_name": "aep1", "state": "absent"}"#;
        let params: PolicyGroupParams = serde_json::from_str(json).unwrap();

        assert_eq!(params.policy_group.as_deref(), Some("pg1"));
        assert_eq!(params.description.as_deref(), Some("web"));
        assert_eq!(params.lag_type.as_deref(), Some("node"));
        assert_eq!(params.sub_policy(SubPolicy::AttachedEntityProfile), Some("aep1"));
        assert_eq!(params.state(), State::Absent);
    }

    #[test]
    fn test_params_file_rejects_unknown_option() {
        let json = r#"{"policy_group": "pg1", "lldp": "on"}"#;
        assert!(serde_json::from_str::<PolicyGroupParams>(json).is_err());
    }

    #[test]
    fn test_merge_prefers_overrides() {
        let file = PolicyGroupParams {
            policy_group: Some("pg1".into()),
            cdp_policy: Some("cdp-off".into()),
            ..Default::default()
        };
        let flags = PolicyGroupParams {
            cdp_policy: Some("cdp-on".into()),
            state: Some(State::Query),
            ..Default::default()
        };

        let merged = file.merge(flags);
        assert_eq!(merged.policy_group.as_deref(), Some("pg1"));
        assert_eq!(merged.sub_policy(SubPolicy::Cdp), Some("cdp-on"));
        assert_eq!(merged.state(), State::Query);
    }
}
