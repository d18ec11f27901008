//! CLI interface for the ACI policy group tool

pub mod runner;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::aci::OutputLevel;
use crate::config::ConnectionOptions;
use crate::models::PolicyGroupParams;

/// ACI Interface Policy Group Tool - Manage leaf policy groups via the APIC REST API
#[derive(Parser, Debug, Default)]
#[command(name = "aci-policy-group")]
#[command(author = "FrazierSystems")]
#[command(version)]
#[command(about = "Manage Cisco ACI leaf interface policy groups", long_about = None)]
pub struct Cli {
    /// APIC hostname or IP address
    #[arg(short = 'H', long, global = true, env = "ACI_HOST")]
    pub host: Option<String>,

    /// Profile name to use (loads settings from saved profile)
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true, default_value = "false")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create, update, delete or query a leaf interface policy group
    Apply(ApplyArgs),

    /// Manage connection profiles
    Profile(ProfileArgs),

    /// Test connection to an APIC
    Test(TestArgs),
}

/// Connection options shared by commands that talk to the controller
#[derive(Args, Debug, Clone, Default)]
pub struct ConnectionArgs {
    /// Username to log in with
    #[arg(short, long, env = "ACI_USERNAME")]
    pub username: Option<String>,

    /// Password to log in with (or set ACI_PASSWORD env var)
    #[arg(long, env = "ACI_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Port of the REST API
    #[arg(long, env = "ACI_PORT")]
    pub port: Option<u16>,

    /// Use https (true/false)
    #[arg(long)]
    pub use_ssl: Option<bool>,

    /// Verify the controller certificate (true/false)
    #[arg(long)]
    pub validate_certs: Option<bool>,

    /// Use system proxy settings (true/false)
    #[arg(long)]
    pub use_proxy: Option<bool>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
}

impl ConnectionArgs {
    /// Overlay explicitly given options on saved ones
    pub fn apply_to(&self, options: &mut ConnectionOptions) {
        if let Some(port) = self.port {
            options.port = Some(port);
        }
        if let Some(use_ssl) = self.use_ssl {
            options.use_ssl = use_ssl;
        }
        if let Some(validate_certs) = self.validate_certs {
            options.validate_certs = validate_certs;
        }
        if let Some(use_proxy) = self.use_proxy {
            options.use_proxy = use_proxy;
        }
        if let Some(timeout) = self.timeout {
            options.timeout_secs = timeout;
        }
    }
}

/// Arguments for the apply command
#[derive(Args, Debug)]
pub struct ApplyArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    #[command(flatten)]
    pub params: PolicyGroupParams,

    /// JSON file with policy group parameters (flags take precedence)
    #[arg(long = "params", value_name = "FILE")]
    pub params_file: Option<PathBuf>,

    /// Report what would change without changing anything
    #[arg(long)]
    pub check: bool,

    /// Include before/after state in the result
    #[arg(long)]
    pub diff: bool,

    /// Amount of detail in the result
    #[arg(long, value_enum, default_value_t = OutputLevel::Normal)]
    pub output_level: OutputLevel,
}

/// Arguments for profile management
#[derive(Args, Debug)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub command: ProfileCommands,
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommands {
    /// List all saved profiles
    List,

    /// Add or update a profile (uses --host for the controller address)
    Add {
        /// Profile name
        name: String,
        #[command(flatten)]
        connection: ConnectionArgs,
    },

    /// Delete a profile
    Delete {
        /// Profile name to delete
        name: String,
    },

    /// Set the active profile
    Use {
        /// Profile name to activate
        name: String,
    },

    /// Store the APIC password for a profile (reads from stdin)
    SetPassword {
        /// Profile name
        name: String,
    },
}

/// Arguments for connection testing
#[derive(Args, Debug)]
pub struct TestArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::State;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_apply() {
        let cli = Cli::try_parse_from([
            "aci-policy-group",
            "-H",
            "apic",
            "apply",
            "-u",
            "admin",
            "--password",
            "pw",
            "--name",
            "pg1",
            "--lag-type",
            "node",
            "--link-level-policy-name",
            "llp1",
            "--aep",
            "aep1",
            "--state",
            "present",
            "--check",
            "--validate-certs",
            "false",
        ])
        .unwrap();

        assert_eq!(cli.host.as_deref(), Some("apic"));
        let Some(Commands::Apply(args)) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.params.policy_group.as_deref(), Some("pg1"));
        assert_eq!(args.params.lag_type.as_deref(), Some("node"));
        assert_eq!(args.params.link_level_policy.as_deref(), Some("llp1"));
        assert_eq!(args.params.aep.as_deref(), Some("aep1"));
        assert_eq!(args.params.state, Some(State::Present));
        assert!(args.check);
        assert_eq!(args.output_level, OutputLevel::Normal);

        let mut options = ConnectionOptions::new("apic");
        args.connection.apply_to(&mut options);
        assert!(!options.validate_certs);
        assert!(options.use_ssl);
    }

    #[test]
    fn test_state_defaults_unset() {
        let cli = Cli::try_parse_from(["aci-policy-group", "apply", "--params", "pg.json"]).unwrap();
        let Some(Commands::Apply(args)) = cli.command else {
            panic!("expected apply");
        };
        assert_eq!(args.params.state, None);
        assert_eq!(args.params.state(), State::Present);
        assert_eq!(args.params_file, Some(PathBuf::from("pg.json")));
    }

    #[test]
    fn test_rejects_unknown_state() {
        assert!(Cli::try_parse_from(["aci-policy-group", "apply", "--state", "gone"]).is_err());
    }
}
