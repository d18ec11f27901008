//! CLI command runner

use anyhow::Context;
use std::io::{self, BufRead};
use std::path::Path;

use crate::aci::{AciModule, AciResult, FailureReport, ModuleOptions};
use crate::api::ApicClient;
use crate::config::{ConnectionOptions, Profile, Settings};
use crate::credentials::CredentialStore;
use crate::models::PolicyGroupParams;
use crate::policy_group::{self, PolicyGroupPlan};

use super::{ApplyArgs, Cli, Commands, ConnectionArgs, ProfileCommands, TestArgs};

/// Run the CLI application
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Some(Commands::Apply(args)) => run_apply(cli.host, cli.profile, args).await,
        Some(Commands::Profile(args)) => run_profile(cli.host, args.command).await,
        Some(Commands::Test(args)) => run_test(cli.host, cli.profile, args).await,
        None => {
            println!("ACI Interface Policy Group Tool");
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

/// Connection details resolved from flags and saved profiles
#[derive(Debug)]
struct ResolvedConnection {
    options: ConnectionOptions,
    username: String,
    password: String,
    /// Profile the details came from, if any
    profile: Option<String>,
}

/// Run the apply command
async fn run_apply(
    host: Option<String>,
    profile_name: Option<String>,
    args: ApplyArgs,
) -> anyhow::Result<()> {
    let params = match &args.params_file {
        Some(path) => match load_params(path) {
            Ok(from_file) => from_file.merge(args.params),
            Err(e) => return report_failure(FailureReport::new(format!("{:#}", e)), e),
        },
        None => args.params,
    };

    let options = ModuleOptions {
        check_mode: args.check,
        diff_mode: args.diff,
        output_level: args.output_level,
    };

    let conn = match resolve_connection(host, profile_name, &args.connection) {
        Ok(conn) => conn,
        Err(e) => return report_failure(FailureReport::new(e.to_string()), e),
    };

    let executed = execute(&conn, &params, options).await;
    match executed {
        Ok(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            if let Some(name) = &conn.profile {
                mark_profile_used(name);
            }
            Ok(())
        }
        Err(e) => report_failure(FailureReport::from(&e), e.into()),
    }
}

/// Print the failure report and pass the error on for the exit status
fn report_failure(report: FailureReport, err: anyhow::Error) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&report)?);
    Err(err)
}

/// Log in, converge the policy group and log out again
async fn execute(
    conn: &ResolvedConnection,
    params: &PolicyGroupParams,
    options: ModuleOptions,
) -> crate::Result<AciResult> {
    // Reject bad input before touching the controller
    PolicyGroupPlan::from_params(params)?;

    let client = ApicClient::new(&conn.options)?;
    client.login(&conn.username, &conn.password).await?;
    tracing::info!("Logged in to {} as {}", conn.options.base_url(), conn.username);

    let mut module = AciModule::new(client.clone(), options);
    let outcome = policy_group::apply(params, &mut module).await;
    client.logout().await;

    outcome.map(|()| module.exit_json())
}

/// Read a JSON params file
fn load_params(path: &Path) -> anyhow::Result<PolicyGroupParams> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read params file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid params file {}", path.display()))
}

fn mark_profile_used(name: &str) {
    let updated = Settings::load().and_then(|mut settings| {
        if let Some(profile) = settings.profiles.iter_mut().find(|p| p.name == name) {
            profile.touch();
            settings.save()?;
        }
        Ok(())
    });
    if let Err(e) = updated {
        tracing::warn!("Could not update profile '{}': {}", name, e);
    }
}

/// Run profile management commands
async fn run_profile(host: Option<String>, cmd: ProfileCommands) -> anyhow::Result<()> {
    match cmd {
        ProfileCommands::List => {
            let settings = Settings::load()?;
            if settings.profiles.is_empty() {
                println!("No profiles saved.");
            } else {
                println!("Saved profiles:");
                for profile in &settings.profiles {
                    let active = settings.active_profile.as_ref() == Some(&profile.name);
                    let marker = if active { "*" } else { " " };
                    let creds = if CredentialStore::has_password(&profile.name) {
                        "✓"
                    } else {
                        " "
                    };
                    println!(
                        "  {} {} {} ({}@{})",
                        marker,
                        creds,
                        profile.name,
                        profile.username,
                        profile.connection.base_url()
                    );
                }
                println!("\n* = active profile");
                println!("✓ = password stored");
            }
        }

        ProfileCommands::Add { name, connection } => {
            let host = host.ok_or_else(|| anyhow::anyhow!("--host is required to add a profile"))?;
            let username = connection
                .username
                .clone()
                .ok_or_else(|| anyhow::anyhow!("--username is required to add a profile"))?;

            let mut settings = Settings::load()?;
            let mut profile = Profile::new(&name, &host, &username);
            connection.apply_to(&mut profile.connection);
            settings.add_profile(profile);

            if settings.active_profile.is_none() {
                settings.active_profile = Some(name.clone());
            }
            settings.save()?;

            println!("✓ Profile '{}' saved", name);
            if let Some(password) = &connection.password {
                let backend = CredentialStore::store_password(&name, password)?;
                println!("✓ Password stored in {}", backend);
            }
        }

        ProfileCommands::Delete { name } => {
            let mut settings = Settings::load()?;
            settings.delete_profile(&name);
            let _ = CredentialStore::delete_password(&name);
            settings.save()?;
            println!("✓ Profile '{}' deleted", name);
        }

        ProfileCommands::Use { name } => {
            let mut settings = Settings::load()?;
            settings.set_active_profile(&name)?;
            settings.save()?;
            println!("✓ Active profile set to '{}'", name);
        }

        ProfileCommands::SetPassword { name } => {
            println!("Enter APIC password for profile '{}': ", name);
            let mut password = String::new();
            io::stdin().lock().read_line(&mut password)?;
            let password = password.trim_end_matches(['\r', '\n']);

            if password.is_empty() {
                anyhow::bail!("Password cannot be empty");
            }

            let backend = CredentialStore::store_password(&name, password)?;
            println!("✓ Password for profile '{}' stored in {}", name, backend);
        }
    }

    Ok(())
}

/// Run connection test
async fn run_test(
    host: Option<String>,
    profile_name: Option<String>,
    args: TestArgs,
) -> anyhow::Result<()> {
    let conn = resolve_connection(host, profile_name, &args.connection)?;

    println!("Testing connection to {}...", conn.options.base_url());

    let client = ApicClient::new(&conn.options)?;

    match client.login(&conn.username, &conn.password).await {
        Ok(()) => {
            println!("✓ Authentication successful");

            match client.get_version().await {
                Ok(Some(version)) => println!("  Controller version: {}", version),
                Ok(None) => {}
                Err(e) => tracing::debug!("Version lookup failed: {}", e),
            }
            client.logout().await;
            Ok(())
        }
        Err(e) => {
            println!("✗ Authentication failed: {}", e);
            Err(e.into())
        }
    }
}

/// Resolve connection details from CLI args or profile
fn resolve_connection(
    host: Option<String>,
    profile_name: Option<String>,
    args: &ConnectionArgs,
) -> anyhow::Result<ResolvedConnection> {
    // If explicit host provided, use it
    if let Some(host) = host {
        let mut options = ConnectionOptions::new(&host);
        args.apply_to(&mut options);

        let username = args.username.clone().ok_or_else(|| {
            anyhow::anyhow!("Username required when using --host. Use --username or set ACI_USERNAME")
        })?;
        let password = args.password.clone().ok_or_else(|| {
            anyhow::anyhow!("Password required when using --host. Use --password or set ACI_PASSWORD")
        })?;

        return Ok(ResolvedConnection {
            options,
            username,
            password,
            profile: None,
        });
    }

    // Otherwise, try to load from profile
    let settings = Settings::load()?;

    let profile_name = profile_name
        .or(settings.active_profile.clone())
        .ok_or_else(|| {
            anyhow::anyhow!("No profile specified and no active profile set. Use --host or --profile")
        })?;

    let profile = settings
        .get_profile(&profile_name)
        .ok_or_else(|| anyhow::anyhow!("Profile '{}' not found", profile_name))?;

    let mut options = profile.connection.clone();
    args.apply_to(&mut options);

    let password = match &args.password {
        Some(p) => p.clone(),
        None => CredentialStore::get_password(&profile_name)?.ok_or_else(|| {
            anyhow::anyhow!(
                "No password stored for profile '{}'. Use: aci-policy-group profile set-password {}",
                profile_name,
                profile_name
            )
        })?,
    };

    Ok(ResolvedConnection {
        options,
        username: args.username.clone().unwrap_or_else(|| profile.username.clone()),
        password,
        profile: Some(profile_name),
    })
}
