// ACI Interface Policy Group Tool - CLI Binary
// Run with: cargo run --bin aci-policy-group -- [args]

use aci_policy_group_lib::cli::{runner, Cli};
use clap::Parser;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    aci_policy_group_lib::init_logging(cli.verbose);

    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    runner::run(cli).await
}
