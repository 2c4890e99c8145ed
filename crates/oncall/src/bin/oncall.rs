//! OnCall CLI - query a Grafana OnCall instance from the terminal.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use oncall::config::DEFAULT_TIMEOUT_SECS;
use oncall::resources::{
    AlertFilter, EscalationChainFilter, EscalationPolicyFilter, ScheduleFilter, UserFilter,
};
use oncall::{ClientConfig, OnCallClient};

/// OnCall CLI - inspect alerts, escalations, schedules and users.
#[derive(Parser)]
#[command(name = "oncall")]
#[command(about = "Query the Grafana OnCall public API")]
struct Cli {
    /// OnCall base URL (or set `ONCALL_API_URL` env var).
    #[arg(long, env = "ONCALL_API_URL")]
    url: String,

    /// OnCall API token (or set `ONCALL_API_TOKEN` env var).
    #[arg(long, env = "ONCALL_API_TOKEN", hide_env_values = true)]
    token: String,

    /// Request timeout in seconds.
    #[arg(long, env = "ONCALL_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// Enable verbose logging.
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List alerts.
    Alerts {
        /// Only alerts in this alert group.
        #[arg(long, default_value = "")]
        alert_group_id: String,

        /// Free-text search.
        #[arg(long, default_value = "")]
        search: String,
    },

    /// List escalation chains.
    EscalationChains,

    /// List escalation policies.
    EscalationPolicies {
        /// Only policies in this escalation chain.
        #[arg(long, default_value = "")]
        chain_id: String,
    },

    /// List schedules.
    Schedules {
        /// Only the schedule with this name.
        #[arg(long, default_value = "")]
        name: String,
    },

    /// List users.
    Users {
        /// Only the user with this username.
        #[arg(long, default_value = "")]
        username: String,
    },

    /// Show a single resource.
    Get {
        /// Resource type.
        #[arg(value_enum)]
        resource: Resource,

        /// Resource ID.
        id: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Resource {
    EscalationChain,
    EscalationPolicy,
    Schedule,
    User,
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to encode output")?;
    println!("{out}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::new(&cli.url, cli.token)
        .context("Invalid OnCall configuration")?
        .with_timeout(Duration::from_secs(cli.timeout_secs));
    debug!(?config, "Using configuration");

    let client = OnCallClient::new(&config).context("Failed to create OnCall client")?;

    match cli.command {
        Commands::Alerts {
            alert_group_id,
            search,
        } => {
            let filter = AlertFilter {
                alert_group_id,
                search,
            };
            print_json(&client.list_alerts(&filter).await?)?;
        }
        Commands::EscalationChains => {
            print_json(&client.list_escalation_chains(&EscalationChainFilter).await?)?;
        }
        Commands::EscalationPolicies { chain_id } => {
            let filter = EscalationPolicyFilter {
                escalation_chain_id: chain_id,
            };
            print_json(&client.list_escalation_policies(&filter).await?)?;
        }
        Commands::Schedules { name } => {
            print_json(&client.list_schedules(&ScheduleFilter { name }).await?)?;
        }
        Commands::Users { username } => {
            print_json(&client.list_users(&UserFilter { username }).await?)?;
        }
        Commands::Get { resource, id } => match resource {
            Resource::EscalationChain => {
                print_json(&client.get_escalation_chain(&id).await?)?;
            }
            Resource::EscalationPolicy => {
                print_json(&client.get_escalation_policy(&id).await?)?;
            }
            Resource::Schedule => print_json(&client.get_schedule(&id).await?)?,
            Resource::User => print_json(&client.get_user(&id).await?)?,
        },
    }

    Ok(())
}
