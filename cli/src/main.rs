//! Micro-segmentation CLI
//!
//! Splits an existing ACI application profile into one attribute-based EPG
//! per application tier.
//!
//! # Usage
//!
//! ```bash
//! # topology from AppDynamics
//! microseg -t prod -p shop -a shop-app
//!
//! # topology from app_mapping.json / tier_relationship.json
//! microseg -t prod -p shop
//!
//! # show the transaction without applying it
//! microseg -t prod -p shop --dry-run --format yaml
//! ```

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod output;
mod segment;

#[derive(Parser, Debug)]
#[command(name = "microseg")]
#[command(version)]
#[command(
    about = "Micro-segment an ACI application profile from its tier topology",
    long_about = None
)]
pub struct Cli {
    /// Tenant that owns the application profile
    #[arg(short, long)]
    pub tenant: String,

    /// Application profile to micro-segment
    #[arg(short = 'p', long)]
    pub approfile: String,

    /// AppDynamics application; omit to read the topology files instead
    #[arg(short, long)]
    pub application: Option<String>,

    /// Config file (default ~/.microseg/config.toml)
    #[arg(long, env = "MICROSEG_CONFIG")]
    pub config: Option<PathBuf>,

    /// APIC URL
    #[arg(long, env = "APIC_URL")]
    pub apic_url: Option<String>,

    /// APIC user
    #[arg(long, env = "APIC_LOGIN")]
    pub apic_login: Option<String>,

    /// APIC password
    #[arg(long, env = "APIC_PASSWORD", hide_env_values = true)]
    pub apic_password: Option<String>,

    /// AppDynamics controller URL
    #[arg(long, env = "APPD_URL")]
    pub appd_url: Option<String>,

    /// AppDynamics user (user@account)
    #[arg(long, env = "APPD_LOGIN")]
    pub appd_login: Option<String>,

    /// AppDynamics password
    #[arg(long, env = "APPD_PASSWORD", hide_env_values = true)]
    pub appd_password: Option<String>,

    /// Tier map file
    #[arg(long)]
    pub tier_map: Option<PathBuf>,

    /// Tier relationship file
    #[arg(long)]
    pub relationships: Option<PathBuf>,

    /// Print the transaction instead of committing it
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for --dry-run
    #[arg(long, short, value_enum, default_value = "json")]
    pub format: output::OutputFormat,

    /// Abort the run after this many seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Fail on contracts that are consumed but never provided (or the reverse)
    #[arg(long)]
    pub strict_symmetry: bool,

    /// Skip APIC certificate verification
    #[arg(long)]
    pub insecure: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match config::resolve(&cli) {
        Ok(config) => segment::handle(&cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from(["microseg", "-t", "prod", "-p", "shop", "-a", "shop-app"])
            .unwrap();
        assert_eq!(cli.tenant, "prod");
        assert_eq!(cli.approfile, "shop");
        assert_eq!(cli.application.as_deref(), Some("shop-app"));
        assert!(!cli.dry_run);
    }

    #[test]
    fn test_tenant_and_profile_are_required() {
        assert!(Cli::try_parse_from(["microseg", "-p", "shop"]).is_err());
        assert!(Cli::try_parse_from(["microseg", "-t", "prod"]).is_err());
    }

    #[test]
    fn test_dry_run_yaml() {
        let cli = Cli::try_parse_from([
            "microseg",
            "-t",
            "prod",
            "-p",
            "shop",
            "--dry-run",
            "--format",
            "yaml",
            "--timeout-secs",
            "30",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert!(matches!(cli.format, output::OutputFormat::Yaml));
        assert_eq!(cli.timeout_secs, Some(30));
    }
}
