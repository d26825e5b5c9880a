//! CLI Configuration
//!
//! Flags and their environment variables win over the config file.

use crate::Cli;
use microseg_common::Result;
use microseg_orchestrator::MicrosegConfig;

pub fn resolve(cli: &Cli) -> Result<MicrosegConfig> {
    let mut config = MicrosegConfig::load(cli.config.as_deref())?;

    overlay(&mut config.controller.url, &cli.apic_url);
    overlay(&mut config.controller.login, &cli.apic_login);
    overlay(&mut config.controller.password, &cli.apic_password);
    overlay(&mut config.topology.url, &cli.appd_url);
    overlay(&mut config.topology.login, &cli.appd_login);
    overlay(&mut config.topology.password, &cli.appd_password);

    if let Some(path) = &cli.tier_map {
        config.topology.tier_map_path = path.clone();
    }
    if let Some(path) = &cli.relationships {
        config.topology.relationships_path = path.clone();
    }
    if cli.strict_symmetry {
        config.strict_symmetry = true;
    }
    if cli.insecure {
        config.controller.verify_tls = false;
    }

    Ok(config)
}

fn overlay(slot: &mut Option<String>, value: &Option<String>) {
    if value.is_some() {
        slot.clone_from(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let content = r#"
            [controller]
            url = "https://apic-file"
            login = "admin"

            [topology]
            tier_map_path = "tiers.json"
        "#;
        writeln!(file, "{content}").unwrap();
        let path = file.path().to_str().unwrap();

        let cli = Cli::try_parse_from([
            "microseg",
            "-t",
            "prod",
            "-p",
            "shop",
            "--config",
            path,
            "--apic-url",
            "https://apic-flag",
            "--tier-map",
            "override.yaml",
            "--strict-symmetry",
            "--insecure",
        ])
        .unwrap();

        let config = resolve(&cli).unwrap();
        assert_eq!(config.controller.url.as_deref(), Some("https://apic-flag"));
        assert_eq!(config.controller.login.as_deref(), Some("admin"));
        assert_eq!(config.topology.tier_map_path, PathBuf::from("override.yaml"));
        assert!(config.strict_symmetry);
        assert!(!config.controller.verify_tls);
    }

    #[test]
    fn test_missing_config_file_fails() {
        let cli = Cli::try_parse_from([
            "microseg",
            "-t",
            "prod",
            "-p",
            "shop",
            "--config",
            "/nonexistent/config.toml",
        ])
        .unwrap();
        assert!(resolve(&cli).is_err());
    }
}
