//! Segmentation command

use crate::Cli;
use microseg_apic::ApicClient;
use microseg_appd::{
    AppDynamicsProvider, AppDynamicsSettings, FileTopologyProvider, TopologyProvider,
};
use microseg_common::Result;
use microseg_orchestrator::{MicrosegConfig, Outcome, SegmentationPipeline};
use std::error::Error;
use std::time::Duration;
use tracing::info;

/// Live provider when an application is named, topology files otherwise
fn topology_provider(cli: &Cli, config: &MicrosegConfig) -> Result<Box<dyn TopologyProvider>> {
    match &cli.application {
        Some(application) => {
            let credentials = config.topology_credentials()?;
            let settings = AppDynamicsSettings {
                base_url: credentials.url.to_string(),
                login: credentials.login.to_string(),
                password: credentials.password.to_string(),
                timeout: config.topology_timeout(),
                relationships_path: config.topology.relationships_path.clone(),
            };
            Ok(Box::new(AppDynamicsProvider::new(settings, application.clone())?))
        }
        None => Ok(Box::new(FileTopologyProvider::new(
            config.topology.tier_map_path.clone(),
            config.topology.relationships_path.clone(),
        ))),
    }
}

pub async fn handle(
    cli: &Cli,
    config: &MicrosegConfig,
) -> std::result::Result<(), Box<dyn Error>> {
    let credentials = config.controller_credentials()?;
    let topology = topology_provider(cli, config)?;

    let apic = ApicClient::new(
        credentials.url,
        config.controller_timeout(),
        config.controller.verify_tls,
    )?;
    apic.login(credentials.login, credentials.password).await?;
    info!(url = credentials.url, "Logged in to APIC");

    let outcome = SegmentationPipeline::new(&apic, topology.as_ref(), config)
        .with_timeout(cli.timeout_secs.map(Duration::from_secs))
        .dry_run(cli.dry_run)
        .run(&cli.tenant, &cli.approfile)
        .await?;

    match outcome {
        Outcome::Planned { request, .. } => cli.format.print(&request.to_json())?,
        Outcome::Committed(report) => println!(
            "Application {} in Tenant {}, has been micro-segmented!",
            report.profile, report.tenant
        ),
    }
    Ok(())
}
