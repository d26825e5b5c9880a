//! Segmentation pipeline
//!
//! Preflight → Resolve → Topology → Build → Validate → Commit
//!
//! Every stage runs once, in order; the first failure ends the run before
//! anything later is touched.

use crate::config::MicrosegConfig;
use microseg_apic::{
    preflight, CommitPipeline, CommitReport, ConfigRequest, FabricController, IdentityResolver,
    SharedResourceOverrides,
};
use microseg_appd::TopologyProvider;
use microseg_common::{GraphValidator, MicrosegError, PolicyGraphBuilder, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Preflight,
    Resolve,
    Topology,
    Build,
    Validate,
    Commit,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preflight => "preflight",
            Self::Resolve => "resolve",
            Self::Topology => "topology",
            Self::Build => "build",
            Self::Validate => "validate",
            Self::Commit => "commit",
        }
    }
}

/// Result of a run
#[derive(Debug)]
pub enum Outcome {
    /// The transaction was applied
    Committed(CommitReport),
    /// Dry run: the transaction that would have been applied
    Planned {
        report: CommitReport,
        request: ConfigRequest,
    },
}

impl Outcome {
    pub fn report(&self) -> &CommitReport {
        match self {
            Self::Committed(report) | Self::Planned { report, .. } => report,
        }
    }
}

/// One tenant/profile segmentation run
pub struct SegmentationPipeline<'a> {
    controller: &'a dyn FabricController,
    topology: &'a dyn TopologyProvider,
    overrides: &'a SharedResourceOverrides,
    validator: GraphValidator,
    timeout: Option<Duration>,
    dry_run: bool,
}

impl<'a> SegmentationPipeline<'a> {
    pub fn new(
        controller: &'a dyn FabricController,
        topology: &'a dyn TopologyProvider,
        config: &'a MicrosegConfig,
    ) -> Self {
        Self {
            controller,
            topology,
            overrides: &config.shared,
            validator: GraphValidator::new(config.strict_symmetry),
            timeout: None,
            dry_run: false,
        }
    }

    /// Bound the whole run, not each request
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Stop after validation and return the encoded transaction
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn run(&self, tenant: &str, profile: &str) -> Result<Outcome> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.execute(tenant, profile))
                .await
                .map_err(|_| {
                    warn!(tenant, profile, "Segmentation timed out");
                    MicrosegError::Timeout(limit)
                })?,
            None => self.execute(tenant, profile).await,
        }
    }

    async fn execute(&self, tenant: &str, profile: &str) -> Result<Outcome> {
        stage(Stage::Preflight, tenant, profile);
        preflight(self.controller, tenant, profile).await?;

        stage(Stage::Resolve, tenant, profile);
        let shared = IdentityResolver::new(self.controller, self.overrides)
            .resolve(tenant, profile)
            .await?;

        stage(Stage::Topology, tenant, profile);
        let tiers = self.topology.fetch_tier_map().await?;
        let relationships = self.topology.fetch_relationships().await?;

        stage(Stage::Build, tenant, profile);
        let graph = PolicyGraphBuilder::new(tenant, profile, &shared).build(&tiers, &relationships);

        stage(Stage::Validate, tenant, profile);
        self.validator.validate(&graph, &relationships).into_result()?;

        let commit = CommitPipeline::new(self.controller);
        if self.dry_run {
            info!(tenant, profile, "Dry run, skipping commit");
            return Ok(Outcome::Planned {
                report: CommitReport::for_graph(&graph),
                request: commit.prepare(&graph),
            });
        }

        stage(Stage::Commit, tenant, profile);
        commit.commit(&graph).await.map(Outcome::Committed)
    }
}

fn stage(stage: Stage, tenant: &str, profile: &str) {
    info!(stage = stage.as_str(), tenant, profile, "Entering stage");
}
