//! Commit Pipeline
//!
//! Encodes the whole graph as one transaction and submits it once. The
//! controller applies a transaction atomically, so there is no partial state
//! to roll back and no retry on failure.

use crate::controller::{ConfigRequest, FabricController};
use crate::encode::encode;
use microseg_common::{PolicyGraph, Result};
use serde::Serialize;
use tracing::{error, info};

/// What a successful commit applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommitReport {
    pub tenant: String,
    pub profile: String,
    /// Tier segments plus the base segment
    pub segments: usize,
    pub tiers: Vec<String>,
}

impl CommitReport {
    pub fn for_graph(graph: &PolicyGraph) -> Self {
        Self {
            tenant: graph.tenant.clone(),
            profile: graph.profile.name.clone(),
            segments: graph.segment_count(),
            tiers: graph.segments.iter().map(|s| s.name.to_string()).collect(),
        }
    }
}

/// Submits policy graphs to a fabric controller
pub struct CommitPipeline<'a, C: FabricController + ?Sized> {
    controller: &'a C,
}

impl<'a, C: FabricController + ?Sized> CommitPipeline<'a, C> {
    pub fn new(controller: &'a C) -> Self {
        Self { controller }
    }

    /// Transaction that [`Self::commit`] would submit
    pub fn prepare(&self, graph: &PolicyGraph) -> ConfigRequest {
        encode(graph)
    }

    pub async fn commit(&self, graph: &PolicyGraph) -> Result<CommitReport> {
        let request = self.prepare(graph);

        if let Err(e) = self.controller.commit(&request).await {
            error!(tenant = %graph.tenant, profile = %graph.profile.name, "Commit failed: {}", e);
            return Err(e);
        }

        let report = CommitReport::for_graph(graph);
        info!(
            tenant = %report.tenant,
            profile = %report.profile,
            segments = report.segments,
            "Committed micro-segmentation"
        );
        Ok(report)
    }
}
