//! Topology providers
//!
//! A [`TopologyProvider`] supplies the two inputs of the compiler: which
//! addresses make up each application tier, and which contracts each tier
//! consumes or provides. Two sources are interchangeable behind the trait:
//!
//! - [`AppDynamicsProvider`]: live tier map from application analytics
//! - [`FileTopologyProvider`]: static JSON/YAML documents

pub mod appd;
pub mod file;

pub use appd::{AppDynamicsProvider, AppDynamicsSettings};
pub use file::{
    load_document, load_relationships, FileTopologyProvider, DEFAULT_RELATIONSHIPS_FILE,
    DEFAULT_TIER_MAP_FILE,
};

use async_trait::async_trait;
use microseg_common::{RelationshipGraph, Result, TierMap};

/// Source of application topology
#[async_trait]
pub trait TopologyProvider: Send + Sync {
    /// Tier name → addresses; `NotFound` if the application has no tiers
    async fn fetch_tier_map(&self) -> Result<TierMap>;

    /// Tier name → contract → directions
    async fn fetch_relationships(&self) -> Result<RelationshipGraph>;
}
