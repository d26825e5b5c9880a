//! Static file topology provider
//!
//! Reads the tier map and relationship graph from local JSON or YAML
//! documents, e.g.
//!
//! ```text
//! app_mapping.json        {"coursefront": ["10.1.1.10"], "coursefund": ["10.1.2.10"]}
//! tier_relationship.json  {"coursefront": {"app2web": ["consume"]},
//!                          "coursefund":  {"app2web": ["provide"]}}
//! ```

use crate::TopologyProvider;
use async_trait::async_trait;
use microseg_common::{
    MicrosegError, RawRelationshipGraph, RawTierMap, RelationshipGraph, Result, TierMap,
};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::info;

/// Default tier map file name
pub const DEFAULT_TIER_MAP_FILE: &str = "app_mapping.json";

/// Default relationship file name
pub const DEFAULT_RELATIONSHIPS_FILE: &str = "tier_relationship.json";

/// Read a JSON or YAML document; `.yaml`/`.yml` select YAML
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| MicrosegError::config(format!("cannot read {}: {}", path.display(), e)))?;

    let is_yaml = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    );
    let parsed = if is_yaml {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|e| MicrosegError::invalid_topology(format!("{}: {}", path.display(), e)))
}

/// Load and validate a relationship graph file
pub fn load_relationships(path: &Path) -> Result<RelationshipGraph> {
    let raw: RawRelationshipGraph = load_document(path)?;
    RelationshipGraph::from_raw(raw)
}

/// Topology read from local files
pub struct FileTopologyProvider {
    tier_map_path: PathBuf,
    relationships_path: PathBuf,
}

impl FileTopologyProvider {
    pub fn new(tier_map_path: impl Into<PathBuf>, relationships_path: impl Into<PathBuf>) -> Self {
        Self {
            tier_map_path: tier_map_path.into(),
            relationships_path: relationships_path.into(),
        }
    }
}

#[async_trait]
impl TopologyProvider for FileTopologyProvider {
    async fn fetch_tier_map(&self) -> Result<TierMap> {
        let raw: RawTierMap = load_document(&self.tier_map_path)?;
        let tiers = TierMap::from_raw(raw)?;
        if tiers.is_empty() {
            return Err(MicrosegError::invalid_topology(format!(
                "{} defines no tiers",
                self.tier_map_path.display()
            )));
        }
        info!(path = %self.tier_map_path.display(), tiers = tiers.len(), "Loaded tier map");
        Ok(tiers)
    }

    async fn fetch_relationships(&self) -> Result<RelationshipGraph> {
        load_relationships(&self.relationships_path)
    }
}
