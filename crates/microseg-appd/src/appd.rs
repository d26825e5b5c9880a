//! AppDynamics topology provider
//!
//! Tiers and node addresses come from the AppDynamics controller REST API.
//! The API has no tier-to-tier flow endpoint, so relationships are read from
//! a local file.

use crate::file::load_relationships;
use crate::TopologyProvider;
use async_trait::async_trait;
use microseg_common::{
    MicrosegError, RawTierMap, RelationshipGraph, ResourceKind, Result, TierMap,
};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Connection settings for an AppDynamics controller
#[derive(Debug, Clone)]
pub struct AppDynamicsSettings {
    pub base_url: String,
    pub login: String,
    pub password: String,
    pub timeout: Duration,
    /// Relationship file used alongside the live tier map
    pub relationships_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct AppdApplication {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AppdTier {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppdNode {
    name: String,
    ip_addresses: Option<AppdIpAddresses>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppdIpAddresses {
    #[serde(default)]
    ip_addresses: Vec<String>,
}

impl AppdNode {
    /// Address the node is segmented by: the last one it reports
    fn address(&self) -> Option<&str> {
        self.ip_addresses
            .as_ref()
            .and_then(|ips| ips.ip_addresses.last())
            .map(String::as_str)
    }
}

/// Live topology from AppDynamics
pub struct AppDynamicsProvider {
    settings: AppDynamicsSettings,
    application: String,
    client: Client,
}

impl AppDynamicsProvider {
    pub fn new(settings: AppDynamicsSettings, application: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| MicrosegError::config(format!("cannot build HTTP client: {e}")))?;

        Ok(Self {
            settings,
            application: application.into(),
            client,
        })
    }

    /// `<base>/controller/rest/applications/<segments...>?output=JSON`
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|e| MicrosegError::config(format!("invalid AppDynamics URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| MicrosegError::config("AppDynamics URL cannot carry a path"))?
            .pop_if_empty()
            .extend(["controller", "rest", "applications"])
            .extend(segments);
        url.query_pairs_mut().append_pair("output", "JSON");
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .basic_auth(&self.settings.login, Some(&self.settings.password))
            .send()
            .await
            .map_err(|e| MicrosegError::transport(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(MicrosegError::transport(format!("AppDynamics {}: {}", status, text)));
        }

        response
            .json()
            .await
            .map_err(|e| MicrosegError::transport(format!("AppDynamics response: {e}")))
    }
}

#[async_trait]
impl TopologyProvider for AppDynamicsProvider {
    async fn fetch_tier_map(&self) -> Result<TierMap> {
        let app = self.application.as_str();
        let applications: Vec<AppdApplication> = self.get(&[]).await?;
        if !applications.iter().any(|a| a.name == app) {
            return Err(MicrosegError::not_found(ResourceKind::Application, app));
        }

        let tiers: Vec<AppdTier> = self.get(&[app, "tiers"]).await?;
        let mut raw = RawTierMap::new();
        for tier in tiers {
            let nodes: Vec<AppdNode> = self
                .get(&[app, "tiers", tier.name.as_str(), "nodes"])
                .await?;
            let addresses = nodes
                .iter()
                .filter_map(|node| {
                    let address = node.address();
                    if address.is_none() {
                        debug!(tier = %tier.name, node = %node.name, "Node reports no address");
                    }
                    address.map(str::to_string)
                })
                .collect();
            raw.insert(tier.name, addresses);
        }

        if raw.is_empty() {
            return Err(MicrosegError::not_found(ResourceKind::Application, app));
        }

        let tiers = TierMap::from_raw(raw)?;
        info!(application = app, tiers = tiers.len(), "Fetched tier map from AppDynamics");
        Ok(tiers)
    }

    async fn fetch_relationships(&self) -> Result<RelationshipGraph> {
        load_relationships(&self.settings.relationships_path)
    }
}
