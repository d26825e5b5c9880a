//! Policy object graph
//!
//! In-memory form of the configuration that gets committed to the fabric:
//! one application profile, the re-annotated base segment and one isolated
//! micro-segment per application tier.

use crate::topology::{ContractName, Direction, TierName};
use serde::Serialize;

/// Description stamped on the re-used application profile
pub const PROFILE_DESCRIPTION: &str = "This application has been micro-segmented by AppD";

/// Description stamped on the base segment
pub const BASE_SEGMENT_DESCRIPTION: &str = "The base EPG has been micro-segmented by AppD";

/// Description stamped on every tier segment
pub const TIER_SEGMENT_DESCRIPTION: &str = "This is a Micro-segmented EPG created by AppDynamics";

/// Name of the single match-criteria container on a tier segment
pub const DEFAULT_CRITERION_NAME: &str = "default";

/// Fabric resources shared by every segment of one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SharedResources {
    /// Bridge domain every segment binds to
    pub bridge_domain: String,
    /// Name of the pre-existing catch-all segment
    pub base_segment: String,
    /// Distinguished name of the virtual (VMM) domain
    pub vmm_domain_dn: String,
}

/// Policy-control enforcement preference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    Enforced,
    Unenforced,
}

impl Enforcement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enforced => "enforced",
            Self::Unenforced => "unenforced",
        }
    }
}

/// Membership in the VRF preferred group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredGroup {
    Include,
    Exclude,
}

impl PreferredGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Exclude => "exclude",
        }
    }
}

/// Class preference of a domain attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassPreference {
    /// Classify by encapsulation (tier segments)
    Encap,
    /// Classify by micro-segmentation attributes (base segment)
    Useg,
}

impl ClassPreference {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encap => "encap",
            Self::Useg => "useg",
        }
    }
}

/// Attachment of a segment to the virtual domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainBinding {
    pub target_dn: String,
    pub class_preference: ClassPreference,
}

/// Re-used application profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplicationProfile {
    pub name: String,
    pub description: String,
}

/// Pre-existing catch-all segment, re-annotated but not created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BaseSegment {
    pub name: String,
    pub description: String,
    pub enforcement: Enforcement,
    pub preferred_group: PreferredGroup,
    pub shutdown: bool,
    pub bridge_domain: String,
    pub domain: DomainBinding,
}

/// Single address-match rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressCriterion {
    /// Zero-based, dense within the owning segment
    pub id: u32,
    pub address: String,
}

/// Match-criteria container holding the address rules of one segment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCriteria {
    pub name: String,
    pub addresses: Vec<AddressCriterion>,
}

/// Directed edge from a segment to a named contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrafficRelationship {
    pub contract: ContractName,
    pub direction: Direction,
}

/// Isolated micro-segment for one application tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierSegment {
    pub name: TierName,
    pub description: String,
    pub enforcement: Enforcement,
    pub preferred_group: PreferredGroup,
    /// Membership computed from criteria rather than static ports
    pub attribute_based: bool,
    pub bridge_domain: String,
    pub domain: DomainBinding,
    pub criteria: MatchCriteria,
    pub relationships: Vec<TrafficRelationship>,
}

impl TierSegment {
    /// Contracts this segment binds to in `direction`
    pub fn contracts(&self, direction: Direction) -> impl Iterator<Item = &ContractName> {
        self.relationships
            .iter()
            .filter(move |r| r.direction == direction)
            .map(|r| &r.contract)
    }

    pub fn consumes(&self, contract: &str) -> bool {
        self.contracts(Direction::Consume).any(|c| c.as_str() == contract)
    }

    pub fn provides(&self, contract: &str) -> bool {
        self.contracts(Direction::Provide).any(|c| c.as_str() == contract)
    }
}

/// Everything committed to the controller in one transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyGraph {
    pub tenant: String,
    pub profile: ApplicationProfile,
    pub base: BaseSegment,
    /// Sorted by tier name
    pub segments: Vec<TierSegment>,
    pub shared: SharedResources,
}

impl PolicyGraph {
    pub fn segment(&self, tier: &str) -> Option<&TierSegment> {
        self.segments.iter().find(|s| s.name.as_str() == tier)
    }

    /// Number of segments in the transaction, base segment included
    pub fn segment_count(&self) -> usize {
        self.segments.len() + 1
    }
}
