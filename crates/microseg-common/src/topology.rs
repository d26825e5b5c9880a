//! Typed topology model
//!
//! Topology arrives loosely shaped (JSON/YAML files or analytics responses) and is
//! turned into validated types here, in one fail-fast step.

use crate::error::{MicrosegError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use tracing::warn;

/// Tier map as read from a file or provider, before validation
pub type RawTierMap = BTreeMap<String, Vec<String>>;

/// Relationship graph as read from a file or provider, before validation
pub type RawRelationshipGraph = BTreeMap<String, BTreeMap<String, Vec<String>>>;

/// Longest object name the fabric accepts
const MAX_NAME_LEN: usize = 64;

fn check_name(what: &str, name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(MicrosegError::invalid_topology(format!("{what} name cannot be empty")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(MicrosegError::invalid_topology(format!(
            "{what} name {name:?} exceeds {MAX_NAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | ':' | '-'))
    {
        return Err(MicrosegError::invalid_topology(format!(
            "{what} name {name:?} may only contain letters, digits, '_', '.', ':' and '-'"
        )));
    }
    Ok(())
}

/// Application tier name
///
/// # Invariants
/// - Non-empty, at most 64 characters
/// - Letters, digits, `_`, `.`, `:` and `-` only
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TierName(String);

impl TierName {
    /// Create new tier name with validation
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_name("tier", &name)?;
        Ok(Self(name))
    }

    /// Get inner value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TierName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contract name, same naming rules as [`TierName`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContractName(String);

impl ContractName {
    /// Create new contract name with validation
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        check_name("contract", &name)?;
        Ok(Self(name))
    }

    /// Get inner value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Traffic direction of a tier towards a contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Consume,
    Provide,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consume => "consume",
            Self::Provide => "provide",
        }
    }
}

impl FromStr for Direction {
    type Err = MicrosegError;

    fn from_str(tag: &str) -> Result<Self> {
        match tag {
            "consume" => Ok(Self::Consume),
            "provide" => Ok(Self::Provide),
            other => Err(MicrosegError::invalid_topology(format!(
                "unknown direction tag {other:?} (expected \"consume\" or \"provide\")"
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, duplicate-free set of endpoint addresses of one tier
///
/// Every entry is a literal IP address or a CIDR prefix. Order is the order of
/// first appearance in the input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressSet(Vec<String>);

impl AddressSet {
    /// Parse addresses for `tier`, dropping repeats
    pub fn parse<I, S>(tier: &TierName, addresses: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();

        for address in addresses {
            let address = address.into().trim().to_string();
            if address.parse::<IpAddr>().is_err()
                && address.parse::<ipnetwork::IpNetwork>().is_err()
            {
                return Err(MicrosegError::invalid_topology(format!(
                    "tier {tier}: {address:?} is not an IP address or prefix"
                )));
            }
            if seen.insert(address.clone()) {
                ordered.push(address);
            } else {
                warn!(tier = %tier, address = %address, "Dropping duplicate address");
            }
        }

        Ok(Self(ordered))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Validated mapping of tier name to its addresses, iterated in lexicographic tier order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierMap(BTreeMap<TierName, AddressSet>);

impl TierMap {
    /// Validate a raw tier map
    pub fn from_raw(raw: RawTierMap) -> Result<Self> {
        let mut tiers = BTreeMap::new();
        for (name, addresses) in raw {
            let tier = TierName::new(name)?;
            let set = AddressSet::parse(&tier, addresses)?;
            tiers.insert(tier, set);
        }
        Ok(Self(tiers))
    }

    pub fn insert(&mut self, tier: TierName, addresses: AddressSet) {
        self.0.insert(tier, addresses);
    }

    pub fn get(&self, tier: &TierName) -> Option<&AddressSet> {
        self.0.get(tier)
    }

    pub fn contains(&self, tier: &TierName) -> bool {
        self.0.contains_key(tier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TierName, &AddressSet)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Contract bindings declared by a single tier
pub type TierRelationships = BTreeMap<ContractName, BTreeSet<Direction>>;

/// Validated mapping of tier name to contract bindings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipGraph(BTreeMap<TierName, TierRelationships>);

impl RelationshipGraph {
    /// Validate a raw relationship graph
    pub fn from_raw(raw: RawRelationshipGraph) -> Result<Self> {
        let mut graph = BTreeMap::new();
        for (tier, contracts) in raw {
            let tier = TierName::new(tier)?;
            let mut bindings = TierRelationships::new();
            for (contract, tags) in contracts {
                let contract = ContractName::new(contract)?;
                let directions = tags
                    .iter()
                    .map(|tag| {
                        tag.parse::<Direction>().map_err(|_| {
                            MicrosegError::invalid_topology(format!(
                                "tier {tier}, contract {contract}: unknown direction tag {tag:?}"
                            ))
                        })
                    })
                    .collect::<Result<BTreeSet<_>>>()?;
                bindings.insert(contract, directions);
            }
            graph.insert(tier, bindings);
        }
        Ok(Self(graph))
    }

    /// Record that `tier` binds to `contract` in `direction`
    pub fn bind(&mut self, tier: TierName, contract: ContractName, direction: Direction) {
        self.0
            .entry(tier)
            .or_default()
            .entry(contract)
            .or_default()
            .insert(direction);
    }

    /// Contract bindings of `tier`, `None` if the tier has no entry
    pub fn get(&self, tier: &TierName) -> Option<&TierRelationships> {
        self.0.get(tier)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TierName, &TierRelationships)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
