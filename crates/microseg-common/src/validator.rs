//! Graph validation
//!
//! Runs after the builder and before the commit. Errors stop the run,
//! warnings are only logged.

use crate::error::{MicrosegError, Result};
use crate::graph::PolicyGraph;
use crate::topology::{ContractName, Direction, RelationshipGraph};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::warn;

/// Issue severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// Single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub severity: Severity,
    /// Segment or contract the finding is about
    pub subject: String,
    pub message: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// Outcome of validating one graph
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    fn push(&mut self, severity: Severity, subject: impl Into<String>, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            severity,
            subject: subject.into(),
            message: message.into(),
        });
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// Log warnings and turn errors into [`MicrosegError::Validation`]
    pub fn into_result(self) -> Result<Self> {
        for issue in self.warnings() {
            warn!(subject = %issue.subject, "{}", issue.message);
        }
        if self.has_errors() {
            return Err(MicrosegError::Validation(
                self.errors().map(ToString::to_string).collect(),
            ));
        }
        Ok(self)
    }
}

/// Referential-integrity and naming checks over a built graph
#[derive(Debug, Clone, Copy, Default)]
pub struct GraphValidator {
    /// Treat unmatched consume/provide bindings as errors instead of warnings
    pub strict_symmetry: bool,
}

impl GraphValidator {
    pub fn new(strict_symmetry: bool) -> Self {
        Self { strict_symmetry }
    }

    pub fn validate(
        &self,
        graph: &PolicyGraph,
        relationships: &RelationshipGraph,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        self.check_segments(graph, &mut report);
        self.check_addresses(graph, &mut report);
        self.check_unknown_tiers(graph, relationships, &mut report);
        self.check_symmetry(graph, &mut report);
        report
    }

    fn check_segments(&self, graph: &PolicyGraph, report: &mut ValidationReport) {
        let shared = &graph.shared;

        if graph.base.bridge_domain != shared.bridge_domain
            || graph.base.domain.target_dn != shared.vmm_domain_dn
        {
            report.push(
                Severity::Error,
                &graph.base.name,
                "base segment is not bound to the shared bridge domain and virtual domain",
            );
        }

        for segment in &graph.segments {
            let name = segment.name.as_str();

            if name == graph.base.name {
                report.push(
                    Severity::Error,
                    name,
                    "tier segment collides with the base segment name",
                );
            }
            if segment.bridge_domain != shared.bridge_domain {
                report.push(
                    Severity::Error,
                    name,
                    format!(
                        "bound to bridge domain {} instead of {}",
                        segment.bridge_domain, shared.bridge_domain
                    ),
                );
            }
            if segment.domain.target_dn != shared.vmm_domain_dn {
                report.push(
                    Severity::Error,
                    name,
                    format!(
                        "bound to domain {} instead of {}",
                        segment.domain.target_dn, shared.vmm_domain_dn
                    ),
                );
            }

            let dense = segment
                .criteria
                .addresses
                .iter()
                .enumerate()
                .all(|(idx, c)| c.id as usize == idx);
            if !dense {
                report.push(Severity::Error, name, "address criterion ids are not 0..N-1");
            }
            if segment.criteria.addresses.is_empty() {
                report.push(
                    Severity::Warning,
                    name,
                    "tier has no addresses and will match no traffic",
                );
            }
        }
    }

    fn check_addresses(&self, graph: &PolicyGraph, report: &mut ValidationReport) {
        let mut owners: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
        for segment in &graph.segments {
            for criterion in &segment.criteria.addresses {
                owners
                    .entry(criterion.address.as_str())
                    .or_default()
                    .insert(segment.name.as_str());
            }
        }

        for (address, tiers) in owners.into_iter().filter(|(_, t)| t.len() > 1) {
            let tiers: Vec<&str> = tiers.into_iter().collect();
            report.push(
                Severity::Error,
                address,
                format!("address claimed by multiple tiers: {}", tiers.join(", ")),
            );
        }
    }

    fn check_unknown_tiers(
        &self,
        graph: &PolicyGraph,
        relationships: &RelationshipGraph,
        report: &mut ValidationReport,
    ) {
        for (tier, _) in relationships.iter() {
            if graph.segment(tier.as_str()).is_none() {
                report.push(
                    Severity::Warning,
                    tier.as_str(),
                    "relationship entry for a tier with no segment is ignored",
                );
            }
        }
    }

    /// A contract must be consumed and provided by two different tiers
    fn check_symmetry(&self, graph: &PolicyGraph, report: &mut ValidationReport) {
        let mut consumers: BTreeMap<&ContractName, BTreeSet<&str>> = BTreeMap::new();
        let mut providers: BTreeMap<&ContractName, BTreeSet<&str>> = BTreeMap::new();
        for segment in &graph.segments {
            let tier = segment.name.as_str();
            for contract in segment.contracts(Direction::Consume) {
                consumers.entry(contract).or_default().insert(tier);
            }
            for contract in segment.contracts(Direction::Provide) {
                providers.entry(contract).or_default().insert(tier);
            }
        }

        let severity = if self.strict_symmetry {
            Severity::Error
        } else {
            Severity::Warning
        };
        let empty = BTreeSet::new();

        for (contract, tiers) in &consumers {
            let others = providers.get(contract).unwrap_or(&empty);
            if tiers.iter().any(|tier| others.iter().all(|p| p == tier)) {
                report.push(
                    severity,
                    contract.as_str(),
                    "contract is consumed but no other tier provides it",
                );
            }
        }
        for (contract, tiers) in &providers {
            let others = consumers.get(contract).unwrap_or(&empty);
            if tiers.iter().any(|tier| others.iter().all(|c| c == tier)) {
                report.push(
                    severity,
                    contract.as_str(),
                    "contract is provided but no other tier consumes it",
                );
            }
        }
    }
}
