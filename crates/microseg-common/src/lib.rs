//! Micro-segmentation compiler core
//!
//! Turns an application's tier topology into a policy-object graph for an ACI
//! fabric: one isolated, attribute-based micro-segment per tier, bound to the
//! tier's addresses and to the contracts the tier consumes or provides.
//!
//! - [`topology`]: typed, validated tier map and relationship graph
//! - [`graph`]: policy objects committed to the controller
//! - [`builder`]: pure topology → graph compiler
//! - [`validator`]: referential-integrity checks before commit

#![warn(clippy::all)]

pub mod builder;
pub mod error;
pub mod graph;
pub mod topology;
pub mod validator;

pub use builder::PolicyGraphBuilder;
pub use error::*;
pub use graph::*;
pub use topology::*;
pub use validator::{GraphValidator, Severity, ValidationIssue, ValidationReport};
