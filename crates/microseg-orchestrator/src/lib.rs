//! Micro-segmentation orchestrator
//!
//! Wires configuration, a [`FabricController`](microseg_apic::FabricController)
//! and a [`TopologyProvider`](microseg_appd::TopologyProvider) into a single
//! sequential run per tenant/profile.

pub mod config;
pub mod pipeline;

pub use config::{ControllerConfig, Credentials, MicrosegConfig, TopologyConfig};
pub use pipeline::{Outcome, SegmentationPipeline, Stage};
