//! APIC integration for the micro-segmentation compiler
//!
//! ## Features
//!
//! - **Controller seam**: [`FabricController`] with REST ([`ApicClient`]) and
//!   in-memory ([`InMemoryFabric`]) implementations
//! - **Pre-flight**: tenant and tenant-scoped profile existence checks
//! - **Identity Resolver**: bridge domain, base EPG and VMM domain discovery
//! - **Commit Pipeline**: one atomic `polUni` transaction per run
//!
//! ## Architecture
//!
//! ```text
//! preflight ──► IdentityResolver ──► (builder) ──► CommitPipeline
//!      │               │                               │
//!      └───────────────┴──────── FabricController ◄────┘
//!                                  │          │
//!                             ApicClient  InMemoryFabric
//! ```

pub mod client;
pub mod commit;
pub mod controller;
pub mod encode;
pub mod memory;
pub mod mo;
pub mod preflight;
pub mod resolver;

pub use client::ApicClient;
pub use commit::{CommitPipeline, CommitReport};
pub use controller::{ClassQuery, ConfigRequest, FabricController, PropFilter};
pub use encode::encode;
pub use memory::InMemoryFabric;
pub use mo::ManagedObject;
pub use preflight::preflight;
pub use resolver::{IdentityResolver, SharedResourceOverrides};
