//! Render Graph System
//!
//! A declarative system for defining render passes as a directed acyclic
//! graph. Passes reference resources by name; the graph derives execution
//! order from writer/reader relationships, culls passes with no consumers,
//! aliases transient resources, and handles resource allocation and release.

pub mod builder;
pub mod graph;
pub mod pass;
pub mod resource;

pub use builder::{GraphBuilder, PassBuilder};
pub use graph::{GraphError, GraphStats, RenderGraph};
pub use pass::{AccessMode, PassContext, RenderPass, ResourceRef};
pub use resource::{
    PhysicalResource, ResourceDescriptor, ResourceHandle, ResourceInfo, ResourceKind,
    ResourceLifetime,
};
