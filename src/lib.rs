//! Framegraph - a dependency-driven render graph
//!
//! Passes declare which named resources they read and write; the graph
//! compiles a valid execution order from those declarations, culls passes
//! whose results nobody consumes, aliases transient resources with
//! non-overlapping lifetimes, and allocates backing resources through an
//! abstract device.
//!
//! # Features
//! - Declarative pass/resource wiring with a fluent [`GraphBuilder`]
//! - Topological pass ordering with hard cycle detection
//! - Dead-pass culling driven by final sinks and external outputs
//! - Transient resource aliasing based on lifetime analysis
//! - External (imported) resources that the graph never allocates or frees
//! - Graphviz export and per-format memory statistics for tooling
//!
//! # Example
//!
//! ```
//! use framegraph::{
//!     AccessMode, HeadlessDevice, RenderGraph, ResourceDescriptor, TextureDescriptor,
//!     TextureFormat, TextureUsage,
//! };
//!
//! let mut device = HeadlessDevice::new();
//! let mut graph = RenderGraph::new();
//!
//! graph
//!     .declare_resource(ResourceDescriptor::texture(
//!         "shadow_map",
//!         TextureDescriptor::new_2d(
//!             2048,
//!             2048,
//!             TextureFormat::Depth32Float,
//!             TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
//!         ),
//!     ))
//!     .unwrap();
//!
//! let pass = graph.add_pass("shadow").unwrap();
//! pass.add_output("shadow_map", AccessMode::Write);
//!
//! graph.compile(&mut device).unwrap();
//! graph.execute(&mut device).unwrap();
//! graph.clear(&mut device);
//! ```

pub mod backend;
pub mod render_graph;

// Re-export main types for convenience
pub use backend::{
    BufferDescriptor, BufferHandle, BufferUsage, DeviceError, DeviceResult, HeadlessDevice,
    RenderDevice, TextureDescriptor, TextureFormat, TextureHandle, TextureUsage,
};
pub use render_graph::{
    AccessMode, GraphBuilder, GraphError, GraphStats, PassBuilder, PassContext, PhysicalResource,
    RenderGraph, RenderPass, ResourceDescriptor, ResourceHandle, ResourceInfo, ResourceKind,
    ResourceLifetime, ResourceRef,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the framegraph subsystem.
///
/// Optional; only emits a startup log line. Graphs and devices are plain
/// values owned by the caller.
pub fn init() {
    log::info!("framegraph v{} initialized", VERSION);
}
