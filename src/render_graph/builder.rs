//! Fluent construction helper for render graphs
//!
//! [`GraphBuilder`] is convenience sugar over [`RenderGraph`]: it declares
//! resources and passes and wires reads/writes in chained calls, delegating
//! every operation to the graph.

use crate::backend::traits::DeviceError;
use crate::render_graph::graph::{GraphError, RenderGraph};
use crate::render_graph::pass::{AccessMode, PassContext, RenderPass};
use crate::render_graph::resource::{ResourceDescriptor, ResourceHandle};

/// Fluent helper borrowing a graph during construction.
pub struct GraphBuilder<'g> {
    graph: &'g mut RenderGraph,
}

impl<'g> GraphBuilder<'g> {
    pub fn new(graph: &'g mut RenderGraph) -> Self {
        Self { graph }
    }

    /// Declare a logical resource.
    pub fn resource(&mut self, descriptor: ResourceDescriptor) -> Result<&mut Self, GraphError> {
        self.graph.declare_resource(descriptor)?;
        Ok(self)
    }

    /// Bind an external resource.
    pub fn external(&mut self, name: impl Into<String>, handle: ResourceHandle) -> &mut Self {
        self.graph.set_external_resource(name, handle);
        self
    }

    /// Start declaring a pass.
    pub fn pass(&mut self, name: impl Into<String>) -> Result<PassBuilder<'_>, GraphError> {
        let pass = self.graph.add_pass(name)?;
        Ok(PassBuilder { pass })
    }
}

/// Builder for wiring a single pass's reads, writes, and callback.
pub struct PassBuilder<'p> {
    pass: &'p mut RenderPass,
}

impl PassBuilder<'_> {
    /// Declare a read of `resource`.
    pub fn read(self, resource: impl Into<String>) -> Self {
        self.pass.add_input(resource, AccessMode::Read);
        self
    }

    /// Declare a write of `resource`.
    pub fn write(self, resource: impl Into<String>) -> Self {
        self.pass.add_output(resource, AccessMode::Write);
        self
    }

    /// Declare an in-place read-modify-write of `resource`.
    pub fn read_write(self, resource: impl Into<String>) -> Self {
        let resource = resource.into();
        self.pass.add_input(resource.clone(), AccessMode::ReadWrite);
        self.pass.add_output(resource, AccessMode::ReadWrite);
        self
    }

    /// Set the execution callback.
    pub fn callback(
        self,
        callback: impl FnMut(&mut PassContext<'_>) -> Result<(), DeviceError> + Send + 'static,
    ) -> Self {
        self.pass.set_callback(callback);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::HeadlessDevice;
    use crate::backend::traits::TextureHandle;
    use crate::backend::types::{TextureDescriptor, TextureFormat, TextureUsage};

    #[test]
    fn test_builder_matches_manual_wiring() {
        let mut device = HeadlessDevice::new();
        let mut graph = RenderGraph::new();

        let mut builder = GraphBuilder::new(&mut graph);
        builder
            .resource(
                ResourceDescriptor::texture(
                    "bright",
                    TextureDescriptor::new_2d(
                        640,
                        360,
                        TextureFormat::Rgba16Float,
                        TextureUsage::RENDER_ATTACHMENT | TextureUsage::TEXTURE_BINDING,
                    ),
                )
                .transient(),
            )
            .unwrap()
            .external(
                "scene_color",
                ResourceHandle::Texture(TextureHandle::from_raw(5)),
            );
        builder
            .pass("bloom")
            .unwrap()
            .read("scene_color")
            .write("bright");
        builder
            .pass("composite")
            .unwrap()
            .read("bright")
            .read_write("scene_color");

        graph.compile(&mut device).unwrap();
        assert_eq!(graph.execution_order(), vec!["bloom", "composite"]);

        let bloom = graph.pass("bloom").unwrap();
        assert!(bloom.reads_resource("scene_color"));
        assert!(bloom.writes_resource("bright"));
        let composite = graph.pass("composite").unwrap();
        assert!(composite.reads_resource("scene_color"));
        assert!(composite.writes_resource("scene_color"));
    }

    #[test]
    fn test_builder_propagates_duplicate_errors() {
        let mut graph = RenderGraph::new();
        let mut builder = GraphBuilder::new(&mut graph);
        builder.pass("shadow").unwrap();
        assert!(builder.pass("shadow").is_err());
    }
}
