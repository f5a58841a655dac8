//! Render pass definitions for the render graph

use std::collections::HashMap;
use std::fmt;

use crate::backend::traits::{BufferHandle, DeviceError, RenderDevice, TextureHandle};
use crate::render_graph::resource::{PhysicalResource, ResourceHandle};

/// How a pass accesses a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessMode {
    Read,
    Write,
    ReadWrite,
}

impl AccessMode {
    /// True if this access reads the resource.
    pub fn is_read(&self) -> bool {
        matches!(self, AccessMode::Read | AccessMode::ReadWrite)
    }

    /// True if this access may write to the resource.
    pub fn is_write(&self) -> bool {
        matches!(self, AccessMode::Write | AccessMode::ReadWrite)
    }
}

/// A (resource name, access mode) pair attached to a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub resource: String,
    pub access: AccessMode,
}

/// Callback invoked when a pass executes.
///
/// Callbacks get a [`PassContext`] to resolve resource handles and reach the
/// device; errors propagate out of
/// [`RenderGraph::execute`](crate::RenderGraph::execute) unmodified.
pub type PassCallback = Box<dyn FnMut(&mut PassContext<'_>) -> Result<(), DeviceError> + Send>;

/// Context handed to a pass callback during execution.
pub struct PassContext<'a> {
    pub(crate) device: &'a mut dyn RenderDevice,
    pub(crate) physical: &'a HashMap<String, PhysicalResource>,
    pub(crate) aliases: &'a HashMap<String, String>,
    pub(crate) pass_name: &'a str,
}

impl<'a> PassContext<'a> {
    /// Name of the executing pass.
    pub fn pass_name(&self) -> &str {
        self.pass_name
    }

    /// The device, for issuing submission work from inside the callback.
    pub fn device(&mut self) -> &mut dyn RenderDevice {
        &mut *self.device
    }

    /// Resolve a logical resource name to its backing handle, following one
    /// alias indirection. Returns `None` for unresolved names.
    pub fn resource(&self, name: &str) -> Option<ResourceHandle> {
        if let Some(physical) = self.physical.get(name) {
            return Some(physical.handle());
        }
        let target = self.aliases.get(name)?;
        self.physical.get(target).map(|physical| physical.handle())
    }

    /// Resolve a name to a texture handle.
    pub fn texture(&self, name: &str) -> Option<TextureHandle> {
        self.resource(name)?.texture()
    }

    /// Resolve a name to a buffer handle.
    pub fn buffer(&self, name: &str) -> Option<BufferHandle> {
        self.resource(name)?.buffer()
    }
}

/// A named unit of graph-scheduled work with declared resource reads/writes
/// and an optional callback.
///
/// Created through [`RenderGraph::add_pass`](crate::RenderGraph::add_pass),
/// populated during graph construction, consumed by compile/execute.
pub struct RenderPass {
    name: String,
    inputs: Vec<ResourceRef>,
    outputs: Vec<ResourceRef>,
    callback: Option<PassCallback>,
    culled: bool,
    execution_order: Option<usize>,
}

impl RenderPass {
    pub(crate) fn new(name: String) -> Self {
        Self {
            name,
            inputs: Vec::new(),
            outputs: Vec::new(),
            callback: None,
            culled: false,
            execution_order: None,
        }
    }

    /// Get the pass name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare that this pass reads from a resource.
    ///
    /// References are appended as-is; declaring the same resource twice
    /// produces duplicate dependency edges, which the scheduler tolerates.
    pub fn add_input(&mut self, resource: impl Into<String>, access: AccessMode) -> &mut Self {
        self.inputs.push(ResourceRef {
            resource: resource.into(),
            access,
        });
        self
    }

    /// Declare that this pass writes to a resource.
    pub fn add_output(&mut self, resource: impl Into<String>, access: AccessMode) -> &mut Self {
        self.outputs.push(ResourceRef {
            resource: resource.into(),
            access,
        });
        self
    }

    /// Set the callback invoked when this pass executes.
    pub fn set_callback(
        &mut self,
        callback: impl FnMut(&mut PassContext<'_>) -> Result<(), DeviceError> + Send + 'static,
    ) -> &mut Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Input resource references, in declaration order.
    pub fn inputs(&self) -> &[ResourceRef] {
        &self.inputs
    }

    /// Output resource references, in declaration order.
    pub fn outputs(&self) -> &[ResourceRef] {
        &self.outputs
    }

    /// True if compilation culled this pass.
    pub fn is_culled(&self) -> bool {
        self.culled
    }

    /// Position in the compiled execution order, if compiled.
    pub fn execution_order(&self) -> Option<usize> {
        self.execution_order
    }

    pub fn reads_resource(&self, resource: &str) -> bool {
        self.inputs.iter().any(|r| r.resource == resource)
    }

    pub fn writes_resource(&self, resource: &str) -> bool {
        self.outputs.iter().any(|r| r.resource == resource)
    }

    pub(crate) fn set_culled(&mut self, culled: bool) {
        self.culled = culled;
    }

    pub(crate) fn set_execution_order(&mut self, order: usize) {
        self.execution_order = Some(order);
    }

    pub(crate) fn reset_schedule(&mut self) {
        self.culled = false;
        self.execution_order = None;
    }

    /// Invoke the callback.
    ///
    /// Culled passes and passes without a callback are a silent no-op.
    pub fn execute(&mut self, ctx: &mut PassContext<'_>) -> Result<(), DeviceError> {
        if self.culled {
            return Ok(());
        }
        match self.callback.as_mut() {
            Some(callback) => callback(ctx),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for RenderPass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderPass")
            .field("name", &self.name)
            .field("inputs", &self.inputs)
            .field("outputs", &self.outputs)
            .field("has_callback", &self.callback.is_some())
            .field("culled", &self.culled)
            .field("execution_order", &self.execution_order)
            .finish()
    }
}
