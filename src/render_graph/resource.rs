//! Logical and physical resources for the render graph

use crate::backend::traits::{BufferHandle, TextureHandle};
use crate::backend::types::{BufferDescriptor, TextureDescriptor, TextureUsage};

/// What kind of backing allocation a resource needs.
///
/// Render targets are textures with attachment usage; they share the
/// texture creation/deletion path but are tracked as their own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    RenderTarget,
    Buffer,
}

/// Creation payload of a logical resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceInfo {
    Texture(TextureDescriptor),
    Buffer(BufferDescriptor),
}

impl ResourceInfo {
    /// True if two payloads describe interchangeable allocations.
    ///
    /// Labels are ignored; everything that affects the device allocation
    /// (dimensions, format, usage, size) must match.
    pub fn compatible(&self, other: &ResourceInfo) -> bool {
        match (self, other) {
            (ResourceInfo::Texture(a), ResourceInfo::Texture(b)) => {
                a.width == b.width
                    && a.height == b.height
                    && a.depth == b.depth
                    && a.mip_levels == b.mip_levels
                    && a.format == b.format
                    && a.usage == b.usage
            }
            (ResourceInfo::Buffer(a), ResourceInfo::Buffer(b)) => {
                a.size == b.size && a.usage == b.usage
            }
            _ => false,
        }
    }
}

/// A named, typed placeholder for a device allocation, declared
/// independently of any specific pass.
///
/// Descriptors are immutable once declared; redeclaring a name is an error.
#[derive(Debug, Clone)]
pub struct ResourceDescriptor {
    name: String,
    info: ResourceInfo,
    transient: bool,
}

impl ResourceDescriptor {
    /// Declare a texture resource.
    pub fn texture(name: impl Into<String>, desc: TextureDescriptor) -> Self {
        Self {
            name: name.into(),
            info: ResourceInfo::Texture(desc),
            transient: false,
        }
    }

    /// Declare a buffer resource.
    pub fn buffer(name: impl Into<String>, desc: BufferDescriptor) -> Self {
        Self {
            name: name.into(),
            info: ResourceInfo::Buffer(desc),
            transient: false,
        }
    }

    /// Mark the resource as transient, making it eligible for aliasing with
    /// other transient resources whose lifetimes don't overlap.
    pub fn transient(mut self) -> Self {
        self.transient = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn info(&self) -> &ResourceInfo {
        &self.info
    }

    pub fn is_transient(&self) -> bool {
        self.transient
    }

    /// The allocation kind this descriptor resolves to.
    pub fn kind(&self) -> ResourceKind {
        match &self.info {
            ResourceInfo::Buffer(_) => ResourceKind::Buffer,
            ResourceInfo::Texture(desc) => {
                if desc.usage.contains(TextureUsage::RENDER_ATTACHMENT) {
                    ResourceKind::RenderTarget
                } else {
                    ResourceKind::Texture
                }
            }
        }
    }

    /// Approximate device memory this resource occupies, in bytes.
    ///
    /// Textures are sized from their declared format; buffers report their
    /// byte size directly.
    pub fn estimated_size(&self) -> u64 {
        match &self.info {
            ResourceInfo::Texture(desc) => {
                desc.width as u64
                    * desc.height as u64
                    * desc.depth.max(1) as u64
                    * desc.format.block_size() as u64
            }
            ResourceInfo::Buffer(desc) => desc.size,
        }
    }
}

/// Opaque handle to a realized resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceHandle {
    Texture(TextureHandle),
    Buffer(BufferHandle),
}

impl ResourceHandle {
    /// The texture handle, if this is a texture.
    pub fn texture(self) -> Option<TextureHandle> {
        match self {
            ResourceHandle::Texture(handle) => Some(handle),
            ResourceHandle::Buffer(_) => None,
        }
    }

    /// The buffer handle, if this is a buffer.
    pub fn buffer(self) -> Option<BufferHandle> {
        match self {
            ResourceHandle::Buffer(handle) => Some(handle),
            ResourceHandle::Texture(_) => None,
        }
    }
}

/// The realized backing allocation bound to one or more logical names.
///
/// Several logical resources may share one physical resource (aliasing), and
/// external resources carry handles the graph never allocated.
#[derive(Debug, Clone, Copy)]
pub struct PhysicalResource {
    pub(crate) handle: ResourceHandle,
    pub(crate) kind: ResourceKind,
    pub(crate) allocated: bool,
    pub(crate) external: bool,
}

impl PhysicalResource {
    pub fn handle(&self) -> ResourceHandle {
        self.handle
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn is_allocated(&self) -> bool {
        self.allocated
    }

    /// External resources are supplied by the caller and never freed by the
    /// graph.
    pub fn is_external(&self) -> bool {
        self.external
    }
}

/// First and last execution index at which a resource is touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceLifetime {
    pub first_use: usize,
    pub last_use: usize,
}

impl ResourceLifetime {
    pub fn new(step: usize) -> Self {
        Self {
            first_use: step,
            last_use: step,
        }
    }

    /// Extend the lifetime to cover `step`.
    pub fn touch(&mut self, step: usize) {
        self.first_use = self.first_use.min(step);
        self.last_use = self.last_use.max(step);
    }

    /// True if the two lifetimes share at least one execution step.
    pub fn overlaps(&self, other: &ResourceLifetime) -> bool {
        self.first_use <= other.last_use && other.first_use <= self.last_use
    }

    /// Grow to the union of both lifetimes.
    pub fn merge(&mut self, other: &ResourceLifetime) {
        self.first_use = self.first_use.min(other.first_use);
        self.last_use = self.last_use.max(other.last_use);
    }
}
