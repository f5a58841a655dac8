//! Core device abstraction trait
//!
//! [`RenderDevice`] is the interface through which the render graph
//! allocates and releases backing resources. Deletion is explicit and keyed
//! by resource kind; handles are plain value types with no drop behavior.

use thiserror::Error;

use crate::backend::types::{BufferDescriptor, TextureDescriptor};

/// Device error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Failed to create texture: {0}")]
    TextureCreationFailed(String),
    #[error("Failed to create buffer: {0}")]
    BufferCreationFailed(String),
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Device lost")]
    DeviceLost,
}

pub type DeviceResult<T> = Result<T, DeviceError>;

/// Handle to a device texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureHandle(u64);

impl TextureHandle {
    /// Wrap a raw handle value supplied by an external owner (e.g. a
    /// swap-chain layer).
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Handle to a device buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferHandle(u64);

impl BufferHandle {
    /// Wrap a raw handle value supplied by an external owner.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw handle value.
    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Resource allocation interface implemented by device backends.
///
/// The graph calls `create_*` during compilation and `destroy_*` from
/// [`RenderGraph::clear`](crate::RenderGraph::clear). Pass callbacks may use
/// the device for whatever submission work they need; the graph itself only
/// uses these four methods.
pub trait RenderDevice {
    /// Create a texture
    fn create_texture(&mut self, desc: &TextureDescriptor) -> DeviceResult<TextureHandle>;

    /// Create a buffer
    fn create_buffer(&mut self, desc: &BufferDescriptor) -> DeviceResult<BufferHandle>;

    /// Destroy a texture
    fn destroy_texture(&mut self, handle: TextureHandle);

    /// Destroy a buffer
    fn destroy_buffer(&mut self, handle: BufferHandle);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = DeviceError::OutOfMemory;
        assert_eq!(err.to_string(), "Out of memory");

        let err = DeviceError::TextureCreationFailed("no memory type".to_string());
        assert_eq!(err.to_string(), "Failed to create texture: no memory type");
    }

    #[test]
    fn test_handle_roundtrip() {
        let handle = TextureHandle::from_raw(42);
        assert_eq!(handle.raw(), 42);
        assert_eq!(handle, TextureHandle::from_raw(42));
        assert_ne!(handle, TextureHandle::from_raw(43));
    }
}
