//! Headless device for testing and development.
//!
//! This device doesn't perform actual GPU operations but provides a valid
//! [`RenderDevice`] implementation for exercising the render graph without
//! GPU hardware. It mints monotonically increasing handles and tracks which
//! ones are live, so tests can assert that teardown released everything.

use std::collections::HashMap;

use crate::backend::traits::{
    BufferHandle, DeviceError, DeviceResult, RenderDevice, TextureHandle,
};
use crate::backend::types::{BufferDescriptor, TextureDescriptor};

/// Headless device backend.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    next_handle: u64,
    /// Live allocations with their byte sizes.
    live_textures: HashMap<TextureHandle, u64>,
    live_buffers: HashMap<BufferHandle, u64>,
    /// Byte budget; allocations beyond it fail with `OutOfMemory`. Zero
    /// means unlimited.
    memory_budget: u64,
    allocated_bytes: u64,
}

impl HeadlessDevice {
    /// Create a new headless device.
    pub fn new() -> Self {
        Self {
            // Handle 0 is reserved so external test handles can use it freely.
            next_handle: 1,
            ..Self::default()
        }
    }

    /// Create a headless device that fails allocations past `budget` bytes.
    pub fn with_memory_budget(budget: u64) -> Self {
        Self {
            memory_budget: budget,
            ..Self::new()
        }
    }

    /// Get the backend name.
    pub fn name(&self) -> &'static str {
        "Headless"
    }

    /// Number of textures created and not yet destroyed.
    pub fn live_textures(&self) -> usize {
        self.live_textures.len()
    }

    /// Number of buffers created and not yet destroyed.
    pub fn live_buffers(&self) -> usize {
        self.live_buffers.len()
    }

    /// True if the texture handle was created here and is still live.
    pub fn is_texture_live(&self, handle: TextureHandle) -> bool {
        self.live_textures.contains_key(&handle)
    }

    /// True if the buffer handle was created here and is still live.
    pub fn is_buffer_live(&self, handle: BufferHandle) -> bool {
        self.live_buffers.contains_key(&handle)
    }

    /// Bytes currently allocated across live resources.
    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes
    }

    fn reserve(&mut self, bytes: u64) -> DeviceResult<()> {
        if self.memory_budget != 0 && self.allocated_bytes + bytes > self.memory_budget {
            return Err(DeviceError::OutOfMemory);
        }
        self.allocated_bytes += bytes;
        Ok(())
    }

    fn mint_handle(&mut self) -> u64 {
        let handle = self.next_handle;
        self.next_handle += 1;
        handle
    }
}

impl RenderDevice for HeadlessDevice {
    fn create_texture(&mut self, desc: &TextureDescriptor) -> DeviceResult<TextureHandle> {
        let bytes = desc.width as u64
            * desc.height as u64
            * desc.depth.max(1) as u64
            * desc.format.block_size() as u64;
        self.reserve(bytes)?;

        let handle = TextureHandle::from_raw(self.mint_handle());
        self.live_textures.insert(handle, bytes);
        log::trace!(
            "HeadlessDevice: created texture {:?} {}x{}x{} {:?} ({} bytes)",
            desc.label,
            desc.width,
            desc.height,
            desc.depth,
            desc.format,
            bytes
        );
        Ok(handle)
    }

    fn create_buffer(&mut self, desc: &BufferDescriptor) -> DeviceResult<BufferHandle> {
        self.reserve(desc.size)?;

        let handle = BufferHandle::from_raw(self.mint_handle());
        self.live_buffers.insert(handle, desc.size);
        log::trace!(
            "HeadlessDevice: created buffer {:?} (size: {})",
            desc.label,
            desc.size
        );
        Ok(handle)
    }

    fn destroy_texture(&mut self, handle: TextureHandle) {
        match self.live_textures.remove(&handle) {
            Some(bytes) => {
                self.allocated_bytes -= bytes;
                log::trace!("HeadlessDevice: destroyed texture {}", handle.raw());
            }
            None => log::warn!(
                "HeadlessDevice: destroy_texture on unknown handle {}",
                handle.raw()
            ),
        }
    }

    fn destroy_buffer(&mut self, handle: BufferHandle) {
        match self.live_buffers.remove(&handle) {
            Some(bytes) => {
                self.allocated_bytes -= bytes;
                log::trace!("HeadlessDevice: destroyed buffer {}", handle.raw());
            }
            None => log::warn!(
                "HeadlessDevice: destroy_buffer on unknown handle {}",
                handle.raw()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::types::{BufferUsage, TextureFormat, TextureUsage};

    #[test]
    fn test_handles_are_unique() {
        let mut device = HeadlessDevice::new();
        let a = device.create_texture(&TextureDescriptor::default()).unwrap();
        let b = device.create_texture(&TextureDescriptor::default()).unwrap();
        let c = device
            .create_buffer(&BufferDescriptor::new(64, BufferUsage::UNIFORM))
            .unwrap();

        assert_ne!(a, b);
        assert_ne!(a.raw(), c.raw());
        assert_eq!(device.live_textures(), 2);
        assert_eq!(device.live_buffers(), 1);
    }

    #[test]
    fn test_destroy_removes_live_entry() {
        let mut device = HeadlessDevice::new();
        let handle = device.create_texture(&TextureDescriptor::default()).unwrap();
        assert!(device.is_texture_live(handle));

        device.destroy_texture(handle);
        assert!(!device.is_texture_live(handle));
        assert_eq!(device.live_textures(), 0);
        assert_eq!(device.allocated_bytes(), 0);
    }

    #[test]
    fn test_memory_budget() {
        let mut device = HeadlessDevice::with_memory_budget(1024);
        let desc = TextureDescriptor::new_2d(
            16,
            16,
            TextureFormat::Rgba8Unorm,
            TextureUsage::TEXTURE_BINDING,
        );

        // 16 * 16 * 4 = 1024 bytes, exactly the budget
        let handle = device.create_texture(&desc).unwrap();
        assert_eq!(device.create_texture(&desc), Err(DeviceError::OutOfMemory));

        // Freeing the first texture makes room again
        device.destroy_texture(handle);
        device.create_texture(&desc).unwrap();
    }
}
