//! Device abstraction for physical resource allocation.
//!
//! The render graph never talks to a GPU API directly; it creates and
//! destroys backing resources through the [`RenderDevice`] trait. The
//! [`HeadlessDevice`] implementation mints handles without touching any
//! hardware and backs the test suite and examples.

pub mod headless;
pub mod traits;
pub mod types;

pub use headless::HeadlessDevice;
pub use traits::{BufferHandle, DeviceError, DeviceResult, RenderDevice, TextureHandle};
pub use types::{BufferDescriptor, BufferUsage, TextureDescriptor, TextureFormat, TextureUsage};
