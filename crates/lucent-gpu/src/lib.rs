//! Vulkan frame pacing and resource lifecycle layer for the Lucent engine.
//!
//! This crate provides:
//! - Vulkan instance and device management
//! - Queue family role resolution
//! - Memory allocation via gpu-allocator, with deferred deletion
//! - Swapchain handling and recreation
//! - N-buffered frame pacing across graphics, transfer, and compute queues

pub mod command;
pub mod context;
pub mod deferred;
pub mod error;
pub mod instance;
pub mod memory;
pub mod pacer;
pub mod queues;
pub mod submit;
pub mod surface;
pub mod swapchain;
pub mod sync;

pub use context::{Queues, RenderContext, RenderContextBuilder};
pub use deferred::DeletionQueue;
pub use error::{GpuError, Result};
pub use memory::{GpuBuffer, GpuImage, ImageDesc, ResourceFactory};
pub use pacer::{FrameContext, FrameOutcome, FramePacer, PacerConfig};
pub use queues::{QueueAssignment, QueueFamilyInfo, QueueRole};
pub use submit::{FrameWork, QueueSubmit};
pub use surface::{SurfaceCapabilities, SurfaceContext};
pub use swapchain::{AcquireStatus, PresentStatus, Swapchain};
pub use sync::{create_fence, create_semaphore, FrameSlot, SlotSignals};

// Re-export the allocator's memory locality for resource creation.
pub use gpu_allocator::MemoryLocation;
