//! GPU error types.
//!
//! Every variant here is fatal to the render context. Recoverable
//! conditions (a stale swapchain at acquire or present) are carried as
//! status values by the swapchain module, never as errors.

use ash::vk;
use thiserror::Error;

/// GPU-related errors.
#[derive(Error, Debug)]
pub enum GpuError {
    /// Vulkan error.
    #[error("Vulkan error: {0}")]
    Vulkan(#[from] vk::Result),

    /// No suitable GPU found.
    #[error("No suitable GPU found")]
    NoSuitableDevice,

    /// No queue family combination covering graphics and presentation.
    #[error("No suitable queue families (graphics + present required)")]
    NoSuitableQueueFamilies,

    /// Surface reports no usable formats or present modes.
    #[error("Unsupported surface: {0}")]
    UnsupportedSurface(String),

    /// Format does not support the requested tiling/usage.
    #[error("Unsupported format: {0:?}")]
    UnsupportedFormat(vk::Format),

    /// Memory allocation failed.
    #[error("Memory allocation failed: {0}")]
    AllocationFailed(String),

    /// Surface creation failed.
    #[error("Surface creation failed: {0}")]
    SurfaceCreation(String),

    /// Swapchain creation failed.
    #[error("Swapchain creation failed: {0}")]
    SwapchainCreation(String),

    /// A frame fence did not signal within the configured timeout.
    #[error("Fence wait timed out after {timeout_ns} ns")]
    FenceTimeout {
        /// The configured wait budget that elapsed.
        timeout_ns: u64,
    },

    /// Invalid state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, GpuError>;
