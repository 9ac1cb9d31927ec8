//! Synchronization primitives and per-frame slots.

use crate::deferred::DeletionQueue;
use crate::error::{GpuError, Result};
use ash::vk;

/// Create a semaphore.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_semaphore(device: &ash::Device) -> Result<vk::Semaphore> {
    let create_info = vk::SemaphoreCreateInfo::default();
    let semaphore = device.create_semaphore(&create_info, None)?;
    Ok(semaphore)
}

/// Create a fence.
///
/// # Safety
/// The device must be valid.
pub unsafe fn create_fence(device: &ash::Device, signaled: bool) -> Result<vk::Fence> {
    let flags = if signaled {
        vk::FenceCreateFlags::SIGNALED
    } else {
        vk::FenceCreateFlags::empty()
    };

    let create_info = vk::FenceCreateInfo::default().flags(flags);
    let fence = device.create_fence(&create_info, None)?;
    Ok(fence)
}

/// Wait for a fence to be signaled.
///
/// A wait exceeding `timeout_ns` is reported as [`GpuError::FenceTimeout`]
/// rather than hanging: a fence that never signals means the device has
/// stopped making forward progress.
///
/// # Safety
/// The device and fence must be valid.
pub unsafe fn wait_for_fence(device: &ash::Device, fence: vk::Fence, timeout_ns: u64) -> Result<()> {
    match device.wait_for_fences(&[fence], true, timeout_ns) {
        Ok(()) => Ok(()),
        Err(vk::Result::TIMEOUT) => Err(GpuError::FenceTimeout { timeout_ns }),
        Err(e) => Err(GpuError::from(e)),
    }
}

/// Reset a fence to unsignaled state.
///
/// # Safety
/// The device and fence must be valid.
pub unsafe fn reset_fence(device: &ash::Device, fence: vk::Fence) -> Result<()> {
    device.reset_fences(&[fence])?;
    Ok(())
}

/// Copyable view of a slot's synchronization handles, used by the
/// submission planner.
#[derive(Debug, Clone, Copy)]
pub struct SlotSignals {
    /// Signaled by acquire when the swapchain image is ready.
    pub image_available: vk::Semaphore,
    /// Signaled by the final graphics submission, waited by present.
    pub render_finished: vk::Semaphore,
    /// Signaled by a dedicated transfer submission.
    pub transfer_complete: vk::Semaphore,
    /// Signaled by a dedicated compute submission.
    pub compute_complete: vk::Semaphore,
    /// Signaled on GPU completion of the slot's frame.
    pub in_flight: vk::Fence,
}

/// One of N reusable frame slots.
///
/// Holds the slot's ordering semaphores, completion fence, per-queue
/// command buffers, and the deletion queue flushed once the fence has
/// been observed signaled. Created at startup and reused every N-th
/// frame; destroyed only at shutdown.
pub struct FrameSlot {
    pub image_available: vk::Semaphore,
    pub render_finished: vk::Semaphore,
    pub transfer_complete: vk::Semaphore,
    pub compute_complete: vk::Semaphore,
    /// Created signaled so the first wait on a fresh slot returns
    /// immediately.
    pub in_flight: vk::Fence,
    pub graphics_cmd: vk::CommandBuffer,
    pub transfer_cmd: vk::CommandBuffer,
    pub compute_cmd: vk::CommandBuffer,
    /// Resources retired while this slot's frame was recorded; flushed
    /// at the slot's next fence wait.
    pub deletions: DeletionQueue,
}

impl FrameSlot {
    /// Create a slot from pre-allocated command buffers.
    ///
    /// # Safety
    /// The device must be valid and the command buffers must outlive the
    /// slot.
    pub unsafe fn new(
        device: &ash::Device,
        graphics_cmd: vk::CommandBuffer,
        transfer_cmd: vk::CommandBuffer,
        compute_cmd: vk::CommandBuffer,
    ) -> Result<Self> {
        Ok(Self {
            image_available: create_semaphore(device)?,
            render_finished: create_semaphore(device)?,
            transfer_complete: create_semaphore(device)?,
            compute_complete: create_semaphore(device)?,
            in_flight: create_fence(device, true)?,
            graphics_cmd,
            transfer_cmd,
            compute_cmd,
            deletions: DeletionQueue::new(),
        })
    }

    /// Handles consumed by the submission planner.
    pub fn signals(&self) -> SlotSignals {
        SlotSignals {
            image_available: self.image_available,
            render_finished: self.render_finished,
            transfer_complete: self.transfer_complete,
            compute_complete: self.compute_complete,
            in_flight: self.in_flight,
        }
    }

    /// Destroy the slot's synchronization primitives.
    ///
    /// # Safety
    /// The device must be valid and the slot must not be in use.
    pub unsafe fn destroy(&self, device: &ash::Device) {
        device.destroy_semaphore(self.image_available, None);
        device.destroy_semaphore(self.render_finished, None);
        device.destroy_semaphore(self.transfer_complete, None);
        device.destroy_semaphore(self.compute_complete, None);
        device.destroy_fence(self.in_flight, None);
    }
}
