//! The N-buffered frame pacing state machine.
//!
//! One step per rendered frame: wait on the current slot's completion
//! fence, flush that slot's deletion queue, acquire a swapchain image,
//! record and submit, present, advance. The fence wait is the sole
//! place the engine blocks the CPU; everything else is ordered on the
//! GPU through semaphores. A stale acquire abandons the frame without
//! advancing the counter; a stale present recreates after the frame
//! completes normally.

use crate::command::{begin_command_buffer, end_command_buffer, CommandPool};
use crate::context::RenderContext;
use crate::deferred::DeletionQueue;
use crate::error::Result;
use crate::submit::{execute, plan_submissions, FrameWork};
use crate::surface::SurfaceContext;
use crate::swapchain::{AcquireStatus, PresentStatus, Swapchain};
use crate::sync::{reset_fence, wait_for_fence, FrameSlot};
use ash::vk;

/// Frame pacing configuration.
///
/// Consumed by value at pacer construction; immutable afterwards.
#[derive(Debug, Clone, Copy)]
pub struct PacerConfig {
    /// Number of frames the CPU may prepare ahead of the GPU.
    pub frames_in_flight: usize,
    /// Budget for each completion-fence wait. A wait that exceeds it is
    /// a fatal error rather than a hang; `u64::MAX` restores unbounded
    /// waiting.
    pub fence_timeout_ns: u64,
    /// Prefer FIFO presentation over mailbox.
    pub vsync: bool,
}

impl Default for PacerConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            fence_timeout_ns: 10_000_000_000,
            vsync: false,
        }
    }
}

/// What a `render_frame` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// The frame was submitted and presented.
    Rendered,
    /// The swapchain was stale at acquire; it was recreated and the
    /// frame abandoned without advancing the frame counter.
    SkippedStale,
}

/// Everything the record callback needs for one frame.
pub struct FrameContext<'a> {
    /// Device handle for recording commands.
    pub device: &'a ash::Device,
    /// Graphics command buffer, already begun; ended by the pacer.
    pub graphics_cmd: vk::CommandBuffer,
    /// Transfer command buffer; the callback begins/ends it if used.
    pub transfer_cmd: vk::CommandBuffer,
    /// Compute command buffer; the callback begins/ends it if used.
    pub compute_cmd: vk::CommandBuffer,
    /// Index of the acquired swapchain image.
    pub image_index: u32,
    /// The acquired swapchain image.
    pub image: vk::Image,
    /// View over the acquired image.
    pub image_view: vk::ImageView,
    /// Current swapchain extent.
    pub extent: vk::Extent2D,
    /// Monotonic frame number.
    pub frame_number: u64,
    /// Deletion queue of the current slot: resources retired here are
    /// destroyed once this slot's fence is next observed signaled.
    pub deletions: &'a mut DeletionQueue,
}

/// Slot index for a frame number.
fn slot_index_for(frame_count: u64, slot_count: usize) -> usize {
    (frame_count % slot_count as u64) as usize
}

/// The frame pacer: owns the frame slots and drives one frame per call.
pub struct FramePacer {
    slots: Vec<FrameSlot>,
    graphics_pool: CommandPool,
    transfer_pool: Option<CommandPool>,
    compute_pool: Option<CommandPool>,
    frame_count: u64,
    config: PacerConfig,
}

impl FramePacer {
    /// Create the pacer with its slots and per-family command pools.
    ///
    /// Pools for the transfer and compute roles are created only when
    /// those roles resolved to families distinct from graphics.
    pub fn new(ctx: &RenderContext, config: PacerConfig) -> Result<Self> {
        assert!(config.frames_in_flight >= 1, "at least one frame slot");

        let device = ctx.device();
        let assignment = ctx.assignment();
        let flags = vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER;

        let graphics_pool = unsafe { CommandPool::new(device, assignment.graphics, flags)? };
        let transfer_pool = if assignment.has_dedicated_transfer() {
            Some(unsafe { CommandPool::new(device, assignment.transfer, flags)? })
        } else {
            None
        };
        let compute_pool = if assignment.has_dedicated_compute() {
            Some(unsafe { CommandPool::new(device, assignment.compute, flags)? })
        } else {
            None
        };

        let mut slots = Vec::with_capacity(config.frames_in_flight);
        for _ in 0..config.frames_in_flight {
            let graphics_cmd = unsafe { graphics_pool.allocate_command_buffer(device)? };
            let transfer_cmd = unsafe {
                transfer_pool
                    .as_ref()
                    .unwrap_or(&graphics_pool)
                    .allocate_command_buffer(device)?
            };
            let compute_cmd = unsafe {
                compute_pool
                    .as_ref()
                    .unwrap_or(&graphics_pool)
                    .allocate_command_buffer(device)?
            };

            slots.push(unsafe { FrameSlot::new(device, graphics_cmd, transfer_cmd, compute_cmd)? });
        }

        Ok(Self {
            slots,
            graphics_pool,
            transfer_pool,
            compute_pool,
            frame_count: 0,
            config,
        })
    }

    /// Total frames rendered.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Index of the slot the next frame will use.
    pub fn slot_index(&self) -> usize {
        slot_index_for(self.frame_count, self.slots.len())
    }

    /// Number of frame slots.
    pub fn frames_in_flight(&self) -> usize {
        self.slots.len()
    }

    /// Deletion queue of the slot the next frame will use.
    ///
    /// Resources registered here are destroyed only after that slot's
    /// fence is next observed signaled.
    pub fn current_slot_deletions(&mut self) -> &mut DeletionQueue {
        let index = self.slot_index();
        &mut self.slots[index].deletions
    }

    /// Drive one frame.
    ///
    /// `record` is invoked with the slot's command buffers after the
    /// graphics buffer has been begun; it returns the work to submit.
    /// `window_extent` is the fallback extent used if the swapchain
    /// must be recreated.
    pub fn render_frame<F>(
        &mut self,
        ctx: &RenderContext,
        surface: &SurfaceContext,
        swapchain: &mut Swapchain,
        window_extent: (u32, u32),
        record: F,
    ) -> Result<FrameOutcome>
    where
        F: FnOnce(&mut FrameContext<'_>) -> Result<FrameWork>,
    {
        let index = self.slot_index();
        let device = ctx.device();

        // Wait: the sole CPU block, bounding frames in flight to N.
        let fence = self.slots[index].in_flight;
        unsafe { wait_for_fence(device, fence, self.config.fence_timeout_ns)? };

        // Reclaim: the fence proves this slot's prior work finished, so
        // resources it retired are safe to destroy now.
        self.slots[index].deletions.flush();

        let image_available = self.slots[index].image_available;
        let status = unsafe {
            swapchain.acquire_next_image(&surface.swapchain_loader, image_available, u64::MAX)?
        };

        let image_index = match status {
            AcquireStatus::Ready { image_index } => image_index,
            AcquireStatus::Stale => {
                // The fence was not reset yet, so the abandoned slot is
                // re-waited (and returns immediately) next call.
                self.recreate(ctx, surface, swapchain, window_extent)?;
                return Ok(FrameOutcome::SkippedStale);
            }
        };

        // Reset only after a successful acquire: the frame is now
        // committed to submit and re-signal the fence.
        unsafe { reset_fence(device, fence)? };

        let slot = &mut self.slots[index];
        let signals = slot.signals();
        let graphics_cmd = slot.graphics_cmd;

        unsafe {
            device.reset_command_buffer(graphics_cmd, vk::CommandBufferResetFlags::empty())?;
            begin_command_buffer(
                device,
                graphics_cmd,
                vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT,
            )?;
        }

        let work = {
            let mut frame = FrameContext {
                device,
                graphics_cmd,
                transfer_cmd: slot.transfer_cmd,
                compute_cmd: slot.compute_cmd,
                image_index,
                image: swapchain.images[image_index as usize],
                image_view: swapchain.image_views[image_index as usize],
                extent: swapchain.extent,
                frame_number: self.frame_count,
                deletions: &mut slot.deletions,
            };
            record(&mut frame)?
        };

        unsafe { end_command_buffer(device, graphics_cmd)? };

        let plan = plan_submissions(&signals, ctx.assignment(), &work);
        unsafe { execute(device, ctx.queues(), &plan)? };

        let present_status = unsafe {
            swapchain.present(
                &surface.swapchain_loader,
                ctx.queues().present,
                image_index,
                &[signals.render_finished],
            )?
        };

        if present_status == PresentStatus::Stale {
            // Submission already happened and completes normally; only
            // the swapchain needs rebuilding.
            self.recreate(ctx, surface, swapchain, window_extent)?;
        }

        self.frame_count += 1;
        Ok(FrameOutcome::Rendered)
    }

    /// Rebuild the swapchain at the given extent.
    ///
    /// Waits for the device to go idle, destroys the current state
    /// wholesale (slot sync primitives untouched), and constructs a
    /// fresh one from the latest surface capabilities. Safe to call
    /// back-to-back: each call only ever destroys the state the
    /// previous call constructed.
    pub fn recreate(
        &self,
        ctx: &RenderContext,
        surface: &SurfaceContext,
        swapchain: &mut Swapchain,
        (width, height): (u32, u32),
    ) -> Result<()> {
        if width == 0 || height == 0 {
            // Minimized; keep the stale swapchain until a real extent
            return Ok(());
        }

        ctx.wait_idle()?;

        unsafe {
            swapchain.destroy(ctx.device(), &surface.swapchain_loader);
        }

        *swapchain =
            unsafe { surface.create_swapchain(ctx, width, height, self.config.vsync, None)? };

        tracing::info!(
            "Swapchain recreated: {}x{}",
            swapchain.extent.width,
            swapchain.extent.height
        );

        Ok(())
    }

    /// Tear the pacer down.
    ///
    /// Waits for the device, flushes every slot's deletion queue (all
    /// fences have signaled once the device is idle), then destroys the
    /// slots' sync primitives and the command pools.
    pub fn destroy(&mut self, ctx: &RenderContext) -> Result<()> {
        ctx.wait_idle()?;

        for slot in &mut self.slots {
            slot.deletions.flush();
        }

        let device = ctx.device();
        unsafe {
            for slot in &self.slots {
                slot.destroy(device);
            }
            if let Some(pool) = &self.transfer_pool {
                pool.destroy(device);
            }
            if let Some(pool) = &self.compute_pool {
                pool.destroy(device);
            }
            self.graphics_pool.destroy(device);
        }
        self.slots.clear();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_index_cycles_modulo_slot_count() {
        assert_eq!(slot_index_for(0, 2), 0);
        assert_eq!(slot_index_for(1, 2), 1);
        assert_eq!(slot_index_for(2, 2), 0);
        assert_eq!(slot_index_for(7, 3), 1);
    }

    #[test]
    fn abandoned_frame_reuses_the_same_slot() {
        // A stale acquire leaves frame_count untouched, so the next
        // call lands on the same slot and re-waits its fence.
        let frame_count = 5_u64;
        let before = slot_index_for(frame_count, 2);
        let after = slot_index_for(frame_count, 2);
        assert_eq!(before, after);
    }

    #[test]
    fn default_config_bounds_fence_waits() {
        let config = PacerConfig::default();
        assert_eq!(config.frames_in_flight, 2);
        assert!(config.fence_timeout_ns < u64::MAX);
    }
}
