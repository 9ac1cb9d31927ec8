//! Multi-queue submission planning and execution.
//!
//! For each frame the orchestrator turns the recorded work into one
//! submission per queue with the wait/signal chain that keeps producers
//! ahead of consumers: transfer work that stages a resource signals
//! before the graphics submission that reads it, compute work the same.
//! Work recorded for a role that resolves to the graphics family is
//! folded into the graphics submission instead, since ordering within a
//! single queue's command stream is implicit and needs no semaphore.
//!
//! Planning is pure and never blocks; semaphore waits are GPU-side
//! only.

use crate::context::Queues;
use crate::error::Result;
use crate::queues::{QueueAssignment, QueueRole};
use crate::sync::SlotSignals;
use ash::vk;

/// Stages at which the graphics submission first writes the acquired
/// swapchain image: attachment output for draws, transfer for
/// clears/blits. The image-available wait gates both.
pub const ACQUIRE_CONSUME_STAGES: vk::PipelineStageFlags = vk::PipelineStageFlags::from_raw(
    vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT.as_raw()
        | vk::PipelineStageFlags::TRANSFER.as_raw(),
);

/// Pipeline stage at which the graphics queue consumes staged transfer
/// data (vertex/index pulls from freshly copied buffers).
pub const TRANSFER_CONSUME_STAGE: vk::PipelineStageFlags = vk::PipelineStageFlags::VERTEX_INPUT;

/// Pipeline stage at which the graphics queue consumes compute output
/// (e.g. a particle buffer read as vertex data).
pub const COMPUTE_CONSUME_STAGE: vk::PipelineStageFlags = vk::PipelineStageFlags::VERTEX_INPUT;

/// Command buffers recorded for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameWork {
    /// Graphics work; always present and always submitted last.
    pub graphics: vk::CommandBuffer,
    /// Optional staging/upload work for the transfer role.
    pub transfer: Option<vk::CommandBuffer>,
    /// Optional compute work consumed by graphics this frame.
    pub compute: Option<vk::CommandBuffer>,
}

impl FrameWork {
    /// Frame consisting of graphics work only.
    pub fn graphics_only(graphics: vk::CommandBuffer) -> Self {
        Self {
            graphics,
            transfer: None,
            compute: None,
        }
    }

    /// Attach transfer work to the frame.
    pub fn with_transfer(mut self, transfer: vk::CommandBuffer) -> Self {
        self.transfer = Some(transfer);
        self
    }

    /// Attach compute work to the frame.
    pub fn with_compute(mut self, compute: vk::CommandBuffer) -> Self {
        self.compute = Some(compute);
        self
    }
}

/// One planned queue submission.
#[derive(Debug, Clone)]
pub struct QueueSubmit {
    /// Queue the submission targets.
    pub role: QueueRole,
    /// Command buffers, in execution order.
    pub command_buffers: Vec<vk::CommandBuffer>,
    /// Semaphores to wait on, paired with `wait_stages`.
    pub wait_semaphores: Vec<vk::Semaphore>,
    /// Destination stage for each wait.
    pub wait_stages: Vec<vk::PipelineStageFlags>,
    /// Semaphores signaled on completion.
    pub signal_semaphores: Vec<vk::Semaphore>,
    /// Fence signaled on completion (null except the final graphics
    /// submission, which signals the slot's completion fence).
    pub fence: vk::Fence,
}

/// Build the submission plan for one frame.
///
/// The final graphics submission waits on the slot's image-available
/// semaphore and signals both its render-finished semaphore and its
/// completion fence.
pub fn plan_submissions(
    signals: &SlotSignals,
    assignment: &QueueAssignment,
    work: &FrameWork,
) -> Vec<QueueSubmit> {
    let mut plan = Vec::with_capacity(3);

    let mut graphics_buffers = Vec::with_capacity(3);
    let mut graphics_waits = vec![signals.image_available];
    let mut graphics_stages = vec![ACQUIRE_CONSUME_STAGES];

    if let Some(transfer) = work.transfer {
        if assignment.has_dedicated_transfer() {
            plan.push(QueueSubmit {
                role: QueueRole::Transfer,
                command_buffers: vec![transfer],
                wait_semaphores: Vec::new(),
                wait_stages: Vec::new(),
                signal_semaphores: vec![signals.transfer_complete],
                fence: vk::Fence::null(),
            });
            graphics_waits.push(signals.transfer_complete);
            graphics_stages.push(TRANSFER_CONSUME_STAGE);
        } else {
            // Same family: in-queue ordering suffices, no semaphore.
            graphics_buffers.push(transfer);
        }
    }

    if let Some(compute) = work.compute {
        if assignment.has_dedicated_compute() {
            plan.push(QueueSubmit {
                role: QueueRole::Compute,
                command_buffers: vec![compute],
                wait_semaphores: Vec::new(),
                wait_stages: Vec::new(),
                signal_semaphores: vec![signals.compute_complete],
                fence: vk::Fence::null(),
            });
            graphics_waits.push(signals.compute_complete);
            graphics_stages.push(COMPUTE_CONSUME_STAGE);
        } else {
            graphics_buffers.push(compute);
        }
    }

    graphics_buffers.push(work.graphics);

    plan.push(QueueSubmit {
        role: QueueRole::Graphics,
        command_buffers: graphics_buffers,
        wait_semaphores: graphics_waits,
        wait_stages: graphics_stages,
        signal_semaphores: vec![signals.render_finished],
        fence: signals.in_flight,
    });

    plan
}

/// Execute a submission plan, one `vkQueueSubmit` per entry.
///
/// # Safety
/// All handles in the plan must be valid and the queues must match the
/// assignment the plan was built against.
pub unsafe fn execute(device: &ash::Device, queues: &Queues, plan: &[QueueSubmit]) -> Result<()> {
    for submit in plan {
        let submit_info = vk::SubmitInfo::default()
            .command_buffers(&submit.command_buffers)
            .wait_semaphores(&submit.wait_semaphores)
            .wait_dst_stage_mask(&submit.wait_stages)
            .signal_semaphores(&submit.signal_semaphores);

        device.queue_submit(queues.by_role(submit.role), &[submit_info], submit.fence)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;

    fn signals() -> SlotSignals {
        SlotSignals {
            image_available: vk::Semaphore::from_raw(1),
            render_finished: vk::Semaphore::from_raw(2),
            transfer_complete: vk::Semaphore::from_raw(3),
            compute_complete: vk::Semaphore::from_raw(4),
            in_flight: vk::Fence::from_raw(5),
        }
    }

    fn cmd(raw: u64) -> vk::CommandBuffer {
        vk::CommandBuffer::from_raw(raw)
    }

    fn unified_assignment() -> QueueAssignment {
        QueueAssignment {
            graphics: 0,
            present: 0,
            transfer: 0,
            compute: 0,
        }
    }

    fn split_assignment() -> QueueAssignment {
        QueueAssignment {
            graphics: 0,
            present: 0,
            transfer: 1,
            compute: 2,
        }
    }

    #[test]
    fn graphics_only_plan_waits_acquire_and_signals_present_and_fence() {
        let plan = plan_submissions(
            &signals(),
            &unified_assignment(),
            &FrameWork::graphics_only(cmd(10)),
        );

        assert_eq!(plan.len(), 1);
        let graphics = &plan[0];
        assert_eq!(graphics.role, QueueRole::Graphics);
        assert_eq!(graphics.command_buffers, vec![cmd(10)]);
        assert_eq!(graphics.wait_semaphores, vec![signals().image_available]);
        assert_eq!(graphics.wait_stages, vec![ACQUIRE_CONSUME_STAGES]);
        assert_eq!(graphics.signal_semaphores, vec![signals().render_finished]);
        assert_eq!(graphics.fence, signals().in_flight);
    }

    #[test]
    fn dedicated_transfer_chains_through_semaphore() {
        let work = FrameWork::graphics_only(cmd(10)).with_transfer(cmd(11));
        let plan = plan_submissions(&signals(), &split_assignment(), &work);

        assert_eq!(plan.len(), 2);

        let transfer = &plan[0];
        assert_eq!(transfer.role, QueueRole::Transfer);
        assert!(transfer.wait_semaphores.is_empty());
        assert_eq!(transfer.signal_semaphores, vec![signals().transfer_complete]);
        assert_eq!(transfer.fence, vk::Fence::null());

        let graphics = &plan[1];
        assert!(graphics
            .wait_semaphores
            .contains(&signals().transfer_complete));
        assert_eq!(graphics.command_buffers, vec![cmd(10)]);
    }

    #[test]
    fn same_family_work_folds_into_graphics_submission() {
        let work = FrameWork::graphics_only(cmd(10))
            .with_transfer(cmd(11))
            .with_compute(cmd(12));
        let plan = plan_submissions(&signals(), &unified_assignment(), &work);

        // One submission: producers precede the graphics buffer in the
        // same queue's command stream.
        assert_eq!(plan.len(), 1);
        let graphics = &plan[0];
        assert_eq!(graphics.command_buffers, vec![cmd(11), cmd(12), cmd(10)]);
        assert_eq!(graphics.wait_semaphores, vec![signals().image_available]);
    }

    #[test]
    fn transfer_and_compute_both_gate_graphics() {
        let work = FrameWork::graphics_only(cmd(10))
            .with_transfer(cmd(11))
            .with_compute(cmd(12));
        let plan = plan_submissions(&signals(), &split_assignment(), &work);

        assert_eq!(plan.len(), 3);
        assert_eq!(plan[0].role, QueueRole::Transfer);
        assert_eq!(plan[1].role, QueueRole::Compute);

        let graphics = &plan[2];
        assert_eq!(graphics.role, QueueRole::Graphics);
        assert_eq!(graphics.wait_semaphores.len(), 3);
        assert!(graphics
            .wait_semaphores
            .contains(&signals().transfer_complete));
        assert!(graphics
            .wait_semaphores
            .contains(&signals().compute_complete));
        assert_eq!(graphics.wait_stages.len(), graphics.wait_semaphores.len());
    }

    #[test]
    fn graphics_submission_is_always_last() {
        let work = FrameWork::graphics_only(cmd(10)).with_compute(cmd(12));
        let plan = plan_submissions(&signals(), &split_assignment(), &work);

        assert_eq!(plan.last().unwrap().role, QueueRole::Graphics);
        assert_eq!(plan.last().unwrap().fence, signals().in_flight);
    }
}
