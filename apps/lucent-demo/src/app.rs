//! Clear-color demo application.

use ash::vk;
use lucent_app::{EngineContext, RenderApp};
use lucent_gpu::{FrameContext, FrameWork};
use tracing::info;

/// Cycles the clear color through hues over time.
pub struct ClearDemo {
    hue: f32,
}

impl RenderApp for ClearDemo {
    fn init(ctx: &mut EngineContext) -> anyhow::Result<Self> {
        info!(
            "Clear demo ready: {}x{}, {} frames in flight",
            ctx.width(),
            ctx.height(),
            ctx.frames_in_flight()
        );
        Ok(Self { hue: 0.0 })
    }

    fn update(&mut self, _ctx: &EngineContext, dt: f32) {
        self.hue = (self.hue + dt * 0.05).fract();
    }

    fn record(&mut self, frame: &mut FrameContext<'_>) -> lucent_gpu::Result<FrameWork> {
        let device = frame.device;
        let cmd = frame.graphics_cmd;

        let range = vk::ImageSubresourceRange::default()
            .aspect_mask(vk::ImageAspectFlags::COLOR)
            .base_mip_level(0)
            .level_count(1)
            .base_array_layer(0)
            .layer_count(1);

        unsafe {
            let to_transfer = vk::ImageMemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(frame.image)
                .subresource_range(range);

            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_transfer],
            );

            let [r, g, b] = hue_to_rgb(self.hue);
            let clear = vk::ClearColorValue {
                float32: [r, g, b, 1.0],
            };
            device.cmd_clear_color_image(
                cmd,
                frame.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &clear,
                &[range],
            );

            let to_present = vk::ImageMemoryBarrier::default()
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::empty())
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::PRESENT_SRC_KHR)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(frame.image)
                .subresource_range(range);

            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::BOTTOM_OF_PIPE,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[to_present],
            );
        }

        Ok(FrameWork::graphics_only(cmd))
    }
}

/// Saturated hue to RGB.
fn hue_to_rgb(hue: f32) -> [f32; 3] {
    let h = hue * 6.0;
    let x = 1.0 - (h % 2.0 - 1.0).abs();
    match h as u32 {
        0 => [1.0, x, 0.0],
        1 => [x, 1.0, 0.0],
        2 => [0.0, 1.0, x],
        3 => [0.0, x, 1.0],
        4 => [x, 0.0, 1.0],
        _ => [1.0, 0.0, x],
    }
}
