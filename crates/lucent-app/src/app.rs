//! `RenderApp` trait definition.

use crate::context::EngineContext;
use lucent_gpu::{FrameContext, FrameWork};
use winit::event::WindowEvent;

/// Trait for Lucent applications.
///
/// Implement this trait to create an application on the Lucent engine.
/// The framework handles window creation, GPU initialization, swapchain
/// management and recreation, frame pacing, and event loop handling.
pub trait RenderApp: Sized {
    /// Initialize the application.
    ///
    /// Called once after the GPU context, swapchain, and frame pacer
    /// have been created.
    fn init(ctx: &mut EngineContext) -> anyhow::Result<Self>;

    /// Update application state.
    ///
    /// Called every frame before recording.
    ///
    /// # Arguments
    /// * `ctx` - Engine context with GPU and window access
    /// * `dt` - Delta time in seconds since last frame
    fn update(&mut self, ctx: &EngineContext, dt: f32);

    /// Record one frame's commands.
    ///
    /// The graphics command buffer is already begun; record into it and
    /// return the frame's work. Transfer/compute command buffers are
    /// available on the frame context for multi-queue frames; begin and
    /// end them before returning them in the [`FrameWork`].
    ///
    /// The framework handles image acquisition, submission ordering
    /// across queues, presentation, and recreation on resize.
    fn record(&mut self, frame: &mut FrameContext<'_>) -> lucent_gpu::Result<FrameWork>;

    /// Handle window resize.
    ///
    /// The framework recreates the swapchain before this is called; use
    /// it to rebuild size-dependent resources.
    ///
    /// Default implementation does nothing.
    #[allow(unused_variables)]
    fn on_resize(&mut self, ctx: &mut EngineContext, width: u32, height: u32) -> anyhow::Result<()> {
        Ok(())
    }

    /// Handle window events.
    ///
    /// Return `true` if the event was handled and should not be
    /// processed further.
    #[allow(unused_variables)]
    fn on_event(&mut self, event: &WindowEvent) -> bool {
        false
    }

    /// Cleanup resources before shutdown.
    ///
    /// The GPU is idle when this is called.
    #[allow(unused_variables)]
    fn cleanup(&mut self, ctx: &mut EngineContext) {}
}
