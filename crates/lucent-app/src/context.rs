//! Engine context owned by the runner.

use std::sync::Arc;

use crate::app::RenderApp;
use crate::runner::AppConfig;
use lucent_gpu::{
    DeletionQueue, FrameOutcome, FramePacer, PacerConfig, RenderContext, RenderContextBuilder,
    ResourceFactory, SurfaceContext, Swapchain,
};
use tracing::error;
use winit::window::Window;

/// Engine context shared across all app methods.
///
/// Owns the window, the render context, the presentation surface and
/// swapchain, the frame pacer, the resource factory, and the
/// process-wide deletion queue flushed at shutdown.
pub struct EngineContext {
    /// The window handle.
    pub window: Arc<Window>,
    /// Render context with device and queues.
    pub gpu: RenderContext,
    /// Surface context for windowed rendering.
    pub surface: SurfaceContext,
    /// Current swapchain.
    pub swapchain: Swapchain,
    /// Frame pacing state machine.
    pub pacer: FramePacer,
    /// Resource factory bound to the render context.
    pub factory: ResourceFactory,
    /// Process-wide deletion queue; flushed once at shutdown after the
    /// device goes idle.
    pub globals: DeletionQueue,
}

impl EngineContext {
    /// Create the engine context for a window.
    pub(crate) fn new(window: Arc<Window>, config: &AppConfig) -> anyhow::Result<Self> {
        let (gpu, surface) = RenderContextBuilder::new()
            .app_name(&config.title)
            .validation(config.validation)
            .build(window.as_ref())?;

        let size = window.inner_size();
        let width = size.width.max(1);
        let height = size.height.max(1);

        let swapchain =
            unsafe { surface.create_swapchain(&gpu, width, height, config.vsync, None)? };

        tracing::info!(
            "Swapchain created: {}x{} ({} images)",
            swapchain.extent.width,
            swapchain.extent.height,
            swapchain.images.len()
        );

        let pacer = FramePacer::new(
            &gpu,
            PacerConfig {
                frames_in_flight: config.frames_in_flight,
                fence_timeout_ns: config.fence_timeout_ns,
                vsync: config.vsync,
            },
        )?;

        let factory = gpu.resource_factory();

        Ok(Self {
            window,
            gpu,
            surface,
            swapchain,
            pacer,
            factory,
            globals: DeletionQueue::new(),
        })
    }

    /// Get the swapchain width.
    pub fn width(&self) -> u32 {
        self.swapchain.extent.width
    }

    /// Get the swapchain height.
    pub fn height(&self) -> u32 {
        self.swapchain.extent.height
    }

    /// Get the aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f32 {
        self.swapchain.extent.width as f32 / self.swapchain.extent.height as f32
    }

    /// Total frames rendered.
    pub fn frame_count(&self) -> u64 {
        self.pacer.frame_count()
    }

    /// Number of frames in flight.
    pub fn frames_in_flight(&self) -> usize {
        self.pacer.frames_in_flight()
    }

    /// Drive one frame pacer cycle with the app's record callback.
    pub fn render_one_frame<A: RenderApp>(&mut self, app: &mut A) -> anyhow::Result<FrameOutcome> {
        let size = self.window.inner_size();
        let extent = (size.width.max(1), size.height.max(1));

        let Self {
            gpu,
            surface,
            swapchain,
            pacer,
            ..
        } = self;

        let outcome =
            pacer.render_frame(gpu, surface, swapchain, extent, |frame| app.record(frame))?;
        Ok(outcome)
    }

    /// Recreate the swapchain at a new extent.
    pub fn handle_resize(&mut self, width: u32, height: u32) -> anyhow::Result<()> {
        if width == 0 || height == 0 {
            return Ok(());
        }

        let Self {
            gpu,
            surface,
            swapchain,
            pacer,
            ..
        } = self;

        pacer.recreate(gpu, surface, swapchain, (width, height))?;
        Ok(())
    }

    /// Cleanup all resources.
    ///
    /// Per-slot deletion queues flush inside the pacer teardown, then
    /// the process-wide queue, then the swapchain and surface. The
    /// render context destroys the allocator, device, and instance when
    /// dropped afterwards.
    pub(crate) fn cleanup(&mut self) {
        if let Err(e) = self.gpu.wait_idle() {
            error!("Failed to wait idle: {e}");
        }

        if let Err(e) = self.pacer.destroy(&self.gpu) {
            error!("Failed to destroy frame pacer: {e}");
        }

        self.globals.flush();

        unsafe {
            self.swapchain
                .destroy(self.gpu.device(), &self.surface.swapchain_loader);
            self.surface.destroy();
        }
    }
}
