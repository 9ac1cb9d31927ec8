//! Application framework for the Lucent engine.
//!
//! This crate provides a trait-based application framework that handles
//! common boilerplate:
//! - Window creation and management
//! - Render context initialization
//! - Swapchain creation and recreation
//! - Frame pacing and synchronization
//! - Event loop handling
//!
//! # Example
//!
//! ```no_run
//! use lucent_app::{run_app, AppConfig, EngineContext, RenderApp};
//! use lucent_gpu::{FrameContext, FrameWork};
//!
//! struct MyApp;
//!
//! impl RenderApp for MyApp {
//!     fn init(ctx: &mut EngineContext) -> anyhow::Result<Self> {
//!         Ok(MyApp)
//!     }
//!
//!     fn update(&mut self, ctx: &EngineContext, dt: f32) {}
//!
//!     fn record(&mut self, frame: &mut FrameContext<'_>) -> lucent_gpu::Result<FrameWork> {
//!         // Record into frame.graphics_cmd
//!         Ok(FrameWork::graphics_only(frame.graphics_cmd))
//!     }
//! }
//!
//! fn main() -> anyhow::Result<()> {
//!     run_app::<MyApp>(AppConfig::default())
//! }
//! ```

mod app;
mod context;
mod runner;

pub use app::RenderApp;
pub use context::EngineContext;
pub use runner::{run_app, AppConfig};

// Re-export commonly used types for convenience
pub use lucent_gpu::{
    FrameContext, FrameOutcome, FrameWork, RenderContext, RenderContextBuilder,
};
pub use winit::event::WindowEvent;
