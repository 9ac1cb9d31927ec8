//! Lucent engine clear-color demo.
//!
//! Clears the swapchain image to a slowly cycling color each frame.
//! Exercises the full frame loop: acquisition, submission, presentation,
//! and swapchain recreation on resize.
//!
//! ```bash
//! cargo run -p lucent-demo
//! ```
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Set log level (e.g., info, debug, trace)

mod app;

use lucent_app::{run_app, AppConfig};

use crate::app::ClearDemo;

const WIDTH: u32 = 1280;
const HEIGHT: u32 = 720;

fn main() -> anyhow::Result<()> {
    run_app::<ClearDemo>(AppConfig::new("Lucent Clear Demo").with_size(WIDTH, HEIGHT))
}
