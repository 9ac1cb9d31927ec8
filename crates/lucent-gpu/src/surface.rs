//! Surface management for windowed rendering.
//!
//! Owns the Vulkan surface and the extension loaders, and performs the
//! capability queries that swapchain construction is derived from.

use crate::context::RenderContext;
use crate::error::{GpuError, Result};
use crate::swapchain::{
    calculate_extent, select_image_count, select_present_mode, select_surface_format, Swapchain,
};
use ash::vk;

/// Surface context for windowed rendering.
pub struct SurfaceContext {
    /// The Vulkan surface handle.
    pub surface: vk::SurfaceKHR,
    /// Surface extension loader.
    pub surface_loader: ash::khr::surface::Instance,
    /// Swapchain extension loader.
    pub swapchain_loader: ash::khr::swapchain::Device,
}

impl SurfaceContext {
    /// Wrap an already-created surface once the logical device exists.
    ///
    /// # Safety
    /// The entry, instance, device, and surface must be valid.
    pub(crate) unsafe fn new(
        entry: &ash::Entry,
        instance: &ash::Instance,
        device: &ash::Device,
        surface: vk::SurfaceKHR,
    ) -> Self {
        Self {
            surface,
            surface_loader: ash::khr::surface::Instance::new(entry, instance),
            swapchain_loader: ash::khr::swapchain::Device::new(instance, device),
        }
    }

    /// Query surface capabilities, formats, and present modes.
    ///
    /// A surface reporting no formats or no present modes is unusable
    /// and fatal.
    pub fn capabilities(&self, physical_device: vk::PhysicalDevice) -> Result<SurfaceCapabilities> {
        unsafe {
            let caps = self
                .surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)?;

            let formats = self
                .surface_loader
                .get_physical_device_surface_formats(physical_device, self.surface)?;

            let present_modes = self
                .surface_loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)?;

            if formats.is_empty() {
                return Err(GpuError::UnsupportedSurface(
                    "no surface formats reported".to_string(),
                ));
            }
            if present_modes.is_empty() {
                return Err(GpuError::UnsupportedSurface(
                    "no present modes reported".to_string(),
                ));
            }

            Ok(SurfaceCapabilities {
                capabilities: caps,
                formats,
                present_modes,
            })
        }
    }

    /// Create a swapchain for this surface.
    ///
    /// # Safety
    /// The render context must be valid.
    pub unsafe fn create_swapchain(
        &self,
        ctx: &RenderContext,
        width: u32,
        height: u32,
        vsync: bool,
        old_swapchain: Option<vk::SwapchainKHR>,
    ) -> Result<Swapchain> {
        let caps = self.capabilities(ctx.physical_device())?;

        let surface_format = select_surface_format(&caps.formats);
        let present_mode = select_present_mode(&caps.present_modes, vsync);
        let extent = calculate_extent(&caps.capabilities, width, height);
        let image_count = select_image_count(&caps.capabilities);
        let sharing_families = ctx.assignment().distinct_families();

        Swapchain::new(
            ctx.device(),
            &self.swapchain_loader,
            self.surface,
            &caps.capabilities,
            surface_format,
            present_mode,
            extent,
            image_count,
            &sharing_families,
            old_swapchain,
        )
    }

    /// Destroy the surface.
    ///
    /// # Safety
    /// The surface must not be in use.
    pub unsafe fn destroy(&self) {
        self.surface_loader.destroy_surface(self.surface, None);
    }
}

/// Surface capabilities query result.
pub struct SurfaceCapabilities {
    /// Raw surface capabilities.
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    /// Supported surface formats (never empty).
    pub formats: Vec<vk::SurfaceFormatKHR>,
    /// Supported present modes (never empty).
    pub present_modes: Vec<vk::PresentModeKHR>,
}
