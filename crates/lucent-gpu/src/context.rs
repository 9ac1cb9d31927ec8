//! Render context management.
//!
//! The context is an explicit owned value passed by reference to every
//! component; no component reaches into global state. It owns the
//! instance, the logical device, the resolved queue assignment, and the
//! shared allocator.

use crate::error::{GpuError, Result};
use crate::instance::{create_instance, device_name, rank_physical_devices};
use crate::memory::{GpuAllocator, ResourceFactory};
use crate::queues::{query_queue_families, QueueAssignment, QueueRole};
use crate::surface::SurfaceContext;
use ash::vk;
use parking_lot::Mutex;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CStr;
use std::sync::Arc;

/// One retrieved queue per resolved role.
///
/// Roles sharing a family share the underlying queue; submission to a
/// queue is externally synchronized by the single-threaded frame loop.
#[derive(Debug, Clone, Copy)]
pub struct Queues {
    pub graphics: vk::Queue,
    pub present: vk::Queue,
    pub transfer: vk::Queue,
    pub compute: vk::Queue,
}

impl Queues {
    /// Queue handle for a role.
    pub fn by_role(&self, role: QueueRole) -> vk::Queue {
        match role {
            QueueRole::Graphics => self.graphics,
            QueueRole::Present => self.present,
            QueueRole::Transfer => self.transfer,
            QueueRole::Compute => self.compute,
        }
    }
}

/// Main render context holding Vulkan resources.
pub struct RenderContext {
    // Entry must be kept alive for the lifetime of the context
    #[allow(dead_code)]
    pub(crate) entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: Arc<ash::Device>,
    pub(crate) assignment: QueueAssignment,
    pub(crate) queues: Queues,
    pub(crate) allocator: Arc<Mutex<GpuAllocator>>,
}

impl RenderContext {
    /// Get the Vulkan device handle.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// Shared device handle for deletion closures.
    pub fn device_arc(&self) -> Arc<ash::Device> {
        Arc::clone(&self.device)
    }

    /// Get the Vulkan instance handle.
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Get the physical device handle.
    pub fn physical_device(&self) -> vk::PhysicalDevice {
        self.physical_device
    }

    /// Resolved queue family assignment.
    pub fn assignment(&self) -> &QueueAssignment {
        &self.assignment
    }

    /// Retrieved queue handles.
    pub fn queues(&self) -> &Queues {
        &self.queues
    }

    /// Get access to the GPU allocator.
    pub fn allocator(&self) -> &Arc<Mutex<GpuAllocator>> {
        &self.allocator
    }

    /// Resource factory bound to this context.
    pub fn resource_factory(&self) -> ResourceFactory {
        ResourceFactory::new(
            Arc::clone(&self.device),
            Arc::clone(&self.allocator),
            self.instance.clone(),
            self.physical_device,
        )
    }

    /// Wait for the device to be idle.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe {
            self.device.device_wait_idle()?;
        }
        Ok(())
    }
}

impl Drop for RenderContext {
    fn drop(&mut self) {
        unsafe {
            let _ = self.device.device_wait_idle();

            // Allocator frees all VkDeviceMemory before the device goes
            self.allocator.lock().shutdown();

            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

/// Builder for creating a render context.
pub struct RenderContextBuilder {
    app_name: String,
    enable_validation: bool,
}

impl Default for RenderContextBuilder {
    fn default() -> Self {
        Self {
            app_name: "Lucent".to_string(),
            enable_validation: cfg!(debug_assertions),
        }
    }
}

impl RenderContextBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application name.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Enable or disable validation layers.
    pub fn validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    /// Build the render context and surface context for a window.
    ///
    /// Physical devices are walked best-first; the first one whose
    /// queue families resolve graphics and presentation against the
    /// surface wins. Devices that cannot present are rejected.
    pub fn build<W>(self, window: &W) -> Result<(RenderContext, SurfaceContext)>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| GpuError::Other(format!("Failed to load Vulkan: {e}")))?;

        let instance = unsafe { create_instance(&entry, &self.app_name, self.enable_validation) }?;

        let display = window
            .display_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get display handle: {e}")))?;
        let window_handle = window
            .window_handle()
            .map_err(|e| GpuError::SurfaceCreation(format!("Failed to get window handle: {e}")))?;

        let surface = unsafe {
            ash_window::create_surface(
                &entry,
                &instance,
                display.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| GpuError::SurfaceCreation(e.to_string()))?
        };

        let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

        // Best-first device walk: reject devices whose families cannot
        // cover graphics + present for this surface.
        let mut selected = None;
        for candidate in unsafe { rank_physical_devices(&instance) }? {
            let families =
                unsafe { query_queue_families(&instance, candidate, &surface_loader, surface) }?;
            match QueueAssignment::resolve(&families) {
                Ok(assignment) => {
                    selected = Some((candidate, assignment));
                    break;
                }
                Err(GpuError::NoSuitableQueueFamilies) => continue,
                Err(e) => return Err(e),
            }
        }

        let Some((physical_device, assignment)) = selected else {
            unsafe {
                surface_loader.destroy_surface(surface, None);
                instance.destroy_instance(None);
            }
            return Err(GpuError::NoSuitableQueueFamilies);
        };

        tracing::info!(
            "Selected GPU: {} (graphics={}, present={}, transfer={}, compute={})",
            unsafe { device_name(&instance, physical_device) },
            assignment.graphics,
            assignment.present,
            assignment.transfer,
            assignment.compute,
        );

        let (device, queues) = unsafe { create_device(&instance, physical_device, &assignment)? };
        let device = Arc::new(device);

        let allocator = unsafe { GpuAllocator::new(&instance, &device, physical_device) }?;

        let surface_ctx = unsafe { SurfaceContext::new(&entry, &instance, &device, surface) };

        let ctx = RenderContext {
            entry,
            instance,
            physical_device,
            device,
            assignment,
            queues,
            allocator: Arc::new(Mutex::new(allocator)),
        };

        Ok((ctx, surface_ctx))
    }
}

/// Required device extensions.
fn required_device_extensions() -> Vec<&'static CStr> {
    vec![ash::khr::swapchain::NAME]
}

/// Create the logical device and retrieve one queue per role.
///
/// # Safety
/// The instance and physical device must be valid.
unsafe fn create_device(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    assignment: &QueueAssignment,
) -> Result<(ash::Device, Queues)> {
    let unique_families = assignment.distinct_families();

    let queue_priority = 1.0_f32;
    let queue_create_infos: Vec<vk::DeviceQueueCreateInfo> = unique_families
        .iter()
        .map(|&family| {
            vk::DeviceQueueCreateInfo::default()
                .queue_family_index(family)
                .queue_priorities(std::slice::from_ref(&queue_priority))
        })
        .collect();

    let extensions = required_device_extensions();
    let extension_names: Vec<*const i8> = extensions.iter().map(|ext| ext.as_ptr()).collect();

    // Vulkan 1.3 features
    let mut vulkan_1_3_features = vk::PhysicalDeviceVulkan13Features::default()
        .dynamic_rendering(true)
        .synchronization2(true);

    // Vulkan 1.2 features
    let mut vulkan_1_2_features =
        vk::PhysicalDeviceVulkan12Features::default().buffer_device_address(true);

    let mut features2 = vk::PhysicalDeviceFeatures2::default()
        .push_next(&mut vulkan_1_3_features)
        .push_next(&mut vulkan_1_2_features);

    let device_create_info = vk::DeviceCreateInfo::default()
        .queue_create_infos(&queue_create_infos)
        .enabled_extension_names(&extension_names)
        .push_next(&mut features2);

    let device = instance
        .create_device(physical_device, &device_create_info, None)
        .map_err(GpuError::from)?;

    let queues = Queues {
        graphics: device.get_device_queue(assignment.graphics, 0),
        present: device.get_device_queue(assignment.present, 0),
        transfer: device.get_device_queue(assignment.transfer, 0),
        compute: device.get_device_queue(assignment.compute, 0),
    };

    Ok((device, queues))
}
