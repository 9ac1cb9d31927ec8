//! GPU memory management and resource creation.
//!
//! The factory follows the two-step protocol of every explicit GPU API:
//! create the object, query its memory requirements, allocate matching
//! memory, bind. Destruction authority never stays with the returned
//! handle: each creation registers its reverse-order teardown into the
//! deletion queue the caller supplies, and that queue is the only path
//! by which the resource is ever destroyed.

use crate::deferred::DeletionQueue;
use crate::error::{GpuError, Result};
use ash::vk;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc,
};
use gpu_allocator::MemoryLocation;
use parking_lot::Mutex;
use std::ptr::NonNull;
use std::sync::Arc;

/// GPU memory allocator wrapper.
pub struct GpuAllocator {
    allocator: Option<Allocator>,
}

impl GpuAllocator {
    /// Create a new allocator.
    ///
    /// # Safety
    /// The instance, device, and physical device must be valid.
    pub unsafe fn new(
        instance: &ash::Instance,
        device: &ash::Device,
        physical_device: vk::PhysicalDevice,
    ) -> Result<Self> {
        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: instance.clone(),
            device: device.clone(),
            physical_device,
            debug_settings: gpu_allocator::AllocatorDebugSettings {
                log_memory_information: cfg!(debug_assertions),
                log_leaks_on_shutdown: true,
                store_stack_traces: cfg!(debug_assertions),
                log_allocations: false,
                log_frees: false,
                log_stack_traces: false,
            },
            buffer_device_address: true,
            allocation_sizes: Default::default(),
        })
        .map_err(|e| GpuError::AllocationFailed(e.to_string()))?;

        Ok(Self {
            allocator: Some(allocator),
        })
    }

    fn inner(&mut self) -> Result<&mut Allocator> {
        self.allocator
            .as_mut()
            .ok_or_else(|| GpuError::InvalidState("Allocator already shut down".to_string()))
    }

    fn allocate(&mut self, desc: &AllocationCreateDesc) -> Result<Allocation> {
        self.inner()?
            .allocate(desc)
            .map_err(|e| GpuError::AllocationFailed(e.to_string()))
    }

    fn free(&mut self, allocation: Allocation) -> Result<()> {
        self.inner()?
            .free(allocation)
            .map_err(|e| GpuError::AllocationFailed(e.to_string()))
    }

    /// Shutdown the allocator, freeing all GPU memory.
    ///
    /// Must be called before the Vulkan device is destroyed. Remaining
    /// allocations are freed and logged as leaks.
    pub fn shutdown(&mut self) {
        if let Some(allocator) = self.allocator.take() {
            drop(allocator);
        }
    }
}

impl Drop for GpuAllocator {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A GPU buffer handle.
///
/// Carries no destruction authority: the teardown registered at
/// creation owns the underlying object and memory.
pub struct GpuBuffer {
    pub buffer: vk::Buffer,
    pub size: u64,
    mapped: Option<NonNull<u8>>,
}

impl GpuBuffer {
    /// Mapped pointer for host-visible buffers.
    pub fn mapped_ptr(&self) -> Option<*mut u8> {
        self.mapped.map(NonNull::as_ptr)
    }

    /// Write data to the buffer (must be host-visible).
    pub fn write<T: Copy>(&self, data: &[T]) -> Result<()> {
        let byte_size = std::mem::size_of_val(data);
        self.write_bytes(0, unsafe {
            std::slice::from_raw_parts(data.as_ptr().cast::<u8>(), byte_size)
        })
    }

    /// Write raw bytes at the given offset (must be host-visible).
    pub fn write_bytes(&self, offset: u64, data: &[u8]) -> Result<()> {
        let ptr = self
            .mapped_ptr()
            .ok_or_else(|| GpuError::InvalidState("Buffer not mapped".to_string()))?;

        let end = offset
            .checked_add(data.len() as u64)
            .ok_or_else(|| GpuError::InvalidState("Offset overflow".to_string()))?;
        if end > self.size {
            return Err(GpuError::InvalidState(
                "Data range too large for buffer".to_string(),
            ));
        }

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), ptr.add(offset as usize), data.len());
        }

        Ok(())
    }
}

/// A GPU image handle with its default view.
///
/// Like [`GpuBuffer`], destruction authority lives in the deletion
/// queue the image was registered into.
pub struct GpuImage {
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub format: vk::Format,
    pub extent: vk::Extent3D,
    pub mip_levels: u32,
}

/// Parameters for image creation.
#[derive(Debug, Clone)]
pub struct ImageDesc {
    pub width: u32,
    pub height: u32,
    pub mip_levels: u32,
    pub samples: vk::SampleCountFlags,
    pub format: vk::Format,
    pub tiling: vk::ImageTiling,
    pub usage: vk::ImageUsageFlags,
    pub location: MemoryLocation,
    pub label: String,
}

impl ImageDesc {
    /// Single-sampled optimal-tiling 2D image on device memory.
    pub fn new_2d(width: u32, height: u32, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            width,
            height,
            mip_levels: 1,
            samples: vk::SampleCountFlags::TYPE_1,
            format,
            tiling: vk::ImageTiling::OPTIMAL,
            usage,
            location: MemoryLocation::GpuOnly,
            label: "image".to_string(),
        }
    }

    pub fn with_mip_levels(mut self, mip_levels: u32) -> Self {
        self.mip_levels = mip_levels;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// Creates GPU buffers and images, routing every teardown through a
/// caller-supplied [`DeletionQueue`].
///
/// Stateless beyond the device, allocator, and format-query handles it
/// wraps; cheap to clone from the render context.
pub struct ResourceFactory {
    device: Arc<ash::Device>,
    allocator: Arc<Mutex<GpuAllocator>>,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
}

impl ResourceFactory {
    pub(crate) fn new(
        device: Arc<ash::Device>,
        allocator: Arc<Mutex<GpuAllocator>>,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
    ) -> Self {
        Self {
            device,
            allocator,
            instance,
            physical_device,
        }
    }

    /// Create a buffer and register its teardown into `deletions`.
    pub fn create_buffer(
        &self,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        label: &str,
        deletions: &mut DeletionQueue,
    ) -> Result<GpuBuffer> {
        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            self.device
                .create_buffer(&buffer_info, None)
                .map_err(GpuError::from)?
        };

        let requirements = unsafe { self.device.get_buffer_memory_requirements(buffer) };

        let allocation = self.allocator.lock().allocate(&AllocationCreateDesc {
            name: label,
            requirements,
            location,
            linear: true,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;

        unsafe {
            self.device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(GpuError::from)?;
        }

        let mapped = allocation
            .mapped_ptr()
            .map(|p| p.cast::<u8>());

        let device = Arc::clone(&self.device);
        let shared_allocator = Arc::clone(&self.allocator);
        deletions.push(move || {
            unsafe { device.destroy_buffer(buffer, None) };
            if let Err(e) = shared_allocator.lock().free(allocation) {
                tracing::warn!("Failed to free buffer memory: {e}");
            }
        });

        Ok(GpuBuffer {
            buffer,
            size,
            mapped,
        })
    }

    /// Create an image plus its default view and register their
    /// teardown (view, then image, then memory) into `deletions`.
    pub fn create_image(&self, desc: &ImageDesc, deletions: &mut DeletionQueue) -> Result<GpuImage> {
        self.check_format_support(desc)?;

        let create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(desc.format)
            .extent(vk::Extent3D {
                width: desc.width,
                height: desc.height,
                depth: 1,
            })
            .mip_levels(desc.mip_levels)
            .array_layers(1)
            .samples(desc.samples)
            .tiling(desc.tiling)
            .usage(desc.usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe {
            self.device
                .create_image(&create_info, None)
                .map_err(GpuError::from)?
        };

        let requirements = unsafe { self.device.get_image_memory_requirements(image) };

        let allocation = self.allocator.lock().allocate(&AllocationCreateDesc {
            name: &desc.label,
            requirements,
            location: desc.location,
            linear: desc.tiling == vk::ImageTiling::LINEAR,
            allocation_scheme: AllocationScheme::GpuAllocatorManaged,
        })?;

        unsafe {
            self.device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(GpuError::from)?;
        }

        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(desc.format)
            .subresource_range(
                vk::ImageSubresourceRange::default()
                    .aspect_mask(aspect_mask_for(desc.format))
                    .base_mip_level(0)
                    .level_count(desc.mip_levels)
                    .base_array_layer(0)
                    .layer_count(1),
            );

        let view = unsafe {
            self.device
                .create_image_view(&view_info, None)
                .map_err(GpuError::from)?
        };

        let device = Arc::clone(&self.device);
        let shared_allocator = Arc::clone(&self.allocator);
        deletions.push(move || {
            unsafe {
                device.destroy_image_view(view, None);
                device.destroy_image(image, None);
            }
            if let Err(e) = shared_allocator.lock().free(allocation) {
                tracing::warn!("Failed to free image memory: {e}");
            }
        });

        Ok(GpuImage {
            image,
            view,
            format: desc.format,
            extent: vk::Extent3D {
                width: desc.width,
                height: desc.height,
                depth: 1,
            },
            mip_levels: desc.mip_levels,
        })
    }

    fn check_format_support(&self, desc: &ImageDesc) -> Result<()> {
        let props = unsafe {
            self.instance
                .get_physical_device_format_properties(self.physical_device, desc.format)
        };

        let available = match desc.tiling {
            vk::ImageTiling::LINEAR => props.linear_tiling_features,
            _ => props.optimal_tiling_features,
        };

        if available.contains(required_format_features(desc.usage)) {
            Ok(())
        } else {
            Err(GpuError::UnsupportedFormat(desc.format))
        }
    }
}

/// Format features an image usage set requires.
pub(crate) fn required_format_features(usage: vk::ImageUsageFlags) -> vk::FormatFeatureFlags {
    let mut features = vk::FormatFeatureFlags::empty();
    if usage.contains(vk::ImageUsageFlags::SAMPLED) {
        features |= vk::FormatFeatureFlags::SAMPLED_IMAGE;
    }
    if usage.contains(vk::ImageUsageFlags::STORAGE) {
        features |= vk::FormatFeatureFlags::STORAGE_IMAGE;
    }
    if usage.contains(vk::ImageUsageFlags::COLOR_ATTACHMENT) {
        features |= vk::FormatFeatureFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT) {
        features |= vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if usage.contains(vk::ImageUsageFlags::TRANSFER_SRC) {
        features |= vk::FormatFeatureFlags::TRANSFER_SRC;
    }
    if usage.contains(vk::ImageUsageFlags::TRANSFER_DST) {
        features |= vk::FormatFeatureFlags::TRANSFER_DST;
    }
    features
}

/// Image aspect implied by a format.
pub(crate) fn aspect_mask_for(format: vk::Format) -> vk::ImageAspectFlags {
    match format {
        vk::Format::D16_UNORM | vk::Format::D32_SFLOAT | vk::Format::X8_D24_UNORM_PACK32 => {
            vk::ImageAspectFlags::DEPTH
        }
        vk::Format::D16_UNORM_S8_UINT
        | vk::Format::D24_UNORM_S8_UINT
        | vk::Format::D32_SFLOAT_S8_UINT => {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        }
        vk::Format::S8_UINT => vk::ImageAspectFlags::STENCIL,
        _ => vk::ImageAspectFlags::COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_maps_to_required_format_features() {
        let features = required_format_features(
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
        );
        assert!(features.contains(vk::FormatFeatureFlags::SAMPLED_IMAGE));
        assert!(features.contains(vk::FormatFeatureFlags::TRANSFER_DST));
        assert!(!features.contains(vk::FormatFeatureFlags::COLOR_ATTACHMENT));
    }

    #[test]
    fn depth_formats_use_depth_aspect() {
        assert_eq!(
            aspect_mask_for(vk::Format::D32_SFLOAT),
            vk::ImageAspectFlags::DEPTH
        );
        assert_eq!(
            aspect_mask_for(vk::Format::D24_UNORM_S8_UINT),
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        );
        assert_eq!(
            aspect_mask_for(vk::Format::B8G8R8A8_SRGB),
            vk::ImageAspectFlags::COLOR
        );
    }
}
