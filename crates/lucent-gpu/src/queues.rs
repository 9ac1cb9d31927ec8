//! Queue family resolution.
//!
//! Assigns the graphics, present, transfer, and compute roles to queue
//! family indices once per physical device. Resolution is a pure
//! function over a snapshot of the family properties so it can be
//! exercised without a device.

use crate::error::{GpuError, Result};
use ash::vk;

/// Snapshot of one queue family's properties.
#[derive(Debug, Clone, Copy)]
pub struct QueueFamilyInfo {
    /// Capability flags advertised by the family.
    pub flags: vk::QueueFlags,
    /// Number of queues in the family.
    pub queue_count: u32,
    /// Whether the family can present to the target surface.
    pub supports_present: bool,
}

/// Queue roles used by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueRole {
    Graphics,
    Present,
    Transfer,
    Compute,
}

/// Resolved queue family index per role.
///
/// Immutable once resolved. Graphics and present always resolve or the
/// device is rejected; transfer and compute fall back to the graphics
/// family when no distinct family offers them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueAssignment {
    pub graphics: u32,
    pub present: u32,
    pub transfer: u32,
    pub compute: u32,
}

impl QueueAssignment {
    /// Resolve roles over a family snapshot.
    ///
    /// Families are scanned in index order. Presentation locks to the
    /// first supporting family. Compute and transfer each prefer the
    /// first capable family distinct from the graphics family; roles
    /// left unresolved after the scan fall back to the graphics family.
    pub fn resolve(families: &[QueueFamilyInfo]) -> Result<Self> {
        let mut graphics = None;
        let mut present = None;

        for (index, family) in families.iter().enumerate() {
            if family.queue_count == 0 {
                continue;
            }
            let index = index as u32;

            if family.supports_present && present.is_none() {
                present = Some(index);
            }
            if family.flags.contains(vk::QueueFlags::GRAPHICS) && graphics.is_none() {
                graphics = Some(index);
            }
        }

        let (Some(graphics), Some(present)) = (graphics, present) else {
            return Err(GpuError::NoSuitableQueueFamilies);
        };

        let compute = first_capable_besides(families, vk::QueueFlags::COMPUTE, graphics);
        let transfer = first_capable_besides(families, vk::QueueFlags::TRANSFER, graphics);

        Ok(Self {
            graphics,
            present,
            // Graphics-first fallback: the graphics family is required
            // to support both roles implicitly.
            transfer: transfer.unwrap_or(graphics),
            compute: compute.unwrap_or(graphics),
        })
    }

    /// Family index assigned to a role.
    pub fn index(&self, role: QueueRole) -> u32 {
        match role {
            QueueRole::Graphics => self.graphics,
            QueueRole::Present => self.present,
            QueueRole::Transfer => self.transfer,
            QueueRole::Compute => self.compute,
        }
    }

    /// Unique family indices across all roles, in role order.
    ///
    /// Drives the swapchain sharing-mode decision: more than one
    /// distinct family requires concurrent sharing.
    pub fn distinct_families(&self) -> Vec<u32> {
        let mut unique = Vec::with_capacity(4);
        for index in [self.graphics, self.present, self.transfer, self.compute] {
            if !unique.contains(&index) {
                unique.push(index);
            }
        }
        unique
    }

    /// Whether transfer work runs on a family other than graphics.
    pub fn has_dedicated_transfer(&self) -> bool {
        self.transfer != self.graphics
    }

    /// Whether compute work runs on a family other than graphics.
    pub fn has_dedicated_compute(&self) -> bool {
        self.compute != self.graphics
    }
}

/// First family with `required` set whose index differs from `avoid`.
fn first_capable_besides(
    families: &[QueueFamilyInfo],
    required: vk::QueueFlags,
    avoid: u32,
) -> Option<u32> {
    families
        .iter()
        .enumerate()
        .filter(|(_, family)| family.queue_count > 0)
        .find(|&(index, family)| index as u32 != avoid && family.flags.contains(required))
        .map(|(index, _)| index as u32)
}

/// Snapshot the queue families of a physical device against a surface.
///
/// # Safety
/// The instance, physical device, surface loader, and surface must be
/// valid.
pub unsafe fn query_queue_families(
    instance: &ash::Instance,
    physical_device: vk::PhysicalDevice,
    surface_loader: &ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
) -> Result<Vec<QueueFamilyInfo>> {
    let properties = instance.get_physical_device_queue_family_properties(physical_device);

    let mut families = Vec::with_capacity(properties.len());
    for (index, props) in properties.iter().enumerate() {
        let supports_present = surface_loader.get_physical_device_surface_support(
            physical_device,
            index as u32,
            surface,
        )?;

        families.push(QueueFamilyInfo {
            flags: props.queue_flags,
            queue_count: props.queue_count,
            supports_present,
        });
    }

    Ok(families)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags, supports_present: bool) -> QueueFamilyInfo {
        QueueFamilyInfo {
            flags,
            queue_count: 1,
            supports_present,
        }
    }

    #[test]
    fn single_combined_family_resolves_all_roles() {
        let families = [family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
            true,
        )];

        let assignment = QueueAssignment::resolve(&families).unwrap();
        assert_eq!(assignment.graphics, 0);
        assert_eq!(assignment.present, 0);
        assert_eq!(assignment.transfer, 0);
        assert_eq!(assignment.compute, 0);
        assert_eq!(assignment.distinct_families(), vec![0]);
    }

    #[test]
    fn no_present_support_is_rejected() {
        let families = [family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
            false,
        )];

        assert!(matches!(
            QueueAssignment::resolve(&families),
            Err(GpuError::NoSuitableQueueFamilies)
        ));
    }

    #[test]
    fn no_graphics_support_is_rejected() {
        let families = [
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, true),
            family(vk::QueueFlags::TRANSFER, false),
        ];

        assert!(matches!(
            QueueAssignment::resolve(&families),
            Err(GpuError::NoSuitableQueueFamilies)
        ));
    }

    #[test]
    fn dedicated_compute_and_transfer_are_preferred() {
        let families = [
            family(
                vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
                true,
            ),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER, false),
            family(vk::QueueFlags::TRANSFER, false),
        ];

        let assignment = QueueAssignment::resolve(&families).unwrap();
        assert_eq!(assignment.graphics, 0);
        assert_eq!(assignment.present, 0);
        // First capable family distinct from graphics wins for both.
        assert_eq!(assignment.compute, 1);
        assert_eq!(assignment.transfer, 1);
        assert!(assignment.has_dedicated_compute());
        assert!(assignment.has_dedicated_transfer());
        assert_eq!(assignment.distinct_families(), vec![0, 1]);
    }

    #[test]
    fn present_locks_to_first_supporting_family() {
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER, false),
            family(vk::QueueFlags::COMPUTE, true),
            family(vk::QueueFlags::GRAPHICS, true),
        ];

        let assignment = QueueAssignment::resolve(&families).unwrap();
        assert_eq!(assignment.graphics, 0);
        assert_eq!(assignment.present, 1);
        assert_eq!(assignment.compute, 1);
        assert_eq!(assignment.distinct_families(), vec![0, 1]);
    }

    #[test]
    fn missing_dedicated_families_fall_back_to_graphics() {
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER, true),
            family(vk::QueueFlags::empty(), false),
        ];

        let assignment = QueueAssignment::resolve(&families).unwrap();
        assert_eq!(assignment.compute, 0);
        assert_eq!(assignment.transfer, 0);
        assert!(!assignment.has_dedicated_compute());
        assert!(!assignment.has_dedicated_transfer());
    }

    #[test]
    fn zero_queue_families_are_skipped() {
        let families = [
            QueueFamilyInfo {
                flags: vk::QueueFlags::GRAPHICS,
                queue_count: 0,
                supports_present: true,
            },
            family(vk::QueueFlags::GRAPHICS, true),
        ];

        let assignment = QueueAssignment::resolve(&families).unwrap();
        assert_eq!(assignment.graphics, 1);
        assert_eq!(assignment.present, 1);
    }
}
