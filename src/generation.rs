//! Hardware-spec dispatch table.
//!
//! The original driver keeps one `qat_qp_hw_spec_funcs` /
//! `qat_dev_hw_spec_funcs` struct-of-function-pointers per device
//! generation, registered into a static array at module-init time
//! (`RTE_INIT(qat_dev_gen_5_init)` in `qat_dev_gen5.c`). This crate keeps
//! that shape as a trait object table, built once behind `once_cell` and
//! immutable thereafter — the "once-initialized, then-immutable registry"
//! variant named in the design notes.

use once_cell::sync::Lazy;

use crate::error::{QatError, Result};

/// Device generation, selecting which `HwSpec` entry governs CSR offsets,
/// descriptor variants, and supported services.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceGeneration {
    Gen1,
    Gen2,
    Gen3,
    Gen4,
    Gen5,
    Lce,
    Vqat,
}

impl DeviceGeneration {
    fn index(self) -> usize {
        match self {
            DeviceGeneration::Gen1 => 0,
            DeviceGeneration::Gen2 => 1,
            DeviceGeneration::Gen3 => 2,
            DeviceGeneration::Gen4 => 3,
            DeviceGeneration::Gen5 => 4,
            DeviceGeneration::Lce => 5,
            DeviceGeneration::Vqat => 6,
        }
    }

    /// Ordinal used for "session generation < device generation floor"
    /// rejection checks. LCE and VQAT are modeled as newer than every
    /// numbered generation.
    pub fn rank(self) -> u8 {
        match self {
            DeviceGeneration::Gen1 => 1,
            DeviceGeneration::Gen2 => 2,
            DeviceGeneration::Gen3 => 3,
            DeviceGeneration::Gen4 => 4,
            DeviceGeneration::Gen5 => 5,
            DeviceGeneration::Lce => 6,
            DeviceGeneration::Vqat => 7,
        }
    }
}

const NUM_GENERATIONS: usize = 7;

/// CSR offset formulas and per-generation capability set. Isolates all
/// bit-layout differences (ring bundle stride, register offsets,
/// base-address encoding shift-by-6) so the engine above stays
/// generation-agnostic.
pub trait HwSpec: Send + Sync {
    fn generation(&self) -> DeviceGeneration;

    /// Base-address CSR offset (lower word) for a given bundle/ring.
    fn ring_base_lower_offset(&self, bundle: u8, ring: u8) -> u32;

    /// Base-address CSR offset (upper word) for a given bundle/ring.
    fn ring_base_upper_offset(&self, bundle: u8, ring: u8) -> u32;

    /// Ring-config CSR offset for a given bundle/ring.
    fn ring_config_offset(&self, bundle: u8, ring: u8) -> u32;

    /// Tail CSR offset for a given bundle/ring.
    fn ring_tail_offset(&self, bundle: u8, ring: u8) -> u32;

    /// Head CSR offset for a given bundle/ring.
    fn ring_head_offset(&self, bundle: u8, ring: u8) -> u32;

    /// Arbiter-enable CSR offset for a bundle.
    fn arb_enable_offset(&self, bundle: u8) -> u32;

    /// Whether `reset_ring_pairs` requires a PF-VF mailbox round trip
    /// (true from gen 4 onward).
    fn reset_requires_mailbox(&self) -> bool {
        self.generation().rank() >= 4
    }

    /// Number of ring bundles (arbitration domains) on this generation.
    fn num_bundles(&self) -> u16;

    /// Whether this generation supports the compression service.
    fn supports_compression(&self) -> bool;
}

macro_rules! simple_gen_spec {
    ($name:ident, $gen:expr, $bundles:expr, $comp:expr, $bundle_stride:expr, $ring_stride:expr) => {
        struct $name;

        impl HwSpec for $name {
            fn generation(&self) -> DeviceGeneration {
                $gen
            }

            fn ring_base_lower_offset(&self, bundle: u8, ring: u8) -> u32 {
                bundle as u32 * $bundle_stride + ring as u32 * $ring_stride
            }

            fn ring_base_upper_offset(&self, bundle: u8, ring: u8) -> u32 {
                self.ring_base_lower_offset(bundle, ring) + 4
            }

            fn ring_config_offset(&self, bundle: u8, ring: u8) -> u32 {
                self.ring_base_lower_offset(bundle, ring) + 0x08
            }

            fn ring_tail_offset(&self, bundle: u8, ring: u8) -> u32 {
                self.ring_base_lower_offset(bundle, ring) + 0x0C
            }

            fn ring_head_offset(&self, bundle: u8, ring: u8) -> u32 {
                self.ring_base_lower_offset(bundle, ring) + 0x10
            }

            fn arb_enable_offset(&self, bundle: u8) -> u32 {
                0x1000 + bundle as u32 * 0x04
            }

            fn num_bundles(&self) -> u16 {
                $bundles
            }

            fn supports_compression(&self) -> bool {
                $comp
            }
        }
    };
}

simple_gen_spec!(Gen1Spec, DeviceGeneration::Gen1, 256, false, 0x1000, 0x80);
simple_gen_spec!(Gen2Spec, DeviceGeneration::Gen2, 256, false, 0x1000, 0x80);
simple_gen_spec!(Gen3Spec, DeviceGeneration::Gen3, 512, true, 0x2000, 0x80);
simple_gen_spec!(Gen4Spec, DeviceGeneration::Gen4, 512, true, 0x2000, 0x100);
simple_gen_spec!(Gen5Spec, DeviceGeneration::Gen5, 1024, true, 0x4000, 0x100);
simple_gen_spec!(LceSpec, DeviceGeneration::Lce, 1024, true, 0x4000, 0x100);
simple_gen_spec!(VqatSpec, DeviceGeneration::Vqat, 64, true, 0x800, 0x80);

static DISPATCH_TABLE: Lazy<[&'static dyn HwSpec; NUM_GENERATIONS]> = Lazy::new(|| {
    [
        &Gen1Spec as &'static dyn HwSpec,
        &Gen2Spec as &'static dyn HwSpec,
        &Gen3Spec as &'static dyn HwSpec,
        &Gen4Spec as &'static dyn HwSpec,
        &Gen5Spec as &'static dyn HwSpec,
        &LceSpec as &'static dyn HwSpec,
        &VqatSpec as &'static dyn HwSpec,
    ]
});

/// Resolve the dispatch-table entry for a device generation.
pub fn hw_spec(generation: DeviceGeneration) -> &'static dyn HwSpec {
    DISPATCH_TABLE[generation.index()]
}

/// Validate that a session built for `min_device_generation` may run on a
/// queue pair of `device_generation`. A session generation below the
/// device's floor is rejected as `Invalid` at build time, before a
/// request is ever constructed.
pub fn check_generation_floor(
    device_generation: DeviceGeneration,
    min_device_generation: DeviceGeneration,
) -> Result<()> {
    if device_generation.rank() < min_device_generation.rank() {
        return Err(QatError::invalid(format!(
            "session requires generation >= {:?}, device is {:?}",
            min_device_generation, device_generation
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_generation_resolves_distinct_offsets() {
        let a = hw_spec(DeviceGeneration::Gen1).ring_base_lower_offset(0, 0);
        let b = hw_spec(DeviceGeneration::Gen5).ring_base_lower_offset(0, 0);
        assert_eq!(a, 0);
        assert_eq!(b, 0);
        assert_ne!(
            hw_spec(DeviceGeneration::Gen1).ring_base_lower_offset(1, 0),
            hw_spec(DeviceGeneration::Gen5).ring_base_lower_offset(1, 0)
        );
    }

    #[test]
    fn gen4_and_above_require_mailbox_reset() {
        assert!(hw_spec(DeviceGeneration::Gen4).reset_requires_mailbox());
        assert!(hw_spec(DeviceGeneration::Lce).reset_requires_mailbox());
        assert!(!hw_spec(DeviceGeneration::Gen2).reset_requires_mailbox());
    }

    #[test]
    fn generation_floor_rejects_older_device() {
        let err = check_generation_floor(DeviceGeneration::Gen3, DeviceGeneration::Gen4);
        assert!(err.is_err());
        assert!(check_generation_floor(DeviceGeneration::Gen5, DeviceGeneration::Gen4).is_ok());
    }

    #[test]
    fn compression_support_matches_generation_table() {
        assert!(!hw_spec(DeviceGeneration::Gen1).supports_compression());
        assert!(hw_spec(DeviceGeneration::Gen3).supports_compression());
    }
}
