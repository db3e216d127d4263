//! Per-service request builders.
//!
//! Each builder copies a session's pre-built template into the output ring
//! slot, overlays operation-specific parameters, and patches SGL or flat
//! buffer pointers — the single largest component by line share in the
//! original driver.

pub mod aead_lce;
pub mod compression;
pub mod symmetric;

use crate::cookie::Cookie;
use crate::error::Result;
use crate::generation::DeviceGeneration;
use crate::op::Operation;
use crate::wire::RequestDescriptor;

/// Common signature every per-service builder implements. `slot` is the
/// ring slot the descriptor is written into; `cookie` supplies
/// precomputed SGL scratch and physical addresses for this in-flight
/// request.
pub type BuildRequestFn =
    fn(op: &mut Operation, slot: &mut RequestDescriptor, cookie: &mut Cookie, generation: DeviceGeneration) -> Result<()>;
