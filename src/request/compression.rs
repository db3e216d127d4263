//! Compression request builder.
//!
//! Grounded on the compression-specific template construction in
//! `qat_comp.c` (via `_INDEX.md`'s `drivers/compress/qat/*` listing): a
//! session-level template is built once per transform, selecting command
//! ID, hardware search depth, and initial checksum seeds; the per-request
//! builder only overlays lengths, the opaque pointer, and SGL patches,
//! since compression is always SGL-capable.

use crate::cookie::Cookie;
use crate::error::{QatError, Result};
use crate::op::Operation;
use crate::sgl::build_sgl;
use crate::wire::{comn_flags, CompressionCommandId, RequestDescriptor};

/// Application compression level (1, 2, 3, or 4-9).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionLevel {
    L1,
    L2,
    L3,
    L4Through9,
}

/// Hardware search-depth mapping: levels 1/2/3 map to 1/4/8, level 4-9
/// defaults to 8 (not 16 — 16 is reserved for an explicit deep-search
/// request this core does not expose a knob for).
pub fn hw_search_depth(level: CompressionLevel) -> u8 {
    match level {
        CompressionLevel::L1 => 1,
        CompressionLevel::L2 => 4,
        CompressionLevel::L3 => 8,
        CompressionLevel::L4Through9 => 8,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionDirection {
    Compress,
    Decompress,
}

/// Per-session compression template. Dynamic Huffman encoding is rejected
/// at session-create time with `Unsupported`, not modeled as a runtime
/// request path.
#[derive(Debug, Clone)]
pub struct CompressionXform {
    pub command_id: CompressionCommandId,
    pub direction: CompressionDirection,
    pub search_depth: u8,
    pub initial_adler: u32,
    pub initial_crc: u32,
}

impl CompressionXform {
    pub fn new(level: CompressionLevel, direction: CompressionDirection, dynamic_huffman: bool) -> Result<Self> {
        if dynamic_huffman {
            return Err(QatError::unsupported("dynamic Huffman encoding is not supported on this core"));
        }
        let command_id = match direction {
            CompressionDirection::Decompress => CompressionCommandId::Decompress,
            CompressionDirection::Compress => CompressionCommandId::Static,
        };
        Ok(Self {
            command_id,
            direction,
            search_depth: hw_search_depth(level),
            initial_adler: 1,
            initial_crc: 0,
        })
    }
}

/// Build a compression request. `xform` supplies the session-level
/// template fields; the op supplies source/destination chains and the
/// uncompressed/compressed length the caller expects.
pub fn build_request(
    xform: &CompressionXform,
    op: &mut Operation,
    slot: &mut RequestDescriptor,
    cookie: &mut Cookie,
) -> Result<()> {
    slot.header.service_cmd_id = xform.command_id as u8;
    slot.header.comn_req_flags |= comn_flags::COMN_PTR_TYPE_SGL;
    slot.mid.opaque_data = op as *mut Operation as u64;

    let src_len = op.compression.src_length;
    build_sgl(op.source.as_ref(), op.compression.src_offset as u64, src_len, &mut cookie.src_sgl)?;
    slot.mid.src_data_addr = cookie.src_sgl_phys;
    slot.mid.src_length = src_len;

    let dst_len = op.compression.dst_length;
    build_sgl(op.dest(), 0, dst_len, &mut cookie.dst_sgl)?;
    slot.mid.dst_data_addr = cookie.dst_sgl_phys;
    slot.mid.dst_length = dst_len;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dynamic_huffman_is_rejected_at_session_create() {
        let err = CompressionXform::new(CompressionLevel::L3, CompressionDirection::Compress, true);
        assert!(err.is_err());
    }

    #[test]
    fn level_4_through_9_defaults_to_depth_8() {
        assert_eq!(hw_search_depth(CompressionLevel::L4Through9), 8);
    }

    #[test]
    fn xform_seeds_checksums_to_documented_defaults() {
        let xform = CompressionXform::new(CompressionLevel::L1, CompressionDirection::Compress, false).unwrap();
        assert_eq!(xform.initial_adler, 1);
        assert_eq!(xform.initial_crc, 0);
    }

    #[test]
    fn build_request_wires_source_and_destination_sgls() {
        use crate::generation::DeviceGeneration;
        use crate::op::CompressionParams;
        use crate::session::{CipherAlgorithm, CipherDirection, CipherMode, CommandId, HashAlgorithm, Session};
        use crate::sgl::{Segment, VecBufferChain};
        use crate::wire::CommonHeader;
        use bytemuck::Zeroable;
        use std::sync::Arc;

        let session = Arc::new(Session {
            command_id: CommandId::Cipher,
            cipher_algorithm: CipherAlgorithm::Null,
            cipher_mode: CipherMode::Ecb,
            cipher_direction: CipherDirection::Encrypt,
            hash_algorithm: HashAlgorithm::None,
            cipher_iv_offset: 0,
            cipher_iv_length: 0,
            auth_iv_offset: 0,
            auth_iv_length: 0,
            aad_length: 0,
            digest_length: 0,
            auth_key_length: 0,
            bpi_context: None,
            fw_request_template: RequestDescriptor {
                header: CommonHeader::zeroed_header(),
                mid: Zeroable::zeroed(),
                cipher: Zeroable::zeroed(),
                auth: Zeroable::zeroed(),
                cd_ctrl: Zeroable::zeroed(),
                _tail_pad: [0; 16],
            },
            min_device_generation: DeviceGeneration::Gen1,
        });

        let mut src = vec![0u8; 64];
        let mut dst = vec![0u8; 64];
        let mut op = Operation {
            session,
            source: Box::new(VecBufferChain {
                segments: vec![Segment { iova: src.as_mut_ptr() as u64, data_len: 64 }],
            }),
            destination: Some(Box::new(VecBufferChain {
                segments: vec![Segment { iova: dst.as_mut_ptr() as u64, data_len: 64 }],
            })),
            cipher: Default::default(),
            auth: Default::default(),
            aead: Default::default(),
            compression: CompressionParams { src_offset: 0, src_length: 40, dst_length: 64 },
            status: Default::default(),
        };

        let xform = CompressionXform::new(CompressionLevel::L1, CompressionDirection::Compress, false).unwrap();
        let mut cookie_pool = crate::cookie::CookiePool::new(1);
        let cookie = cookie_pool.get_mut(0);
        let mut slot = RequestDescriptor {
            header: CommonHeader::zeroed_header(),
            mid: Zeroable::zeroed(),
            cipher: Zeroable::zeroed(),
            auth: Zeroable::zeroed(),
            cd_ctrl: Zeroable::zeroed(),
            _tail_pad: [0; 16],
        };

        build_request(&xform, &mut op, &mut slot, cookie).unwrap();
        assert_eq!({ slot.mid.src_length }, 40);
        assert_eq!({ slot.mid.dst_length }, 64);
        assert_eq!(
            { slot.header.comn_req_flags } & comn_flags::COMN_PTR_TYPE_SGL,
            comn_flags::COMN_PTR_TYPE_SGL
        );
    }
}
