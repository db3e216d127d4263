//! LCE-generation AEAD request builder (AES-256-GCM only).
//!
//! Grounded on `qat_sym_build_op_aead_gen_lce` in
//! `qat_crypto_pmd_gen_lce.c`: this generation collapses GCM onto a single
//! specialized descriptor shape, always SGL, always in-place, with a
//! digest-adjacency fast path folding the digest into the cipher-text span
//! when possible.

use crate::constants::SGL_MAX_SEGMENTS;
use crate::cookie::Cookie;
use crate::error::{QatError, Result};
use crate::generation::DeviceGeneration;
use crate::op::Operation;
use crate::session::{CipherAlgorithm, CipherDirection, CipherMode};
use crate::sgl::{build_sgl, digest_is_adjacent, Sgl};
use crate::wire::{comn_flags, FlatBufferDesc, RequestDescriptor};

/// Build the source SGL as AAD, if any, followed by the cipher-text span
/// (plus digest when decrypting with a non-adjacent digest). `build_sgl`
/// fills the cipher-text part first; the AAD entry is then unshifted into
/// slot zero so the AAD always leads the chain.
fn build_source_sgl(op: &Operation, cipher_ofs: u64, cipher_region_len: u32, sgl: &mut Sgl) -> Result<()> {
    build_sgl(op.source.as_ref(), cipher_ofs, cipher_region_len, sgl)?;

    let aad_len = op.aead.aad_length;
    if aad_len == 0 {
        return Ok(());
    }

    let existing = sgl.num_bufs as usize;
    if existing >= SGL_MAX_SEGMENTS {
        return Err(QatError::invalid("SGL exceeded max segments while prepending AAD"));
    }
    for i in (0..existing).rev() {
        sgl.entries[i + 1] = sgl.entries[i];
    }
    sgl.entries[0] = FlatBufferDesc { length: aad_len as u32, reserved: 0, physical_address: op.aead.aad_phys_addr };
    sgl.num_bufs = existing as u32 + 1;
    sgl.num_mapped = sgl.num_bufs;
    Ok(())
}

/// Build an LCE AES-256-GCM request. Rejects anything else with `Invalid`
/// — the original driver enforces this with a debug `assert!`; here it's
/// a hard runtime error instead, since request-build failures surface
/// through the op, not through process aborts.
pub fn build_request(
    op: &mut Operation,
    slot: &mut RequestDescriptor,
    cookie: &mut Cookie,
    _generation: DeviceGeneration,
) -> Result<()> {
    let session = op.session.clone();

    if session.cipher_algorithm != CipherAlgorithm::Aes256 || session.cipher_mode != CipherMode::Gcm {
        return Err(QatError::invalid("LCE AEAD path only supports AES-256-GCM"));
    }
    if session.cipher_iv_length != 12 {
        return Err(QatError::invalid("LCE AEAD path requires a 12-byte IV"));
    }
    if op.is_out_of_place() {
        return Err(QatError::invalid("LCE AEAD path always runs in-place"));
    }

    *slot = session.fw_request_template;
    slot.mid.opaque_data = op as *mut Operation as u64;
    slot.header.comn_req_flags |= comn_flags::GCM_IV_LEN_12_OCTETS | comn_flags::COMN_PTR_TYPE_SGL;

    let cipher_ofs = op.cipher.offset as u64;
    let cipher_len = op.cipher.length;
    let digest_len = session.digest_length as u32;
    let encrypting = session.cipher_direction == CipherDirection::Encrypt;

    let adjacent = digest_is_adjacent(op.source.as_ref(), cipher_ofs, cipher_len, op.auth.digest_phys_addr);
    if adjacent {
        slot.header.comn_req_flags |= comn_flags::DIGEST_IN_BUFFER;
    }

    // Source SGL: AAD -> cipher-text (-> digest if decrypting and not
    // adjacent). Destination SGL: cipher-text (-> digest if encrypting
    // and not adjacent).
    let aad_len = op.aead.aad_length as u32;
    let cipher_region_len = if !encrypting && !adjacent { cipher_len + digest_len } else { cipher_len };
    build_source_sgl(op, cipher_ofs, cipher_region_len, &mut cookie.src_sgl)?;
    slot.mid.src_data_addr = cookie.src_sgl_phys;
    slot.mid.src_length = aad_len + cipher_region_len;

    let dst_len = if encrypting && !adjacent { cipher_len + digest_len } else { cipher_len };
    slot.mid.dst_data_addr = cookie.src_sgl_phys;
    slot.mid.dst_length = dst_len;

    slot.cipher.cipher_offset = aad_len;
    slot.cipher.cipher_length = cipher_len;
    slot.cd_ctrl.aad_size = op.aead.aad_length;
    slot.auth.auth_res_addr = op.auth.digest_phys_addr;
    slot.auth.auth_res_size = session.digest_length as u8;

    Ok(())
}
