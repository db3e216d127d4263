//! Symmetric request builder: cipher, auth, chained cipher+hash, and
//! generic (non-LCE) AEAD.
//!
//! Grounded on `qat_sym_build_request` in `qat_sym.c` — the single largest
//! function in the original driver and the largest component of this
//! crate by design.

use crate::bpi;
use crate::constants::QAT_64_BYTE_ALIGN_MASK;
use crate::cookie::Cookie;
use crate::error::{QatError, Result};
use crate::generation::DeviceGeneration;
use crate::op::Operation;
use crate::session::{CipherMode, HashAlgorithm, Session};
use crate::sgl::{build_sgl, digest_is_adjacent};
use crate::wire::{comn_flags, RequestDescriptor};

struct SubOps {
    do_cipher: bool,
    do_auth: bool,
    do_aead: bool,
}

fn classify(session: &Session) -> SubOps {
    use crate::wire::CommandId;

    let do_aead = session.is_aead();
    if do_aead {
        return SubOps { do_cipher: false, do_auth: false, do_aead: true };
    }

    match session.command_id {
        CommandId::Cipher => SubOps { do_cipher: true, do_auth: false, do_aead: false },
        CommandId::Auth => SubOps { do_cipher: false, do_auth: true, do_aead: false },
        CommandId::CipherThenHash | CommandId::HashThenCipher => {
            SubOps { do_cipher: true, do_auth: true, do_aead: false }
        }
        CommandId::Aead => SubOps { do_cipher: false, do_auth: false, do_aead: true },
        CommandId::CipherCrc => SubOps { do_cipher: true, do_auth: false, do_aead: false },
    }
}

/// CCM B0-block flags byte: `CCM_BUILD_B0_FLAGS(aad_present, digest_len, q)`.
fn ccm_build_b0_flags(aad_present: bool, digest_len: u16, q: u8) -> u8 {
    let adata = if aad_present { 1u8 } else { 0u8 };
    let m = ((digest_len - 2) / 2) as u8; // (t-2)/2, t = digest length in bytes
    let q_field = q - 1;
    (adata << 6) | (m << 3) | q_field
}

fn write_ccm_b0(cd_ctrl_aad: &mut [u8], nonce: &[u8], msg_len: u32, digest_len: u16, aad_len: u16) {
    let q = 15 - nonce.len() as u8;
    cd_ctrl_aad[0] = ccm_build_b0_flags(aad_len > 0, digest_len, q);
    cd_ctrl_aad[1..1 + nonce.len()].copy_from_slice(nonce);
    let len_bytes = (msg_len as u64).to_be_bytes();
    let q_usize = q as usize;
    cd_ctrl_aad[1 + nonce.len()..1 + nonce.len() + q_usize]
        .copy_from_slice(&len_bytes[8 - q_usize..]);

    if aad_len > 0 {
        let aad_region = &mut cd_ctrl_aad[crate::constants::CCM_AAD_DATA_OFFSET..];
        aad_region[0..2].copy_from_slice(&aad_len.to_be_bytes());
    }
}

/// Build a symmetric (cipher/auth/chained/generic-AEAD) request into
/// `slot`, using `cookie`'s scratch for any SGL path.
pub fn build_request(
    op: &mut Operation,
    slot: &mut RequestDescriptor,
    cookie: &mut Cookie,
    _generation: DeviceGeneration,
) -> Result<()> {
    let session = op.session.clone();
    *slot = session.fw_request_template;
    slot.mid.opaque_data = op as *mut Operation as u64;

    // The IV field is always placed inline (pointer form, signaled by
    // CIPH_IV_FLD_PTR, is not modeled — IVs over 16 bytes are rejected
    // below). The bit is cleared explicitly so a session template that
    // happens to carry it set can't leak through.
    let iv_len = session.cipher_iv_length as usize;
    if iv_len > 16 {
        return Err(QatError::unsupported("IV longer than 16 bytes requires pointer-form placement, not modeled"));
    }
    slot.cipher.cipher_iv[..iv_len].copy_from_slice(&op.cipher.iv[..iv_len]);
    slot.header.comn_req_flags &= !comn_flags::CIPH_IV_FLD_PTR;

    let sub_ops = classify(&session);

    let mut cipher_len = op.cipher.length;
    let mut cipher_ofs = op.cipher.offset;

    if session.is_bit_oriented() {
        if cipher_ofs % 8 != 0 || cipher_len % 8 != 0 {
            op.status = crate::error::OpStatus::InvalidArgs;
            return Err(QatError::invalid("bit-oriented cipher offset/length must be byte-aligned"));
        }
        cipher_len /= 8;
        cipher_ofs /= 8;
    }

    if let Some(bpi_ctx) = session.bpi_context.as_ref() {
        // BPI residue handling operates directly on the op's buffer; the
        // hardware only ever sees the block-aligned portion. The op's own
        // IV seeds the fallback path when the residue has no preceding
        // block. Only a single-segment, in-place buffer can be handled this
        // way — DOCSIS ops are never scattered or out-of-place.
        if op.is_out_of_place() {
            op.status = crate::error::OpStatus::InvalidArgs;
            return Err(QatError::invalid("BPI ciphers require in-place operation"));
        }
        let region = unsafe {
            crate::sgl::single_segment_region_mut(op.source.as_ref(), cipher_ofs as u64, cipher_len)?
        };
        let result = bpi::preprocess_decrypt(bpi_ctx, region, &op.cipher.iv[..bpi_ctx.block_len])?;
        cipher_len = result.hw_cipher_len;
    }

    if sub_ops.do_aead {
        match session.cipher_mode {
            CipherMode::Gcm => {
                if session.cipher_iv_length == 12 {
                    slot.header.comn_req_flags |= comn_flags::GCM_IV_LEN_12_OCTETS;
                }
                slot.header.comn_req_flags |= comn_flags::GCM_PROTO;
            }
            CipherMode::Ccm => {
                slot.header.comn_req_flags |= comn_flags::CCM_PROTO;
                let mut b0 = [0u8; crate::constants::CCM_AAD_B0_LEN + crate::constants::CCM_AAD_DATA_OFFSET];
                let nonce_bytes = slot.cipher.cipher_iv;
                let nonce = &nonce_bytes[crate::constants::CCM_NONCE_OFFSET..crate::constants::CCM_NONCE_OFFSET + 7];
                write_ccm_b0(&mut b0, nonce, cipher_len, session.digest_length, op.aead.aad_length);
                slot.cd_ctrl.ccm_b0_flags = b0[0];
                slot.cd_ctrl.aad_size = op.aead.aad_length;
            }
            _ => {}
        }
    }

    let auth_ofs = op.auth.offset;
    let auth_len = op.auth.length;

    let min_ofs = if sub_ops.do_auth || sub_ops.do_aead {
        cipher_ofs.min(auth_ofs)
    } else {
        cipher_ofs
    };

    let is_out_of_place = op.is_out_of_place();

    let (src_start, dst_start) = if is_out_of_place {
        (min_ofs as u64, min_ofs as u64)
    } else {
        let aligned = (min_ofs as u64) & QAT_64_BYTE_ALIGN_MASK;
        (aligned, aligned)
    };

    slot.cipher.cipher_offset = cipher_ofs - min_ofs;
    slot.cipher.cipher_length = cipher_len;
    if sub_ops.do_auth || sub_ops.do_aead {
        slot.auth.auth_offset = auth_ofs.saturating_sub(min_ofs);
        slot.auth.auth_length = auth_len;
        slot.auth.auth_res_addr = op.auth.digest_phys_addr;
        slot.auth.auth_res_size = session.digest_length as u8;
    }

    let cipher_end = cipher_ofs + cipher_len;
    let auth_end = auth_ofs + auth_len;

    let chain_is_multi_segment = op.source.segments().len() > 1 || op.destination.as_ref().map(|d| d.segments().len() > 1).unwrap_or(false);

    if chain_is_multi_segment || is_out_of_place {
        slot.header.comn_req_flags |= comn_flags::COMN_PTR_TYPE_SGL;

        let dma_len = cipher_end.max(if sub_ops.do_auth || sub_ops.do_aead { auth_end } else { 0 }) - min_ofs;

        if session.is_aead() && digest_is_adjacent(op.source.as_ref(), cipher_ofs as u64, cipher_len, op.auth.digest_phys_addr) {
            slot.header.comn_req_flags |= comn_flags::DIGEST_IN_BUFFER;
        }

        build_sgl(op.source.as_ref(), src_start, dma_len, &mut cookie.src_sgl)?;
        slot.mid.src_data_addr = cookie.src_sgl_phys;
        slot.mid.src_length = dma_len;

        if is_out_of_place {
            build_sgl(op.dest(), dst_start, dma_len, &mut cookie.dst_sgl)?;
            slot.mid.dst_data_addr = cookie.dst_sgl_phys;
            slot.mid.dst_length = dma_len;
        } else {
            slot.mid.dst_data_addr = cookie.src_sgl_phys;
            slot.mid.dst_length = dma_len;
        }
    } else {
        let seg = op.source.segments()[0];
        slot.mid.src_data_addr = seg.iova;
        slot.mid.src_length = seg.data_len;
        slot.mid.dst_data_addr = seg.iova;
        slot.mid.dst_length = seg.data_len;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{CipherAlgorithm, CipherDirection, CommandId as SessionCommandId};
    use crate::sgl::{Segment, VecBufferChain};
    use crate::wire::CommonHeader;
    use bytemuck::Zeroable;
    use std::sync::Arc;

    fn session(mode: CipherMode, hash: HashAlgorithm) -> Arc<Session> {
        Arc::new(Session {
            command_id: SessionCommandId::Cipher,
            cipher_algorithm: CipherAlgorithm::Aes128,
            cipher_mode: mode,
            cipher_direction: CipherDirection::Encrypt,
            hash_algorithm: hash,
            cipher_iv_offset: 0,
            cipher_iv_length: 16,
            auth_iv_offset: 0,
            auth_iv_length: 0,
            aad_length: 0,
            digest_length: 16,
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
        })
    }

    fn flat_chain(iova: u64, len: u32) -> Box<VecBufferChain> {
        Box::new(VecBufferChain { segments: vec![Segment { iova, data_len: len }] })
    }

    #[test]
    fn single_segment_inplace_uses_flat_addressing() {
        let sess = session(CipherMode::Cbc, HashAlgorithm::None);
        let mut op = Operation {
            session: sess,
            source: flat_chain(0x1000, 32),
            destination: None,
            cipher: crate::op::CipherParams { offset: 0, length: 32, iv: [0; 16] },
            auth: Default::default(),
            aead: Default::default(),
            compression: Default::default(),
            status: Default::default(),
        };
        let mut slot = RequestDescriptor {
            header: CommonHeader::zeroed_header(),
            mid: Zeroable::zeroed(),
            cipher: Zeroable::zeroed(),
            auth: Zeroable::zeroed(),
            cd_ctrl: Zeroable::zeroed(),
            _tail_pad: [0; 16],
        };
        let mut cookie_pool = crate::cookie::CookiePool::new(2);
        let cookie = cookie_pool.get_mut(0);
        build_request(&mut op, &mut slot, cookie, DeviceGeneration::Gen4).unwrap();
        assert_eq!({ slot.mid.src_data_addr }, 0x1000);
        assert_eq!({ slot.cipher.cipher_length }, 32);
    }

    #[test]
    fn multi_segment_source_uses_sgl_path() {
        let sess = session(CipherMode::Ctr, HashAlgorithm::None);
        let mut op = Operation {
            session: sess,
            source: Box::new(VecBufferChain {
                segments: vec![Segment { iova: 0x1000, data_len: 16 }, Segment { iova: 0x2000, data_len: 16 }],
            }),
            destination: None,
            cipher: crate::op::CipherParams { offset: 0, length: 32, iv: [0; 16] },
            auth: Default::default(),
            aead: Default::default(),
            compression: Default::default(),
            status: Default::default(),
        };
        let mut slot = RequestDescriptor {
            header: CommonHeader::zeroed_header(),
            mid: Zeroable::zeroed(),
            cipher: Zeroable::zeroed(),
            auth: Zeroable::zeroed(),
            cd_ctrl: Zeroable::zeroed(),
            _tail_pad: [0; 16],
        };
        let mut cookie_pool = crate::cookie::CookiePool::new(2);
        let cookie = cookie_pool.get_mut(0);
        build_request(&mut op, &mut slot, cookie, DeviceGeneration::Gen4).unwrap();
        assert_eq!({ slot.header.comn_req_flags } & comn_flags::COMN_PTR_TYPE_SGL, comn_flags::COMN_PTR_TYPE_SGL);
    }

    #[test]
    fn op_iv_is_copied_into_the_descriptor() {
        let sess = session(CipherMode::Cbc, HashAlgorithm::None);
        let mut iv = [0u8; 16];
        iv[..4].copy_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);
        let mut op = Operation {
            session: sess,
            source: flat_chain(0x1000, 32),
            destination: None,
            cipher: crate::op::CipherParams { offset: 0, length: 32, iv },
            auth: Default::default(),
            aead: Default::default(),
            compression: Default::default(),
            status: Default::default(),
        };
        let mut slot = RequestDescriptor {
            header: CommonHeader::zeroed_header(),
            mid: Zeroable::zeroed(),
            cipher: Zeroable::zeroed(),
            auth: Zeroable::zeroed(),
            cd_ctrl: Zeroable::zeroed(),
            _tail_pad: [0; 16],
        };
        let mut cookie_pool = crate::cookie::CookiePool::new(2);
        let cookie = cookie_pool.get_mut(0);
        build_request(&mut op, &mut slot, cookie, DeviceGeneration::Gen4).unwrap();
        assert_eq!({ slot.cipher.cipher_iv }, iv);
        assert_eq!({ slot.header.comn_req_flags } & comn_flags::CIPH_IV_FLD_PTR, 0);
    }

    #[test]
    fn bpi_preprocess_runs_against_the_real_source_buffer() {
        use crate::session::BpiContext;

        let mut sess = (*session(CipherMode::Cbc, HashAlgorithm::None)).clone();
        sess.cipher_direction = CipherDirection::Decrypt;
        sess.bpi_context = Some(BpiContext { block_len: 16, key: vec![0u8; 16] });
        let sess = Arc::new(sess);

        let mut buf = vec![0xAAu8; 16 + 5];
        let original = buf.clone();
        let mut op = Operation {
            session: sess,
            source: Box::new(VecBufferChain {
                segments: vec![Segment { iova: buf.as_mut_ptr() as u64, data_len: buf.len() as u32 }],
            }),
            destination: None,
            cipher: crate::op::CipherParams { offset: 0, length: buf.len() as u32, iv: [0; 16] },
            auth: Default::default(),
            aead: Default::default(),
            compression: Default::default(),
            status: Default::default(),
        };
        let mut slot = RequestDescriptor {
            header: CommonHeader::zeroed_header(),
            mid: Zeroable::zeroed(),
            cipher: Zeroable::zeroed(),
            auth: Zeroable::zeroed(),
            cd_ctrl: Zeroable::zeroed(),
            _tail_pad: [0; 16],
        };
        let mut cookie_pool = crate::cookie::CookiePool::new(2);
        let cookie = cookie_pool.get_mut(0);
        build_request(&mut op, &mut slot, cookie, DeviceGeneration::Gen4).unwrap();
        assert_eq!({ slot.cipher.cipher_length }, 16);
        assert_ne!(buf[16..], original[16..]);
    }
}
