//! Bit-exact wire descriptors exchanged with firmware.
//!
//! Layout is taken from `icp_qat_fw_la.h` (`struct icp_qat_fw_la_bulk_req`,
//! its `comn_hdr`/`comn_mid`/`serv_specif_rqpars`/`cd_ctrl` members) and the
//! response header it mirrors. Fields are laid out with explicit byte
//! offsets via `#[repr(C, packed)]` rather than language bit-fields, per the
//! design notes ("use explicit masks and shifts, not language bit-field
//! syntax, to avoid implementation-defined layout"). `bytemuck` gives safe
//! `Pod`/`Zeroable` casts to/from the raw ring bytes.

use bytemuck::{Pod, Zeroable};

/// Total size in bytes of a symmetric/compression request descriptor.
pub const REQUEST_DESC_SIZE: usize = 128;
/// Total size in bytes of an asymmetric request descriptor.
pub const ASYM_REQUEST_DESC_SIZE: usize = 64;
/// Total size in bytes of a response descriptor.
pub const RESPONSE_DESC_SIZE: usize = 32;

/// `comn_req_flags` bit positions (`ICP_QAT_FW_COMN_*`/`ICP_QAT_FW_LA_*`).
pub mod comn_flags {
    pub const GCM_IV_LEN_12_OCTETS: u16 = 1 << 0;
    pub const ZUC_3G_PROTO: u16 = 1 << 1;
    pub const DIGEST_IN_BUFFER: u16 = 1 << 2;
    pub const RET_AUTH_RES: u16 = 1 << 3;
    pub const CMP_AUTH_RES: u16 = 1 << 4;
    pub const UPDATE_STATE: u16 = 1 << 5;
    pub const CIPH_IV_FLD_PTR: u16 = 1 << 6;
    pub const CCM_PROTO: u16 = 1 << 7;
    pub const GCM_PROTO: u16 = 1 << 8;
    pub const SNOW3G_PROTO: u16 = 1 << 9;

    pub const PARTIAL_NONE: u16 = 0b00 << 10;
    pub const PARTIAL_START: u16 = 0b01 << 10;
    pub const PARTIAL_MID: u16 = 0b10 << 10;
    pub const PARTIAL_END: u16 = 0b11 << 10;

    pub const COMN_PTR_TYPE_FLAT: u16 = 0 << 12;
    pub const COMN_PTR_TYPE_SGL: u16 = 1 << 12;
}

/// `comn_status` bits on a response (`ICP_QAT_FW_COMN_STATUS_FLAG_OK`,
/// `ICP_QAT_FW_GEN_LCE_STATUS_FLAG_ERROR`-style generic error).
pub mod comn_status {
    pub const FLAG_OK: u8 = 1 << 0;
    pub const CRYPTO_STAT_MASK: u8 = 0b0000_0110;
    pub const CRYPTO_STAT_SHIFT: u8 = 1;
}

/// LA-service command IDs. LCE specializes `4` to AEAD.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandId {
    Cipher = 0,
    Auth = 1,
    CipherThenHash = 2,
    HashThenCipher = 3,
    Aead = 4,
    CipherCrc = 17,
}

/// Compression command IDs.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionCommandId {
    Static = 0,
    Dynamic = 1,
    Decompress = 2,
}

/// 16-byte request common header.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CommonHeader {
    pub service_type: u8,
    pub service_cmd_id: u8,
    pub comn_hdr_flags: u8,
    pub reserved0: u8,
    pub serv_specif_flags: u16,
    pub comn_req_flags: u16,
    pub reserved1: u64,
}

impl CommonHeader {
    pub const fn zeroed_header() -> Self {
        Self {
            service_type: 0,
            service_cmd_id: 0,
            comn_hdr_flags: 0,
            reserved0: 0,
            serv_specif_flags: 0,
            comn_req_flags: 0,
            reserved1: 0,
        }
    }
}

/// 32-byte request mid section: opaque pointer plus src/dst buffer
/// pointers and lengths.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CommonMid {
    pub opaque_data: u64,
    pub src_data_addr: u64,
    pub dst_data_addr: u64,
    pub src_length: u32,
    pub dst_length: u32,
}

/// Inline (<=16B) or pointer-form IV / offset-length pair used throughout
/// the tail section.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CipherParams {
    pub cipher_offset: u32,
    pub cipher_length: u32,
    pub cipher_iv: [u8; 16],
}

#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct AuthParams {
    pub auth_offset: u32,
    pub auth_length: u32,
    pub auth_res_addr: u64,
    pub auth_res_size: u8,
    pub hash_state_size: u8,
    pub _reserved: [u8; 6],
}

#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct CdCtrl {
    pub aad_addr: u64,
    pub aad_size: u16,
    pub digest_size: u16,
    /// CCM B0-block flags byte (`CCM_BUILD_B0_FLAGS`), written when the
    /// session is AES-CCM; unused otherwise.
    pub ccm_b0_flags: u8,
    pub _reserved: [u8; 3],
}

/// Full 128-byte symmetric/compression request descriptor. `_tail_pad`
/// brings the composite up to the fixed wire size; the original firmware
/// descriptor carries additional per-service scratch in that space that
/// this core does not need to interpret.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct RequestDescriptor {
    pub header: CommonHeader,
    pub mid: CommonMid,
    pub cipher: CipherParams,
    pub auth: AuthParams,
    pub cd_ctrl: CdCtrl,
    pub _tail_pad: [u8; 16],
}

const _: () = assert!(std::mem::size_of::<RequestDescriptor>() == REQUEST_DESC_SIZE);

/// 32-byte completion descriptor.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ResponseDescriptor {
    pub service_type: u8,
    pub service_cmd_id: u8,
    pub comn_status: u8,
    pub cmd_id: u8,
    pub reserved0: u32,
    pub opaque_data: u64,
    pub reserved1: [u8; 16],
}

const _: () = assert!(std::mem::size_of::<ResponseDescriptor>() == RESPONSE_DESC_SIZE);

impl ResponseDescriptor {
    #[inline]
    pub fn is_ok(&self) -> bool {
        self.comn_status & comn_status::FLAG_OK != 0
    }

    #[inline]
    pub fn crypto_stat(&self) -> u8 {
        (self.comn_status & comn_status::CRYPTO_STAT_MASK) >> comn_status::CRYPTO_STAT_SHIFT
    }
}

/// Packed, cache-aligned flat buffer descriptor.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct FlatBufferDesc {
    pub length: u32,
    pub reserved: u32,
    pub physical_address: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_sizes_match_wire_contract() {
        assert_eq!(std::mem::size_of::<RequestDescriptor>(), 128);
        assert_eq!(std::mem::size_of::<ResponseDescriptor>(), 32);
        assert_eq!(std::mem::size_of::<FlatBufferDesc>(), 16);
    }

    #[test]
    fn response_status_decoding() {
        let mut resp = ResponseDescriptor::zeroed();
        resp.comn_status = comn_status::FLAG_OK;
        assert!(resp.is_ok());
        resp.comn_status = 0;
        assert!(!resp.is_ok());
    }
}
