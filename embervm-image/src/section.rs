//! On-disk section layout: header shapes, type tags and format constants.
//!
//! An image is a sequence of back-to-back, 8-byte-aligned, size-prefixed
//! sections. Each section starts with an 8-byte header:
//!
//! ```text
//! 0  u32  size   total bytes including this header; > 0, multiple of 8
//! 4  u8   type   section type tag
//! 5  u8   flags  reserved
//! 6  u16  aux    type-specific auxiliary word
//! ```

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

use crate::view::View;

/// `"EmbrVM8\n"` as a little-endian u64.
pub const IMAGE_MAGIC0: u64 = u64::from_le_bytes(*b"EmbrVM8\n");
pub const IMAGE_MAGIC1: u64 = 0x73a9_1b4e_d2c8_05f1;

pub const SECTION_HEADER_BYTES: u32 = 8;
/// Generic per-section size bounds enforced by the load phase.
pub const MIN_SECTION_BYTES: u32 = 16;
pub const MAX_SECTION_BYTES: u32 = 32000;

/// Fixed InfoHeader payload size.
pub const INFO_HEADER_BYTES: u32 = 40;
/// Upper bound on `alloc_globals`.
pub const MAX_ALLOC_GLOBALS: u32 = 10_000;

/// Number of opcode slots reserved for the numbered core instructions;
/// every image's OpCodeMap must cover at least the runtime-call range that
/// starts here.
pub const FIRST_RTCALL: u32 = 24;

/// Byte offset from a Function section's start to its first code byte
/// (8-byte section header plus the 16-byte function info block).
pub const FUNCTION_CODE_OFFSET: u32 = 24;

pub const VTABLE_MAGIC: u8 = 0xf9;
/// `object_type` tag for plain class instances.
pub const OBJECT_TYPE_TAG: u8 = 4;
/// First class id available to user-defined classes.
pub const USER_CLASS_FIRST: u16 = 16;
/// Number of fixed built-in method slots at the head of every vtable.
pub const NUM_BUILTIN_METHODS: usize = 4;
/// Fixed vtable header size: 16 bytes of fields plus the built-in slots.
pub const VTABLE_HEADER_BYTES: u32 = 16 + NUM_BUILTIN_METHODS as u32 * 8;

pub const IFACE_ENTRY_BYTES: u32 = 8;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, FromPrimitive)]
#[repr(u8)]
pub enum SectionType {
    InfoHeader = 0x01,
    OpCodeMap = 0x02,
    NumberLiterals = 0x03,
    ConfigData = 0x04,
    IfaceMemberNames = 0x05,
    Function = 0x20,
    Literal = 0x21,
    VTable = 0x22,
}

/// `aux` values legal on a Literal section.
pub const LIT_BOXED_STRING: u16 = 1;
pub const LIT_BOXED_BUFFER: u16 = 2;

/// One discovered section. Offsets are absolute within the image buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionRef {
    pub offset: u32,
    pub size: u32,
    pub ty_raw: u8,
    pub flags: u8,
    pub aux: u16,
}

impl SectionRef {
    /// Recognized section type, or `None` for unknown tags (which are
    /// allowed and simply skipped by the loader).
    #[inline]
    pub fn ty(&self) -> Option<SectionType> {
        SectionType::from_u8(self.ty_raw)
    }

    #[inline]
    pub fn is(&self, ty: SectionType) -> bool {
        self.ty() == Some(ty)
    }

    /// Absolute offset of the payload (first byte after the header).
    #[inline]
    pub fn payload(&self) -> u32 {
        self.offset + SECTION_HEADER_BYTES
    }

    /// Absolute end offset (exclusive).
    #[inline]
    pub fn end(&self) -> u32 {
        self.offset + self.size
    }

    /// Payload size in bytes.
    #[inline]
    pub fn payload_len(&self) -> u32 {
        self.size - SECTION_HEADER_BYTES
    }

    /// Read the section header at `offset`. The caller must have verified
    /// the 8 header bytes are in range.
    pub(crate) fn read(view: View<'_>, offset: u32) -> Option<SectionRef> {
        Some(SectionRef {
            offset,
            size: view.u32(offset as usize)?,
            ty_raw: view.u8(offset as usize + 4)?,
            flags: view.u8(offset as usize + 5)?,
            aux: view.u16(offset as usize + 6)?,
        })
    }
}

/// Module metadata carried by the (mandatory, first) InfoHeader section.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InfoHeader {
    pub magic0: u64,
    pub magic1: u64,
    pub hex_hash: u64,
    pub program_hash: u64,
    pub alloc_globals: u32,
    pub non_pointer_globals: u32,
}

impl InfoHeader {
    pub(crate) fn read(view: View<'_>, payload: u32) -> Option<InfoHeader> {
        let p = payload as usize;
        Some(InfoHeader {
            magic0: view.u64(p)?,
            magic1: view.u64(p + 8)?,
            hex_hash: view.u64(p + 16)?,
            program_hash: view.u64(p + 24)?,
            alloc_globals: view.u32(p + 32)?,
            non_pointer_globals: view.u32(p + 36)?,
        })
    }
}

/// Fixed header of a VTable section payload. The four built-in method
/// slots and the interface hash table follow it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VTableHeader {
    pub numbytes: u16,
    pub object_type: u8,
    pub magic: u8,
    pub iface_hash_mult: u32,
    pub iface_hash_entries: u16,
    pub reserved: u16,
    pub class_first: u16,
    pub class_last: u16,
}

impl VTableHeader {
    pub(crate) fn read(view: View<'_>, payload: u32) -> Option<VTableHeader> {
        let p = payload as usize;
        Some(VTableHeader {
            numbytes: view.u16(p)?,
            object_type: view.u8(p + 2)?,
            magic: view.u8(p + 3)?,
            iface_hash_mult: view.u32(p + 4)?,
            iface_hash_entries: view.u16(p + 8)?,
            reserved: view.u16(p + 10)?,
            class_first: view.u16(p + 12)?,
            class_last: view.u16(p + 14)?,
        })
    }
}

/// One bucket of a vtable's interface hash table.
///
/// `member_id == 0` marks an empty bucket. Otherwise `aux == 0` means
/// `method` is the section index of a virtual call target, and `aux != 0`
/// means the entry resolves to a field at 8-byte-unit offset `aux`
/// (with `method` mirroring the same value).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IfaceEntry {
    pub member_id: u16,
    pub aux: u16,
    pub method: u32,
}

impl IfaceEntry {
    pub(crate) fn read(view: View<'_>, off: u32) -> Option<IfaceEntry> {
        let p = off as usize;
        Some(IfaceEntry {
            member_id: view.u16(p)?,
            aux: view.u16(p + 2)?,
            method: view.u32(p + 4)?,
        })
    }
}
