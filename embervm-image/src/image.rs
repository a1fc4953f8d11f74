//! The loaded-module data object threaded through every load phase.

use std::fmt;

use crate::host::{BuiltinMethods, GcRef, NativePtr, OpcodeDesc};
use crate::number::NumLit;
use crate::section::{InfoHeader, SectionRef};
use crate::view::View;

/// Per-section pointer literal: the boxed value for Literal sections, a
/// self-reference for Function/VTable sections, null for everything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerLit {
    Null,
    Boxed(GcRef),
    Section(u32),
}

/// One `(key, value)` pair of the ConfigData table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ConfigEntry {
    pub key: i32,
    pub value: i32,
}

/// A linked Function section: a callable object.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FunctionLink {
    /// Section index.
    pub section: u32,
    /// The built-in callable vtable, from the host.
    pub vtable: NativePtr,
    /// Absolute byte offset of the first code byte.
    pub code_start: u32,
}

/// A validated class vtable; `methods` is filled by the link pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ClassVTable {
    /// Section index.
    pub section: u32,
    /// Instance size in bytes.
    pub object_bytes: u16,
    pub class_first: u16,
    pub class_last: u16,
    pub methods: Option<BuiltinMethods>,
}

/// One loaded bytecode module and its derived runtime tables.
///
/// Created empty by [`crate::load`], populated phase by phase. Dropping an
/// image, partial or complete, frees the raw buffer and the derived
/// tables; boxed values referenced through [`GcRef`] handles belong to the
/// host's arena and are deliberately left alone.
pub struct Image {
    pub(crate) data: Vec<u8>,

    /// Sections in discovery order.
    pub sections: Vec<SectionRef>,
    /// Parallel to `sections`.
    pub pointer_literals: Vec<PointerLit>,

    pub info: Option<InfoHeader>,

    /// Opcode handler table, indexed by opcode number; `None` for
    /// reserved slots.
    pub opcodes: Vec<Option<NativePtr>>,
    /// Parallel descriptor table for diagnostics and disassembly.
    pub opcode_descs: Vec<Option<&'static OpcodeDesc>>,

    /// Decoded number literal pool.
    pub number_literals: Vec<NumLit>,

    pub config_data: Vec<ConfigEntry>,

    /// Resolved interface member name table, sorted by identity and by
    /// content.
    pub iface_member_names: Vec<GcRef>,

    /// Section index of the first Function section.
    pub entry_point: Option<u32>,

    /// Link results, one per Function section, in section order.
    pub functions: Vec<FunctionLink>,
    /// Link results, one per VTable section, in section order.
    pub class_vtables: Vec<ClassVTable>,
}

impl Image {
    pub(crate) fn new(data: Vec<u8>) -> Image {
        Image {
            data,
            sections: Vec::new(),
            pointer_literals: Vec::new(),
            info: None,
            opcodes: Vec::new(),
            opcode_descs: Vec::new(),
            number_literals: Vec::new(),
            config_data: Vec::new(),
            iface_member_names: Vec::new(),
            entry_point: None,
            functions: Vec::new(),
            class_vtables: Vec::new(),
        }
    }

    /// The raw image bytes.
    #[inline]
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    pub(crate) fn view(&self) -> View<'_> {
        View::new(&self.data)
    }

    #[inline]
    pub fn num_sections(&self) -> usize {
        self.sections.len()
    }

    /// Payload bytes of section `idx`.
    pub fn section_payload(&self, idx: usize) -> Option<&[u8]> {
        let sect = self.sections.get(idx)?;
        self.view()
            .slice(sect.payload() as usize, sect.payload_len() as usize)
    }

    /// First ConfigData value for `key`, if any.
    pub fn config(&self, key: i32) -> Option<i32> {
        self.config_data
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value)
    }
}

impl fmt::Debug for Image {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Image")
            .field("bytes", &self.data.len())
            .field("sections", &self.sections.len())
            .field("opcodes", &self.opcodes.len())
            .field("number_literals", &self.number_literals.len())
            .field("entry_point", &self.entry_point)
            .finish_non_exhaustive()
    }
}
