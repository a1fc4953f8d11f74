//! Phase 2: per-type section loading.
//!
//! Re-walks the sections in order, dispatching on the type tag and
//! populating the image's derived tables. Unknown tags are allowed; their
//! pointer literal stays null.

use log::error;

use crate::error::{check, Fault, LoadError};
use crate::host::LoaderHost;
use crate::image::{ConfigEntry, Image, PointerLit};
use crate::number::{self, NumLit};
use crate::section::{
    InfoHeader, SectionRef, SectionType, FIRST_RTCALL, INFO_HEADER_BYTES, LIT_BOXED_BUFFER,
    LIT_BOXED_STRING, MAX_ALLOC_GLOBALS, MAX_SECTION_BYTES, MIN_SECTION_BYTES,
};

pub(super) fn load_sections<H: LoaderHost>(img: &mut Image, host: &mut H) -> Result<(), Fault> {
    let len = img.data.len() as u64;
    let mut off: u32 = 0;
    let mut idx: usize = 0;

    while (off as u64) < len {
        let sect = SectionRef::read(img.view(), off)
            .ok_or(Fault::at(LoadError::BadSectionSize, off))?;

        check(sect.size < MAX_SECTION_BYTES, LoadError::SectionTooLarge, off)?;
        check(sect.size >= MIN_SECTION_BYTES, LoadError::SectionTooSmall, off)?;

        match sect.ty() {
            Some(SectionType::InfoHeader) => load_info_header(img, sect, idx)?,
            Some(SectionType::OpCodeMap) => load_opcode_map(img, host, sect)?,
            Some(SectionType::NumberLiterals) => load_number_literals(img, sect)?,
            Some(SectionType::ConfigData) => load_config_data(img, sect)?,
            Some(SectionType::Literal) => load_literal(img, host, sect, idx)?,
            Some(SectionType::Function) | Some(SectionType::VTable) => {
                img.pointer_literals[idx] = PointerLit::Section(idx as u32);
            }
            _ => {} // unknown tag: pointer literal stays null
        }

        img.sections.push(sect);
        idx += 1;
        off = sect.end();
    }

    check(img.info.is_some(), LoadError::MissingInfoHeader, 0)?;
    check(!img.opcodes.is_empty(), LoadError::MissingOpCodeMap, 0)?;
    check(
        !img.number_literals.is_empty(),
        LoadError::MissingNumberLiterals,
        0,
    )?;
    check(!img.config_data.is_empty(), LoadError::MissingConfigData, 0)?;
    Ok(())
}

fn load_info_header(img: &mut Image, sect: SectionRef, idx: usize) -> Result<(), Fault> {
    let off = sect.offset;
    check(
        sect.payload_len() >= INFO_HEADER_BYTES,
        LoadError::InfoHeaderTooSmall,
        off,
    )?;
    let hd = InfoHeader::read(img.view(), sect.payload())
        .ok_or(Fault::at(LoadError::InfoHeaderTooSmall, off))?;
    check(hd.magic0 == crate::section::IMAGE_MAGIC0, LoadError::BadMagic0, off)?;
    check(hd.magic1 == crate::section::IMAGE_MAGIC1, LoadError::BadMagic1, off)?;
    check(
        hd.alloc_globals >= hd.non_pointer_globals,
        LoadError::GlobalsInverted,
        off,
    )?;
    check(hd.alloc_globals < MAX_ALLOC_GLOBALS, LoadError::GlobalsTooMany, off)?;
    check(idx == 0, LoadError::InfoHeaderNotFirst, off)?;
    img.info = Some(hd);
    Ok(())
}

fn load_opcode_map<H: LoaderHost>(
    img: &mut Image,
    host: &mut H,
    sect: SectionRef,
) -> Result<(), Fault> {
    let off = sect.offset;
    check(img.opcodes.is_empty(), LoadError::DuplicateOpCodeMap, off)?;

    let payload = sect.payload() as usize;
    let bytes = img
        .view()
        .slice(payload, sect.payload_len() as usize)
        .ok_or(Fault::at(LoadError::SectionTooSmall, off))?;
    check(
        bytes.last() == Some(&0),
        LoadError::OpCodeMapUnterminated,
        off,
    )?;

    // Every NUL delimits one opcode slot; empty names are reserved slots.
    let num_opcodes = bytes.iter().filter(|&&b| b == 0).count();
    check(
        num_opcodes >= FIRST_RTCALL as usize,
        LoadError::TooFewOpcodes,
        off,
    )?;

    let mut handlers = Vec::with_capacity(num_opcodes);
    let mut descs = Vec::with_capacity(num_opcodes);
    for name in bytes.split(|&b| b == 0).take(num_opcodes) {
        if name.is_empty() {
            handlers.push(None);
            descs.push(None);
            continue;
        }
        // Offset of this name within the image, for diagnostics.
        let name_off = payload + (name.as_ptr() as usize - bytes.as_ptr() as usize);
        match host.resolve_opcode(name) {
            Some(desc) => {
                handlers.push(Some(desc.handler));
                descs.push(Some(desc));
            }
            None => {
                error!("missing opcode: {}", String::from_utf8_lossy(name));
                return Err(Fault::at(LoadError::UnknownOpcode, name_off as u32));
            }
        }
    }

    img.opcodes = handlers;
    img.opcode_descs = descs;
    Ok(())
}

fn load_number_literals(img: &mut Image, sect: SectionRef) -> Result<(), Fault> {
    let off = sect.offset;
    check(
        img.number_literals.is_empty(),
        LoadError::DuplicateNumberLiterals,
        off,
    )?;

    let count = (sect.size / 8 - 1) as usize;
    let mut pool = Vec::with_capacity(count);
    let view = img.view();
    for i in 0..count {
        let slot_off = sect.payload() + 8 * i as u32;
        let v = view
            .u64(slot_off as usize)
            .ok_or(Fault::at(LoadError::NumberLiteralEncoding, slot_off))?;
        let lit = if number::is_encoded_double(v) {
            let d = number::decode_double(v);
            check(!d.is_nan(), LoadError::NumberLiteralNan, slot_off)?;
            NumLit::Double(d)
        } else if v & 1 != 0 {
            check(v >> 1 <= u32::MAX as u64, LoadError::NumberLiteralRange, slot_off)?;
            NumLit::Int((v >> 1) as u32)
        } else if v == 0 {
            NumLit::Null // padding
        } else {
            return Err(Fault::at(LoadError::NumberLiteralEncoding, slot_off));
        };
        pool.push(lit);
    }
    img.number_literals = pool;
    Ok(())
}

fn load_config_data(img: &mut Image, sect: SectionRef) -> Result<(), Fault> {
    let count = (sect.payload_len() / 8) as usize;
    let mut entries = Vec::with_capacity(count);
    let view = img.view();
    for i in 0..count {
        let p = sect.payload() as usize + 8 * i;
        let key = view
            .i32(p)
            .ok_or(Fault::at(LoadError::SectionTooSmall, sect.offset))?;
        let value = view
            .i32(p + 4)
            .ok_or(Fault::at(LoadError::SectionTooSmall, sect.offset))?;
        entries.push(ConfigEntry { key, value });
    }
    check(
        entries.last().map(|e| e.key) == Some(0),
        LoadError::ConfigTerminator,
        sect.offset,
    )?;
    // A later ConfigData section overwrites an earlier one.
    img.config_data = entries;
    Ok(())
}

fn load_literal<H: LoaderHost>(
    img: &mut Image,
    host: &mut H,
    sect: SectionRef,
    idx: usize,
) -> Result<(), Fault> {
    let off = sect.offset;
    check(
        sect.aux == LIT_BOXED_STRING || sect.aux == LIT_BOXED_BUFFER,
        LoadError::UnknownLiteralKind,
        off,
    )?;

    let payload = sect.payload() as usize;
    let numbytes = img
        .view()
        .u32(payload)
        .ok_or(Fault::at(LoadError::LiteralTooShort, off))?;
    check(
        sect.size as u64 >= numbytes as u64 + 12,
        LoadError::LiteralTooShort,
        off,
    )?;
    let bytes = img
        .view()
        .slice(payload + 4, numbytes as usize)
        .ok_or(Fault::at(LoadError::LiteralTooShort, off))?;

    let boxed = if sect.aux == LIT_BOXED_STRING {
        host.make_string(bytes)
    } else {
        host.make_buffer(bytes)
    };
    img.pointer_literals[idx] = PointerLit::Boxed(boxed);
    Ok(())
}
