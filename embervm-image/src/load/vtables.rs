//! Phase 4: vtable hash-table validation and per-function delegation.
//!
//! Every class vtable embeds an open-addressed hash table for interface
//! dispatch: a u16 bucket-offset array starting right after the built-in
//! method slots (`mult_base`), with bucket offsets indexing an IfaceEntry
//! array measured in entry units from that same base. The header checks
//! gate all array access; the bucket scan bounds every entry before the
//! entry walk dereferences any of them.

use crate::error::{check, Fault, LoadError};
use crate::host::LoaderHost;
use crate::image::{ClassVTable, Image};
use crate::section::{
    IfaceEntry, SectionRef, SectionType, VTableHeader, IFACE_ENTRY_BYTES, OBJECT_TYPE_TAG,
    USER_CLASS_FIRST, VTABLE_HEADER_BYTES, VTABLE_MAGIC,
};

pub(super) fn validate_sections<H: LoaderHost>(
    img: &mut Image,
    host: &mut H,
) -> Result<(), Fault> {
    for i in 0..img.sections.len() {
        let sect = img.sections[i];
        match sect.ty() {
            Some(SectionType::VTable) => validate_vtable(img, sect, i as u32)?,
            Some(SectionType::Function) => {
                if let Err(fault) = host.validate_function(img, i, false) {
                    // re-run in debug mode for richer context; the
                    // original failure is what gets reported
                    let _ = host.validate_function(img, i, true);
                    return Err(Fault::at(
                        LoadError::InvalidFunction { code: fault.code },
                        fault.offset,
                    ));
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn validate_vtable(img: &mut Image, sect: SectionRef, section_idx: u32) -> Result<(), Fault> {
    let off = sect.offset;
    let view = img.view();
    let endp = sect.end() as u64;
    let mult_base = (sect.payload() + VTABLE_HEADER_BYTES) as u64;

    // basic size check, before reading any header field
    check(mult_base < endp, LoadError::VTableTooSmall, off)?;
    let vt = VTableHeader::read(view, sect.payload())
        .ok_or(Fault::at(LoadError::VTableTooSmall, off))?;

    let shift = vt.iface_hash_mult & 0xff;
    let max_mult = 0xffff_ffffu32.checked_shr(shift).unwrap_or(0);

    check(vt.numbytes < 1024, LoadError::ObjectTooBig, off)?;
    check(vt.numbytes % 8 == 0, LoadError::ObjectSizeUnaligned, off)?;
    check(vt.object_type == OBJECT_TYPE_TAG, LoadError::BadObjectType, off)?;
    check(vt.magic == VTABLE_MAGIC, LoadError::BadVTableMagic, off)?;
    check(
        vt.iface_hash_entries as u64 > max_mult as u64 + 3,
        LoadError::IfaceHashTooFew,
        off,
    )?;
    check(
        mult_base + vt.iface_hash_entries as u64 * 2 < endp,
        LoadError::IfaceHashOverflow,
        off,
    )?;
    check(vt.reserved == 0, LoadError::VTableReserved, off)?;
    check(vt.iface_hash_mult != 0, LoadError::ZeroHashMult, off)?;
    check(
        vt.iface_hash_entries % 4 == 0,
        LoadError::IfaceHashCountUnaligned,
        off,
    )?;
    check(vt.class_first >= USER_CLASS_FIRST, LoadError::ClassIdTooLow, off)?;
    check(vt.class_last >= vt.class_first, LoadError::ClassRangeInverted, off)?;

    let entry_at = |i: u64| mult_base + i * IFACE_ENTRY_BYTES as u64;

    let mut min_off: u64 = u64::MAX;
    let mut max_off: u64 = 0;
    for i in 0..vt.iface_hash_entries as u64 {
        let bucket = view
            .u16((mult_base + 2 * i) as usize)
            .ok_or(Fault::at(LoadError::IfaceHashOverflow, off))?
            as u64;
        min_off = min_off.min(bucket);
        max_off = max_off.max(bucket);
        check(
            entry_at(bucket + 1) <= endp,
            LoadError::IfaceEntryOutOfSection,
            off,
        )?;
    }

    // The smallest bucket offset must land exactly at the end of the
    // bucket array: the structural density guarantee of the compiler's
    // hash layout.
    check(
        min_off * IFACE_ENTRY_BYTES as u64 == vt.iface_hash_entries as u64 * 2,
        LoadError::IfaceHashDensity,
        off,
    )?;

    // The compiler can leave one live entry just past the densest bucket;
    // include it when it fully fits and is non-empty. A non-empty tail
    // that does not fit falls through to the padding check below.
    if entry_at(max_off + 2) <= endp {
        if let Some(next) = IfaceEntry::read(view, entry_at(max_off + 1) as u32) {
            if next.member_id != 0 {
                max_off += 1;
            }
        }
    }

    for i in min_off..=max_off {
        let ent = IfaceEntry::read(view, entry_at(i) as u32)
            .ok_or(Fault::at(LoadError::IfaceEntryOutOfSection, off))?;
        if ent.member_id == 0 {
            continue;
        }
        if ent.aux == 0 {
            check(
                (ent.method as usize) < img.sections.len(),
                LoadError::IfaceMethodIndex,
                off,
            )?;
            check(
                img.sections[ent.method as usize].is(SectionType::Function),
                LoadError::IfaceMethodNotFunction,
                off,
            )?;
        } else {
            check(ent.aux < vt.numbytes >> 3, LoadError::IfaceFieldOffset, off)?;
            check(ent.aux as u32 == ent.method, LoadError::IfaceAuxMismatch, off)?;
        }
    }

    // Everything after the last real entry must be zero padding.
    for p in entry_at(max_off + 1)..endp {
        check(view.u8(p as usize) == Some(0), LoadError::VTablePadding, off)?;
    }

    img.class_vtables.push(ClassVTable {
        section: section_idx,
        object_bytes: vt.numbytes,
        class_first: vt.class_first,
        class_last: vt.class_last,
        methods: None,
    });
    Ok(())
}
