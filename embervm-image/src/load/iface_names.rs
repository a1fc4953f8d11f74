//! Phase 3: interface member name table validation.
//!
//! The table is a length-prefixed array of section indices, each naming a
//! boxed-string Literal section. The resolved handles must be strictly
//! ascending both by identity (arena allocation order) and by string
//! content; the two orders are checked independently with distinct codes
//! so a compiler emitting duplicate or unsorted interned strings is
//! caught either way.

use crate::error::{check, Fault, LoadError};
use crate::host::LoaderHost;
use crate::image::{Image, PointerLit};
use crate::section::{SectionType, LIT_BOXED_STRING};
use std::cmp::Ordering;

pub(super) fn load_iface_names<H: LoaderHost>(img: &mut Image, host: &mut H) -> Result<(), Fault> {
    for i in 0..img.sections.len() {
        let sect = img.sections[i];
        if !sect.is(SectionType::IfaceMemberNames) {
            continue;
        }
        let off = sect.offset;
        let payload = sect.payload() as usize;

        // Section size >= 16 guarantees the length word is readable.
        let len = img
            .view()
            .u64(payload)
            .ok_or(Fault::at(LoadError::IfaceNamesTooShort, off))?;
        let need = len
            .checked_mul(8)
            .and_then(|n| n.checked_add(16))
            .ok_or(Fault::at(LoadError::IfaceNamesTooShort, off))?;
        check(sect.size as u64 >= need, LoadError::IfaceNamesTooShort, off)?;

        let mut names = Vec::with_capacity(len as usize);
        for j in 0..len as usize {
            let target = img
                .view()
                .u64(payload + 8 + 8 * j)
                .ok_or(Fault::at(LoadError::IfaceNamesTooShort, off))?;
            check(
                target < img.sections.len() as u64,
                LoadError::IfaceNameIndexRange,
                off,
            )?;
            let target = target as usize;
            let ss = img.sections[target];
            check(
                ss.is(SectionType::Literal) && ss.aux == LIT_BOXED_STRING,
                LoadError::IfaceNameNotString,
                off,
            )?;
            let PointerLit::Boxed(s) = img.pointer_literals[target] else {
                // load phase invariant: every surviving string literal
                // section carries a boxed value
                unreachable!("string literal section without boxed value");
            };
            if let Some(&prev) = names.last() {
                // handles have to be sorted
                check(prev < s, LoadError::IfaceNameIdentityOrder, off)?;
                // and so the strings themselves
                check(
                    host.compare_strings(prev, s) == Ordering::Less,
                    LoadError::IfaceNameContentOrder,
                    off,
                )?;
            }
            names.push(s);
        }
        img.iface_member_names = names;
    }
    Ok(())
}
