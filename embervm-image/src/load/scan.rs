//! Phase 1: section tiling walk.
//!
//! Reads only the size field of each section header, never payload. On
//! success the parallel per-section tables are allocated at their exact
//! final capacity, so no later phase resizes anything mid-parse.

use crate::error::{check, Fault, LoadError};
use crate::image::{Image, PointerLit};

pub(super) fn count_sections(img: &mut Image) -> Result<(), Fault> {
    let view = img.view();
    let len = view.len() as u64;
    let mut off: u64 = 0;
    let mut count: usize = 0;

    while off < len {
        // off and len are both multiples of 8, so the 8-byte header of a
        // section starting at off is always in range.
        let size = view
            .u32(off as usize)
            .ok_or(Fault::at(LoadError::BadSectionSize, off as u32))?;
        check(size > 0, LoadError::BadSectionSize, off as u32)?;
        check(size % 8 == 0, LoadError::BadSectionSize, off as u32)?;
        count += 1;
        off += size as u64;
    }
    check(
        off == len,
        LoadError::SectionTiling,
        u32::try_from(off).unwrap_or(u32::MAX),
    )?;

    img.pointer_literals = vec![PointerLit::Null; count];
    img.sections = Vec::with_capacity(count);
    Ok(())
}
