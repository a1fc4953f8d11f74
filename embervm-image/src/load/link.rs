//! Phase 5: linking.
//!
//! The only pass allowed to assume every prior invariant holds, and the
//! only one that produces execution-facing state: callable entry points
//! for Function sections and the fixed built-in method slots for class
//! vtables. No validation happens here beyond the literal-kind re-assert.

use crate::error::{check, Fault, LoadError};
use crate::host::LoaderHost;
use crate::image::{FunctionLink, Image};
use crate::section::{SectionType, FUNCTION_CODE_OFFSET, LIT_BOXED_BUFFER, LIT_BOXED_STRING};

pub(super) fn inject_vtables<H: LoaderHost>(img: &mut Image, host: &mut H) -> Result<(), Fault> {
    let mut vti = 0;
    for i in 0..img.sections.len() {
        let sect = img.sections[i];
        match sect.ty() {
            Some(SectionType::Literal) => {
                check(
                    sect.aux == LIT_BOXED_STRING || sect.aux == LIT_BOXED_BUFFER,
                    LoadError::LinkLiteralKind,
                    sect.offset,
                )?;
            }
            Some(SectionType::Function) => {
                if img.entry_point.is_none() {
                    img.entry_point = Some(i as u32);
                }
                img.functions.push(FunctionLink {
                    section: i as u32,
                    vtable: host.callable_vtable(),
                    code_start: sect.offset + FUNCTION_CODE_OFFSET,
                });
            }
            Some(SectionType::VTable) => {
                // one ClassVTable per VTable section, pushed in section
                // order by the validation pass
                img.class_vtables[vti].methods = Some(host.record_methods());
                vti += 1;
            }
            _ => {}
        }
    }
    Ok(())
}
