//! The five-phase load pipeline.
//!
//! `load` runs scan, section loading, interface-name validation,
//! vtable/function validation and linking strictly in order; each phase
//! may assume every invariant the previous phases established, and the
//! first failure short-circuits the rest.

mod iface_names;
mod link;
mod scan;
mod sections;
mod vtables;

use log::{info, warn};

use crate::error::{check, Fault, LoadError, LoadFailure};
use crate::host::LoaderHost;
use crate::image::Image;

/// Load, validate and link one image.
///
/// The buffer is consumed; on failure the partial image travels back
/// inside the [`LoadFailure`] and can be inspected or dropped at any
/// point, including after a first-phase failure.
pub fn load<H: LoaderHost>(data: Vec<u8>, host: &mut H) -> Result<Image, LoadFailure> {
    info!("loading image ({} bytes)", data.len());
    let mut img = Image::new(data);
    match run(&mut img, host) {
        Ok(()) => {
            info!("image loaded: {} sections", img.sections.len());
            Ok(img)
        }
        Err(fault) => {
            warn!(
                "image rejected: code {} at offset {:#x}",
                fault.error.code(),
                fault.offset
            );
            Err(LoadFailure {
                error: fault.error,
                offset: fault.offset,
                image: img,
            })
        }
    }
}

fn run<H: LoaderHost>(img: &mut Image, host: &mut H) -> Result<(), Fault> {
    // Structural precondition, before any section parsing.
    check(img.data.len() % 8 == 0, LoadError::UnalignedLength, 0)?;

    scan::count_sections(img)?;
    sections::load_sections(img, host)?;
    iface_names::load_iface_names(img, host)?;
    vtables::validate_sections(img, host)?;
    link::inject_vtables(img, host)
}
