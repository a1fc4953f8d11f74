//! embervm-image
//!
//! Image loader, validator and linker for the embervm bytecode runtime.
//!
//! An image is a compiled bytecode module: back-to-back 8-byte-aligned
//! sections carrying module metadata, the opcode name map, literal pools,
//! configuration data, functions and class vtables. The bytes are
//! untrusted; before anything in an image runs, [`load`] parses them,
//! validates every embedded structure, and links the result against the
//! runtime tables supplied through a [`LoaderHost`].
//!
//! The interpreter, the GC, boxed-value construction and per-function
//! bytecode validation live outside this crate and are reached only
//! through the host trait and opaque handles.

mod error;
mod host;
mod image;
mod load;
pub mod number;
pub mod section;
mod view;

pub use error::{FunctionFault, LoadError, LoadFailure};
pub use host::{BuiltinMethods, GcRef, LoaderHost, NativePtr, OpcodeDesc};
pub use image::{ClassVTable, ConfigEntry, FunctionLink, Image, PointerLit};
pub use load::load;
pub use number::NumLit;
pub use section::{SectionRef, SectionType};
