//! Runtime hooks the loader depends on.
//!
//! The loader never owns boxed values, opcode handlers or built-in method
//! pointers; it only records opaque handles handed out by the host. This
//! keeps the crate independent from the interpreter and the GC while the
//! load result stays directly consumable by both.

use std::cmp::Ordering;

use crate::error::FunctionFault;
use crate::image::Image;

/// Handle to an object in the host's GC arena.
///
/// The arena hands handles out in ascending allocation order, so handle
/// order is identity order. The loader relies on this for the interface
/// name table's identity-sort check.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GcRef(pub u32);

/// Opaque native entry point: an interpreter dispatch index or a raw
/// address. The loader records these but never calls through them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NativePtr(pub usize);

/// One entry of the static opcode registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpcodeDesc {
    /// Name as emitted by the compiler in the OpCodeMap section.
    pub name: &'static str,
    pub handler: NativePtr,
}

/// The four fixed native methods patched into every class vtable.
/// Built once at process start and passed by reference into the loader.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BuiltinMethods {
    pub destroy: NativePtr,
    pub print: NativePtr,
    pub scan: NativePtr,
    pub gcsize: NativePtr,
}

pub trait LoaderHost {
    /// Arena-allocate a boxed string from raw UTF-8 bytes.
    fn make_string(&mut self, bytes: &[u8]) -> GcRef;

    /// Arena-allocate a boxed buffer.
    fn make_buffer(&mut self, bytes: &[u8]) -> GcRef;

    /// Lexicographic order of two boxed strings previously created by
    /// this host. Must match the interpreter's string comparison.
    fn compare_strings(&self, a: GcRef, b: GcRef) -> Ordering;

    /// Look up an opcode name in the static native registry.
    fn resolve_opcode(&self, name: &[u8]) -> Option<&'static OpcodeDesc>;

    /// Validate the bytecode of one Function section. `debug` requests a
    /// diagnostic re-run with richer context; it must not change the
    /// pass/fail outcome.
    fn validate_function(
        &mut self,
        image: &Image,
        section: usize,
        debug: bool,
    ) -> Result<(), FunctionFault>;

    /// The built-in vtable making Function sections callable.
    fn callable_vtable(&self) -> NativePtr;

    /// The fixed method pointers for class vtables.
    fn record_methods(&self) -> BuiltinMethods;
}
