//! Load diagnostics.
//!
//! Every failure mode has a stable numeric code (the space the producing
//! compiler's test suite asserts against) and is reported together with
//! the byte offset, relative to the image start, of the data that
//! triggered it. The first failure wins; the pipeline short-circuits.

use crate::image::Image;

/// One distinct way an image can be rejected.
///
/// Code 1000 (base-pointer misalignment) existed in older loaders that
/// reinterpreted the buffer in place; with an owned byte buffer it cannot
/// occur and the number is retired. Other gaps in the numbering are
/// likewise historical.
#[derive(thiserror::Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadError {
    #[error("image length not a multiple of 8")]
    UnalignedLength, // 1001
    #[error("section size zero or misaligned")]
    BadSectionSize, // 1002
    #[error("sections do not tile the image")]
    SectionTiling, // 1003

    #[error("more than one NumberLiterals section")]
    DuplicateNumberLiterals, // 1004
    #[error("number literal decodes to NaN")]
    NumberLiteralNan, // 1005
    #[error("integer literal exceeds 32 bits")]
    NumberLiteralRange, // 1006
    #[error("malformed number literal encoding")]
    NumberLiteralEncoding, // 1007

    #[error("InfoHeader section too small")]
    InfoHeaderTooSmall, // 1008
    #[error("bad image magic0")]
    BadMagic0, // 1009
    #[error("bad image magic1")]
    BadMagic1, // 1010
    #[error("alloc_globals below non_pointer_globals")]
    GlobalsInverted, // 1011
    #[error("alloc_globals out of range")]
    GlobalsTooMany, // 1012
    #[error("InfoHeader is not the first section")]
    InfoHeaderNotFirst, // 1013

    #[error("section too large")]
    SectionTooLarge, // 1014

    #[error("more than one OpCodeMap section")]
    DuplicateOpCodeMap, // 1015
    #[error("too few opcode slots")]
    TooFewOpcodes, // 1016
    #[error("OpCodeMap not NUL-terminated")]
    OpCodeMapUnterminated, // 1017
    #[error("opcode name not in the native registry")]
    UnknownOpcode, // 1018

    #[error("missing InfoHeader section")]
    MissingInfoHeader, // 1019
    #[error("missing OpCodeMap section")]
    MissingOpCodeMap, // 1020
    #[error("missing NumberLiterals section")]
    MissingNumberLiterals, // 1021
    #[error("missing ConfigData section")]
    MissingConfigData, // 1022

    #[error("vtable smaller than its fixed header")]
    VTableTooSmall, // 1023
    #[error("object size too large")]
    ObjectTooBig, // 1024
    #[error("object size not a multiple of 8")]
    ObjectSizeUnaligned, // 1025
    #[error("bad vtable object type")]
    BadObjectType, // 1026
    #[error("bad vtable magic")]
    BadVTableMagic, // 1027
    #[error("too few interface hash buckets for the hash multiplier")]
    IfaceHashTooFew, // 1028
    #[error("interface hash bucket array exceeds the section")]
    IfaceHashOverflow, // 1029
    #[error("vtable reserved field not zero")]
    VTableReserved, // 1030
    #[error("interface hash multiplier is zero")]
    ZeroHashMult, // 1031
    #[error("interface hash bucket count not a multiple of 4")]
    IfaceHashCountUnaligned, // 1032
    #[error("interface entry exceeds the section")]
    IfaceEntryOutOfSection, // 1033
    #[error("interface hash density mismatch")]
    IfaceHashDensity, // 1034
    #[error("interface field offset out of object bounds")]
    IfaceFieldOffset, // 1035
    #[error("interface field entry aux/method mismatch")]
    IfaceAuxMismatch, // 1036
    #[error("interface method index out of range")]
    IfaceMethodIndex, // 1037
    #[error("interface method target is not a function")]
    IfaceMethodNotFunction, // 1039
    #[error("nonzero padding after interface entries")]
    VTablePadding, // 1040

    #[error("literal payload exceeds its section")]
    LiteralTooShort, // 1042
    #[error("literal kind changed between passes")]
    LinkLiteralKind, // 1043
    #[error("ConfigData missing zero-key terminator")]
    ConfigTerminator, // 1045
    #[error("IfaceMemberNames section too small for its length")]
    IfaceNamesTooShort, // 1047
    #[error("section too small")]
    SectionTooSmall, // 1048
    #[error("unknown literal kind")]
    UnknownLiteralKind, // 1050
    #[error("interface name index out of range")]
    IfaceNameIndexRange, // 1051
    #[error("interface name is not a boxed string literal")]
    IfaceNameNotString, // 1052
    #[error("interface names not sorted by identity")]
    IfaceNameIdentityOrder, // 1053
    #[error("interface names not sorted by content")]
    IfaceNameContentOrder, // 1054
    #[error("class id below the user range")]
    ClassIdTooLow, // 1055
    #[error("class id range inverted")]
    ClassRangeInverted, // 1056

    /// Delegated per-function bytecode validation failed; the code comes
    /// from the external validator's own space.
    #[error("function bytecode invalid (code {code})")]
    InvalidFunction { code: u16 },
}

impl LoadError {
    /// Stable numeric diagnostic code.
    pub fn code(&self) -> u16 {
        use LoadError::*;
        match *self {
            UnalignedLength => 1001,
            BadSectionSize => 1002,
            SectionTiling => 1003,
            DuplicateNumberLiterals => 1004,
            NumberLiteralNan => 1005,
            NumberLiteralRange => 1006,
            NumberLiteralEncoding => 1007,
            InfoHeaderTooSmall => 1008,
            BadMagic0 => 1009,
            BadMagic1 => 1010,
            GlobalsInverted => 1011,
            GlobalsTooMany => 1012,
            InfoHeaderNotFirst => 1013,
            SectionTooLarge => 1014,
            DuplicateOpCodeMap => 1015,
            TooFewOpcodes => 1016,
            OpCodeMapUnterminated => 1017,
            UnknownOpcode => 1018,
            MissingInfoHeader => 1019,
            MissingOpCodeMap => 1020,
            MissingNumberLiterals => 1021,
            MissingConfigData => 1022,
            VTableTooSmall => 1023,
            ObjectTooBig => 1024,
            ObjectSizeUnaligned => 1025,
            BadObjectType => 1026,
            BadVTableMagic => 1027,
            IfaceHashTooFew => 1028,
            IfaceHashOverflow => 1029,
            VTableReserved => 1030,
            ZeroHashMult => 1031,
            IfaceHashCountUnaligned => 1032,
            IfaceEntryOutOfSection => 1033,
            IfaceHashDensity => 1034,
            IfaceFieldOffset => 1035,
            IfaceAuxMismatch => 1036,
            IfaceMethodIndex => 1037,
            IfaceMethodNotFunction => 1039,
            VTablePadding => 1040,
            LiteralTooShort => 1042,
            LinkLiteralKind => 1043,
            ConfigTerminator => 1045,
            IfaceNamesTooShort => 1047,
            SectionTooSmall => 1048,
            UnknownLiteralKind => 1050,
            IfaceNameIndexRange => 1051,
            IfaceNameNotString => 1052,
            IfaceNameIdentityOrder => 1053,
            IfaceNameContentOrder => 1054,
            ClassIdTooLow => 1055,
            ClassRangeInverted => 1056,
            InvalidFunction { code } => code,
        }
    }
}

/// Failure reported by the external per-function bytecode validator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FunctionFault {
    /// Code in the validator's own diagnostic space.
    pub code: u16,
    /// Byte offset relative to the image start.
    pub offset: u32,
}

/// A rejected load: the diagnostic plus the partial image, which remains
/// inspectable and is torn down like any other image when dropped.
#[derive(thiserror::Error, Debug)]
#[error("image load failed: {error} (code {}, offset {offset:#x})", .error.code())]
pub struct LoadFailure {
    pub error: LoadError,
    pub offset: u32,
    pub image: Image,
}

/// Internal phase-level failure; `load` folds it into a [`LoadFailure`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Fault {
    pub error: LoadError,
    pub offset: u32,
}

impl Fault {
    pub fn at(error: LoadError, offset: u32) -> Fault {
        Fault { error, offset }
    }
}

/// The loader's CHECK: fail with `error` at `offset` unless `cond` holds.
#[inline]
pub(crate) fn check(cond: bool, error: LoadError, offset: u32) -> Result<(), Fault> {
    if cond {
        Ok(())
    } else {
        Err(Fault::at(error, offset))
    }
}
