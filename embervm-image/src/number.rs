//! Tagged 64-bit number literal encoding.
//!
//! Each slot of the NumberLiterals pool holds one of:
//!
//! - `0` — padding, reserved slot.
//! - an odd value — the unsigned integer `v >> 1`, which must fit in
//!   32 bits.
//! - an encoded double — the IEEE-754 bits biased by `1 << 48`. Valid
//!   integer encodings always have the top 16 bits clear, so any value
//!   with a nonzero top half is a double candidate; the bias guarantees
//!   every finite double (and positive NaN, rejected separately) lands in
//!   that space.
//!
//! Everything else is malformed.

/// Bias added to raw IEEE-754 bits by the compiler when emitting a double.
pub const DOUBLE_BIAS: u64 = 1 << 48;

/// A decoded number literal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NumLit {
    /// Padding slot.
    Null,
    Int(u32),
    Double(f64),
}

#[inline]
pub fn is_encoded_double(v: u64) -> bool {
    (v >> 48) != 0
}

#[inline]
pub fn decode_double(v: u64) -> f64 {
    f64::from_bits(v.wrapping_sub(DOUBLE_BIAS))
}

/// Encode an unsigned integer literal.
#[inline]
pub fn encode_int(v: u32) -> u64 {
    ((v as u64) << 1) | 1
}

/// Encode a double literal; NaN has no valid encoding.
pub fn encode_double(d: f64) -> Option<u64> {
    if d.is_nan() {
        return None;
    }
    Some(d.to_bits().wrapping_add(DOUBLE_BIAS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_encoding() {
        assert_eq!(encode_int(0), 1);
        assert_eq!(encode_int(42) >> 1, 42);
        assert!(!is_encoded_double(encode_int(u32::MAX)));
        assert_eq!(encode_int(u32::MAX) & 1, 1);
    }

    #[test]
    fn double_encoding() {
        for d in [0.0, -0.0, 1.0, -1.5, 5e-324, f64::MAX, f64::NEG_INFINITY] {
            let enc = encode_double(d).unwrap();
            assert!(is_encoded_double(enc), "{d} encoded to {enc:#x}");
            assert_eq!(decode_double(enc).to_bits(), d.to_bits());
        }
        assert_eq!(encode_double(f64::NAN), None);
    }

    #[test]
    fn spaces_are_disjoint() {
        // Small even values are neither ints nor doubles.
        assert!(!is_encoded_double(2));
        assert_ne!(2 & 1, 1);
        // A raw NaN pattern still decodes (and is then rejected as NaN).
        let nan_enc = f64::NAN.to_bits().wrapping_add(DOUBLE_BIAS);
        assert!(is_encoded_double(nan_enc));
        assert!(decode_double(nan_enc).is_nan());
    }
}
