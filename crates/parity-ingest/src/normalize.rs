//! Legacy cell normalization.
//!
//! Fixed-width character fields from legacy exports arrive right-padded with
//! spaces, and some readers hand them over as raw byte buffers or as sequences
//! of byte codes instead of decoded text. [`normalize`] turns both shapes into
//! trimmed text and passes every other value through untouched.

/// A decoded, single-valued cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// A cell as delivered by a dataset reader.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// Undecoded bytes of a character field.
    Bytes(Vec<u8>),
    /// A character field delivered as a sequence of byte codes.
    ByteCodes(Vec<i64>),
    /// Any value that needs no decoding.
    Scalar(Scalar),
}

/// What [`normalize_with_outcome`] did to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeOutcome {
    /// Bytes were decoded into trimmed text.
    Decoded,
    /// The value needed no decoding.
    Passthrough,
    /// Byte codes were out of byte range; the value was kept unchanged.
    Fallback,
}

/// Normalize a single cell.
///
/// - `Bytes`: decoded as UTF-8 with undecodable bytes dropped, then trimmed.
/// - `ByteCodes`: decoded the same way when every code fits in a byte,
///   otherwise returned unchanged.
/// - `Scalar`: returned unchanged.
pub fn normalize(raw: RawValue) -> RawValue {
    normalize_with_outcome(raw).0
}

/// Normalize a single cell and report what happened to it.
pub fn normalize_with_outcome(raw: RawValue) -> (RawValue, NormalizeOutcome) {
    match decode(raw) {
        Decoded::Value(scalar, outcome) => (RawValue::Scalar(scalar), outcome),
        Decoded::OutOfRange(codes) => (RawValue::ByteCodes(codes), NormalizeOutcome::Fallback),
    }
}

/// Normalize a single cell into a scalar.
///
/// Out-of-range byte codes are kept as their literal text, e.g. `[65, 300]`.
pub fn normalize_scalar(raw: RawValue) -> (Scalar, NormalizeOutcome) {
    match decode(raw) {
        Decoded::Value(scalar, outcome) => (scalar, outcome),
        Decoded::OutOfRange(codes) => (
            Scalar::Text(format!("{codes:?}")),
            NormalizeOutcome::Fallback,
        ),
    }
}

enum Decoded {
    Value(Scalar, NormalizeOutcome),
    OutOfRange(Vec<i64>),
}

fn decode(raw: RawValue) -> Decoded {
    match raw {
        RawValue::Bytes(bytes) => {
            Decoded::Value(Scalar::Text(decode_trimmed(&bytes)), NormalizeOutcome::Decoded)
        }
        RawValue::ByteCodes(codes) => {
            match codes
                .iter()
                .map(|&code| u8::try_from(code))
                .collect::<Result<Vec<u8>, _>>()
            {
                Ok(bytes) => {
                    Decoded::Value(Scalar::Text(decode_trimmed(&bytes)), NormalizeOutcome::Decoded)
                }
                Err(_) => Decoded::OutOfRange(codes),
            }
        }
        RawValue::Scalar(scalar) => Decoded::Value(scalar, NormalizeOutcome::Passthrough),
    }
}

fn decode_trimmed(bytes: &[u8]) -> String {
    let decoded: String = bytes.utf8_chunks().map(|chunk| chunk.valid()).collect();
    decoded.trim().to_string()
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Scalar(Scalar::Text(value.to_string()))
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Scalar(Scalar::Text(value))
    }
}

impl From<i64> for RawValue {
    fn from(value: i64) -> Self {
        RawValue::Scalar(Scalar::Int(value))
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Scalar(Scalar::Float(value))
    }
}

impl From<bool> for RawValue {
    fn from(value: bool) -> Self {
        RawValue::Scalar(Scalar::Bool(value))
    }
}

impl<T: Into<RawValue>> From<Option<T>> for RawValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(RawValue::Scalar(Scalar::Null), Into::into)
    }
}
