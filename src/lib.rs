//! PostgreSQL composite column type codecs.
//!
//! Bidirectional conversion between Rust values and the textual/binary wire
//! representations PostgreSQL uses for composite column types:
//!
//! - [`array`] - brace-delimited array literals (`int[]`, `bigint[]`, `varchar[]`)
//! - [`geo`] - PostGIS geometries (WKT on the way out, hex-EWKB on the way in)
//! - [`range`] - `tsrange` interval literals
//! - [`json`] - raw JSON payloads (`varchar`, `json`, `jsonb`)
//!
//! Every codec is a pure function over its input: no I/O, no shared state,
//! no retries. The database access layer hands a codec one [`WireValue`] per
//! column per row and gets back either a typed value or a [`TypeError`].
//!
//! # Example
//!
//! ```
//! use pq_sqltypes::{FromPg, ToPg, WireValue};
//! use pq_sqltypes::array::Int32Array;
//!
//! let wire = Int32Array::from(vec![1, 0, -3]).to_pg()?;
//! assert_eq!(wire, WireValue::Bytes(b"{1,0,-3}".to_vec()));
//!
//! let back = Int32Array::from_pg(&wire)?;
//! assert_eq!(*back, [1, 0, -3]);
//! # Ok::<(), pq_sqltypes::TypeError>(())
//! ```

pub mod array;
pub mod convert;
pub mod geo;
pub mod json;
pub mod range;

pub use array::{Int32Array, Int64Array, StringArray};
pub use geo::{Box2D, Point, Polygon};
pub use json::JsonText;
pub use range::{TimeBound, TsRange};

/// A wire value as handed over by (or to) the database access layer.
///
/// PostgreSQL delivers column data either as raw bytes or as text depending
/// on the column's declared wire encoding; `Null` is the SQL NULL sentinel.
/// Codecs pattern-match on the variant instead of inspecting runtime types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// SQL NULL.
    Null,
    /// Raw byte payload.
    Bytes(Vec<u8>),
    /// Text payload.
    Text(String),
}

impl WireValue {
    /// Variant name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            WireValue::Null => "NULL",
            WireValue::Bytes(_) => "bytes",
            WireValue::Text(_) => "text",
        }
    }

    /// Payload bytes for either non-null representation.
    pub fn payload(&self) -> Option<&[u8]> {
        match self {
            WireValue::Null => None,
            WireValue::Bytes(b) => Some(b),
            WireValue::Text(s) => Some(s.as_bytes()),
        }
    }
}

impl From<Vec<u8>> for WireValue {
    fn from(b: Vec<u8>) -> Self {
        WireValue::Bytes(b)
    }
}

impl From<&[u8]> for WireValue {
    fn from(b: &[u8]) -> Self {
        WireValue::Bytes(b.to_vec())
    }
}

impl From<String> for WireValue {
    fn from(s: String) -> Self {
        WireValue::Text(s)
    }
}

impl From<&str> for WireValue {
    fn from(s: &str) -> Self {
        WireValue::Text(s.to_string())
    }
}

/// Error type for wire conversion failures.
///
/// All variants are deterministic functions of the input: retrying with the
/// same bytes cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// Malformed wire payload: wrong delimiters, bad escape sequence, header
    /// mismatch, truncated binary layout, unparsable number or timestamp.
    /// The message carries the offending bytes.
    #[error("invalid data: {0}")]
    InvalidData(String),
    /// The wire value's representation is not usable for this type.
    #[error("expected {expected} value, got {got}")]
    UnexpectedType {
        expected: &'static str,
        got: &'static str,
    },
    /// NULL where a non-null value is required. Decode into `Option<T>` to
    /// accept NULL columns.
    #[error("unexpected NULL value")]
    UnexpectedNull,
}

/// Trait for decoding a PostgreSQL wire value into a Rust type.
pub trait FromPg: Sized {
    /// Decode from the wire representation.
    fn from_pg(value: &WireValue) -> Result<Self, TypeError>;
}

/// Trait for encoding a Rust type into a PostgreSQL wire value.
pub trait ToPg {
    /// Encode to the wire representation.
    fn to_pg(&self) -> Result<WireValue, TypeError>;
}

// NULL handling lives at the Option level: a bare T refuses NULL, Option<T>
// maps it to None / renders None as the NULL sentinel.

impl<T: FromPg> FromPg for Option<T> {
    fn from_pg(value: &WireValue) -> Result<Self, TypeError> {
        match value {
            WireValue::Null => Ok(None),
            v => T::from_pg(v).map(Some),
        }
    }
}

impl<T: ToPg> ToPg for Option<T> {
    fn to_pg(&self) -> Result<WireValue, TypeError> {
        match self {
            None => Ok(WireValue::Null),
            Some(v) => v.to_pg(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Every codec type must implement both halves of the conversion pair.
    fn assert_codec<T: FromPg + ToPg>() {}

    #[test]
    fn codec_conformance() {
        assert_codec::<array::Int32Array>();
        assert_codec::<array::Int64Array>();
        assert_codec::<array::StringArray>();
        assert_codec::<geo::Point>();
        assert_codec::<geo::Box2D>();
        assert_codec::<geo::Polygon>();
        assert_codec::<range::TsRange>();
        assert_codec::<json::JsonText>();
        assert_codec::<Option<array::StringArray>>();
        assert_codec::<Option<json::JsonText>>();
    }

    #[test]
    fn wire_value_kind_and_payload() {
        assert_eq!(WireValue::Null.kind(), "NULL");
        assert_eq!(WireValue::Null.payload(), None);
        assert_eq!(WireValue::from("abc").kind(), "text");
        assert_eq!(WireValue::from("abc").payload(), Some(&b"abc"[..]));
        assert_eq!(WireValue::from(vec![1u8, 2]).kind(), "bytes");
        assert_eq!(WireValue::from(&b"xy"[..]).payload(), Some(&b"xy"[..]));
    }

    #[test]
    fn option_maps_null_both_ways() {
        let absent: Option<array::Int32Array> = None;
        assert_eq!(absent.to_pg().unwrap(), WireValue::Null);
        assert_eq!(
            Option::<array::Int32Array>::from_pg(&WireValue::Null).unwrap(),
            None
        );

        let present = Some(array::Int32Array::from(vec![7]));
        assert_eq!(present.to_pg().unwrap(), WireValue::Bytes(b"{7}".to_vec()));
    }

    #[test]
    fn bare_type_refuses_null() {
        assert_eq!(
            array::Int32Array::from_pg(&WireValue::Null),
            Err(TypeError::UnexpectedNull)
        );
    }

    #[test]
    fn error_display() {
        let e = TypeError::UnexpectedType {
            expected: "bytes",
            got: "text",
        };
        assert_eq!(e.to_string(), "expected bytes value, got text");
        assert_eq!(
            TypeError::UnexpectedNull.to_string(),
            "unexpected NULL value"
        );
    }
}
