//! Brace-delimited array literal codecs.
//!
//! PostgreSQL renders one-dimensional arrays as `{e1,e2,...}`. Integer
//! elements are plain decimal; text elements may be double-quoted, with `\`
//! escaping backslash and quote characters inside quotes. On encode we always
//! quote text elements - quoting alone disambiguates embedded commas and
//! braces, so those need no escaping.
//!
//! Absent (SQL NULL) arrays are handled at the `Option` level and are
//! distinct from present-but-empty `{}`.

use std::ops::{Deref, DerefMut};

use crate::{FromPg, ToPg, TypeError, WireValue};

/// An `int[]` column value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Int32Array(pub Vec<i32>);

/// A `bigint[]` column value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Int64Array(pub Vec<i64>);

/// A `varchar[]` / `text[]` column value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringArray(pub Vec<String>);

macro_rules! array_newtype {
    ($name:ident, $elem:ty) => {
        impl Deref for $name {
            type Target = Vec<$elem>;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }

        impl From<Vec<$elem>> for $name {
            fn from(v: Vec<$elem>) -> Self {
                Self(v)
            }
        }

        impl FromIterator<$elem> for $name {
            fn from_iter<I: IntoIterator<Item = $elem>>(iter: I) -> Self {
                Self(iter.into_iter().collect())
            }
        }
    };
}

array_newtype!(Int32Array, i32);
array_newtype!(Int64Array, i64);
array_newtype!(StringArray, String);

impl Int32Array {
    /// Multiset equality. May sort both operands in place; callers must not
    /// rely on element order afterwards.
    pub fn equal_without_order(&mut self, other: &mut Int32Array) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        self.0.sort_unstable();
        other.0.sort_unstable();
        self.0 == other.0
    }
}

impl Int64Array {
    /// Multiset equality. May sort both operands in place; callers must not
    /// rely on element order afterwards.
    pub fn equal_without_order(&mut self, other: &mut Int64Array) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        self.0.sort_unstable();
        other.0.sort_unstable();
        self.0 == other.0
    }
}

impl StringArray {
    /// Multiset equality. May sort both operands in place; callers must not
    /// rely on element order afterwards.
    pub fn equal_without_order(&mut self, other: &mut StringArray) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        self.0.sort_unstable();
        other.0.sort_unstable();
        self.0 == other.0
    }
}

/// Render integer elements as `{1,2,...}`.
fn encode_int_literal<I>(items: I) -> Vec<u8>
where
    I: IntoIterator<Item = i64>,
{
    let mut out = Vec::with_capacity(16);
    let mut buf = itoa::Buffer::new();
    out.push(b'{');
    for (i, v) in items.into_iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        out.extend_from_slice(buf.format(v).as_bytes());
    }
    out.push(b'}');
    out
}

/// Check the `{...}` envelope and return the interior as UTF-8 text.
fn array_interior<'a>(what: &'static str, b: &'a [u8]) -> Result<&'a str, TypeError> {
    if b.len() < 2 || b[0] != b'{' || b[b.len() - 1] != b'}' {
        return Err(TypeError::InvalidData(format!(
            "{what}: unexpected data {:?}",
            String::from_utf8_lossy(b)
        )));
    }
    std::str::from_utf8(&b[1..b.len() - 1])
        .map_err(|e| TypeError::InvalidData(format!("{what}: invalid utf-8: {e}")))
}

/// Integer array decode needs the raw byte representation.
fn require_bytes<'a>(value: &'a WireValue) -> Result<&'a [u8], TypeError> {
    match value {
        WireValue::Null => Err(TypeError::UnexpectedNull),
        WireValue::Bytes(b) => Ok(b),
        WireValue::Text(_) => Err(TypeError::UnexpectedType {
            expected: "bytes",
            got: "text",
        }),
    }
}

impl ToPg for Int32Array {
    fn to_pg(&self) -> Result<WireValue, TypeError> {
        Ok(WireValue::Bytes(encode_int_literal(
            self.0.iter().map(|v| i64::from(*v)),
        )))
    }
}

impl FromPg for Int32Array {
    fn from_pg(value: &WireValue) -> Result<Self, TypeError> {
        let interior = array_interior("Int32Array", require_bytes(value)?)?;
        let mut res = Vec::new();
        for s in interior.split(',') {
            if s.is_empty() {
                continue;
            }
            // The intarray module can surface literal NULL elements; treat
            // them as zero, like the reference behavior for int[].
            if s == "NULL" {
                res.push(0);
                continue;
            }
            let v = s.parse::<i32>().map_err(|e| {
                TypeError::InvalidData(format!("Int32Array: cannot parse element {s:?}: {e}"))
            })?;
            res.push(v);
        }
        Ok(Int32Array(res))
    }
}

impl ToPg for Int64Array {
    fn to_pg(&self) -> Result<WireValue, TypeError> {
        Ok(WireValue::Bytes(encode_int_literal(self.0.iter().copied())))
    }
}

impl FromPg for Int64Array {
    fn from_pg(value: &WireValue) -> Result<Self, TypeError> {
        let interior = array_interior("Int64Array", require_bytes(value)?)?;
        let mut res = Vec::new();
        for s in interior.split(',') {
            if s.is_empty() {
                continue;
            }
            let v = s.parse::<i64>().map_err(|e| {
                TypeError::InvalidData(format!("Int64Array: cannot parse element {s:?}: {e}"))
            })?;
            res.push(v);
        }
        Ok(Int64Array(res))
    }
}

impl ToPg for StringArray {
    fn to_pg(&self) -> Result<WireValue, TypeError> {
        let mut out = Vec::with_capacity(2 + self.0.iter().map(|e| e.len() + 3).sum::<usize>());
        out.push(b'{');
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                out.push(b',');
            }
            out.push(b'"');
            for byte in e.bytes() {
                if byte == b'\\' || byte == b'"' {
                    out.push(b'\\');
                }
                out.push(byte);
            }
            out.push(b'"');
        }
        out.push(b'}');
        Ok(WireValue::Bytes(out))
    }
}

impl FromPg for StringArray {
    fn from_pg(value: &WireValue) -> Result<Self, TypeError> {
        let interior = match value {
            WireValue::Null => return Err(TypeError::UnexpectedNull),
            WireValue::Bytes(b) => array_interior("StringArray", b)?,
            WireValue::Text(s) => array_interior("StringArray", s.as_bytes())?,
        };
        if interior.is_empty() {
            return Ok(StringArray(Vec::new()));
        }

        // Single left-to-right scan: `"` toggles the quote flag, `,` outside
        // quotes ends an element, `\` takes the next character verbatim.
        let mut elements = Vec::new();
        let mut current = String::new();
        let mut in_quotes = false;
        let mut chars = interior.chars();
        while let Some(c) = chars.next() {
            match c {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => elements.push(std::mem::take(&mut current)),
                '\\' => match chars.next() {
                    Some(escaped) => current.push(escaped),
                    None => {
                        return Err(TypeError::InvalidData(format!(
                            "StringArray: dangling escape in {interior:?}"
                        )));
                    }
                },
                _ => current.push(c),
            }
        }
        if in_quotes {
            return Err(TypeError::InvalidData(format!(
                "StringArray: unterminated quote in {interior:?}"
            )));
        }
        elements.push(current);
        Ok(StringArray(elements))
    }
}
