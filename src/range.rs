//! `tsrange` interval literal codec.
//!
//! The wire grammar is `[`/`(` lower `,` upper `]`/`)`: bracket style per
//! bound inclusivity, timestamps as `YYYY-MM-DD HH:MM:SS` in UTC, an empty
//! side meaning unbounded. Encode truncates to whole seconds.
//!
//! Inclusivity is only meaningful when the corresponding instant is present.
//! An unbounded side never renders a bracket distinction: it is always
//! written and read back as exclusive. This is policy, not an accident -
//! changing it would break wire compatibility with the server, which
//! normalizes `[,` to `(,` itself.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::{FromPg, ToPg, TypeError, WireValue};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One side of a [`TsRange`]: an optional instant plus an inclusivity flag.
///
/// `time == None` means unbounded (infinity). Construct unbounded sides with
/// [`TimeBound::unbounded`]; the flag is normalized to exclusive there and
/// ignored by the encoder for any bound without an instant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimeBound {
    pub time: Option<DateTime<Utc>>,
    pub inclusive: bool,
}

impl TimeBound {
    /// Bound at `t`, included in the range.
    pub fn inclusive(t: DateTime<Utc>) -> Self {
        Self {
            time: Some(t),
            inclusive: true,
        }
    }

    /// Bound at `t`, excluded from the range.
    pub fn exclusive(t: DateTime<Utc>) -> Self {
        Self {
            time: Some(t),
            inclusive: false,
        }
    }

    /// Unbounded side; always exclusive.
    pub fn unbounded() -> Self {
        Self {
            time: None,
            inclusive: false,
        }
    }

    fn bracket(&self, open: bool) -> u8 {
        match (self.time.is_some() && self.inclusive, open) {
            (true, true) => b'[',
            (false, true) => b'(',
            (true, false) => b']',
            (false, false) => b')',
        }
    }
}

/// A `tsrange` column value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TsRange {
    pub lower: TimeBound,
    pub upper: TimeBound,
}

impl TsRange {
    pub fn new(lower: TimeBound, upper: TimeBound) -> Self {
        Self { lower, upper }
    }
}

impl ToPg for TsRange {
    fn to_pg(&self) -> Result<WireValue, TypeError> {
        let mut out = Vec::with_capacity(2 + 2 * (TIME_FORMAT.len() + 1));
        out.push(self.lower.bracket(true));
        if let Some(t) = self.lower.time {
            out.extend_from_slice(t.format(TIME_FORMAT).to_string().as_bytes());
        }
        out.push(b',');
        if let Some(t) = self.upper.time {
            out.extend_from_slice(t.format(TIME_FORMAT).to_string().as_bytes());
        }
        out.push(self.upper.bracket(false));
        Ok(WireValue::Bytes(out))
    }
}

impl FromPg for TsRange {
    fn from_pg(value: &WireValue) -> Result<Self, TypeError> {
        let v = match value {
            WireValue::Null => return Err(TypeError::UnexpectedNull),
            WireValue::Bytes(b) => b.as_slice(),
            WireValue::Text(_) => {
                return Err(TypeError::UnexpectedType {
                    expected: "bytes",
                    got: "text",
                });
            }
        };
        let err = || TypeError::InvalidData(format!(
            "TsRange: unexpected data {:?}",
            String::from_utf8_lossy(v)
        ));
        if v.len() < 3 {
            return Err(err());
        }
        let open = v[0];
        let close = v[v.len() - 1];
        if open != b'(' && open != b'[' {
            return Err(err());
        }
        if close != b')' && close != b']' {
            return Err(err());
        }
        let comma = v.iter().position(|&b| b == b',').ok_or_else(err)?;
        let lower_time = parse_bound(&v[1..comma])?;
        let upper_time = parse_bound(&v[comma + 1..v.len() - 1])?;
        Ok(TsRange {
            lower: TimeBound {
                time: lower_time,
                inclusive: lower_time.is_some() && open == b'[',
            },
            upper: TimeBound {
                time: upper_time,
                inclusive: upper_time.is_some() && close == b']',
            },
        })
    }
}

/// Parse one side of the literal; empty means unbounded. The server quotes
/// timestamps, our own encoder does not - both forms are accepted.
fn parse_bound(raw: &[u8]) -> Result<Option<DateTime<Utc>>, TypeError> {
    if raw.is_empty() {
        return Ok(None);
    }
    let raw = match (raw.first(), raw.last()) {
        (Some(b'"'), Some(b'"')) if raw.len() >= 2 => &raw[1..raw.len() - 1],
        _ => raw,
    };
    let s = std::str::from_utf8(raw).map_err(|e| {
        TypeError::InvalidData(format!("TsRange: invalid utf-8 in bound: {e}"))
    })?;
    let t = NaiveDateTime::parse_from_str(s, TIME_FORMAT).map_err(|e| {
        TypeError::InvalidData(format!("TsRange: cannot parse bound {s:?}: {e}"))
    })?;
    Ok(Some(t.and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn bytes(s: &str) -> WireValue {
        WireValue::Bytes(s.as_bytes().to_vec())
    }

    fn t1() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 4, 5, 6, 7).unwrap()
    }

    fn t2() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 3, 4, 7, 6, 7).unwrap()
    }

    #[test]
    fn encode_all_bound_combinations() {
        let cases = [
            (
                TsRange::new(TimeBound::inclusive(t1()), TimeBound::inclusive(t2())),
                "[2021-03-04 05:06:07,2021-03-04 07:06:07]",
            ),
            (
                TsRange::new(TimeBound::exclusive(t1()), TimeBound::exclusive(t2())),
                "(2021-03-04 05:06:07,2021-03-04 07:06:07)",
            ),
            (
                TsRange::new(TimeBound::exclusive(t1()), TimeBound::inclusive(t2())),
                "(2021-03-04 05:06:07,2021-03-04 07:06:07]",
            ),
            (
                TsRange::new(TimeBound::inclusive(t1()), TimeBound::exclusive(t2())),
                "[2021-03-04 05:06:07,2021-03-04 07:06:07)",
            ),
            (
                TsRange::new(TimeBound::unbounded(), TimeBound::inclusive(t2())),
                "(,2021-03-04 07:06:07]",
            ),
            (
                TsRange::new(TimeBound::inclusive(t1()), TimeBound::unbounded()),
                "[2021-03-04 05:06:07,)",
            ),
            (
                TsRange::new(TimeBound::unbounded(), TimeBound::exclusive(t2())),
                "(,2021-03-04 07:06:07)",
            ),
            (
                TsRange::new(TimeBound::exclusive(t1()), TimeBound::unbounded()),
                "(2021-03-04 05:06:07,)",
            ),
            (
                TsRange::new(TimeBound::unbounded(), TimeBound::unbounded()),
                "(,)",
            ),
        ];
        for (range, want) in cases {
            assert_eq!(range.to_pg().unwrap(), bytes(want), "encoding {range:?}");
            assert_eq!(TsRange::from_pg(&bytes(want)).unwrap(), range);
        }
    }

    #[test]
    fn unbounded_side_never_renders_inclusive() {
        // flag without an instant has no effect on the wire
        let r = TsRange {
            lower: TimeBound {
                time: None,
                inclusive: true,
            },
            upper: TimeBound {
                time: None,
                inclusive: true,
            },
        };
        assert_eq!(r.to_pg().unwrap(), bytes("(,)"));
        // ...and decodes back to the normalized form
        assert_eq!(
            TsRange::from_pg(&bytes("[,]")).unwrap(),
            TsRange::new(TimeBound::unbounded(), TimeBound::unbounded())
        );
    }

    #[test]
    fn decode_server_quoted_timestamps() {
        let r = TsRange::from_pg(&bytes(
            "[\"2021-03-04 05:06:07\",\"2021-03-04 07:06:07\")",
        ))
        .unwrap();
        assert_eq!(
            r,
            TsRange::new(TimeBound::inclusive(t1()), TimeBound::exclusive(t2()))
        );
    }

    #[test]
    fn encode_truncates_to_whole_seconds() {
        let t = Utc
            .with_ymd_and_hms(2021, 3, 4, 5, 6, 7)
            .unwrap()
            .checked_add_signed(chrono::Duration::milliseconds(789))
            .unwrap();
        let r = TsRange::new(TimeBound::inclusive(t), TimeBound::unbounded());
        assert_eq!(r.to_pg().unwrap(), bytes("[2021-03-04 05:06:07,)"));
    }

    #[test]
    fn decode_errors() {
        for bad in [
            "",
            "()",
            "{,}",
            "(,",
            ",)",
            "(2021-03-04 05:06:07)",
            "(bogus,)",
            "(\"2021-13-99 05:06:07\",)",
        ] {
            assert!(
                matches!(TsRange::from_pg(&bytes(bad)), Err(TypeError::InvalidData(_))),
                "expected InvalidData for {bad:?}"
            );
        }
        assert_eq!(
            TsRange::from_pg(&WireValue::Text("(,)".into())),
            Err(TypeError::UnexpectedType {
                expected: "bytes",
                got: "text"
            })
        );
        assert_eq!(
            TsRange::from_pg(&WireValue::Null),
            Err(TypeError::UnexpectedNull)
        );
    }
}
