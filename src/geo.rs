//! PostGIS geometry codecs.
//!
//! Values encode to WKT (`SRID=4326;POINT(...)`, `BOX(...)`,
//! `SRID=4326;POLYGON((...))`) and decode from the hex-encoded little-endian
//! EWKB the server returns for geometry columns. Only 2-D, SRID 4326,
//! single-ring shapes are supported; anything else is a format error.

use bytes::Buf;

use crate::{FromPg, ToPg, TypeError, WireValue};

/// WGS-84 geographic coordinates; the only SRID accepted on decode.
pub const SRID_WGS84: u32 = 4326;

/// EWKB type tag for a point with embedded SRID.
const EWKB_POINT_S: u32 = 0x2000_0001;
/// EWKB type tag for a polygon with embedded SRID.
const EWKB_POLYGON_S: u32 = 0x2000_0003;
/// EWKB byte-order marker for little-endian.
const EWKB_LITTLE_ENDIAN: u8 = 1;

/// A 2-D point, compatible with the PostGIS `POINT` type.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub lon: f64,
    pub lat: f64,
}

impl Point {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }
}

/// An axis-aligned rectangle, compatible with the PostGIS `box2d` type.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Box2D {
    pub min: Point,
    pub max: Point,
}

/// A single closed ring of points, compatible with the PostGIS `POLYGON` type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Polygon {
    pub points: Vec<Point>,
}

/// Hex-decode an EWKB payload; geometry columns arrive as raw bytes.
fn ewkb_payload(what: &'static str, value: &WireValue) -> Result<Vec<u8>, TypeError> {
    let b = match value {
        WireValue::Null => return Err(TypeError::UnexpectedNull),
        WireValue::Bytes(b) => b,
        WireValue::Text(_) => {
            return Err(TypeError::UnexpectedType {
                expected: "bytes",
                got: "text",
            });
        }
    };
    hex::decode(b).map_err(|e| {
        TypeError::InvalidData(format!(
            "{what}: invalid hex {:?}: {e}",
            String::from_utf8_lossy(b)
        ))
    })
}

impl ToPg for Point {
    fn to_pg(&self) -> Result<WireValue, TypeError> {
        Ok(WireValue::Bytes(
            format!("SRID=4326;POINT({:.7} {:.7})", self.lon, self.lat).into_bytes(),
        ))
    }
}

impl FromPg for Point {
    fn from_pg(value: &WireValue) -> Result<Self, TypeError> {
        let raw = ewkb_payload("Point", value)?;
        let mut buf = raw.as_slice();
        // order marker + type tag + SRID + two f64 coordinates
        if buf.remaining() < 1 + 4 + 4 + 16 {
            return Err(TypeError::InvalidData(format!(
                "Point: truncated ewkb ({} bytes)",
                raw.len()
            )));
        }
        let order = buf.get_u8();
        let tag = buf.get_u32_le();
        let srid = buf.get_u32_le();
        if order != EWKB_LITTLE_ENDIAN || tag != EWKB_POINT_S || srid != SRID_WGS84 {
            return Err(TypeError::InvalidData(format!(
                "Point: unexpected ewkb header (order {order}, type {tag:#010x}, srid {srid})"
            )));
        }
        let lon = buf.get_f64_le();
        let lat = buf.get_f64_le();
        Ok(Point { lon, lat })
    }
}

impl ToPg for Box2D {
    fn to_pg(&self) -> Result<WireValue, TypeError> {
        Ok(WireValue::Bytes(
            format!(
                "BOX({:.7} {:.7},{:.7} {:.7})",
                self.min.lon, self.min.lat, self.max.lon, self.max.lat
            )
            .into_bytes(),
        ))
    }
}

impl FromPg for Box2D {
    fn from_pg(value: &WireValue) -> Result<Self, TypeError> {
        let b = match value {
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
            "Box2D: unexpected data {:?}",
            String::from_utf8_lossy(b)
        ));
        let s = std::str::from_utf8(b).map_err(|_| err())?;
        let inner = s
            .strip_prefix("BOX(")
            .and_then(|r| r.strip_suffix(')'))
            .ok_or_else(err)?;
        let (min_s, max_s) = inner.split_once(',').ok_or_else(err)?;
        Ok(Box2D {
            min: parse_coord_pair(min_s).ok_or_else(err)?,
            max: parse_coord_pair(max_s).ok_or_else(err)?,
        })
    }
}

/// Parse `<lon> <lat>` into a point; `None` on any shape mismatch.
fn parse_coord_pair(s: &str) -> Option<Point> {
    let mut fields = s.split_whitespace();
    let lon = fields.next()?.parse::<f64>().ok()?;
    let lat = fields.next()?.parse::<f64>().ok()?;
    if fields.next().is_some() {
        return None;
    }
    Some(Point { lon, lat })
}

impl Polygon {
    /// Canonical closed 5-point rectangle spanning `min` to `max`.
    pub fn envelope(min: Point, max: Point) -> Polygon {
        Polygon {
            points: vec![
                min,
                Point::new(min.lon, max.lat),
                max,
                Point::new(max.lon, min.lat),
                min,
            ],
        }
    }

    /// True iff the ring has the exact shape produced by [`Polygon::envelope`].
    fn is_envelope(&self) -> bool {
        let p = &self.points;
        p.len() == 5
            && p[0] == p[4]
            && p[0].lon == p[1].lon
            && p[0].lat == p[3].lat
            && p[1].lat == p[2].lat
            && p[2].lon == p[3].lon
    }

    /// Min corner of a rectangular envelope polygon.
    ///
    /// # Panics
    ///
    /// Panics if the polygon is not an envelope. That is a programmer error:
    /// these accessors are only meaningful on values produced by
    /// [`Polygon::envelope`] or decoded from such values.
    pub fn min(&self) -> Point {
        assert!(self.is_envelope(), "not an envelope polygon: {self:?}");
        self.points[0]
    }

    /// Max corner of a rectangular envelope polygon.
    ///
    /// # Panics
    ///
    /// Panics if the polygon is not an envelope, see [`Polygon::min`].
    pub fn max(&self) -> Point {
        assert!(self.is_envelope(), "not an envelope polygon: {self:?}");
        self.points[2]
    }
}

impl ToPg for Polygon {
    fn to_pg(&self) -> Result<WireValue, TypeError> {
        let parts: Vec<String> = self
            .points
            .iter()
            .map(|pt| format!("{:.7} {:.7}", pt.lon, pt.lat))
            .collect();
        Ok(WireValue::Bytes(
            format!("SRID=4326;POLYGON(({}))", parts.join(",")).into_bytes(),
        ))
    }
}

impl FromPg for Polygon {
    fn from_pg(value: &WireValue) -> Result<Self, TypeError> {
        let raw = ewkb_payload("Polygon", value)?;
        let mut buf = raw.as_slice();
        // order marker + type tag + SRID + ring count + point count
        if buf.remaining() < 1 + 4 + 4 + 4 + 4 {
            return Err(TypeError::InvalidData(format!(
                "Polygon: truncated ewkb ({} bytes)",
                raw.len()
            )));
        }
        let order = buf.get_u8();
        let tag = buf.get_u32_le();
        let srid = buf.get_u32_le();
        let rings = buf.get_u32_le();
        if order != EWKB_LITTLE_ENDIAN || tag != EWKB_POLYGON_S || srid != SRID_WGS84 || rings != 1
        {
            return Err(TypeError::InvalidData(format!(
                "Polygon: unexpected ewkb header (order {order}, type {tag:#010x}, \
                 srid {srid}, rings {rings})"
            )));
        }
        let count = buf.get_u32_le() as usize;
        if (buf.remaining() as u64) < count as u64 * 16 {
            return Err(TypeError::InvalidData(format!(
                "Polygon: truncated ring, {count} points declared but {} bytes left",
                buf.remaining()
            )));
        }
        let mut points = Vec::with_capacity(count);
        for _ in 0..count {
            let lon = buf.get_f64_le();
            let lat = buf.get_f64_le();
            points.push(Point { lon, lat });
        }
        // trailing bytes beyond the declared count are not validated
        Ok(Polygon { points })
    }
}
