//! The encoded polyline format used by routing APIs.
//!
//! Each coordinate is stored as the delta from the previous one, scaled by
//! `10^precision`, zig-zag folded so the sign lives in the lowest bit, and
//! written as little-endian 5-bit groups. Every group is offset by 63 so the
//! output stays in printable ASCII; bit `0x20` marks a continuation.

use thiserror::Error;

use crate::coordinate::Coordinate;

pub const DEFAULT_PRECISION: u32 = 5;

const CHAR_OFFSET: u8 = 63;
const CONTINUATION_BIT: i64 = 0x20;
const CHUNK_MASK: i64 = 0x1f;
// keeps every decoded delta within 60 bits
const MAX_SHIFT: u32 = 55;

#[derive(Error, Debug, PartialEq)]
pub enum PolylineError {
    #[error("invalid character {character:?} at byte {index}")]
    InvalidCharacter { character: char, index: usize },

    #[error("unexpected end of input inside a value")]
    Truncated,

    #[error("value starting at byte {index} overflows")]
    Overflow { index: usize },

    #[error("unsupported precision {0}")]
    UnsupportedPrecision(u32),

    #[error("coordinate out of range: {latitude}, {longitude}")]
    OutOfRange { latitude: f64, longitude: f64 },
}

fn factor(precision: u32) -> Result<f64, PolylineError> {
    if precision > 10 {
        return Err(PolylineError::UnsupportedPrecision(precision));
    }
    Ok(10_f64.powi(precision as i32))
}

struct Reader<'a> {
    bytes: &'a [u8],
    index: usize,
}

impl Reader<'_> {
    fn is_empty(&self) -> bool {
        self.index >= self.bytes.len()
    }

    fn next_value(&mut self) -> Result<i64, PolylineError> {
        let start = self.index;
        let mut result: i64 = 0;
        let mut shift: u32 = 0;
        loop {
            let byte = *self.bytes.get(self.index).ok_or(PolylineError::Truncated)?;
            if !(CHAR_OFFSET..=CHAR_OFFSET + 63).contains(&byte) {
                return Err(PolylineError::InvalidCharacter {
                    character: byte as char,
                    index: self.index,
                });
            }
            self.index += 1;
            if shift > MAX_SHIFT {
                return Err(PolylineError::Overflow { index: start });
            }
            let chunk = (byte - CHAR_OFFSET) as i64;
            result |= (chunk & CHUNK_MASK) << shift;
            shift += 5;
            if chunk & CONTINUATION_BIT == 0 {
                break;
            }
        }
        Ok(if result & 1 != 0 {
            !(result >> 1)
        } else {
            result >> 1
        })
    }
}

/// Decodes `encoded` into coordinates, `precision` being the number of
/// decimal digits the encoder kept (5 for most routing services).
pub fn decode(encoded: &str, precision: u32) -> Result<Vec<Coordinate>, PolylineError> {
    let factor = factor(precision)?;
    let mut reader = Reader {
        bytes: encoded.as_bytes(),
        index: 0,
    };
    let mut points = Vec::new();
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    while !reader.is_empty() {
        let index = reader.index;
        lat = lat
            .checked_add(reader.next_value()?)
            .ok_or(PolylineError::Overflow { index })?;
        let index = reader.index;
        lng = lng
            .checked_add(reader.next_value()?)
            .ok_or(PolylineError::Overflow { index })?;
        points.push(Coordinate::new(lat as f64 / factor, lng as f64 / factor));
    }
    Ok(points)
}

fn write_value(value: i64, out: &mut String) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };
    while v >= CONTINUATION_BIT {
        out.push(((CONTINUATION_BIT | (v & CHUNK_MASK)) as u8 + CHAR_OFFSET) as char);
        v >>= 5;
    }
    out.push((v as u8 + CHAR_OFFSET) as char);
}

pub fn encode(points: &[Coordinate], precision: u32) -> Result<String, PolylineError> {
    let factor = factor(precision)?;
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;
    for point in points {
        if !(-90.0..=90.0).contains(&point.latitude)
            || !(-180.0..=180.0).contains(&point.longitude)
        {
            return Err(PolylineError::OutOfRange {
                latitude: point.latitude,
                longitude: point.longitude,
            });
        }
        let lat = (point.latitude * factor).round() as i64;
        let lng = (point.longitude * factor).round() as i64;
        write_value(lat - prev_lat, &mut out);
        write_value(lng - prev_lng, &mut out);
        prev_lat = lat;
        prev_lng = lng;
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_values() {
        let mut out = String::new();
        write_value(-17998321, &mut out);
        assert_eq!(out, "`~oia@");

        let mut reader = Reader {
            bytes: b"`~oia@",
            index: 0,
        };
        assert_eq!(reader.next_value().unwrap(), -17998321);
        assert!(reader.is_empty());
    }

    #[test]
    fn zero_is_question_mark() {
        assert_eq!(
            encode(&[Coordinate::new(0.0, 0.0)], DEFAULT_PRECISION).unwrap(),
            "??"
        );
    }
}
