//! Primitive codec: fixed-width integers, booleans, byte arrays, strings,
//! and Qt's Julian-day date / millisecond-of-day time encodings.
//!
//! Every decoder here is a pure function over a [`Cursor`]; every encoder is
//! a pure function over a [`bytes::BufMut`]. Nothing in this module touches
//! the network or the type registry.

use bytes::BufMut;

use crate::error::{CodecError, Result};

/// Sentinel length that marks a byte array or string as null on the wire.
pub const NULL_LENGTH: u32 = 0xFFFF_FFFF;

/// Sentinel time-of-day value that marks a `QTime` as null.
pub const NULL_TIME: u32 = 0xFFFF_FFFF;

/// A read cursor over a borrowed byte slice.
///
/// Mirrors the role of Python's `io.BytesIO` in the reference client: a
/// single forward-only read position shared by every decoder in a frame.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Wrap a byte slice for decoding, starting at offset 0.
    #[must_use]
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current read offset, for error reporting.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.pos
    }

    /// Bytes not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(CodecError::EndOfInput { needed: n, available: self.remaining() });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }
}

/// Decode an unsigned 8-bit integer.
pub fn decode_u8(cur: &mut Cursor) -> Result<u8> {
    Ok(cur.take(1)?[0])
}

/// Decode a signed 8-bit integer (two's complement).
pub fn decode_i8(cur: &mut Cursor) -> Result<i8> {
    Ok(cur.take(1)?[0] as i8)
}

/// Decode a big-endian unsigned 16-bit integer.
pub fn decode_u16(cur: &mut Cursor) -> Result<u16> {
    let b = cur.take(2)?;
    Ok(u16::from_be_bytes([b[0], b[1]]))
}

/// Decode a big-endian signed 16-bit integer.
pub fn decode_i16(cur: &mut Cursor) -> Result<i16> {
    decode_u16(cur).map(|v| v as i16)
}

/// Decode a big-endian unsigned 32-bit integer.
pub fn decode_u32(cur: &mut Cursor) -> Result<u32> {
    let b = cur.take(4)?;
    Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}

/// Decode a big-endian signed 32-bit integer.
pub fn decode_i32(cur: &mut Cursor) -> Result<i32> {
    decode_u32(cur).map(|v| v as i32)
}

/// Decode a boolean (one byte, `0` or `1`; any nonzero value reads as true).
pub fn decode_bool(cur: &mut Cursor) -> Result<bool> {
    Ok(decode_u8(cur)? != 0)
}

/// Decode a length-prefixed byte array. `None` if the length sentinel
/// [`NULL_LENGTH`] is read.
pub fn decode_byte_array(cur: &mut Cursor) -> Result<Option<bytes::Bytes>> {
    let len = decode_u32(cur)?;
    if len == NULL_LENGTH {
        return Ok(None);
    }
    let bytes = cur.take(len as usize)?;
    Ok(Some(bytes::Bytes::copy_from_slice(bytes)))
}

/// Decode a length-prefixed UTF-16BE string. `None` if the length sentinel
/// [`NULL_LENGTH`] is read.
pub fn decode_string(cur: &mut Cursor) -> Result<Option<String>> {
    let len = decode_u32(cur)?;
    if len == NULL_LENGTH {
        return Ok(None);
    }
    let raw = cur.take(len as usize)?;
    if raw.len() % 2 != 0 {
        return Err(CodecError::InvalidUtf16);
    }
    let units: Vec<u16> =
        raw.chunks_exact(2).map(|pair| u16::from_be_bytes([pair[0], pair[1]])).collect();
    String::from_utf16(&units).map(Some).map_err(|_| CodecError::InvalidUtf16)
}

/// Decode a `QDate`: an unsigned 32-bit Julian day number, `0` for null.
pub fn decode_date(cur: &mut Cursor) -> Result<Option<Date>> {
    let julian = decode_u32(cur)?;
    if julian == 0 {
        return Ok(None);
    }
    Ok(Some(Date::from_julian_day(i64::from(julian))))
}

/// Decode a `QTime`: milliseconds since midnight, [`NULL_TIME`] for null.
pub fn decode_time(cur: &mut Cursor) -> Result<Option<Time>> {
    let ms = decode_u32(cur)?;
    if ms == NULL_TIME {
        return Ok(None);
    }
    Ok(Some(Time::from_milliseconds(ms)))
}

/// Decode a `QDateTime`: a date, a time, then a one-byte UTC flag.
///
/// Per the corrected behavior for local-vs-UTC date-times (see
/// `SPEC_FULL.md` §9), the flag is read but the date/time fields are used
/// as-is regardless of its value: the wire format carries no offset to
/// convert by, so "UTC" is treated as the canonical interpretation.
pub fn decode_date_time(cur: &mut Cursor) -> Result<DateTime> {
    let date = decode_date(cur)?;
    let time = decode_time(cur)?;
    let utc_flag = decode_u8(cur)?;
    Ok(DateTime { date, time, utc: utc_flag != 0 })
}

/// Encode an unsigned 8-bit integer.
pub fn encode_u8(dst: &mut impl BufMut, v: u8) {
    dst.put_u8(v);
}

/// Encode a signed 8-bit integer.
pub fn encode_i8(dst: &mut impl BufMut, v: i8) {
    dst.put_u8(v as u8);
}

/// Encode a big-endian unsigned 16-bit integer.
pub fn encode_u16(dst: &mut impl BufMut, v: u16) {
    dst.put_slice(&v.to_be_bytes());
}

/// Encode a big-endian signed 16-bit integer.
pub fn encode_i16(dst: &mut impl BufMut, v: i16) {
    encode_u16(dst, v as u16);
}

/// Encode a big-endian unsigned 32-bit integer.
pub fn encode_u32(dst: &mut impl BufMut, v: u32) {
    dst.put_slice(&v.to_be_bytes());
}

/// Encode a big-endian signed 32-bit integer.
pub fn encode_i32(dst: &mut impl BufMut, v: i32) {
    encode_u32(dst, v as u32);
}

/// Encode a boolean as a single `0`/`1` byte.
pub fn encode_bool(dst: &mut impl BufMut, v: bool) {
    dst.put_u8(u8::from(v));
}

/// Encode an optional byte array; `None` becomes the [`NULL_LENGTH`]
/// sentinel with no trailing bytes.
pub fn encode_byte_array(dst: &mut impl BufMut, v: Option<&[u8]>) {
    match v {
        None => encode_u32(dst, NULL_LENGTH),
        Some(bytes) => {
            encode_u32(dst, bytes.len() as u32);
            dst.put_slice(bytes);
        },
    }
}

/// Encode an optional string as length-prefixed UTF-16BE; `None` becomes the
/// [`NULL_LENGTH`] sentinel with no trailing bytes.
pub fn encode_string(dst: &mut impl BufMut, v: Option<&str>) {
    match v {
        None => encode_u32(dst, NULL_LENGTH),
        Some(s) => {
            let units: Vec<u16> = s.encode_utf16().collect();
            encode_u32(dst, (units.len() * 2) as u32);
            for unit in units {
                dst.put_slice(&unit.to_be_bytes());
            }
        },
    }
}

/// Encode a `QDate`; `None` becomes the `0` null sentinel.
pub fn encode_date(dst: &mut impl BufMut, v: Option<Date>) {
    match v {
        None => encode_u32(dst, 0),
        Some(date) => encode_u32(dst, date.to_julian_day() as u32),
    }
}

/// Encode a `QTime`; `None` becomes the [`NULL_TIME`] sentinel.
pub fn encode_time(dst: &mut impl BufMut, v: Option<Time>) {
    match v {
        None => encode_u32(dst, NULL_TIME),
        Some(time) => encode_u32(dst, time.to_milliseconds()),
    }
}

/// Encode a `QDateTime`. The UTC flag is always written as `1`, matching the
/// reference client's unconditional UTC encoding.
pub fn encode_date_time(dst: &mut impl BufMut, v: &DateTime) {
    encode_date(dst, v.date);
    encode_time(dst, v.time);
    encode_u8(dst, 1);
}

/// Floor division, rounding toward negative infinity for negative operands.
///
/// Rust's Euclidean division (`div_euclid`) coincides with floor division
/// whenever the divisor is positive, which is always the case in the Julian
/// day formulas below; this helper exists to keep the call sites readable
/// and to document the hazard from `SPEC_FULL.md` §9.
#[must_use]
pub fn floor_div(a: i64, b: i64) -> i64 {
    debug_assert!(b > 0, "floor_div is only used with positive divisors here");
    a.div_euclid(b)
}

/// A Gregorian calendar date, decoded from (or destined for) a `QDate`
/// Julian day number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Date {
    /// Proleptic Gregorian year. Clamped to `>= 1` on decode (see
    /// [`Date::from_julian_day`]).
    pub year: i32,
    /// Month, 1-12.
    pub month: u32,
    /// Day of month, 1-31.
    pub day: u32,
}

impl Date {
    /// Julian day number for `1858-11-17`, used as a spot-check in tests.
    pub const MODIFIED_JULIAN_EPOCH: i64 = 2_400_000;

    /// Convert to a Julian day number using the Calendar FAQ formula with
    /// floor division throughout.
    #[must_use]
    pub fn to_julian_day(self) -> i64 {
        let (year, month, day) = (i64::from(self.year), i64::from(self.month), i64::from(self.day));
        let a = floor_div(14 - month, 12);
        let y = year + 4800 - a;
        let m = month + 12 * a - 3;
        day + floor_div(153 * m + 2, 5) + 365 * y + floor_div(y, 4) - floor_div(y, 100)
            + floor_div(y, 400)
            - 32045
    }

    /// Convert a Julian day number back to a calendar date, clamping to
    /// `0001-01-01` if the reconstructed year would be less than 1.
    #[must_use]
    pub fn from_julian_day(julian_day: i64) -> Self {
        let a = julian_day + 32044;
        let b = floor_div(4 * a + 3, 146_097);
        let c = a - floor_div(146_097 * b, 4);
        let d = floor_div(4 * c + 3, 1461);
        let e = c - floor_div(1461 * d, 4);
        let m = floor_div(5 * e + 2, 153);

        let day = e - floor_div(153 * m + 2, 5) + 1;
        let month = m + 3 - 12 * floor_div(m, 10);
        let year = 100 * b + d - 4800 + floor_div(m, 10);

        if year < 1 {
            return Self { year: 1, month: 1, day: 1 };
        }

        Self { year: year as i32, month: month as u32, day: day as u32 }
    }
}

/// A time of day with millisecond precision, decoded from (or destined for)
/// a `QTime` millisecond-of-day count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Time {
    /// Hour, 0-23.
    pub hour: u32,
    /// Minute, 0-59.
    pub minute: u32,
    /// Second, 0-59.
    pub second: u32,
    /// Millisecond, 0-999. Sub-millisecond precision is not representable.
    pub millisecond: u32,
}

impl Time {
    /// Pack into the millisecond-of-day wire encoding.
    #[must_use]
    pub fn to_milliseconds(self) -> u32 {
        ((self.hour * 60 + self.minute) * 60 + self.second) * 1000 + self.millisecond
    }

    /// Unpack from the millisecond-of-day wire encoding.
    #[must_use]
    pub fn from_milliseconds(total: u32) -> Self {
        let millisecond = total % 1000;
        let total_seconds = total / 1000;
        let second = total_seconds % 60;
        let total_minutes = total_seconds / 60;
        let minute = total_minutes % 60;
        let hour = total_minutes / 60;
        Self { hour, minute, second, millisecond }
    }
}

/// A `QDateTime`: an optional date, an optional time, and a UTC flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTime {
    /// Calendar date, `None` if the wire date was the null sentinel.
    pub date: Option<Date>,
    /// Time of day, `None` if the wire time was the null sentinel.
    pub time: Option<Time>,
    /// Whether the peer marked this date-time as UTC.
    pub utc: bool,
}
