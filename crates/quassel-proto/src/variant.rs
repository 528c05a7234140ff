//! `QVariant` and its container shapes: the self-describing tagged-value
//! layer built on top of [`crate::primitive`].

use bytes::BufMut;

use crate::error::{CodecError, Result};
use crate::primitive::{self, Cursor, Date, DateTime, Time};
use crate::registry::{Registry, UserEntry};

/// `QVariant::Bool`.
pub const TAG_QBOOL: u32 = 1;
/// `QVariant::Int` (signed 32-bit).
pub const TAG_QINT: u32 = 2;
/// `QVariant::UInt` (unsigned 32-bit).
pub const TAG_QUINT: u32 = 3;
/// `QVariant::Map`.
pub const TAG_QVARIANTMAP: u32 = 8;
/// `QVariant::List`.
pub const TAG_QVARIANTLIST: u32 = 9;
/// `QVariant::String`.
pub const TAG_QSTRING: u32 = 10;
/// `QVariant::StringList`.
pub const TAG_QSTRINGLIST: u32 = 11;
/// `QVariant::ByteArray`.
pub const TAG_QBYTEARRAY: u32 = 12;
/// `QVariant::Date`.
pub const TAG_QDATE: u32 = 14;
/// `QVariant::Time`.
pub const TAG_QTIME: u32 = 15;
/// `QVariant::DateTime`.
pub const TAG_QDATETIME: u32 = 16;
/// `QVariant::Int` narrowed to 16 bits (`short`).
pub const TAG_QSHORT: u32 = 130;
/// `QVariant::Int` narrowed to 8 bits (`char`/`signed char`).
pub const TAG_QSCHAR: u32 = 131;
/// `QVariant::UInt` narrowed to 16 bits (`unsigned short`).
pub const TAG_QUSHORT: u32 = 133;
/// `QVariant::UInt` narrowed to 8 bits (`unsigned char`).
pub const TAG_QUCHAR: u32 = 134;
/// `QVariant::UserType`: the tag value is a sentinel; the wire carries a
/// NUL-terminated type name immediately after it instead of a fixed shape.
pub const TAG_QUSERTYPE: u32 = 127;

/// Every built-in tag [`crate::registry::Registry::with_builtins`] seeds a
/// decoder for.
pub const BUILTIN_TAGS: &[u32] = &[
    TAG_QBOOL,
    TAG_QINT,
    TAG_QUINT,
    TAG_QVARIANTMAP,
    TAG_QVARIANTLIST,
    TAG_QSTRING,
    TAG_QSTRINGLIST,
    TAG_QBYTEARRAY,
    TAG_QDATE,
    TAG_QTIME,
    TAG_QDATETIME,
    TAG_QSHORT,
    TAG_QSCHAR,
    TAG_QUSHORT,
    TAG_QUCHAR,
];

/// A decoded `QVariant` payload.
///
/// Closed and exhaustive: user types never produce a distinct `User`
/// variant. Instead a user-type name either aliases onto one of these
/// shapes (the common case — `NetworkId` decodes as [`Variant::Int`]) or a
/// concrete decoder builds one of these shapes directly (`BufferInfo` and
/// `Message` both decode into [`Variant::Map`]). This keeps every function
/// over `Variant` total, with no "unknown user shape" case to propagate.
#[derive(Debug, Clone, PartialEq)]
pub enum Variant {
    /// `QVariant::Bool`.
    Bool(bool),
    /// `QVariant::Int`.
    Int(i32),
    /// `QVariant::UInt`.
    UInt(u32),
    /// `QVariant::Int` narrowed to 16 bits.
    Short(i16),
    /// `QVariant::Int` narrowed to 8 bits.
    SChar(i8),
    /// `QVariant::UInt` narrowed to 16 bits.
    UShort(u16),
    /// `QVariant::UInt` narrowed to 8 bits.
    UChar(u8),
    /// `QVariant::String`, `None` if the wire string was null.
    String(Option<String>),
    /// `QVariant::ByteArray`, `None` if the wire byte array was null.
    ByteArray(Option<bytes::Bytes>),
    /// `QVariant::StringList`.
    StringList(Vec<Option<String>>),
    /// `QVariant::Date`.
    Date(Option<Date>),
    /// `QVariant::Time`.
    Time(Option<Time>),
    /// `QVariant::DateTime`.
    DateTime(DateTime),
    /// `QVariant::List`.
    List(Vec<Variant>),
    /// `QVariant::Map`. Quassel maps always have string keys on the wire.
    Map(Vec<(String, Variant)>),
}

/// Decode a built-in tag's payload, dispatched from [`decode_builtin`] via
/// the registry's `by_tag` table.
pub fn decode_builtin(tag: u32, cur: &mut Cursor, reg: &Registry) -> Result<Variant> {
    match tag {
        TAG_QBOOL => Ok(Variant::Bool(primitive::decode_bool(cur)?)),
        TAG_QINT => Ok(Variant::Int(primitive::decode_i32(cur)?)),
        TAG_QUINT => Ok(Variant::UInt(primitive::decode_u32(cur)?)),
        TAG_QSHORT => Ok(Variant::Short(primitive::decode_i16(cur)?)),
        TAG_QSCHAR => Ok(Variant::SChar(primitive::decode_i8(cur)?)),
        TAG_QUSHORT => Ok(Variant::UShort(primitive::decode_u16(cur)?)),
        TAG_QUCHAR => Ok(Variant::UChar(primitive::decode_u8(cur)?)),
        TAG_QSTRING => Ok(Variant::String(primitive::decode_string(cur)?)),
        TAG_QBYTEARRAY => Ok(Variant::ByteArray(primitive::decode_byte_array(cur)?)),
        TAG_QSTRINGLIST => decode_string_list(cur).map(Variant::StringList),
        TAG_QDATE => Ok(Variant::Date(primitive::decode_date(cur)?)),
        TAG_QTIME => Ok(Variant::Time(primitive::decode_time(cur)?)),
        TAG_QDATETIME => Ok(Variant::DateTime(primitive::decode_date_time(cur)?)),
        TAG_QVARIANTLIST => decode_variant_list(cur, reg).map(Variant::List),
        TAG_QVARIANTMAP => decode_variant_map(cur, reg).map(Variant::Map),
        other => Err(CodecError::UnknownType { what: format!("#{other}"), offset: cur.offset() }),
    }
}

fn decode_string_list(cur: &mut Cursor) -> Result<Vec<Option<String>>> {
    let count = primitive::decode_u32(cur)?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(primitive::decode_string(cur)?);
    }
    Ok(out)
}

fn encode_string_list(dst: &mut impl BufMut, items: &[Option<String>]) {
    primitive::encode_u32(dst, items.len() as u32);
    for item in items {
        primitive::encode_string(dst, item.as_deref());
    }
}

/// Decode a `QVariantList`: a count followed by that many full `QVariant`
/// envelopes (each with its own tag).
pub fn decode_variant_list(cur: &mut Cursor, reg: &Registry) -> Result<Vec<Variant>> {
    let count = primitive::decode_u32(cur)?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        out.push(decode_variant(cur, reg)?);
    }
    Ok(out)
}

fn encode_variant_list(dst: &mut impl BufMut, items: &[Variant]) -> Result<()> {
    primitive::encode_u32(dst, items.len() as u32);
    for item in items {
        encode_variant(dst, item)?;
    }
    Ok(())
}

/// Decode a `QVariantMap`: a count followed by that many `(QString key,
/// QVariant value)` pairs.
pub fn decode_variant_map(cur: &mut Cursor, reg: &Registry) -> Result<Vec<(String, Variant)>> {
    let count = primitive::decode_u32(cur)?;
    let mut out = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let key = primitive::decode_string(cur)?
            .ok_or_else(|| CodecError::Malformed("QVariantMap key was null".to_string()))?;
        let value = decode_variant(cur, reg)?;
        out.push((key, value));
    }
    Ok(out)
}

fn encode_variant_map(dst: &mut impl BufMut, entries: &[(String, Variant)]) -> Result<()> {
    primitive::encode_u32(dst, entries.len() as u32);
    for (key, value) in entries {
        primitive::encode_string(dst, Some(key));
        encode_variant(dst, value)?;
    }
    Ok(())
}

/// Decode one full `QVariant` envelope: a tag, then a one-byte null flag
/// (ignored on read — presence is carried by the payload's own
/// optionality), then the payload.
///
/// If the tag is [`TAG_QUSERTYPE`], the payload starts with a NUL-terminated
/// type name, and the name is resolved through the registry: an
/// [`UserEntry::Alias`] re-dispatches to the aliased built-in tag's decoder,
/// an [`UserEntry::Decoder`] runs directly, and an unregistered name is a
/// [`CodecError::UnknownType`].
pub fn decode_variant(cur: &mut Cursor, reg: &Registry) -> Result<Variant> {
    let tag = primitive::decode_u32(cur)?;
    let _is_null = primitive::decode_bool(cur)?;
    if tag == TAG_QUSERTYPE {
        let name = decode_nul_terminated_name(cur)?;
        return match reg.entry_for_user(&name) {
            Some(UserEntry::Alias(aliased_tag)) => {
                let decoder = reg.decoder_for_tag(aliased_tag).ok_or_else(|| {
                    CodecError::UnknownType { what: format!("#{aliased_tag}"), offset: cur.offset() }
                })?;
                decoder(cur, reg)
            },
            Some(UserEntry::Decoder(decoder)) => decoder(cur, reg),
            None => Err(CodecError::UnknownType { what: name, offset: cur.offset() }),
        };
    }

    let decoder = reg
        .decoder_for_tag(tag)
        .ok_or_else(|| CodecError::UnknownType { what: format!("#{tag}"), offset: cur.offset() })?;
    decoder(cur, reg)
}

fn decode_nul_terminated_name(cur: &mut Cursor) -> Result<String> {
    // The user-type name rides as a length-prefixed byte array with an
    // extra trailing NUL included in the length, matching Qt's
    // `QDataStream << QByteArray` framing of the latin1 type name.
    let raw = primitive::decode_byte_array(cur)?
        .ok_or_else(|| CodecError::Malformed("user type name was null".to_string()))?;
    let trimmed = raw.strip_suffix(&[0u8]).unwrap_or(&raw);
    std::str::from_utf8(trimmed).map(ToString::to_string).map_err(|_| CodecError::InvalidUtf8)
}

pub(crate) fn encode_nul_terminated_name(dst: &mut impl BufMut, name: &str) {
    let mut raw = name.as_bytes().to_vec();
    raw.push(0);
    primitive::encode_byte_array(dst, Some(&raw));
}

/// Encode one full `QVariant` envelope (tag, null flag, payload). User types
/// are never encoded as `TAG_QUSERTYPE`: the session layer only ever sends
/// values built from this closed enum, each of which has a direct built-in
/// tag.
///
/// # Errors
/// Never returns an error in practice since every [`Variant`] shape maps to
/// a built-in tag; kept fallible to mirror the decode side and leave room
/// for a future variant that genuinely has none.
pub fn encode_variant(dst: &mut impl BufMut, value: &Variant) -> Result<()> {
    match value {
        Variant::Bool(v) => {
            primitive::encode_u32(dst, TAG_QBOOL);
            primitive::encode_bool(dst, false);
            primitive::encode_bool(dst, *v);
        },
        Variant::Int(v) => {
            primitive::encode_u32(dst, TAG_QINT);
            primitive::encode_bool(dst, false);
            primitive::encode_i32(dst, *v);
        },
        Variant::UInt(v) => {
            primitive::encode_u32(dst, TAG_QUINT);
            primitive::encode_bool(dst, false);
            primitive::encode_u32(dst, *v);
        },
        Variant::Short(v) => {
            primitive::encode_u32(dst, TAG_QSHORT);
            primitive::encode_bool(dst, false);
            primitive::encode_i16(dst, *v);
        },
        Variant::SChar(v) => {
            primitive::encode_u32(dst, TAG_QSCHAR);
            primitive::encode_bool(dst, false);
            primitive::encode_i8(dst, *v);
        },
        Variant::UShort(v) => {
            primitive::encode_u32(dst, TAG_QUSHORT);
            primitive::encode_bool(dst, false);
            primitive::encode_u16(dst, *v);
        },
        Variant::UChar(v) => {
            primitive::encode_u32(dst, TAG_QUCHAR);
            primitive::encode_bool(dst, false);
            primitive::encode_u8(dst, *v);
        },
        Variant::String(v) => {
            primitive::encode_u32(dst, TAG_QSTRING);
            primitive::encode_bool(dst, v.is_none());
            primitive::encode_string(dst, v.as_deref());
        },
        Variant::ByteArray(v) => {
            primitive::encode_u32(dst, TAG_QBYTEARRAY);
            primitive::encode_bool(dst, v.is_none());
            primitive::encode_byte_array(dst, v.as_deref());
        },
        Variant::StringList(items) => {
            primitive::encode_u32(dst, TAG_QSTRINGLIST);
            primitive::encode_bool(dst, false);
            encode_string_list(dst, items);
        },
        Variant::Date(v) => {
            primitive::encode_u32(dst, TAG_QDATE);
            primitive::encode_bool(dst, v.is_none());
            primitive::encode_date(dst, *v);
        },
        Variant::Time(v) => {
            primitive::encode_u32(dst, TAG_QTIME);
            primitive::encode_bool(dst, v.is_none());
            primitive::encode_time(dst, *v);
        },
        Variant::DateTime(v) => {
            primitive::encode_u32(dst, TAG_QDATETIME);
            primitive::encode_bool(dst, false);
            primitive::encode_date_time(dst, v);
        },
        Variant::List(items) => {
            primitive::encode_u32(dst, TAG_QVARIANTLIST);
            primitive::encode_bool(dst, false);
            encode_variant_list(dst, items)?;
        },
        Variant::Map(entries) => {
            primitive::encode_u32(dst, TAG_QVARIANTMAP);
            primitive::encode_bool(dst, false);
            encode_variant_map(dst, entries)?;
        },
    }
    Ok(())
}
