//! The legacy key/value list framing used by `ClientInit`, `ClientInitAck`,
//! `ClientLogin`, `ClientLoginAck`, `ClientLoginReject`, and `SessionInit`.
//!
//! These five messages predate the general SYNC/RPC dispatch and are
//! encoded as a flat `QVariantList` alternating UTF-8 byte-array keys and
//! `QVariant` values, rather than as a `QVariantMap` — the reference client
//! reads and writes them as pairs, never as a map, so this module keeps that
//! shape instead of forcing it through `Variant::Map`.

use quassel_proto::variant::{decode_variant_list, encode_variant};
use quassel_proto::{Registry, Variant};

use crate::error::SessionError;

/// One legacy message: an ordered list of `(key, value)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyMap(pub Vec<(String, Variant)>);

impl LegacyMap {
    /// Look up a key's value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Variant> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Build a new legacy message from `(key, value)` pairs.
    #[must_use]
    pub fn new(entries: Vec<(String, Variant)>) -> Self {
        Self(entries)
    }
}

/// Decode a frame payload as a legacy key/value list.
///
/// # Errors
/// Returns [`SessionError::Protocol`] if the flattened list has an odd
/// number of elements (an unpaired key), or if any key element is not a
/// byte array containing valid UTF-8, or if the codec itself fails.
pub fn decode_legacy_map(payload: &[u8], reg: &Registry) -> Result<LegacyMap, SessionError> {
    let mut cur = quassel_proto::Cursor::new(payload);
    let flat = decode_variant_list(&mut cur, reg)?;

    if flat.len() % 2 != 0 {
        return Err(SessionError::Protocol(format!(
            "legacy key/value list has odd length {}",
            flat.len()
        )));
    }

    let mut out = Vec::with_capacity(flat.len() / 2);
    let mut iter = flat.into_iter();
    while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
        let key = match key {
            Variant::ByteArray(Some(bytes)) => std::str::from_utf8(&bytes)
                .map_err(|_| SessionError::Protocol("legacy key was not valid UTF-8".to_string()))?
                .to_string(),
            other => {
                return Err(SessionError::Protocol(format!(
                    "legacy key must be a byte array, got {other:?}"
                )));
            },
        };
        out.push((key, value));
    }

    Ok(LegacyMap(out))
}

/// Encode a legacy key/value list as a frame payload (without the
/// length-prefix framing, which [`quassel_proto::Framer`] applies
/// separately).
///
/// # Errors
/// Propagates any [`quassel_proto::CodecError`] from encoding a value
/// (in practice infallible, since every [`Variant`] shape has a built-in
/// wire representation).
pub fn encode_legacy_map(map: &LegacyMap) -> Result<bytes::Bytes, SessionError> {
    let mut buf = bytes::BytesMut::new();
    quassel_proto::primitive::encode_u32(&mut buf, map.0.len() as u32 * 2);
    for (key, value) in &map.0 {
        let mut key_bytes = key.as_bytes().to_vec();
        // The wire's legacy key is a raw QByteArray, not NUL-terminated
        // like a user-type name.
        key_bytes.shrink_to_fit();
        encode_variant(&mut buf, &Variant::ByteArray(Some(bytes::Bytes::from(key_bytes))))?;
        encode_variant(&mut buf, value)?;
    }
    Ok(buf.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use quassel_proto::registry::standard;

    #[test]
    fn round_trips_a_legacy_message() {
        let reg = standard();
        let map = LegacyMap::new(vec![
            ("MsgType".to_string(), Variant::String(Some("ClientInit".to_string()))),
            ("ClientVersion".to_string(), Variant::String(Some("0.1.0".to_string()))),
        ]);

        let encoded = encode_legacy_map(&map).unwrap();
        let decoded = decode_legacy_map(&encoded, &reg).unwrap();
        assert_eq!(decoded, map);
    }

    #[test]
    fn odd_length_list_is_a_protocol_error() {
        let reg = standard();
        let mut buf = bytes::BytesMut::new();
        quassel_proto::primitive::encode_u32(&mut buf, 1);
        encode_variant(&mut buf, &Variant::Bool(true)).unwrap();

        match decode_legacy_map(&buf, &reg) {
            Err(SessionError::Protocol(_)) => {},
            other => panic!("expected Protocol error, got {other:?}"),
        }
    }

    #[test]
    fn get_finds_value_by_key() {
        let map = LegacyMap::new(vec![("A".to_string(), Variant::Int(1))]);
        assert_eq!(map.get("A"), Some(&Variant::Int(1)));
        assert_eq!(map.get("B"), None);
    }
}
