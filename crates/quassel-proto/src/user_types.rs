//! Decoders for the Quassel-specific user types the reference client
//! registers before connecting: plain integer/map aliases plus the two
//! structured types (`BufferInfo`, `Message`) that need a concrete decoder.

use crate::error::{CodecError, Result};
use crate::primitive::{self, Cursor};
use crate::registry::Registry;
use crate::variant::{self, Variant, TAG_QINT, TAG_QVARIANTMAP};

/// Populate `reg` with every user type the reference client registers:
/// the plain id aliases (`NetworkId`, `IdentityId`, `BufferId`, `UserId`,
/// `AccountId`, `MsgId` onto `qint32`), the variant-map aliases
/// (`Identity`, `NetworkInfo`, `Network::Server`), and the two concrete
/// decoders (`BufferInfo`, `Message`).
pub fn register_standard_types(reg: &mut Registry) {
    // `TAG_QINT`/`TAG_QVARIANTMAP` are always present on a registry built
    // from `Registry::with_builtins`, so these aliases can never fail; any
    // error here would mean the caller handed in a stripped-down registry,
    // in which case silently skipping the alias is the right degradation.
    for name in ["NetworkId", "IdentityId", "BufferId", "UserId", "AccountId", "MsgId"] {
        let _ = reg.register_user_alias(name, TAG_QINT);
    }

    for name in ["Identity", "NetworkInfo", "Network::Server"] {
        let _ = reg.register_user_alias(name, TAG_QVARIANTMAP);
    }

    reg.register_user_decoder("BufferInfo", decode_buffer_info);
    reg.register_user_decoder("Message", decode_message);
}

/// Decode a `BufferInfo`: buffer id, owning network id, buffer type flags,
/// group id, and buffer name, laid out as a [`Variant::Map`] with string
/// keys so callers don't need a dedicated struct to read fields out of it.
fn decode_buffer_info(cur: &mut Cursor, _reg: &Registry) -> Result<Variant> {
    let id = primitive::decode_i32(cur)?;
    let network_id = primitive::decode_i32(cur)?;
    let buffer_type = primitive::decode_i16(cur)?;
    let group_id = primitive::decode_u32(cur)?;
    let name = primitive::decode_byte_array(cur)?
        .ok_or_else(|| CodecError::Malformed("BufferInfo name was null".to_string()))?;
    let name = std::str::from_utf8(&name).map_err(|_| CodecError::InvalidUtf8)?.to_string();

    Ok(Variant::Map(vec![
        ("id".to_string(), Variant::Int(id)),
        ("networkId".to_string(), Variant::Int(network_id)),
        ("type".to_string(), Variant::Int(i32::from(buffer_type))),
        ("groupId".to_string(), Variant::UInt(group_id)),
        ("name".to_string(), Variant::String(Some(name))),
    ]))
}

/// Decode a `Message`: id, unix timestamp, type/flags, the buffer it
/// belongs to, sender mask, and raw content, laid out as a
/// [`Variant::Map`].
fn decode_message(cur: &mut Cursor, reg: &Registry) -> Result<Variant> {
    let id = primitive::decode_i32(cur)?;
    let timestamp = primitive::decode_u32(cur)?;
    let message_type = primitive::decode_u32(cur)?;
    let flags = primitive::decode_u8(cur)?;
    let buffer_info = decode_buffer_info(cur, reg)?;
    let sender = primitive::decode_byte_array(cur)?
        .ok_or_else(|| CodecError::Malformed("Message sender was null".to_string()))?;
    let sender = std::str::from_utf8(&sender).map_err(|_| CodecError::InvalidUtf8)?.to_string();
    let content = primitive::decode_byte_array(cur)?
        .ok_or_else(|| CodecError::Malformed("Message content was null".to_string()))?;
    let content = std::str::from_utf8(&content).map_err(|_| CodecError::InvalidUtf8)?.to_string();

    Ok(Variant::Map(vec![
        ("id".to_string(), Variant::Int(id)),
        ("timestamp".to_string(), Variant::UInt(timestamp)),
        ("type".to_string(), Variant::UInt(message_type)),
        ("flags".to_string(), Variant::UInt(u32::from(flags))),
        ("bufferInfo".to_string(), buffer_info),
        ("sender".to_string(), Variant::String(Some(sender))),
        ("content".to_string(), Variant::String(Some(content))),
    ]))
}

// Re-exported so integration tests in `quassel-core` can build a realistic
// `Message`/`BufferInfo` wire fixture without duplicating the layout.
#[doc(hidden)]
pub fn encode_buffer_info_for_tests(
    dst: &mut impl bytes::BufMut,
    id: i32,
    network_id: i32,
    buffer_type: i16,
    group_id: u32,
    name: &str,
) {
    primitive::encode_i32(dst, id);
    primitive::encode_i32(dst, network_id);
    primitive::encode_i16(dst, buffer_type);
    primitive::encode_u32(dst, group_id);
    primitive::encode_byte_array(dst, Some(name.as_bytes()));
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::registry::standard;

    #[test]
    fn standard_registry_resolves_id_aliases() {
        let reg = standard();
        assert!(matches!(reg.entry_for_user("NetworkId"), Some(_)));
        assert!(matches!(reg.entry_for_user("BufferId"), Some(_)));
    }

    #[test]
    fn buffer_info_round_trip_via_user_type_envelope() {
        let reg = standard();
        let mut buf = BytesMut::new();
        primitive::encode_u32(&mut buf, variant::TAG_QUSERTYPE);
        primitive::encode_bool(&mut buf, false);
        variant::encode_nul_terminated_name(&mut buf, "BufferInfo");
        encode_buffer_info_for_tests(&mut buf, 1, 2, 0x02, 0, "#rust");

        let mut cur = Cursor::new(&buf);
        let decoded = crate::variant::decode_variant(&mut cur, &reg).unwrap();
        match decoded {
            Variant::Map(entries) => {
                let name = entries.iter().find(|(k, _)| k == "name").unwrap();
                assert_eq!(name.1, Variant::String(Some("#rust".to_string())));
            },
            other => panic!("expected Map, got {other:?}"),
        }
    }
}
