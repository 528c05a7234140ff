//! Runtime type registry: the dispatch table that lets [`crate::Variant`]
//! decoding stay a total function over arbitrary Qt type tags and user-type
//! names without a closed class hierarchy.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{RegistryError, Result};
use crate::primitive::Cursor;
use crate::variant::Variant;

/// A decoder for one Qt type tag or user-type name.
///
/// Takes the cursor positioned just past the tag/name it was dispatched on,
/// and the registry itself (so composite decoders can recurse into nested
/// variants without threading extra state).
pub type Decoder = fn(&mut Cursor, &Registry) -> Result<Variant>;

/// A user-type registration: either a concrete decoder, or an alias onto an
/// existing built-in tag (the common case — most Quassel user types are
/// just named wrappers around `qint32` or a `QVariantMap`).
#[derive(Clone, Copy)]
pub enum UserEntry {
    /// Decode with this function directly.
    Decoder(Decoder),
    /// Decode as if the wire had sent this built-in tag instead.
    Alias(u32),
}

/// Maps Qt type tags and user-type names to decoders.
///
/// Cheap to clone (an `Arc` around the tables), so one instance can be
/// shared across every session spawned from a client without a global
/// `static`.
#[derive(Clone)]
pub struct Registry {
    inner: Arc<Inner>,
}

#[derive(Clone)]
struct Inner {
    by_tag: HashMap<u32, Decoder>,
    by_user_name: HashMap<String, UserEntry>,
}

impl Registry {
    /// An empty registry with no decoders at all. Exists for tests that
    /// want to assert on `UnknownType` without the built-in table getting
    /// in the way.
    #[must_use]
    pub fn empty() -> Self {
        Self { inner: Arc::new(Inner { by_tag: HashMap::new(), by_user_name: HashMap::new() }) }
    }

    /// A registry seeded with decoders for every built-in Qt tag the codec
    /// understands (bool, int, uint, date, time, datetime, string,
    /// stringlist, bytearray, variantlist, variantmap, user-type envelope).
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut reg = Self::empty();
        reg.register_builtins();
        reg
    }

    fn builder(&mut self) -> &mut Inner {
        Arc::make_mut(&mut self.inner)
    }

    fn register_builtins(&mut self) {
        use crate::variant::decode_builtin;

        for tag in crate::variant::BUILTIN_TAGS {
            let tag = *tag;
            let decoder: Decoder = move |cur, reg| decode_builtin(tag, cur, reg);
            self.register_builtin(tag, decoder);
        }
    }

    /// Register (or overwrite) the decoder for a built-in Qt type tag.
    pub fn register_builtin(&mut self, tag: u32, decoder: Decoder) {
        self.builder().by_tag.insert(tag, decoder);
    }

    /// Register a user-type name with a concrete decoder.
    pub fn register_user_decoder(&mut self, name: impl Into<String>, decoder: Decoder) {
        self.builder().by_user_name.insert(name.into(), UserEntry::Decoder(decoder));
    }

    /// Register a user-type name as an alias onto an existing built-in tag.
    ///
    /// # Errors
    /// Returns [`RegistryError::UnknownAliasTarget`] if `tag` has no
    /// registered built-in decoder at the time of the call. Register
    /// built-ins (or call [`Registry::with_builtins`]) before aliasing onto
    /// them.
    pub fn register_user_alias(
        &mut self,
        name: impl Into<String>,
        tag: u32,
    ) -> std::result::Result<(), RegistryError> {
        let name = name.into();
        if !self.inner.by_tag.contains_key(&tag) {
            return Err(RegistryError::UnknownAliasTarget { name, tag });
        }
        self.builder().by_user_name.insert(name, UserEntry::Alias(tag));
        Ok(())
    }

    /// Look up the decoder for a built-in tag.
    #[must_use]
    pub fn decoder_for_tag(&self, tag: u32) -> Option<Decoder> {
        self.inner.by_tag.get(&tag).copied()
    }

    /// Look up the registration for a user-type name.
    #[must_use]
    pub fn entry_for_user(&self, name: &str) -> Option<UserEntry> {
        self.inner.by_user_name.get(name).copied()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("tags", &self.inner.by_tag.len())
            .field("user_types", &self.inner.by_user_name.len())
            .finish()
    }
}

impl From<RegistryError> for crate::error::CodecError {
    fn from(e: RegistryError) -> Self {
        crate::error::CodecError::Malformed(e.to_string())
    }
}

/// A registry seeded with built-ins plus the application user types the
/// reference Quassel client registers (`NetworkId`, `BufferInfo`, `Message`,
/// and friends). See [`crate::user_types::register_standard_types`].
#[must_use]
pub fn standard() -> Registry {
    let mut reg = Registry::with_builtins();
    crate::user_types::register_standard_types(&mut reg);
    reg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_has_no_builtins() {
        let reg = Registry::empty();
        assert!(reg.decoder_for_tag(2).is_none());
    }

    #[test]
    fn with_builtins_resolves_known_tags() {
        let reg = Registry::with_builtins();
        assert!(reg.decoder_for_tag(crate::variant::TAG_QINT).is_some());
        assert!(reg.decoder_for_tag(crate::variant::TAG_QSTRING).is_some());
    }

    #[test]
    fn alias_to_unknown_tag_is_rejected() {
        let mut reg = Registry::empty();
        let err = reg.register_user_alias("NetworkId", 999).unwrap_err();
        let RegistryError::UnknownAliasTarget { tag, .. } = err;
        assert_eq!(tag, 999);
    }

    #[test]
    fn alias_to_known_tag_is_accepted() {
        let mut reg = Registry::with_builtins();
        reg.register_user_alias("NetworkId", crate::variant::TAG_QINT).unwrap();
        match reg.entry_for_user("NetworkId") {
            Some(UserEntry::Alias(tag)) => assert_eq!(tag, crate::variant::TAG_QINT),
            other => panic!("expected alias entry, got {other:?}"),
        }
    }

    impl std::fmt::Debug for UserEntry {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                UserEntry::Decoder(_) => write!(f, "Decoder(..)"),
                UserEntry::Alias(tag) => write!(f, "Alias({tag})"),
            }
        }
    }
}
