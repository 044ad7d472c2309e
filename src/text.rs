//! Text-resolution seam
//!
//! The surrounding application owns the localized string tables; this crate
//! only needs to ask "what display text does this key resolve to". The
//! [`NameResolver`] trait is that seam. [`StaticResolver`] is a plain
//! map-backed implementation, and [`CachedResolver`] memoizes an expensive
//! backend; the sea-zone rebuild consults the resolver once per ocean record,
//! so the cache sits on the load path.

use crate::Ruleset;
use dashmap::DashMap;
use std::collections::HashMap;

/// Resolve a raw text key to localized display text.
///
/// `None` means the key has no entry; an empty string means the key exists
/// but resolves to nothing. Both exclude an ocean record from the sea-zone
/// list.
pub trait NameResolver: Send + Sync {
    fn resolve(&self, key: &str) -> Option<String>;
}

/// Map-backed resolver. Suitable for tests and small fixed tables.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    entries: HashMap<String, String>,
}

impl StaticResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }
}

impl NameResolver for StaticResolver {
    fn resolve(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// Memoizing decorator over another resolver.
///
/// Negative results are cached too, so repeated misses do not hit the
/// backend again.
pub struct CachedResolver<R> {
    backend: R,
    cache: DashMap<String, Option<String>>,
}

impl<R: NameResolver> CachedResolver<R> {
    pub fn new(backend: R) -> Self {
        Self {
            backend,
            cache: DashMap::new(),
        }
    }

    /// Number of memoized keys, hits and misses both.
    pub fn cached_keys(&self) -> usize {
        self.cache.len()
    }
}

impl<R: NameResolver> NameResolver for CachedResolver<R> {
    fn resolve(&self, key: &str) -> Option<String> {
        if let Some(hit) = self.cache.get(key) {
            return hit.value().clone();
        }
        let resolved = self.backend.resolve(key);
        self.cache.insert(key.to_string(), resolved.clone());
        resolved
    }
}

/// Localization keys the extended game renamed. Lookups under the extended
/// ruleset go through this table first.
const EXTENDED_KEY_RENAMES: &[(&str, &str)] = &[
    ("Persia", "Iran"),
    ("Mesopotamia", "Iraq"),
    ("Levant", "Syria"),
    ("Anatolia", "Turkey"),
    ("Rio de la Plata", "Argentina"),
];

/// The localization key to look up for `key` under the given ruleset.
pub fn localization_key(ruleset: Ruleset, key: &str) -> &str {
    if ruleset == Ruleset::Extended
        && let Some((_, renamed)) = EXTENDED_KEY_RENAMES.iter().find(|(from, _)| *from == key)
    {
        return renamed;
    }
    key
}

/// Display text for a raw key: the resolver's non-empty answer, or the key's
/// canonical spelling as a fallback.
pub fn display_name(resolver: &dyn NameResolver, ruleset: Ruleset, key: &str) -> String {
    let key = localization_key(ruleset, key);
    match resolver.resolve(key) {
        Some(text) if !text.is_empty() => text,
        _ => key.to_string(),
    }
}
