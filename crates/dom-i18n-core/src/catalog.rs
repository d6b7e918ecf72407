use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Translations for a single locale, keyed by translation key.
pub type LocaleTable = BTreeMap<String, String>;

/// A complete translation catalog: locale identifier -> translation key -> display string.
///
/// A catalog is a snapshot. It is never mutated once handed to the binding engine; a fresh
/// load replaces it wholesale. Locales are not required to share the same key set.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Catalog(BTreeMap<String, LocaleTable>);

impl Catalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps an already-built locale map.
    pub fn from_map(map: BTreeMap<String, LocaleTable>) -> Self {
        Self(map)
    }

    /// Returns the table for `locale`, if the catalog has one.
    pub fn table(&self, locale: &str) -> Option<&LocaleTable> {
        self.0.get(locale)
    }

    /// Looks up `key` under `locale`.
    pub fn get(&self, locale: &str, key: &str) -> Option<&str> {
        self.0.get(locale)?.get(key).map(String::as_str)
    }

    pub fn contains_locale(&self, locale: &str) -> bool {
        self.0.contains_key(locale)
    }

    /// Returns the locale identifiers present in the catalog, in sorted order.
    pub fn locales(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of locales in the catalog.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &BTreeMap<String, LocaleTable> {
        &self.0
    }

    pub fn into_map(self) -> BTreeMap<String, LocaleTable> {
        self.0
    }
}

impl From<BTreeMap<String, LocaleTable>> for Catalog {
    fn from(map: BTreeMap<String, LocaleTable>) -> Self {
        Self(map)
    }
}

impl<L, K, V> FromIterator<(L, K, V)> for Catalog
where
    L: Into<String>,
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (L, K, V)>>(iter: I) -> Self {
        let mut map: BTreeMap<String, LocaleTable> = BTreeMap::new();
        for (locale, key, text) in iter {
            map.entry(locale.into())
                .or_default()
                .insert(key.into(), text.into());
        }
        Self(map)
    }
}
