//! Translation lookup policy.

use crate::Catalog;

/// Resolves `key` against `catalog` for `locale`.
///
/// Never fails: when the catalog has not been loaded, has no table for `locale`, or the table
/// lacks `key`, the key itself is returned so untranslated content stays visible as the raw key.
pub fn resolve(catalog: Option<&Catalog>, locale: &str, key: &str) -> String {
    catalog
        .and_then(|catalog| catalog.get(locale, key))
        .unwrap_or(key)
        .to_string()
}

/// A borrowed `(catalog, locale)` pair, taken at the moment a render happens.
#[derive(Clone, Copy, Debug)]
pub struct TranslationView<'a> {
    pub catalog: Option<&'a Catalog>,
    pub locale: &'a str,
}

impl<'a> TranslationView<'a> {
    pub fn new(catalog: Option<&'a Catalog>, locale: &'a str) -> Self {
        Self { catalog, locale }
    }

    pub fn resolve(&self, key: &str) -> String {
        resolve(self.catalog, self.locale, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn catalog() -> Catalog {
        [
            ("en", "greeting", "Hello"),
            ("fr", "greeting", "Bonjour"),
            ("en", "only.english", "English only"),
        ]
        .into_iter()
        .collect()
    }

    #[rstest]
    #[case("en", "greeting", "Hello")]
    #[case("fr", "greeting", "Bonjour")]
    #[case("en", "only.english", "English only")]
    fn present_keys_resolve_to_catalog_text(
        #[case] locale: &str,
        #[case] key: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(resolve(Some(&catalog()), locale, key), expected);
    }

    #[rstest]
    #[case::missing_key("fr", "only.english")]
    #[case::missing_locale("de", "greeting")]
    #[case::empty_key("en", "")]
    fn misses_fall_back_to_the_key(#[case] locale: &str, #[case] key: &str) {
        assert_eq!(resolve(Some(&catalog()), locale, key), key);
    }

    #[test]
    fn unloaded_catalog_falls_back_to_the_key() {
        assert_eq!(resolve(None, "en", "greeting"), "greeting");
    }

    #[test]
    fn view_reads_the_locale_it_was_built_with() {
        let catalog = catalog();
        let view = TranslationView::new(Some(&catalog), "fr");
        assert_eq!(view.resolve("greeting"), "Bonjour");
    }
}
