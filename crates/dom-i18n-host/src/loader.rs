//! Locale file loading.
//!
//! Every source is parsed into a `serde_json::Value` whatever its format, grouped by locale,
//! deep-merged with earlier sources, and finally flattened into dot-separated keys.

use crate::error::HostError;
use dom_i18n_core::{Catalog, LocaleTable};
use rust_embed::RustEmbed;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Unflattened translations per locale, as parsed from one or more sources.
pub type Translations = BTreeMap<String, Value>;

/// Formats a locale source can be written in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SourceFormat {
    Yaml,
    Json,
    Toml,
}

impl SourceFormat {
    /// Maps a file extension to its format. Unknown extensions are `None`.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "yml" | "yaml" => Some(Self::Yaml),
            "json" => Some(Self::Json),
            "toml" => Some(Self::Toml),
            _ => None,
        }
    }

    fn parse(self, content: &str, origin: &str) -> Result<Value, HostError> {
        let origin = origin.to_string();
        match self {
            Self::Yaml => serde_yaml::from_str(content)
                .map_err(|source| HostError::Yaml { origin, source }),
            Self::Json => serde_json::from_str(content)
                .map_err(|source| HostError::Json { origin, source }),
            Self::Toml => toml::from_str(content)
                .map_err(|source| HostError::Toml { origin, source }),
        }
    }
}

/// One locale file's contents, bundled or read from disk.
#[derive(Clone, Debug)]
pub struct LocaleSource {
    /// Where the content came from. Only used in error messages.
    pub origin: String,
    /// Locale the content belongs to, unless it declares `_version: 2`.
    pub locale: String,
    pub format: SourceFormat,
    pub content: String,
}

impl LocaleSource {
    pub fn new(
        locale: impl Into<String>,
        format: SourceFormat,
        content: impl Into<String>,
    ) -> Self {
        let locale = locale.into();
        Self {
            origin: format!("<bundled {locale}>"),
            locale,
            format,
            content: content.into(),
        }
    }

    /// Reads a locale file. Returns `None` for files that are not locale sources.
    pub fn read(path: &Path) -> Result<Option<Self>, HostError> {
        let Some((locale, format)) = classify(path) else {
            return Ok(None);
        };

        let content = fs_err::read_to_string(path)?;
        Ok(Some(Self {
            origin: path.display().to_string(),
            locale,
            format,
            content,
        }))
    }

    /// Reads the file embedded at `path` in `A`. Returns `None` for files that are not locale
    /// sources.
    pub fn from_embedded<A: RustEmbed>(path: &str) -> Result<Option<Self>, HostError> {
        let Some((locale, format)) = classify(Path::new(path)) else {
            return Ok(None);
        };
        let Some(file) = A::get(path) else {
            return Ok(None);
        };

        let content = String::from_utf8(file.data.into_owned()).map_err(|source| {
            HostError::InvalidUtf8 {
                origin: path.to_string(),
                source,
            }
        })?;
        Ok(Some(Self {
            origin: format!("<embedded {path}>"),
            locale,
            format,
            content,
        }))
    }

    /// Parses the source and groups its contents by locale.
    pub fn parse(&self) -> Result<Translations, HostError> {
        let value = self.format.parse(&self.content, &self.origin)?;

        match version(&value) {
            2 => {
                let mut translations = Translations::new();
                if let Value::Object(messages) = &value {
                    collect_v2("", messages, &mut translations);
                }
                if translations.is_empty() {
                    return Err(HostError::EmptyVersion2 {
                        origin: self.origin.clone(),
                    });
                }
                Ok(translations)
            },
            _ => {
                let mut value = value;
                if let Value::Object(map) = &mut value {
                    map.remove("_version");
                }
                Ok(Translations::from([(self.locale.clone(), value)]))
            },
        }
    }
}

/// The locale a file holds: the last dot-separated segment of its stem.
///
/// `en.yml` holds `en`, `app.zh-CN.json` holds `zh-CN`.
pub fn locale_from_path(path: &Path) -> Option<String> {
    path.file_stem()?
        .to_str()?
        .rsplit('.')
        .next()
        .filter(|locale| !locale.is_empty())
        .map(str::to_string)
}

fn classify(path: &Path) -> Option<(String, SourceFormat)> {
    let format = path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(SourceFormat::from_extension)?;
    Some((locale_from_path(path)?, format))
}

fn version(value: &Value) -> u64 {
    value
        .get("_version")
        .and_then(Value::as_u64)
        .unwrap_or(1)
}

/// Regroups a `_version: 2` map.
///
/// Each object node's string children are `locale: text` pairs for the node's key; its object
/// children are nested keys.
fn collect_v2(prefix: &str, messages: &Map<String, Value>, translations: &mut Translations) {
    for (key, value) in messages {
        let Value::Object(children) = value else {
            continue;
        };
        let key = join_key(prefix, key);
        for (locale, text) in children {
            if let Value::String(text) = text {
                let entry = translations
                    .entry(locale.clone())
                    .or_insert_with(|| Value::Object(Map::new()));
                if let Value::Object(entry) = entry {
                    entry.insert(key.clone(), Value::String(text.clone()));
                }
            }
        }
        if children.values().any(Value::is_object) {
            collect_v2(&key, children, translations);
        }
    }
}

fn join_key(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Deep-merges `incoming` into `target`. Objects merge key by key; anything else replaces.
pub fn merge_value(target: &mut Value, incoming: Value) {
    match (target, incoming) {
        (Value::Object(target), Value::Object(incoming)) => {
            for (key, value) in incoming {
                merge_value(target.entry(key).or_insert(Value::Null), value);
            }
        },
        (target, incoming) => *target = incoming,
    }
}

/// Merges every locale of `incoming` into `translations`.
pub fn merge_translations(translations: &mut Translations, incoming: Translations) {
    for (locale, value) in incoming {
        match translations.get_mut(&locale) {
            Some(existing) => merge_value(existing, value),
            None => {
                translations.insert(locale, value);
            },
        }
    }
}

/// Flattens a nested value into dot-separated keys.
///
/// `null` and arrays become empty strings; booleans and numbers their display form.
pub fn flatten(value: &Value) -> LocaleTable {
    let mut table = LocaleTable::new();
    flatten_into("", value, &mut table);
    table
}

fn flatten_into(prefix: &str, value: &Value, table: &mut LocaleTable) {
    match value {
        Value::Object(map) => {
            for (key, value) in map {
                flatten_into(&join_key(prefix, key), value, table);
            }
        },
        Value::String(text) => {
            table.insert(prefix.to_string(), text.clone());
        },
        Value::Bool(flag) => {
            table.insert(prefix.to_string(), flag.to_string());
        },
        Value::Number(number) => {
            table.insert(prefix.to_string(), number.to_string());
        },
        Value::Null | Value::Array(_) => {
            table.insert(prefix.to_string(), String::new());
        },
    }
}

/// Loads every locale file under `dir`, recursively, in file-name order.
///
/// Later files deep-merge over earlier ones. Files with other extensions are ignored.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Catalog, HostError> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(HostError::MissingDir(dir.to_path_buf()));
    }

    let mut translations = Translations::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(source) = LocaleSource::read(entry.path())? else {
            continue;
        };
        debug!(path = %entry.path().display(), locale = %source.locale, "loading locale file");
        merge_translations(&mut translations, source.parse()?);
    }

    Ok(flatten_translations(&translations))
}

fn flatten_translations(translations: &Translations) -> Catalog {
    translations
        .iter()
        .map(|(locale, value)| (locale.clone(), flatten(value)))
        .collect::<BTreeMap<_, _>>()
        .into()
}

/// Assembles a catalog from bundled sources and an optional runtime override directory.
///
/// Bundled sources are flattened one by one. A runtime directory is loaded as a whole and its keys
/// replace bundled keys of the same locale; bundled keys it does not mention are kept.
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    tables: BTreeMap<String, LocaleTable>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a bundled source.
    pub fn bundled(mut self, source: &LocaleSource) -> Result<Self, HostError> {
        for (locale, value) in source.parse()? {
            self.tables.entry(locale).or_default().extend(flatten(&value));
        }
        Ok(self)
    }

    /// Adds every locale file embedded in `A`, in path order.
    ///
    /// Embedded paths follow the rules of a locale directory: the locale comes from the file name
    /// and files with other extensions are ignored.
    pub fn embedded<A: RustEmbed>(mut self) -> Result<Self, HostError> {
        let mut paths: Vec<_> = A::iter().collect();
        paths.sort();
        for path in paths {
            let Some(source) = LocaleSource::from_embedded::<A>(&path)? else {
                continue;
            };
            debug!(path = %path, locale = %source.locale, "loading embedded locale file");
            self = self.bundled(&source)?;
        }
        Ok(self)
    }

    /// Overlays every locale file under `dir`. A missing directory is skipped with a warning.
    pub fn overrides_from_dir(mut self, dir: impl AsRef<Path>) -> Result<Self, HostError> {
        let dir = dir.as_ref();
        let overrides = match load_dir(dir) {
            Ok(catalog) => catalog,
            Err(HostError::MissingDir(path)) => {
                warn!(path = %path.display(), "runtime locale directory not found, skipping");
                return Ok(self);
            },
            Err(err) => return Err(err),
        };
        for (locale, table) in overrides.into_map() {
            self.tables.entry(locale).or_default().extend(table);
        }
        Ok(self)
    }

    pub fn build(self) -> Catalog {
        Catalog::from_map(self.tables)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case("en.yml", Some("en"))]
    #[case("app.zh-CN.json", Some("zh-CN"))]
    #[case("nested/dir/fr.toml", Some("fr"))]
    #[case("en..yml", None)]
    fn locale_comes_from_last_stem_segment(#[case] path: &str, #[case] expected: Option<&str>) {
        assert_eq!(locale_from_path(Path::new(path)).as_deref(), expected);
    }

    #[test]
    fn flatten_joins_nested_keys_and_stringifies_scalars() {
        let table = flatten(&json!({
            "menu": { "file": { "open": "Open" } },
            "count": 3,
            "enabled": true,
            "missing": null,
            "list": ["a", "b"],
        }));

        assert_eq!(table.get("menu.file.open").map(String::as_str), Some("Open"));
        assert_eq!(table.get("count").map(String::as_str), Some("3"));
        assert_eq!(table.get("enabled").map(String::as_str), Some("true"));
        assert_eq!(table.get("missing").map(String::as_str), Some(""));
        assert_eq!(table.get("list").map(String::as_str), Some(""));
    }

    #[test]
    fn merge_is_deep() {
        let mut target = json!({ "menu": { "open": "Open", "close": "Close" } });
        merge_value(&mut target, json!({ "menu": { "open": "Open…" }, "title": "T" }));

        assert_eq!(
            target,
            json!({ "menu": { "open": "Open…", "close": "Close" }, "title": "T" })
        );
    }

    #[test]
    fn version_one_source_belongs_to_its_locale() {
        let source = LocaleSource::new("fr", SourceFormat::Yaml, "greeting: Bonjour\n");

        let translations = source.parse().unwrap();

        assert_eq!(translations.len(), 1);
        assert_eq!(translations["fr"], json!({ "greeting": "Bonjour" }));
    }

    #[test]
    fn explicit_version_one_marker_is_not_a_key() {
        let source = LocaleSource::new("en", SourceFormat::Json, r#"{"_version":1,"a":"A"}"#);

        let translations = source.parse().unwrap();

        assert_eq!(flatten(&translations["en"]).len(), 1);
    }

    #[test]
    fn version_two_source_is_regrouped_by_locale() {
        let source = LocaleSource::new(
            "ignored",
            SourceFormat::Yaml,
            "_version: 2\n\
             welcome:\n  en: Welcome\n  zh-CN: 欢迎\n\
             menu:\n  file:\n    en: File\n    fr: Fichier\n",
        );

        let translations = source.parse().unwrap();
        let en = flatten(&translations["en"]);
        let fr = flatten(&translations["fr"]);

        assert!(!translations.contains_key("ignored"));
        assert_eq!(en.get("welcome").map(String::as_str), Some("Welcome"));
        assert_eq!(en.get("menu.file").map(String::as_str), Some("File"));
        assert_eq!(fr.get("menu.file").map(String::as_str), Some("Fichier"));
        assert_eq!(
            flatten(&translations["zh-CN"]).get("welcome").map(String::as_str),
            Some("欢迎")
        );
    }

    #[test]
    fn version_two_without_entries_is_an_error() {
        let source = LocaleSource::new("en", SourceFormat::Toml, "_version = 2\ntitle = \"x\"\n");

        assert!(matches!(
            source.parse(),
            Err(HostError::EmptyVersion2 { .. })
        ));
    }

    #[rstest]
    #[case(SourceFormat::Yaml, "a: [")]
    #[case(SourceFormat::Json, "{")]
    #[case(SourceFormat::Toml, "a = ")]
    fn malformed_sources_are_errors(#[case] format: SourceFormat, #[case] content: &str) {
        let source = LocaleSource::new("en", format, content);

        let err = source.parse().unwrap_err();

        assert!(err.to_string().contains("<bundled en>"));
    }

    #[test]
    fn bundled_sources_accumulate_per_locale() {
        let catalog = CatalogBuilder::new()
            .bundled(&LocaleSource::new("en", SourceFormat::Yaml, "a: A\n"))
            .unwrap()
            .bundled(&LocaleSource::new("en", SourceFormat::Json, r#"{"b":"B"}"#))
            .unwrap()
            .build();

        assert_eq!(catalog.get("en", "a"), Some("A"));
        assert_eq!(catalog.get("en", "b"), Some("B"));
    }

    #[test]
    fn missing_override_dir_is_skipped() {
        let catalog = CatalogBuilder::new()
            .bundled(&LocaleSource::new("en", SourceFormat::Yaml, "a: A\n"))
            .unwrap()
            .overrides_from_dir("/definitely/not/a/locale/dir")
            .unwrap()
            .build();

        assert_eq!(catalog.get("en", "a"), Some("A"));
    }
}
