use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading or parsing locale sources.
#[derive(Debug, Error)]
pub enum HostError {
    /// Failed to read a locale file.
    #[error("Failed to read locale file: {0}")]
    Read(#[from] std::io::Error),
    /// Failed to walk a locale directory.
    #[error("Failed to walk locale directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid YAML format in {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("Invalid JSON format in {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Invalid TOML format in {origin}: {source}")]
    Toml {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    /// An embedded locale file that is not UTF-8.
    #[error("Embedded locale file {origin} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        origin: String,
        #[source]
        source: std::string::FromUtf8Error,
    },
    /// A `_version: 2` source with no `key: { locale: text }` entry anywhere.
    #[error("Invalid locale file format in {origin}, please check the version field")]
    EmptyVersion2 { origin: String },
    /// A locale directory that was required does not exist.
    #[error("Locale directory {0} does not exist")]
    MissingDir(PathBuf),
}

/// Errors surfaced by [`InProcessChannel`](crate::InProcessChannel) requests.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ChannelError {
    /// The host behind the channel has been dropped.
    #[error("locale host is no longer running")]
    HostGone,
}

/// Errors raised while reading `i18n.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("i18n.toml configuration file not found at {0}")]
    NotFound(PathBuf),
    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),
    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),
}
