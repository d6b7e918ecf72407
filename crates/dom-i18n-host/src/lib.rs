#![doc = include_str!("../README.md")]

mod channel;
mod config;
mod error;
pub mod loader;
mod state;

pub use channel::{ChannelSubscription, InProcessChannel};
pub use config::{CONFIG_FILE, HostConfig};
pub use error::{ChannelError, ConfigError, HostError};
pub use loader::{CatalogBuilder, LocaleSource, SourceFormat, load_dir};
pub use state::{DEFAULT_LOCALE, LocaleHost};
