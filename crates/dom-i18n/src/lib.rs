#![doc = include_str!("../README.md")]

mod config;
mod facade;
pub mod registry;
pub mod watcher;

pub use config::BinderConfig;
pub use facade::I18n;
pub use registry::{Binding, BindingRegistry};
pub use watcher::DomWatcher;

pub use dom_i18n_core::{
    Catalog, DEFAULT_MARKER, DomDocument, DomElement, LocaleChannel, Subscription,
    TranslationView, resolve,
};
