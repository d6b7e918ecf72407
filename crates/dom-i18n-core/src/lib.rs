#![doc = include_str!("../README.md")]

pub mod catalog;
pub mod channel;
pub mod dom;
pub mod lookup;

pub use catalog::{Catalog, LocaleTable};
pub use channel::{LOCALE_CHANGED_EVENT, LocaleChannel, LocaleListener, Subscription};
pub use dom::{DEFAULT_MARKER, DomDocument, DomElement, InsertionHandler, Observation, marker_key};
pub use lookup::{TranslationView, resolve};
