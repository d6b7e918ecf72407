use crate::channel::InProcessChannel;
use crate::config::HostConfig;
use crate::error::HostError;
use crate::loader::CatalogBuilder;
use dom_i18n_core::{Catalog, LOCALE_CHANGED_EVENT};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Locale a host starts in when none is configured.
pub const DEFAULT_LOCALE: &str = "en";

/// The authoritative side: one catalog and the current locale.
///
/// The catalog is fixed for the host's lifetime. The locale changes only through
/// [`set_locale`](Self::set_locale), which notifies every connected channel once.
#[derive(Debug)]
pub struct LocaleHost {
    catalog: Catalog,
    locale: Mutex<String>,
    emitters: Mutex<Vec<UnboundedSender<String>>>,
}

impl LocaleHost {
    pub fn new(catalog: Catalog, locale: impl Into<String>) -> Self {
        Self {
            catalog,
            locale: Mutex::new(locale.into()),
            emitters: Mutex::new(Vec::new()),
        }
    }

    /// A host starting in [`DEFAULT_LOCALE`].
    pub fn with_default_locale(catalog: Catalog) -> Self {
        Self::new(catalog, DEFAULT_LOCALE)
    }

    /// Builds a host from `config`, layering the configured runtime directory (resolved against
    /// `base_dir`) over the `bundled` sources.
    pub fn from_config(
        config: &HostConfig,
        base_dir: &Path,
        bundled: CatalogBuilder,
    ) -> Result<Self, HostError> {
        let builder = match config.locales_dir_from_base(base_dir) {
            Some(dir) => bundled.overrides_from_dir(dir)?,
            None => bundled,
        };
        let catalog = builder.build();
        info!(
            locales = catalog.len(),
            locale = %config.default_locale,
            "locale host ready"
        );
        Ok(Self::new(catalog, config.default_locale.clone()))
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// The catalog as served to pages: `None` when there is nothing to serve.
    pub fn translations(&self) -> Option<Catalog> {
        if self.catalog.is_empty() {
            None
        } else {
            Some(self.catalog.clone())
        }
    }

    pub fn locale(&self) -> String {
        self.locale.lock().clone()
    }

    /// Stores `locale` and emits one locale-changed notification to every connected channel.
    ///
    /// The locale is not validated; a locale missing from the catalog renders keys.
    pub fn set_locale(&self, locale: &str) {
        *self.locale.lock() = locale.to_string();
        self.emit(locale);
    }

    fn emit(&self, locale: &str) {
        let mut emitters = self.emitters.lock();
        emitters.retain(|emitter| emitter.unbounded_send(locale.to_string()).is_ok());
        debug!(
            event = LOCALE_CHANGED_EVENT,
            locale,
            receivers = emitters.len(),
            "emitted"
        );
    }

    /// Locales the catalog has tables for, sorted.
    pub fn available_locales(&self) -> Vec<String> {
        self.catalog.locales().map(str::to_string).collect()
    }

    /// Host-side lookup in the current locale. Unlike page-side rendering there is no fallback.
    pub fn translate(&self, key: &str) -> Option<String> {
        let locale = self.locale.lock();
        self.catalog.get(&locale, key).map(str::to_string)
    }

    /// Opens a page-side channel to this host.
    pub fn connect(self: &Arc<Self>) -> InProcessChannel {
        InProcessChannel::new(Arc::downgrade(self), self.register())
    }

    fn register(&self) -> UnboundedReceiver<String> {
        let (sender, receiver) = mpsc::unbounded();
        self.emitters.lock().push(sender);
        receiver
    }

    /// Number of channels still listening for notifications.
    pub fn connection_count(&self) -> usize {
        let mut emitters = self.emitters.lock();
        emitters.retain(|emitter| !emitter.is_closed());
        emitters.len()
    }
}
