use crate::Catalog;

/// Name of the notification the host emits after the authoritative locale changed.
pub const LOCALE_CHANGED_EVENT: &str = "i18n:locale_changed";

/// Callback invoked with the new locale every time a locale-changed notification arrives.
pub type LocaleListener = Box<dyn Fn(&str)>;

/// A live locale-changed subscription. Releasing it stops further listener calls.
pub trait Subscription {
    fn unsubscribe(self);
}

/// The boundary to the host process that owns the catalog and the authoritative locale.
///
/// Requests suspend the calling task until the host answers. Notifications are delivered
/// asynchronously and are unordered relative to in-flight requests, so a `set_locale` call
/// returning says nothing about whether listeners have run yet.
///
/// Implementations surface their own error type; callers propagate it unchanged.
#[allow(async_fn_in_trait)]
pub trait LocaleChannel {
    type Error: std::error::Error + 'static;
    type Subscription: Subscription;

    /// Fetches the catalog. `None` means the host has no catalog configured.
    async fn load_translations(&self) -> Result<Option<Catalog>, Self::Error>;

    /// Fetches the authoritative current locale.
    async fn get_locale(&self) -> Result<String, Self::Error>;

    /// Asks the host to switch locale. The host applies it and later emits a notification.
    async fn set_locale(&self, locale: &str) -> Result<(), Self::Error>;

    async fn get_available_locales(&self) -> Result<Vec<String>, Self::Error>;

    /// Registers `listener` for locale-changed notifications.
    async fn subscribe(&self, listener: LocaleListener) -> Result<Self::Subscription, Self::Error>;
}
