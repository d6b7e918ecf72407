use crate::config::BinderConfig;
use crate::registry::BindingRegistry;
use crate::watcher::DomWatcher;
use dom_i18n_core::{
    Catalog, DomDocument, DomElement, LocaleChannel, LocaleListener, Subscription as _,
    TranslationView,
};
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

/// Catalog, locale and bindings, shared between the facade and the callbacks it installs.
///
/// Every render reads the catalog and locale stored here at the moment it runs, so an insertion
/// handled after a locale change always renders the new locale.
struct RenderState<E: DomElement> {
    catalog: Option<Catalog>,
    locale: String,
    registry: BindingRegistry<E>,
    loaded: bool,
}

impl<E: DomElement> RenderState<E> {
    fn view(&self) -> TranslationView<'_> {
        TranslationView::new(self.catalog.as_ref(), &self.locale)
    }

    fn bind(&mut self, element: E, key: &str) -> bool {
        let view = TranslationView::new(self.catalog.as_ref(), &self.locale);
        self.registry.bind(element, key, view)
    }

    fn render_all(&self) -> usize {
        self.registry.render_all(self.view())
    }
}

type SharedState<E> = Rc<RefCell<RenderState<E>>>;

/// Coordinates catalog loading, element binding and locale-change re-rendering for one document.
///
/// Construct one per document and pass it where it is needed. Nothing prevents a second
/// instance on the same document, but two instances would each observe and bind every marked
/// element.
///
/// ```ignore
/// let i18n = I18n::new(document, channel);
/// i18n.load().await?;
/// i18n.set_locale("fr").await?; // the DOM updates when the notification arrives
/// ```
pub struct I18n<D: DomDocument, C: LocaleChannel> {
    channel: C,
    watcher: DomWatcher<D>,
    state: SharedState<D::Element>,
    subscription: RefCell<Option<C::Subscription>>,
}

impl<D: DomDocument, C: LocaleChannel> I18n<D, C> {
    pub fn new(document: D, channel: C) -> Self {
        Self::with_config(document, channel, BinderConfig::default())
    }

    pub fn with_config(document: D, channel: C, config: BinderConfig) -> Self {
        Self {
            channel,
            watcher: DomWatcher::new(document, config.marker_attribute),
            state: Rc::new(RefCell::new(RenderState {
                catalog: None,
                locale: config.initial_locale,
                registry: BindingRegistry::new(),
                loaded: false,
            })),
            subscription: RefCell::new(None),
        }
    }

    /// Loads the catalog and locale, binds every marked element, subscribes to locale changes
    /// and starts observing insertions.
    ///
    /// Calling it again refreshes the snapshot and rescans. The previous locale subscription is
    /// released before the new one is created, so exactly one stays live. Transport failures are
    /// returned as-is. On failure the snapshot and bindings already made stay in effect, but the
    /// facade does not count as loaded until the subscription is live and observing has started.
    pub async fn load(&self) -> Result<(), C::Error> {
        let catalog = self.channel.load_translations().await?;
        let locale = self.channel.get_locale().await?;
        info!(
            locale = %locale,
            locales = catalog.as_ref().map_or(0, Catalog::len),
            "loaded translations"
        );
        {
            let mut state = self.state.borrow_mut();
            state.catalog = catalog;
            state.locale = locale;
        }

        self.auto_bind();
        self.subscribe().await?;
        self.watcher.start_observing(binder(Rc::downgrade(&self.state)));
        self.state.borrow_mut().loaded = true;
        Ok(())
    }

    async fn subscribe(&self) -> Result<(), C::Error> {
        let previous = self.subscription.borrow_mut().take();
        if let Some(previous) = previous {
            debug!("releasing previous locale subscription");
            previous.unsubscribe();
        }

        let listener = locale_listener(Rc::downgrade(&self.state));
        let subscription = self.channel.subscribe(listener).await?;
        // A concurrent load may have stored a subscription while this one was in flight.
        if let Some(stale) = self.subscription.replace(Some(subscription)) {
            stale.unsubscribe();
        }
        Ok(())
    }

    /// Translates `key` with the current snapshot, falling back to the key itself.
    pub fn translate(&self, key: &str) -> String {
        self.state.borrow().view().resolve(key)
    }

    /// Binds `element` to `key` regardless of any marker attribute and renders it now.
    pub fn bind(&self, element: D::Element, key: &str) {
        self.state.borrow_mut().bind(element, key);
    }

    /// Binds every marked element currently in the document. Returns how many were bound.
    pub fn auto_bind(&self) -> usize {
        self.watcher.scan_existing(|element, key| {
            self.state.borrow_mut().bind(element, &key);
        })
    }

    /// Re-renders every binding from the current snapshot.
    pub fn render_all(&self) -> usize {
        self.state.borrow().render_all()
    }

    /// Asks the host to switch locale.
    ///
    /// Local state is untouched: bound elements change only once the host's locale-changed
    /// notification is delivered.
    pub async fn set_locale(&self, locale: &str) -> Result<(), C::Error> {
        debug!(locale, "requesting locale change");
        self.channel.set_locale(locale).await
    }

    /// Asks the host for its current locale.
    pub async fn get_locale(&self) -> Result<String, C::Error> {
        self.channel.get_locale().await
    }

    pub async fn get_available_locales(&self) -> Result<Vec<String>, C::Error> {
        self.channel.get_available_locales().await
    }

    /// Releases the locale-changed subscription.
    ///
    /// Insertion observation and existing bindings are left in place: newly inserted marked
    /// elements still bind, but locale changes no longer re-render. Use
    /// [`teardown`](Self::teardown) to release everything.
    pub fn destroy(&self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
            info!("released locale subscription");
        }
    }

    /// Releases the subscription, stops observing insertions and forgets every binding.
    pub fn teardown(&self) {
        self.destroy();
        self.watcher.stop_observing();
        self.state.borrow_mut().registry.clear();
    }

    /// Drops bindings whose elements have left the document. Never runs automatically.
    pub fn prune_detached_bindings(&self) -> usize {
        self.state.borrow_mut().registry.prune_detached()
    }

    /// The locale bound elements are currently rendered in.
    pub fn active_locale(&self) -> String {
        self.state.borrow().locale.clone()
    }

    /// `true` once a `load` has run to completion.
    pub fn is_loaded(&self) -> bool {
        self.state.borrow().loaded
    }

    pub fn is_observing(&self) -> bool {
        self.watcher.is_observing()
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.borrow().is_some()
    }

    pub fn binding_count(&self) -> usize {
        self.state.borrow().registry.len()
    }

    /// The key `element` is bound to, if any.
    pub fn key_for(&self, element: &D::Element) -> Option<String> {
        self.state
            .borrow()
            .registry
            .key_for(element)
            .map(str::to_string)
    }

    pub fn document(&self) -> &D {
        self.watcher.document()
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }
}

impl<D: DomDocument, C: LocaleChannel> Drop for I18n<D, C> {
    fn drop(&mut self) {
        self.destroy();
        self.watcher.stop_observing();
    }
}

fn binder<E: DomElement>(state: Weak<RefCell<RenderState<E>>>) -> impl Fn(E, String) + 'static {
    move |element, key| {
        if let Some(state) = state.upgrade() {
            state.borrow_mut().bind(element, &key);
        }
    }
}

fn locale_listener<E: DomElement>(state: Weak<RefCell<RenderState<E>>>) -> LocaleListener {
    Box::new(move |locale: &str| {
        let Some(state) = state.upgrade() else {
            return;
        };
        debug!(locale, "locale changed");
        let mut state = state.borrow_mut();
        state.locale = locale.to_string();
        state.render_all();
    })
}
