use crate::error::ChannelError;
use crate::state::LocaleHost;
use dom_i18n_core::{Catalog, LocaleChannel, LocaleListener, Subscription};
use futures::channel::mpsc::UnboundedReceiver;
use futures::{FutureExt as _, StreamExt as _};
use std::cell::RefCell;
use std::rc::{Rc, Weak as RcWeak};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Rc<dyn Fn(&str)>)>,
}

/// Page-side end of a [`LocaleHost`] living in the same process.
///
/// Requests are answered straight from the host. Locale-changed notifications are queued and only
/// reach listeners when [`dispatch_pending`](Self::dispatch_pending) runs, which plays the part
/// of the page's event loop delivering host events.
pub struct InProcessChannel {
    host: Weak<LocaleHost>,
    events: RefCell<UnboundedReceiver<String>>,
    listeners: Rc<RefCell<Listeners>>,
}

impl InProcessChannel {
    pub(crate) fn new(host: Weak<LocaleHost>, events: UnboundedReceiver<String>) -> Self {
        Self {
            host,
            events: RefCell::new(events),
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    fn host(&self) -> Result<Arc<LocaleHost>, ChannelError> {
        self.host.upgrade().ok_or(ChannelError::HostGone)
    }

    /// Delivers every queued notification to the listeners registered at delivery time.
    ///
    /// Returns the number of notifications delivered.
    pub fn dispatch_pending(&self) -> usize {
        let mut delivered = 0;
        loop {
            let Some(Some(locale)) = self.events.borrow_mut().next().now_or_never() else {
                break;
            };
            let listeners: Vec<_> = self
                .listeners
                .borrow()
                .entries
                .iter()
                .map(|(_, listener)| listener.clone())
                .collect();
            trace!(locale = %locale, listeners = listeners.len(), "delivering locale change");
            for listener in listeners {
                listener(&locale);
            }
            delivered += 1;
        }
        delivered
    }

    /// Number of live subscriptions on this channel.
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().entries.len()
    }
}

impl LocaleChannel for InProcessChannel {
    type Error = ChannelError;
    type Subscription = ChannelSubscription;

    async fn load_translations(&self) -> Result<Option<Catalog>, Self::Error> {
        Ok(self.host()?.translations())
    }

    async fn get_locale(&self) -> Result<String, Self::Error> {
        Ok(self.host()?.locale())
    }

    async fn set_locale(&self, locale: &str) -> Result<(), Self::Error> {
        self.host()?.set_locale(locale);
        Ok(())
    }

    async fn get_available_locales(&self) -> Result<Vec<String>, Self::Error> {
        Ok(self.host()?.available_locales())
    }

    async fn subscribe(&self, listener: LocaleListener) -> Result<Self::Subscription, Self::Error> {
        self.host()?;
        let mut listeners = self.listeners.borrow_mut();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Rc::from(listener)));
        debug!(id, live = listeners.entries.len(), "locale listener subscribed");
        Ok(ChannelSubscription {
            id,
            listeners: Rc::downgrade(&self.listeners),
        })
    }
}

/// Handle for a listener registered on an [`InProcessChannel`].
#[derive(Debug)]
pub struct ChannelSubscription {
    id: u64,
    listeners: RcWeak<RefCell<Listeners>>,
}

impl Subscription for ChannelSubscription {
    fn unsubscribe(self) {
        if let Some(listeners) = self.listeners.upgrade() {
            listeners.borrow_mut().entries.retain(|(id, _)| *id != self.id);
            debug!(id = self.id, "locale listener unsubscribed");
        }
    }
}
