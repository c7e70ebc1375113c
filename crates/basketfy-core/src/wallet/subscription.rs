//! Scoped provider event listeners.

use std::rc::Rc;

use super::provider::{Eip1193Provider, EventHandler, ListenerId, ProviderEvent};
use crate::error::ProviderError;

/// Listeners registered for one session. Dropping the subscription detaches
/// every listener it registered, whichever path the session ends on.
pub struct Subscription<P: Eip1193Provider> {
    provider: Rc<P>,
    listeners: Vec<ListenerId>,
}

impl<P: Eip1193Provider> Subscription<P> {
    /// Register one handler per event.
    ///
    /// If any registration fails, listeners registered so far are detached
    /// before the error is returned.
    pub fn register(
        provider: Rc<P>,
        handlers: impl IntoIterator<Item = (ProviderEvent, EventHandler)>,
    ) -> Result<Self, ProviderError> {
        let mut subscription = Self {
            provider,
            listeners: Vec::new(),
        };
        for (event, handler) in handlers {
            let id = subscription.provider.on(event, handler)?;
            subscription.listeners.push(id);
        }
        Ok(subscription)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl<P: Eip1193Provider> Drop for Subscription<P> {
    fn drop(&mut self) {
        for id in self.listeners.drain(..) {
            self.provider.remove_listener(id);
        }
    }
}
