//! Persisted global UI/session store.
//!
//! One [`GlobalState`] record, mutated only through [`GlobalAction`]s and
//! written to localStorage under `persist:root` after every dispatch.
//! A store can only be obtained through [`GlobalStore::rehydrate`], so nothing
//! reads state before the persisted record has been loaded.

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::config::{PERSIST_VERSION, storage_keys};
use crate::error::StorageError;
use crate::models::{GlobalAction, GlobalState};
use crate::utils::storage::{BrowserStorage, KeyValueStorage};

type Subscriber = Rc<dyn Fn(&GlobalState)>;

/// On-disk layout. Only the UI/session slice is persisted.
#[derive(Serialize, Deserialize)]
struct Persisted {
    version: u32,
    global: GlobalState,
}

pub struct GlobalStore<S: KeyValueStorage> {
    storage: S,
    state: RefCell<GlobalState>,
    subscribers: RefCell<Vec<Subscriber>>,
}

impl GlobalStore<BrowserStorage> {
    /// Store backed by localStorage.
    pub fn browser() -> Self {
        Self::rehydrate(BrowserStorage::local())
    }
}

impl<S: KeyValueStorage> GlobalStore<S> {
    /// Load the persisted record, falling back to defaults when it is
    /// missing, unreadable or from another version.
    pub fn rehydrate(storage: S) -> Self {
        let state = match storage.get_item(storage_keys::PERSIST_ROOT) {
            Ok(Some(raw)) => match serde_json::from_str::<Persisted>(&raw) {
                Ok(persisted) if persisted.version == PERSIST_VERSION => persisted.global,
                Ok(persisted) => {
                    log::warn!(
                        "discarding persisted store version {} (expected {PERSIST_VERSION})",
                        persisted.version
                    );
                    GlobalState::default()
                }
                Err(e) => {
                    log::warn!("discarding corrupt persisted store: {e}");
                    GlobalState::default()
                }
            },
            Ok(None) => GlobalState::default(),
            Err(e) => {
                log::warn!("persisted store unavailable: {e}");
                GlobalState::default()
            }
        };

        Self {
            storage,
            state: RefCell::new(state),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    pub fn state(&self) -> GlobalState {
        self.state.borrow().clone()
    }

    /// Read a value without cloning the whole record.
    pub fn select<T>(&self, f: impl FnOnce(&GlobalState) -> T) -> T {
        f(&self.state.borrow())
    }

    /// Apply `action`, persist, then notify subscribers synchronously.
    pub fn dispatch(&self, action: GlobalAction) {
        log::debug!("dispatch {action:?}");
        let snapshot = {
            let mut state = self.state.borrow_mut();
            state.apply(action);
            state.clone()
        };

        if let Err(e) = self.persist(&snapshot) {
            log::warn!("failed to persist store: {e}");
        }

        let subscribers = self.subscribers.borrow().clone();
        for subscriber in subscribers {
            subscriber(&snapshot);
        }
    }

    pub fn dispatch_all(&self, actions: impl IntoIterator<Item = GlobalAction>) {
        for action in actions {
            self.dispatch(action);
        }
    }

    pub fn subscribe(&self, subscriber: impl Fn(&GlobalState) + 'static) {
        let subscriber: Subscriber = Rc::new(subscriber);
        self.subscribers.borrow_mut().push(subscriber);
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn persist(&self, state: &GlobalState) -> Result<(), StorageError> {
        let record = Persisted {
            version: PERSIST_VERSION,
            global: state.clone(),
        };
        let json = serde_json::to_string(&record)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.set_item(storage_keys::PERSIST_ROOT, &json)
    }
}
