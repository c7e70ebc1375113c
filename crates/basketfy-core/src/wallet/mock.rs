//! Scriptable in-memory EIP-1193 provider.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use serde_json::{Value, json};

use super::provider::{Eip1193Provider, EventHandler, ListenerId, ProviderEvent, ProviderFlags};
use crate::error::ProviderError;

/// Hash returned by `eth_sendTransaction` unless scripted otherwise.
pub const MOCK_TX_HASH: &str = "0x1111111111111111111111111111111111111111111111111111111111111111";

/// Provider double: scripted responses per method, a call log, and an
/// event emitter driving registered listeners.
#[derive(Default)]
pub struct MockProvider {
    flags: ProviderFlags,
    chain_id: RefCell<String>,
    accounts: RefCell<Vec<String>>,
    scripted: RefCell<HashMap<String, VecDeque<Result<Value, ProviderError>>>>,
    calls: RefCell<Vec<(String, Value)>>,
    listeners: RefCell<Vec<(ListenerId, ProviderEvent, EventHandler)>>,
    next_listener: Cell<u64>,
    registrations_left: Cell<Option<usize>>,
    held: RefCell<HashMap<String, Rc<Cell<bool>>>>,
}

impl MockProvider {
    pub fn with_flags(flags: ProviderFlags) -> Self {
        Self {
            flags,
            chain_id: RefCell::new("0x128".to_string()),
            ..Default::default()
        }
    }

    pub fn metamask() -> Self {
        Self::with_flags(ProviderFlags {
            is_metamask: true,
            ..Default::default()
        })
    }

    pub fn hashpack() -> Self {
        Self::with_flags(ProviderFlags {
            is_hashpack: true,
            ..Default::default()
        })
    }

    /// Accounts returned by `eth_accounts` / `eth_requestAccounts`.
    pub fn set_accounts(&self, accounts: &[&str]) {
        *self.accounts.borrow_mut() = accounts.iter().map(|a| a.to_string()).collect();
    }

    pub fn set_chain_id(&self, chain_id: &str) {
        *self.chain_id.borrow_mut() = chain_id.to_string();
    }

    /// Queue a one-shot response for `method`, consumed before the defaults.
    pub fn push_response(&self, method: &str, response: Result<Value, ProviderError>) {
        self.scripted
            .borrow_mut()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
    }

    /// Park every call to `method` until [`release`](Self::release).
    pub fn hold(&self, method: &str) {
        self.held
            .borrow_mut()
            .insert(method.to_string(), Rc::new(Cell::new(false)));
    }

    pub fn release(&self, method: &str) {
        if let Some(gate) = self.held.borrow_mut().remove(method) {
            gate.set(true);
        }
    }

    /// Allow only `n` more successful `on(...)` registrations.
    pub fn fail_listener_registration_after(&self, n: usize) {
        self.registrations_left.set(Some(n));
    }

    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.borrow().clone()
    }

    pub fn call_count(&self, method: &str) -> usize {
        self.calls.borrow().iter().filter(|(m, _)| m == method).count()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(m, _)| m.clone()).collect()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    /// Invoke every listener registered for `event`.
    pub fn emit(&self, event: ProviderEvent, payload: Value) {
        // Handlers may detach listeners, so never hold the borrow while calling.
        let handlers: Vec<EventHandler> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(_, e, _)| *e == event)
            .map(|(_, _, h)| h.clone())
            .collect();
        for handler in handlers {
            handler(payload.clone());
        }
    }

    fn default_response(&self, method: &str, params: &Value) -> Result<Value, ProviderError> {
        match method {
            "eth_chainId" => Ok(json!(self.chain_id.borrow().clone())),
            "eth_accounts" | "eth_requestAccounts" => Ok(json!(self.accounts.borrow().clone())),
            "wallet_switchEthereumChain" | "wallet_addEthereumChain" => Ok(Value::Null),
            "eth_sendTransaction" => Ok(json!(MOCK_TX_HASH)),
            "eth_getTransactionReceipt" => Ok(json!({
                "transactionHash": params[0].clone(),
                "blockNumber": "0x1",
                "status": "0x1",
            })),
            other => Err(ProviderError::new(-32601, format!("{other} not scripted"))),
        }
    }
}

impl Eip1193Provider for MockProvider {
    fn flags(&self) -> ProviderFlags {
        self.flags
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        self.calls
            .borrow_mut()
            .push((method.to_string(), params.clone()));

        let gate = self.held.borrow().get(method).cloned();
        if let Some(gate) = gate {
            Gate(gate).await;
        }

        let scripted = self
            .scripted
            .borrow_mut()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        scripted.unwrap_or_else(|| self.default_response(method, &params))
    }

    fn on(&self, event: ProviderEvent, handler: EventHandler) -> Result<ListenerId, ProviderError> {
        if let Some(left) = self.registrations_left.get() {
            if left == 0 {
                return Err(ProviderError::internal("listener registration refused"));
            }
            self.registrations_left.set(Some(left - 1));
        }

        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, event, handler));
        Ok(id)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.borrow_mut().retain(|(l, _, _)| *l != id);
    }
}

/// Pending until its flag is set. Never registers a waker: the test driving
/// the future re-polls it after releasing.
struct Gate(Rc<Cell<bool>>);

impl Future for Gate {
    type Output = ();

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<()> {
        if self.0.get() {
            Poll::Ready(())
        } else {
            Poll::Pending
        }
    }
}
