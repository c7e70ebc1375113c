//! Injected provider (`window.ethereum`) accessed through Reflect.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Promise, Reflect};
use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::prelude::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use super::provider::{Eip1193Provider, EventHandler, ListenerId, ProviderEvent, ProviderFlags};
use crate::error::ProviderError;
use crate::utils::dom;

type JsListener = Closure<dyn Fn(JsValue)>;

/// One EIP-1193 provider object injected by a wallet extension.
pub struct BrowserProvider {
    inner: Object,
    flags: ProviderFlags,
    listeners: RefCell<HashMap<u64, (ProviderEvent, JsListener)>>,
    next_listener: Cell<u64>,
}

impl BrowserProvider {
    /// Every provider the page exposes.
    ///
    /// With several extensions installed, `window.ethereum.providers` lists
    /// each of them; otherwise `window.ethereum` itself is the only one.
    pub fn detect() -> Vec<Rc<Self>> {
        let Some(ethereum) = dom::window_property("ethereum") else {
            log::debug!("no injected ethereum provider");
            return Vec::new();
        };

        let nested = Reflect::get(&ethereum, &"providers".into())
            .ok()
            .filter(Array::is_array)
            .map(|val: JsValue| Array::from(&val))
            .filter(|providers| providers.length() > 0);

        let providers: Vec<Rc<Self>> = match nested {
            Some(providers) => providers.iter().filter_map(Self::wrap).map(Rc::new).collect(),
            None => Self::wrap(ethereum).map(Rc::new).into_iter().collect(),
        };
        log::debug!("detected {} injected provider(s)", providers.len());
        providers
    }

    fn wrap(value: JsValue) -> Option<Self> {
        let inner = value.dyn_into::<Object>().ok()?;
        let flags = ProviderFlags {
            is_metamask: flag(&inner, "isMetaMask"),
            is_phantom: flag(&inner, "isPhantom"),
            is_hashpack: flag(&inner, "isHashPack"),
        };
        Some(Self {
            inner,
            flags,
            listeners: RefCell::new(HashMap::new()),
            next_listener: Cell::new(0),
        })
    }

    fn method(&self, name: &str) -> Result<Function, ProviderError> {
        Reflect::get(&self.inner, &name.into())
            .ok()
            .and_then(|f| f.dyn_into::<Function>().ok())
            .ok_or_else(|| ProviderError::internal(format!("provider has no `{name}` method")))
    }
}

impl Eip1193Provider for BrowserProvider {
    fn flags(&self) -> ProviderFlags {
        self.flags
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderError> {
        let args = Object::new();
        let params = params
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| ProviderError::internal(e.to_string()))?;
        Reflect::set(&args, &"method".into(), &method.into()).map_err(provider_error)?;
        Reflect::set(&args, &"params".into(), &params).map_err(provider_error)?;

        let promise: Promise = self
            .method("request")?
            .call1(&self.inner, &args)
            .map_err(provider_error)?
            .into();

        let result = JsFuture::from(promise).await.map_err(provider_error)?;
        serde_wasm_bindgen::from_value(result).map_err(|e| ProviderError::internal(e.to_string()))
    }

    fn on(&self, event: ProviderEvent, handler: EventHandler) -> Result<ListenerId, ProviderError> {
        let closure = Closure::wrap(Box::new(move |payload: JsValue| {
            let payload = serde_wasm_bindgen::from_value(payload).unwrap_or(Value::Null);
            handler(payload);
        }) as Box<dyn Fn(JsValue)>);

        self.method("on")?
            .call2(&self.inner, &event.as_str().into(), closure.as_ref())
            .map_err(provider_error)?;

        let id = self.next_listener.get();
        self.next_listener.set(id + 1);
        self.listeners.borrow_mut().insert(id, (event, closure));
        Ok(ListenerId(id))
    }

    fn remove_listener(&self, id: ListenerId) {
        let Some((event, closure)) = self.listeners.borrow_mut().remove(&id.0) else {
            return;
        };

        let detached = self.method("removeListener").and_then(|remove| {
            remove
                .call2(&self.inner, &event.as_str().into(), closure.as_ref())
                .map_err(provider_error)
        });
        if let Err(e) = detached {
            log::warn!("failed to remove {} listener: {e}", event.as_str());
        }

        // The listener being removed may be the one currently dispatching;
        // free it once the event loop is back in control.
        wasm_bindgen_futures::spawn_local(async move { drop(closure) });
    }
}

fn flag(target: &Object, name: &str) -> bool {
    Reflect::get(target, &name.into())
        .ok()
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

/// Map a rejected provider promise (`{ code, message, data }`) to a
/// [`ProviderError`].
fn provider_error(err: JsValue) -> ProviderError {
    let field = |target: &JsValue, name: &str| Reflect::get(target, &name.into()).ok();

    // Some mobile wallets nest the real code under `data.originalError`.
    let nested_code = field(&err, "data")
        .and_then(|data| field(&data, "originalError"))
        .and_then(|original| field(&original, "code"))
        .and_then(|code| code.as_f64());
    let code = nested_code.or_else(|| field(&err, "code").and_then(|code| code.as_f64()));

    let message = field(&err, "message")
        .and_then(|m| m.as_string())
        .unwrap_or_else(|| format!("{err:?}"));

    match code {
        Some(code) => ProviderError::new(code as i64, message),
        None => ProviderError::internal(message),
    }
}
