//! Browser globals (window, Web Storage, location).
//!
//! Every accessor returns `None` outside a browser, so native builds and
//! tests degrade instead of panicking.

use wasm_bindgen::JsValue;
use web_sys::{Storage, Window};

/// The browser window; `None` off the browser.
#[inline]
pub fn window() -> Option<Window> {
    if cfg!(target_arch = "wasm32") {
        web_sys::window()
    } else {
        None
    }
}

/// `window.localStorage`, if accessible.
#[inline]
pub fn local_storage() -> Option<Storage> {
    window()?.local_storage().ok()?
}

/// `window.sessionStorage`, if accessible.
#[inline]
pub fn session_storage() -> Option<Storage> {
    window()?.session_storage().ok()?
}

/// Read a property of `window` (e.g. `ethereum`), if it is defined.
pub fn window_property(name: &str) -> Option<JsValue> {
    let window = window()?;
    js_sys::Reflect::get(&window, &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

/// Reload the current page.
pub fn reload_page() {
    if let Some(window) = window()
        && let Err(e) = window.location().reload()
    {
        log::error!("page reload failed: {e:?}");
    }
}
