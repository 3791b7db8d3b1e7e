use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::Window;

pub fn log(s: &str) {
    web_sys::console::log_1(&JsValue::from_str(s));
}

pub async fn fetch_text(window: &Window, url: &str) -> Result<String, JsValue> {
    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str(&format!(
            "fetch failed with status {} for {url}",
            response.status()
        )));
    }
    let text = JsFuture::from(response.text()?).await?;
    text.as_string()
        .ok_or_else(|| JsValue::from_str("response body is not text"))
}

pub fn random_index(len: usize) -> usize {
    (js_sys::Math::random() * len as f64) as usize % len.max(1)
}
