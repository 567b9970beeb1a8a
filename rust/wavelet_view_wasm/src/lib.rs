use wasm_bindgen::prelude::*;
use wavelet_view_core::snapshot::decode_base64_text;
use wavelet_view_core::{ActionContext, ReloadOutcome, ViewError, Viewer, ViewerConfig};

fn js_err(e: ViewError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Decodes one of the base64 strings embedded in the page.
#[wasm_bindgen]
pub fn decode_base64(encoded: String) -> Result<String, JsValue> {
    decode_base64_text(&encoded).map_err(js_err)
}

#[wasm_bindgen]
pub struct WaveViewer {
    core: Viewer,
}

#[wasm_bindgen]
impl WaveViewer {
    /// `query` is the page's `location.search`.
    #[wasm_bindgen(constructor)]
    pub fn new(query: String) -> WaveViewer {
        WaveViewer { core: Viewer::new(ViewerConfig::default(), ActionContext::from_query(&query)) }
    }

    pub fn with_config(config_json: String, query: String) -> Result<WaveViewer, JsValue> {
        let config = ViewerConfig::from_json(&config_json).map_err(js_err)?;
        Ok(WaveViewer { core: Viewer::new(config, ActionContext::from_query(&query)) })
    }

    pub fn load(&mut self, payload_json: String) -> Result<(), JsValue> {
        self.core.load(&payload_json).map(|_| ()).map_err(js_err)
    }

    pub fn load_base64(&mut self, encoded: String) -> Result<(), JsValue> {
        let json = decode_base64_text(&encoded).map_err(js_err)?;
        self.load(json)
    }

    // Rendered output
    pub fn thread_html(&self) -> String {
        self.core.page().map(|p| p.thread_html(self.core.config())).unwrap_or_default()
    }
    pub fn participants_html(&self) -> String {
        self.core.page().map(|p| p.participants_html()).unwrap_or_default()
    }
    pub fn heading(&self) -> String {
        self.core.page().map(|p| p.title.heading.clone()).unwrap_or_default()
    }
    pub fn document_title(&self) -> String {
        self.core.page().map(|p| p.title.document_title.clone()).unwrap_or_default()
    }
    pub fn page_json(&self) -> String {
        self.core
            .page()
            .and_then(|p| serde_json::to_string(p).ok())
            .unwrap_or_else(|| "null".to_string())
    }
    pub fn unread(&self) -> u32 { self.core.page().map(|p| p.unread).unwrap_or(0) }
    pub fn render_count(&self) -> u32 { u32::try_from(self.core.render_count()).unwrap_or(u32::MAX) }
    pub fn is_public(&self) -> bool { self.core.page().is_some_and(|p| p.public) }

    // Refresh loop
    pub fn endpoint(&self) -> String { self.core.endpoint() }
    pub fn refresh_interval_ms(&self) -> u32 {
        u32::try_from(self.core.refresh_interval().as_millis()).unwrap_or(u32::MAX)
    }
    /// Request body for this refresh tick, or nothing while a dialog is open.
    pub fn tick(&self) -> Option<String> { self.core.tick().map(|r| r.to_json()) }

    /// Returns whether the page was re-rendered.
    pub fn reload(&mut self, payload_json: Option<String>) -> Result<bool, JsValue> {
        let payload = match payload_json {
            Some(json) => Some(serde_json::from_str(&json).map_err(|e| js_err(ViewError::Decode(e)))?),
            None => None,
        };
        let outcome = self.core.reload(payload).map_err(js_err)?;
        Ok(outcome == ReloadOutcome::Rendered)
    }

    // Read state and replies
    pub fn mark_read(&mut self, blip_id: String) -> Option<String> { self.core.mark_read(&blip_id).map(|r| r.to_json()) }
    pub fn open_reply(&mut self, blip_id: String) -> Option<String> { self.core.open_reply(&blip_id).map(|r| r.to_json()) }
    pub fn close_dialog(&mut self) { self.core.close_dialog() }
    pub fn dialog_open(&self) -> bool { self.core.dialog_open() }
    pub fn submit_reply(&mut self, text: String, name: Option<String>) -> Result<String, JsValue> {
        self.core.submit_reply(&text, name.as_deref()).map(|r| r.to_json()).map_err(js_err)
    }

    // Action responses
    pub fn on_action_success(&mut self, response_json: String) -> Result<bool, JsValue> {
        let outcome = self.core.on_action_success(&response_json).map_err(js_err)?;
        Ok(outcome == ReloadOutcome::Rendered)
    }
    /// Notice to show, as JSON. `status` is 0 when no response arrived.
    pub fn on_action_failure(&mut self, status: u16) -> String {
        let notice = self.core.on_action_failure(status);
        serde_json::to_string(&notice).unwrap_or_else(|_| "{}".to_string())
    }
    pub fn acknowledge_notice(&mut self) -> Result<(), JsValue> {
        self.core.acknowledge_notice().map(|_| ()).map_err(js_err)
    }
}
