//! Requests posted to the robot's action endpoint.

use serde::{Deserialize, Serialize};

use crate::error::ViewError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionKind {
    Refresh,
    Reply,
    Read,
}

/// Identifies the wave and the viewer. Taken from the page's query string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionContext {
    #[serde(rename = "waveid")]
    pub wave_id: String,
    #[serde(rename = "waveletid")]
    pub wavelet_id: String,
    pub email: String,
    pub auth: String,
}

impl ActionContext {
    /// Accepts a query string with or without the leading `?`. Unknown keys
    /// are ignored; missing keys stay empty.
    pub fn from_query(query: &str) -> Self {
        let mut ctx = ActionContext::default();
        let query = query.trim_start_matches('?');
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "waveid" => &mut ctx.wave_id,
                "waveletid" => &mut ctx.wavelet_id,
                "email" => &mut ctx.email,
                "auth" => &mut ctx.auth,
                _ => continue,
            };
            if slot.is_empty() {
                *slot = value.into_owned();
            }
        }
        ctx
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionRequest {
    pub action: ActionKind,
    #[serde(flatten)]
    pub context: ActionContext,
    #[serde(rename = "blipid", skip_serializing_if = "Option::is_none", default)]
    pub blip_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub reply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub name: Option<String>,
}

impl ActionRequest {
    fn bare(action: ActionKind, context: &ActionContext) -> Self {
        Self { action, context: context.clone(), blip_id: None, reply: None, name: None }
    }

    pub fn refresh(context: &ActionContext) -> Self {
        Self::bare(ActionKind::Refresh, context)
    }

    pub fn read(context: &ActionContext, blip_id: &str) -> Self {
        Self { blip_id: Some(blip_id.to_string()), ..Self::bare(ActionKind::Read, context) }
    }

    /// `name` is required for public sessions and ignored otherwise.
    pub fn reply(
        context: &ActionContext,
        blip_id: &str,
        text: &str,
        public: bool,
        name: Option<&str>,
    ) -> Result<Self, ViewError> {
        let name = if public { Some(responder_name(name.unwrap_or_default())?) } else { None };
        Ok(Self {
            blip_id: Some(blip_id.to_string()),
            reply: Some(text.to_string()),
            name,
            ..Self::bare(ActionKind::Reply, context)
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

/// Spaces become underscores; anything outside `[A-Za-z0-9_+$]` is refused.
pub fn responder_name(raw: &str) -> Result<String, ViewError> {
    let name = raw.replace(' ', "_");
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '+' | '$');
    if name.is_empty() || !name.chars().all(allowed) {
        return Err(ViewError::InvalidResponderName(raw.to_string()));
    }
    Ok(name)
}
