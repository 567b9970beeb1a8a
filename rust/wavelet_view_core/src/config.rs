//! Service identity and rendering constants.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ViewError;

/// Who the robot is and where it lives. Used to recognise service accounts
/// and proxied participants, and to build media and endpoint URLs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ServiceIdentity {
    pub ident: String,
    pub domain: String,
    /// Public web root, always ending in `/`.
    pub web_address: String,
    /// Address that stands in for anonymous public participants.
    pub public_email: String,
    /// Token substituted for `@` inside proxied addresses.
    pub proxy_at_token: String,
    pub display_name: String,
    pub page_title_suffix: String,
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self {
            ident: "mr-ray-open".to_string(),
            domain: "appspot.com".to_string(),
            web_address: "http://mr-ray-open.appspot.com/".to_string(),
            public_email: "mrrayopen-public@wave.to".to_string(),
            proxy_at_token: "-_at_-".to_string(),
            display_name: "Mr-Ray".to_string(),
            page_title_suffix: " - Mr-Ray. Wav-e-mail".to_string(),
        }
    }
}

impl ServiceIdentity {
    pub fn robot_email(&self) -> String {
        format!("{}@{}", self.ident, self.domain)
    }

    /// `<ident>+`, the local-part prefix of every proxied participant.
    pub fn proxy_prefix(&self) -> String {
        format!("{}+", self.ident)
    }

    /// `@<domain>`, the suffix of every proxied participant.
    pub fn proxy_suffix(&self) -> String {
        format!("@{}", self.domain)
    }

    /// The public address with `@` swapped for the proxy token.
    pub fn encoded_public_email(&self) -> String {
        self.public_email.replace('@', &self.proxy_at_token)
    }

    pub fn media_url(&self, file: &str) -> String {
        format!("{}web/media/{}", self.web_address, file)
    }

    pub fn action_endpoint(&self) -> String {
        format!("{}wave/action/", self.web_address)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ViewerConfig {
    pub identity: ServiceIdentity,
    /// Left margin per indent level of a line marker, in pixels.
    pub indent_px: u32,
    /// Maximum length of the contributor line shown on a blip; 0 disables.
    pub contributors_max_len: usize,
    pub refresh_interval_secs: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            identity: ServiceIdentity::default(),
            indent_px: 14,
            contributors_max_len: 50,
            refresh_interval_secs: 15,
        }
    }
}

impl ViewerConfig {
    /// Parse a (possibly partial) JSON object over the defaults.
    pub fn from_json(json: &str) -> Result<Self, ViewError> {
        serde_json::from_str(json).map_err(ViewError::Config)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }
}
