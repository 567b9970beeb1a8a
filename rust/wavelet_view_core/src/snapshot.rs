//! The JSON snapshot sent by the action endpoint and embedded in the page.
//!
//! Every field the server may omit or send as `null` is defaulted here, once,
//! so the models never deal with missing data.

use std::collections::{BTreeMap, HashMap};

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ViewError;

fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "nullable")]
    pub is_public: bool,
    #[serde(default)]
    pub rw_permission: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub wavelet: RawWavelet,
    #[serde(default, deserialize_with = "nullable", rename = "readblips")]
    pub read_blips: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub profiles: HashMap<String, RawProfile>,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, ViewError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_value(value: Value) -> Result<Self, ViewError> {
        Ok(serde_json::from_value(value)?)
    }

    /// Decode a snapshot embedded in the page as base64-encoded JSON.
    pub fn from_base64(encoded: &str) -> Result<Self, ViewError> {
        Self::from_json(&decode_base64_text(encoded)?)
    }
}

/// Decode one of the base64 strings the page embeds (payload, addresses).
pub fn decode_base64_text(encoded: &str) -> Result<String, ViewError> {
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ViewError::Base64(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ViewError::Base64(e.to_string()))
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawWavelet {
    #[serde(default, deserialize_with = "nullable")]
    pub wavelet_data: WaveletData,
    #[serde(default, deserialize_with = "nullable")]
    pub blips: HashMap<String, RawBlip>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaveletData {
    #[serde(default, deserialize_with = "nullable")]
    pub root_blip_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub title: String,
    #[serde(default, deserialize_with = "nullable")]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub wavelet_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub wave_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub creator: String,
    #[serde(default, deserialize_with = "nullable")]
    pub participants: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub data_documents: Map<String, Value>,
    #[serde(default, deserialize_with = "nullable")]
    pub last_modified_time: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawBlip {
    #[serde(default, deserialize_with = "nullable")]
    pub blip_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub wavelet_id: String,
    #[serde(default, deserialize_with = "nullable")]
    pub wave_id: String,
    /// Positioned elements keyed by character offset into `content`.
    #[serde(default, deserialize_with = "nullable")]
    pub elements: BTreeMap<usize, RawElement>,
    #[serde(default, deserialize_with = "nullable")]
    pub contributors: Vec<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub creator: String,
    #[serde(default, deserialize_with = "nullable")]
    pub content: String,
    #[serde(default, deserialize_with = "nullable")]
    pub child_blip_ids: Vec<String>,
    #[serde(default)]
    pub parent_blip_id: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub last_modified_time: i64,
    #[serde(default, deserialize_with = "nullable")]
    pub version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct RawElement {
    #[serde(rename = "type", default, deserialize_with = "nullable")]
    pub kind: String,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawProfile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub thumb_url: Option<String>,
}
