//! The whole thread: blip lookup, read state and the top-level render calls.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::blip::{Blip, RenderContext};
use crate::config::ViewerConfig;
use crate::error::ViewError;
use crate::plan::{BlipView, ParticipantBadge, TitleView};
use crate::profile::Profiles;
use crate::session::{friendly_unread_count, Session};
use crate::snapshot::{RawBlip, RawWavelet, Snapshot, WaveletData};

/// Heading shown for waves without a title.
pub const UNTITLED: &str = "(untitled)";

#[derive(Debug, Clone, Default)]
pub struct Wavelet {
    data: WaveletData,
    blips: HashMap<String, RawBlip>,
    read: HashSet<String>,
    profiles: Profiles,
}

impl Wavelet {
    pub fn new(raw: RawWavelet, read: impl IntoIterator<Item = String>, profiles: Profiles) -> Self {
        Self {
            data: raw.wavelet_data,
            blips: raw.blips,
            read: read.into_iter().collect(),
            profiles,
        }
    }

    /// Split a snapshot into the wavelet model and a fresh session.
    pub fn from_snapshot(snapshot: Snapshot, config: &ViewerConfig) -> (Self, Session) {
        let session = Session::new(snapshot.is_public, snapshot.rw_permission.as_deref());
        let profiles = Profiles::new(config.identity.clone(), snapshot.profiles);
        (Self::new(snapshot.wavelet, snapshot.read_blips, profiles), session)
    }

    pub fn data(&self) -> &WaveletData {
        &self.data
    }

    pub fn profiles(&self) -> &Profiles {
        &self.profiles
    }

    pub fn mark_read(&mut self, blip_id: impl Into<String>) {
        self.read.insert(blip_id.into());
    }

    pub fn blip_ids(&self) -> impl Iterator<Item = &str> {
        self.blips.keys().map(String::as_str)
    }

    /// `None` when the id is not part of this wavelet.
    pub fn blip(&self, id: &str) -> Option<Blip<'_>> {
        let (key, raw) = self.blips.get_key_value(id)?;
        Some(Blip::new(self, key, raw, self.read.contains(id)))
    }

    pub fn root_blip(&self) -> Result<Blip<'_>, ViewError> {
        self.blip(&self.data.root_blip_id)
            .ok_or_else(|| ViewError::MissingRootBlip(self.data.root_blip_id.clone()))
    }

    /// Render the full thread starting at the root blip.
    pub fn render_all(&self, ctx: &mut RenderContext<'_>) -> Result<BlipView, ViewError> {
        let root = self.root_blip()?;
        let view = root.render_thread(false, ctx);
        debug!(
            root = root.id(),
            blips = self.blips.len(),
            unread = ctx.session.unread_count(),
            "rendered wavelet"
        );
        Ok(view)
    }

    pub fn render_participants(&self, ctx: &RenderContext<'_>) -> Vec<ParticipantBadge> {
        self.data
            .participants
            .iter()
            .map(|id| ParticipantBadge {
                id: id.clone(),
                avatar_url: self.profiles.avatar_url(id),
                label: self.profiles.display_name_and_raw(id, &*ctx.session),
            })
            .collect()
    }

    /// Heading plus window title. Call after [`Wavelet::render_all`] so the
    /// unread count is complete.
    pub fn render_title(&self, ctx: &RenderContext<'_>) -> TitleView {
        let heading = if self.data.title.is_empty() {
            UNTITLED.to_string()
        } else {
            self.data.title.clone()
        };
        let document_title = format!(
            "{}{}{}",
            heading,
            friendly_unread_count(ctx.session.unread_count()),
            ctx.config.identity.page_title_suffix
        );
        TitleView { heading, document_title }
    }
}
