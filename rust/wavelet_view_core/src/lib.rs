pub mod action;
pub mod blip;
pub mod config;
pub mod driver;
pub mod element;
pub mod error;
pub mod format;
pub mod html;
pub mod plan;
pub mod profile;
pub mod session;
pub mod snapshot;
pub mod wavelet;

pub use action::{ActionContext, ActionKind, ActionRequest};
pub use blip::{Blip, RenderContext};
pub use config::{ServiceIdentity, ViewerConfig};
pub use driver::{ReloadOutcome, RenderedPage, Viewer};
pub use error::{ActionFailure, Notice, ViewError};
pub use plan::{BlipView, ContentPiece, ParticipantBadge, TitleView};
pub use session::Session;
pub use snapshot::Snapshot;
pub use wavelet::Wavelet;

/// One-shot render of a snapshot payload, without any page state.
pub fn render_snapshot(json: &str, config: &ViewerConfig) -> Result<RenderedPage, ViewError> {
    let mut viewer = Viewer::new(config.clone(), ActionContext::default());
    viewer.load(json).cloned()
}
