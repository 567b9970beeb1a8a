//! Page-level state: the snapshot on screen, the reply dialog, and the
//! reactions to refresh ticks and action responses.

use std::collections::HashSet;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::action::{ActionContext, ActionRequest};
use crate::blip::RenderContext;
use crate::config::ViewerConfig;
use crate::error::{ActionFailure, Notice, ViewError};
use crate::html::{participants_to_html, thread_to_html};
use crate::plan::{BlipView, ContentPiece, ParticipantBadge, TitleView};
use crate::session::{friendly_unread_count, Session};
use crate::snapshot::Snapshot;
use crate::wavelet::Wavelet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedPage {
    pub thread: BlipView,
    pub participants: Vec<ParticipantBadge>,
    pub title: TitleView,
    pub unread: u32,
    pub public: bool,
    pub can_write: bool,
}

impl RenderedPage {
    pub fn thread_html(&self, config: &ViewerConfig) -> String {
        thread_to_html(&self.thread, &config.identity)
    }

    pub fn participants_html(&self) -> String {
        participants_to_html(&self.participants)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadOutcome {
    Rendered,
    /// The payload matched the snapshot on screen.
    Unchanged,
}

#[derive(Debug)]
struct Current {
    value: Value,
    canonical: String,
}

impl Current {
    fn new(value: Value) -> Self {
        let canonical = value.to_string();
        Self { value, canonical }
    }
}

#[derive(Debug)]
pub struct Viewer {
    config: ViewerConfig,
    context: ActionContext,
    current: Option<Current>,
    session: Option<Session>,
    page: Option<RenderedPage>,
    dialog_open: bool,
    reply_target: Option<String>,
    locally_read: HashSet<String>,
    render_count: u64,
}

impl Viewer {
    pub fn new(config: ViewerConfig, context: ActionContext) -> Self {
        Self {
            config,
            context,
            current: None,
            session: None,
            page: None,
            dialog_open: false,
            reply_target: None,
            locally_read: HashSet::new(),
            render_count: 0,
        }
    }

    pub fn config(&self) -> &ViewerConfig {
        &self.config
    }

    pub fn page(&self) -> Option<&RenderedPage> {
        self.page.as_ref()
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn dialog_open(&self) -> bool {
        self.dialog_open
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn endpoint(&self) -> String {
        self.config.identity.action_endpoint()
    }

    pub fn refresh_interval(&self) -> Duration {
        self.config.refresh_interval()
    }

    /// First render from the page's JSON payload.
    pub fn load(&mut self, json: &str) -> Result<&RenderedPage, ViewError> {
        let value: Value = serde_json::from_str(json)?;
        self.load_value(value)
    }

    pub fn load_value(&mut self, value: Value) -> Result<&RenderedPage, ViewError> {
        self.commit(Current::new(value))?;
        self.page.as_ref().ok_or(ViewError::NothingLoaded)
    }

    /// `None` re-renders the snapshot on screen. A payload identical to it is
    /// dropped without rendering. A payload that fails to render leaves the
    /// held snapshot and the page as they were.
    pub fn reload(&mut self, payload: Option<Value>) -> Result<ReloadOutcome, ViewError> {
        match payload {
            Some(value) => {
                let next = Current::new(value);
                if self.current.as_ref().is_some_and(|c| c.canonical == next.canonical) {
                    debug!("snapshot unchanged, skipping render");
                    return Ok(ReloadOutcome::Unchanged);
                }
                self.commit(next)?;
            }
            None => {
                let current = self.current.as_ref().ok_or(ViewError::NothingLoaded)?;
                let snapshot = Snapshot::from_value(current.value.clone())?;
                self.render(snapshot)?;
            }
        }
        Ok(ReloadOutcome::Rendered)
    }

    fn commit(&mut self, next: Current) -> Result<(), ViewError> {
        let snapshot = Snapshot::from_value(next.value.clone())?;
        self.render(snapshot)?;
        self.current = Some(next);
        Ok(())
    }

    fn render(&mut self, snapshot: Snapshot) -> Result<(), ViewError> {
        let (mut wavelet, mut session) = Wavelet::from_snapshot(snapshot, &self.config);
        for id in &self.locally_read {
            wavelet.mark_read(id.clone());
        }

        let mut ctx = RenderContext::new(&self.config, &mut session);
        let thread = wavelet.render_all(&mut ctx)?;
        let participants = wavelet.render_participants(&ctx);
        let title = wavelet.render_title(&ctx);

        self.render_count += 1;
        debug!(render = self.render_count, unread = session.unread_count(), "page rendered");
        self.page = Some(RenderedPage {
            thread,
            participants,
            title,
            unread: session.unread_count(),
            public: session.is_public(),
            can_write: session.can_write(),
        });
        self.session = Some(session);
        Ok(())
    }

    /// The REFRESH request for this tick, unless a dialog is open.
    pub fn tick(&self) -> Option<ActionRequest> {
        if self.dialog_open {
            debug!("dialog open, skipping refresh");
            return None;
        }
        Some(ActionRequest::refresh(&self.context))
    }

    /// Marks a blip read on screen and returns the READ request to send.
    /// Public sessions and blips already read produce nothing.
    pub fn mark_read(&mut self, blip_id: &str) -> Option<ActionRequest> {
        let session = self.session.as_mut()?;
        if session.is_public() || self.locally_read.contains(blip_id) {
            return None;
        }
        let page = self.page.as_mut()?;
        let view = find_mut(&mut page.thread, blip_id)?;
        if view.read {
            return None;
        }
        view.read = true;
        view.can_mark_read = false;
        self.locally_read.insert(blip_id.to_string());

        session.decrement_unread(1);
        page.unread = session.unread_count();
        page.title.document_title = format!(
            "{}{}{}",
            page.title.heading,
            friendly_unread_count(page.unread),
            self.config.identity.page_title_suffix
        );
        Some(ActionRequest::read(&self.context, blip_id))
    }

    /// Opens the reply dialog for `blip_id`, marking it read first when the
    /// session is not public.
    pub fn open_reply(&mut self, blip_id: &str) -> Option<ActionRequest> {
        self.dialog_open = true;
        self.reply_target = Some(blip_id.to_string());
        self.mark_read(blip_id)
    }

    /// Builds the REPLY request and closes the dialog. On a rejected name the
    /// dialog stays open.
    pub fn submit_reply(&mut self, text: &str, name: Option<&str>) -> Result<ActionRequest, ViewError> {
        let target = self.reply_target.as_deref().ok_or(ViewError::NoReplyTarget)?;
        let public = self.session.as_ref().is_some_and(Session::is_public);
        let request = ActionRequest::reply(&self.context, target, text, public, name)?;
        self.close_dialog();
        Ok(request)
    }

    pub fn close_dialog(&mut self) {
        self.dialog_open = false;
        self.reply_target = None;
    }

    pub fn on_action_success(&mut self, json: &str) -> Result<ReloadOutcome, ViewError> {
        let value: Value = serde_json::from_str(json)?;
        self.reload(Some(value))
    }

    /// The notice is modal: refreshes stay paused until it is acknowledged.
    pub fn on_action_failure(&mut self, status: u16) -> Notice {
        let failure = ActionFailure::from_status(status);
        debug!(status, %failure, "action failed");
        self.dialog_open = true;
        failure.notice()
    }

    pub fn acknowledge_notice(&mut self) -> Result<ReloadOutcome, ViewError> {
        self.close_dialog();
        self.reload(None)
    }
}

fn find_mut<'a>(view: &'a mut BlipView, blip_id: &str) -> Option<&'a mut BlipView> {
    if view.blip_id == blip_id {
        return Some(view);
    }
    for piece in &mut view.content {
        if let ContentPiece::InlineSlot { thread: Some(thread), .. } = piece {
            if let Some(found) = find_mut(thread, blip_id) {
                return Some(found);
            }
        }
    }
    view.replies.iter_mut().find_map(|reply| find_mut(reply, blip_id))
}
