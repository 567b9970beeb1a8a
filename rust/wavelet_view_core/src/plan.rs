//! Render plan: what the page should show, independent of any DOM.

use serde::Serialize;

/// One piece of a blip's content, in document order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentPiece {
    Paragraph {
        text: String,
        class: String,
        style: String,
        /// Set on the first paragraph of the root blip.
        emphasized: bool,
    },
    /// Icon marking where an inline reply is anchored.
    InlineMarker,
    /// Container for an inline reply thread; filled in when the owning blip's
    /// children are rendered.
    InlineSlot {
        blip_id: String,
        thread: Option<Box<BlipView>>,
    },
    GadgetPlaceholder,
}

impl ContentPiece {
    pub fn paragraph_text(&self) -> Option<&str> {
        match self {
            ContentPiece::Paragraph { text, .. } => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BlipView {
    pub blip_id: String,
    /// Threaded replies other than the first continuation are indented.
    pub sub_reply: bool,
    /// Read, or shown as read because the session is public.
    pub read: bool,
    pub can_mark_read: bool,
    pub can_reply: bool,
    pub contributors: String,
    pub contributors_full: String,
    pub last_edited: String,
    pub content: Vec<ContentPiece>,
    /// Non-inline children, in container order.
    pub replies: Vec<BlipView>,
}

impl BlipView {
    /// Depth-first walk over this blip and every blip nested inside it.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&'a BlipView)) {
        f(self);
        for piece in &self.content {
            if let ContentPiece::InlineSlot { thread: Some(thread), .. } = piece {
                thread.visit(f);
            }
        }
        for reply in &self.replies {
            reply.visit(f);
        }
    }

    pub fn find(&self, blip_id: &str) -> Option<&BlipView> {
        let mut found = None;
        self.visit(&mut |view| {
            if found.is_none() && view.blip_id == blip_id {
                found = Some(view);
            }
        });
        found
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParticipantBadge {
    pub id: String,
    pub avatar_url: String,
    /// Display name and (masked) id.
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleView {
    pub heading: String,
    /// Browser window title, carrying the unread count.
    pub document_title: String,
}
