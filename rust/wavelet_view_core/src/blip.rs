//! A single blip of the thread tree: text layout, inline anchoring and the
//! recursive walk that turns a subtree into a render plan.

use std::cell::OnceCell;
use std::collections::{HashSet, VecDeque};

use tracing::warn;

use crate::config::ViewerConfig;
use crate::element::{Element, ElementKind};
use crate::format::format_timestamp;
use crate::plan::{BlipView, ContentPiece};
use crate::session::Session;
use crate::snapshot::RawBlip;
use crate::wavelet::Wavelet;

/// Everything a render pass needs besides the wavelet itself.
#[derive(Debug)]
pub struct RenderContext<'a> {
    pub config: &'a ViewerConfig,
    pub session: &'a mut Session,
    /// Blips already placed in this pass.
    visited: HashSet<String>,
}

impl<'a> RenderContext<'a> {
    pub fn new(config: &'a ViewerConfig, session: &'a mut Session) -> Self {
        Self { config, session, visited: HashSet::new() }
    }
}

/// Wrapper over one raw blip. Cheap to build; the wavelet hands out a fresh
/// one for every lookup.
#[derive(Debug)]
pub struct Blip<'w> {
    wavelet: &'w Wavelet,
    id: &'w str,
    raw: &'w RawBlip,
    read: bool,
    inline_position: OnceCell<Option<usize>>,
}

impl<'w> Blip<'w> {
    pub(crate) fn new(wavelet: &'w Wavelet, id: &'w str, raw: &'w RawBlip, read: bool) -> Self {
        Self { wavelet, id, raw, read, inline_position: OnceCell::new() }
    }

    pub fn id(&self) -> &'w str {
        self.id
    }

    pub fn text(&self) -> &'w str {
        &self.raw.content
    }

    pub fn is_read(&self) -> bool {
        self.read
    }

    pub fn parent_id(&self) -> Option<&'w str> {
        self.raw.parent_blip_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn is_root(&self) -> bool {
        self.parent_id().is_none()
    }

    pub fn child_ids(&self) -> &'w [String] {
        &self.raw.child_blip_ids
    }

    pub fn contributors(&self) -> &'w [String] {
        &self.raw.contributors
    }

    pub fn creator(&self) -> &'w str {
        &self.raw.creator
    }

    pub fn last_modified_time(&self) -> i64 {
        self.raw.last_modified_time
    }

    pub fn version(&self) -> u64 {
        self.raw.version
    }

    /// All elements in ascending offset order.
    pub fn elements(&self) -> impl DoubleEndedIterator<Item = Element<'w>> + 'w {
        self.raw.elements.iter().map(|(pos, raw)| Element::new(*pos, raw))
    }

    pub fn elements_of(&self, kind: &ElementKind) -> Vec<Element<'w>> {
        self.elements().filter(|e| &e.kind() == kind).collect()
    }

    pub fn parent(&self) -> Option<Blip<'w>> {
        self.wavelet.blip(self.parent_id()?)
    }

    /// Children in listed order. Ids missing from the wavelet are skipped.
    pub fn children(&self) -> Vec<Blip<'w>> {
        self.child_ids()
            .iter()
            .filter_map(|id| {
                let child = self.wavelet.blip(id);
                if child.is_none() {
                    warn!(parent = self.id, child = %id, "child blip missing from wavelet, skipping");
                }
                child
            })
            .collect()
    }

    /// Offset of the anchor in the parent's text that this blip hangs off,
    /// computed once per wrapper.
    pub fn inline_position(&self) -> Option<usize> {
        *self.inline_position.get_or_init(|| self.find_inline_anchor())
    }

    pub fn is_inline(&self) -> bool {
        self.inline_position().is_some()
    }

    fn find_inline_anchor(&self) -> Option<usize> {
        let parent = self.parent()?;
        let mut claims = parent
            .elements_of(&ElementKind::InlineBlip)
            .into_iter()
            .filter(|e| e.inline_blip_id().as_deref() == Some(self.id))
            .map(|e| e.position());
        let first = claims.next();
        if claims.next().is_some() {
            warn!(blip = self.id, parent = parent.id(), "several inline anchors claim this blip, using the first");
        }
        first
    }

    /// Split the text at every element offset into content pieces, in
    /// document order. Elements are visited from the highest offset down and
    /// each piece is pushed to the front, so each paragraph runs from its
    /// element's offset to the next element's.
    ///
    /// Offsets count UTF-16 code units. One that lands inside a surrogate
    /// pair moves forward to the end of that character.
    pub fn layout(&self, indent_px: u32) -> Vec<ContentPiece> {
        let text = self.text();
        // (utf-16 offset, byte index) of every char start
        let starts: Vec<(usize, usize)> = text
            .char_indices()
            .scan(0, |units, (byte, c)| {
                let at = *units;
                *units += c.len_utf16();
                Some((at, byte))
            })
            .collect();
        let unit_len = text.encode_utf16().count();
        let byte_at = |unit: usize| {
            let i = starts.partition_point(|(at, _)| *at < unit);
            starts.get(i).map_or(text.len(), |(_, byte)| *byte)
        };
        let slice = |from: usize, to: usize| text[byte_at(from)..byte_at(to)].to_string();

        let mut pieces = VecDeque::new();
        let mut end = unit_len;
        for element in self.elements().rev() {
            let start = element.position().min(end);
            let paragraph = ContentPiece::Paragraph {
                text: slice(start, end),
                class: element.css_classes(),
                style: element.inline_style(indent_px),
                emphasized: false,
            };
            pieces.push_front(paragraph);
            match element.kind() {
                ElementKind::InlineBlip => {
                    pieces.push_front(ContentPiece::InlineSlot {
                        blip_id: element.inline_blip_id().unwrap_or_default(),
                        thread: None,
                    });
                    pieces.push_front(ContentPiece::InlineMarker);
                }
                ElementKind::Gadget => pieces.push_front(ContentPiece::GadgetPlaceholder),
                ElementKind::Line | ElementKind::Other(_) => {}
            }
            end = start;
        }
        if end > 0 || pieces.is_empty() {
            pieces.push_front(ContentPiece::Paragraph {
                text: slice(0, end),
                class: String::new(),
                style: String::new(),
                emphasized: false,
            });
        }

        if self.is_root() {
            if let Some(ContentPiece::Paragraph { emphasized, .. }) =
                pieces.iter_mut().find(|p| matches!(p, ContentPiece::Paragraph { .. }))
            {
                *emphasized = true;
            }
        }
        pieces.into()
    }

    /// Render this blip alone. Counts it as unread on the session when the
    /// viewer has not seen it and the session is not public.
    pub fn render(&self, sub_reply: bool, ctx: &mut RenderContext<'_>) -> BlipView {
        let session = &mut *ctx.session;
        let shown_read = self.read || session.is_public();
        if !shown_read {
            session.increment_unread(1);
        }
        let profiles = self.wavelet.profiles();
        BlipView {
            blip_id: self.id.to_string(),
            sub_reply,
            read: shown_read,
            can_mark_read: !shown_read,
            can_reply: session.can_write(),
            contributors: profiles.participants_to_string(
                self.contributors(),
                ctx.config.contributors_max_len,
                session,
            ),
            contributors_full: profiles.participants_to_string(self.contributors(), 0, session),
            last_edited: format_timestamp(self.last_modified_time()),
            content: self.layout(ctx.config.indent_px),
            replies: Vec::new(),
        }
    }

    /// Render this blip and its whole subtree. Inline children go into the
    /// slot their anchor created; the rest become replies. Children after the
    /// first are placed before it, and only they are indented. A blip listed
    /// again in the same pass, through a cycle or a duplicate id, is skipped.
    pub fn render_thread(&self, sub_reply: bool, ctx: &mut RenderContext<'_>) -> BlipView {
        ctx.visited.insert(self.id.to_string());
        let mut view = self.render(sub_reply, ctx);
        let children = self.children();
        if let Some((first, rest)) = children.split_first() {
            for child in rest {
                place_child(&mut view, child, true, ctx);
            }
            place_child(&mut view, first, false, ctx);
        }
        view
    }
}

fn place_child(view: &mut BlipView, child: &Blip<'_>, sub_reply: bool, ctx: &mut RenderContext<'_>) {
    if ctx.visited.contains(child.id()) {
        warn!(blip = child.id(), parent = %view.blip_id, "blip already rendered in this thread, skipping");
        return;
    }
    if !child.is_inline() {
        view.replies.push(child.render_thread(sub_reply, ctx));
        return;
    }
    let thread = child.render_thread(true, ctx);
    let slot = view.content.iter_mut().find_map(|piece| match piece {
        ContentPiece::InlineSlot { blip_id, thread } if blip_id == child.id() && thread.is_none() => Some(thread),
        _ => None,
    });
    match slot {
        Some(slot) => *slot = Some(Box::new(thread)),
        None => {
            warn!(blip = child.id(), parent = %view.blip_id, "inline blip has no anchor here, rendering as a reply");
            view.replies.push(thread);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;
    use proptest::prelude::*;
    use serde_json::{json, Value};

    fn wavelet_from(blips: Value, read: Value) -> (Wavelet, Session) {
        let snapshot = Snapshot::from_value(json!({
            "isPublic": false,
            "rwPermission": "rw",
            "wavelet": {"waveletData": {"rootBlipId": "root", "title": "t"}, "blips": blips},
            "readblips": read,
        }))
        .unwrap();
        Wavelet::from_snapshot(snapshot, &ViewerConfig::default())
    }

    fn texts(pieces: &[ContentPiece]) -> Vec<&str> {
        pieces.iter().filter_map(ContentPiece::paragraph_text).collect()
    }

    fn tree() -> Value {
        json!({
            "root": {
                "content": "\nHello world\nsecond line",
                "elements": {
                    "0": {"type": "LINE", "properties": {}},
                    "6": {"type": "INLINE_BLIP", "properties": {"id": "inl"}},
                    "12": {"type": "LINE", "properties": {"lineType": "li", "indent": "1"}}
                },
                "childBlipIds": ["first", "inl", "second"],
                "parentBlipId": null
            },
            "first": {"content": "\nreply one", "elements": {"0": {"type": "LINE"}}, "parentBlipId": "root"},
            "inl": {"content": "\ninline", "elements": {"0": {"type": "LINE"}}, "parentBlipId": "root",
                    "childBlipIds": ["deep"]},
            "deep": {"content": "\ndeep", "parentBlipId": "inl"},
            "second": {"content": "\nreply two", "parentBlipId": "root"}
        })
    }

    #[test]
    fn text_without_elements_is_one_fragment() {
        let (w, _) = wavelet_from(json!({"root": {"content": "plain text"}}), json!([]));
        let pieces = w.blip("root").unwrap().layout(14);
        assert_eq!(texts(&pieces), vec!["plain text"]);
        assert_eq!(pieces.len(), 1);
    }

    #[test]
    fn layout_splits_at_offsets_in_document_order() {
        let (w, _) = wavelet_from(tree(), json!([]));
        let pieces = w.blip("root").unwrap().layout(14);
        assert_eq!(texts(&pieces), vec!["\nHello", " world", "\nsecond line"]);
        assert_eq!(pieces[1], ContentPiece::InlineMarker);
        assert_eq!(pieces[2], ContentPiece::InlineSlot { blip_id: "inl".into(), thread: None });
        match &pieces[4] {
            ContentPiece::Paragraph { class, style, .. } => {
                assert_eq!(class, "blip-text-li");
                assert_eq!(style, "margin-left: 14px;");
            }
            other => panic!("unexpected piece {other:?}"),
        }
    }

    #[test]
    fn leading_text_before_first_element_is_kept() {
        let (w, _) = wavelet_from(
            json!({"root": {"content": "abcdef", "elements": {"3": {"type": "GADGET"}}}}),
            json!([]),
        );
        let pieces = w.blip("root").unwrap().layout(14);
        assert_eq!(texts(&pieces), vec!["abc", "def"]);
        assert_eq!(pieces[1], ContentPiece::GadgetPlaceholder);
    }

    #[test]
    fn offsets_clamp_to_text() {
        let (w, _) = wavelet_from(
            json!({"root": {"content": "héllo", "elements": {"2": {"type": "LINE"}, "40": {"type": "LINE"}}}}),
            json!([]),
        );
        let pieces = w.blip("root").unwrap().layout(14);
        assert_eq!(texts(&pieces), vec!["hé", "llo", ""]);
    }

    #[test]
    fn offsets_count_utf16_units() {
        let (w, _) = wavelet_from(
            json!({"root": {"content": "😀\nab😀\ncd", "elements": {
                "2": {"type": "LINE", "properties": {"lineType": "h2"}},
                "7": {"type": "LINE", "properties": {"lineType": "li"}}
            }}}),
            json!([]),
        );
        let pieces = w.blip("root").unwrap().layout(14);
        assert_eq!(texts(&pieces), vec!["😀", "\nab😀", "\ncd"]);
        match &pieces[2] {
            ContentPiece::Paragraph { class, .. } => assert_eq!(class, "blip-text-li"),
            other => panic!("unexpected piece {other:?}"),
        }
    }

    #[test]
    fn offset_inside_surrogate_pair_moves_past_it() {
        let (w, _) = wavelet_from(
            json!({"root": {"content": "😀\nab", "elements": {"1": {"type": "LINE"}}}}),
            json!([]),
        );
        let pieces = w.blip("root").unwrap().layout(14);
        assert_eq!(texts(&pieces), vec!["😀", "\nab"]);
    }

    #[test]
    fn only_root_first_paragraph_is_emphasized() {
        let (w, _) = wavelet_from(tree(), json!([]));
        let emphasized = |id: &str| -> Vec<bool> {
            w.blip(id)
                .unwrap()
                .layout(14)
                .iter()
                .filter_map(|p| match p {
                    ContentPiece::Paragraph { emphasized, .. } => Some(*emphasized),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(emphasized("root"), vec![true, false, false]);
        assert_eq!(emphasized("first"), vec![false]);
    }

    #[test]
    fn root_emphasis_skips_leading_inline_marker() {
        let (w, _) = wavelet_from(
            json!({
                "root": {"content": "ab", "elements": {"0": {"type": "INLINE_BLIP", "properties": {"id": "c"}}},
                         "childBlipIds": ["c"]},
                "c": {"content": "x", "parentBlipId": "root"}
            }),
            json!([]),
        );
        let pieces = w.blip("root").unwrap().layout(14);
        assert_eq!(pieces[0], ContentPiece::InlineMarker);
        assert!(matches!(&pieces[1], ContentPiece::InlineSlot { blip_id, .. } if blip_id == "c"));
        assert!(matches!(&pieces[2], ContentPiece::Paragraph { text, emphasized: true, .. } if text == "ab"));
        assert_eq!(pieces.len(), 3);
    }

    #[test]
    fn inline_position_comes_from_parent_anchor() {
        let (w, _) = wavelet_from(tree(), json!([]));
        let inl = w.blip("inl").unwrap();
        assert!(inl.is_inline());
        assert_eq!(inl.inline_position(), Some(6));

        let first = w.blip("first").unwrap();
        assert!(!first.is_inline());
        assert_eq!(first.inline_position(), None);

        assert!(!w.blip("root").unwrap().is_inline());
    }

    #[test]
    fn lowest_offset_wins_when_claimed_twice() {
        let (w, _) = wavelet_from(
            json!({
                "root": {"content": "0123456789", "elements": {
                    "7": {"type": "INLINE_BLIP", "properties": {"id": "c"}},
                    "2": {"type": "INLINE_BLIP", "properties": {"id": "c"}}
                }, "childBlipIds": ["c"]},
                "c": {"content": "x", "parentBlipId": "root"}
            }),
            json!([]),
        );
        assert_eq!(w.blip("c").unwrap().inline_position(), Some(2));
    }

    #[test]
    fn thread_places_inline_children_in_slots_and_orders_replies() {
        let (w, mut session) = wavelet_from(tree(), json!(["root", "first"]));
        let config = ViewerConfig::default();
        let mut ctx = RenderContext::new(&config, &mut session);
        let view = w.blip("root").unwrap().render_thread(false, &mut ctx);

        let reply_ids: Vec<&str> = view.replies.iter().map(|r| r.blip_id.as_str()).collect();
        assert_eq!(reply_ids, vec!["second", "first"]);
        assert!(view.replies[0].sub_reply);
        assert!(!view.replies[1].sub_reply);

        let slot = view
            .content
            .iter()
            .find_map(|p| match p {
                ContentPiece::InlineSlot { thread: Some(t), .. } => Some(t),
                _ => None,
            })
            .expect("inline slot filled");
        assert_eq!(slot.blip_id, "inl");
        assert!(slot.sub_reply);
        assert_eq!(slot.replies[0].blip_id, "deep");

        // inl, deep and second are unread
        assert_eq!(session.unread_count(), 3);
    }

    #[test]
    fn inline_first_child_fills_slot_and_rest_are_replies() {
        let (w, mut session) = wavelet_from(
            json!({
                "root": {"content": "0123", "elements": {"2": {"type": "INLINE_BLIP", "properties": {"id": "c"}}},
                         "childBlipIds": ["c", "r"]},
                "c": {"content": "inline", "parentBlipId": "root"},
                "r": {"content": "reply", "parentBlipId": "root"}
            }),
            json!([]),
        );
        let config = ViewerConfig::default();
        let mut ctx = RenderContext::new(&config, &mut session);
        let view = w.blip("root").unwrap().render_thread(false, &mut ctx);

        let reply_ids: Vec<&str> = view.replies.iter().map(|r| r.blip_id.as_str()).collect();
        assert_eq!(reply_ids, vec!["r"]);
        assert!(view.replies[0].sub_reply);
        let inline = view
            .content
            .iter()
            .find_map(|p| match p {
                ContentPiece::InlineSlot { thread: Some(t), .. } => Some(t),
                _ => None,
            })
            .expect("inline slot filled");
        assert_eq!(inline.blip_id, "c");
        assert!(inline.sub_reply);
    }

    #[test]
    fn cyclic_children_are_rendered_once() {
        let (w, mut session) = wavelet_from(
            json!({
                "root": {"content": "r", "childBlipIds": ["root", "a"]},
                "a": {"content": "a", "parentBlipId": "root", "childBlipIds": ["a", "root"]}
            }),
            json!([]),
        );
        let config = ViewerConfig::default();
        let mut ctx = RenderContext::new(&config, &mut session);
        let view = w.blip("root").unwrap().render_thread(false, &mut ctx);

        assert_eq!(view.replies.len(), 1);
        assert_eq!(view.replies[0].blip_id, "a");
        assert!(view.replies[0].replies.is_empty());
        assert_eq!(session.unread_count(), 2);
    }

    #[test]
    fn missing_children_are_skipped() {
        let (w, mut session) = wavelet_from(
            json!({"root": {"content": "r", "childBlipIds": ["ghost", "real"]}, "real": {"content": "x", "parentBlipId": "root"}}),
            json!([]),
        );
        let config = ViewerConfig::default();
        let mut ctx = RenderContext::new(&config, &mut session);
        let view = w.blip("root").unwrap().render_thread(false, &mut ctx);
        assert_eq!(view.replies.len(), 1);
        assert_eq!(view.replies[0].blip_id, "real");
        assert!(!view.replies[0].sub_reply);
    }

    #[test]
    fn unread_blip_counts_once_unless_read_or_public() {
        let blips = json!({"root": {"content": "r"}});

        let (w, mut session) = wavelet_from(blips.clone(), json!([]));
        let config = ViewerConfig::default();
        let view = w.blip("root").unwrap().render(false, &mut RenderContext::new(&config, &mut session));
        assert_eq!(session.unread_count(), 1);
        assert!(!view.read);
        assert!(view.can_mark_read);

        let (w, mut session) = wavelet_from(blips.clone(), json!(["root"]));
        w.blip("root").unwrap().render(false, &mut RenderContext::new(&config, &mut session));
        assert_eq!(session.unread_count(), 0);

        let (w, _) = wavelet_from(blips, json!([]));
        let mut public = Session::new(true, None);
        let view = w.blip("root").unwrap().render(false, &mut RenderContext::new(&config, &mut public));
        assert_eq!(public.unread_count(), 0);
        assert!(view.read);
        assert!(!view.can_reply);
    }

    proptest! {
        #[test]
        fn fragments_reconstruct_text(
            text in "[a-zé😀𝄞\\n ]{0,40}",
            offsets in proptest::collection::btree_set(0usize..80, 0..8),
        ) {
            let len = text.encode_utf16().count();
            let elements: serde_json::Map<String, Value> = offsets
                .iter()
                .filter(|o| **o <= len)
                .map(|o| (o.to_string(), json!({"type": "LINE"})))
                .collect();
            let (w, _) = wavelet_from(json!({"root": {"content": text.clone(), "elements": elements}}), json!([]));
            let pieces = w.blip("root").unwrap().layout(14);
            prop_assert_eq!(texts(&pieces).concat(), text);
        }
    }
}
