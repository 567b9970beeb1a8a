//! HTML export of a render plan.

use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

use crate::config::ServiceIdentity;
use crate::plan::{BlipView, ContentPiece, ParticipantBadge};

const GADGET_NOTICE: &str = "Gadget support available in an upcoming release";

pub fn thread_to_html(view: &BlipView, identity: &ServiceIdentity) -> String {
    let mut out = String::new();
    push_blip(&mut out, view, identity);
    out
}

fn push_blip(out: &mut String, view: &BlipView, identity: &ServiceIdentity) {
    let id = attr(&view.blip_id);
    let structure_class = if view.sub_reply { " class=\"subreply\"" } else { "" };
    out.push_str(&format!("<div id=\"blip-children-container-{id}\"{structure_class}>\n"));
    let mark_read = if view.can_mark_read { " data-mark-read=\"true\"" } else { "" };
    out.push_str(&format!("<div id=\"blip-container-{id}\" class=\"blipcontainer\"{mark_read}>\n"));
    out.push_str("<table class=\"bliptable\">\n<tr>");

    if view.read {
        out.push_str(&format!(
            "<td rowspan=\"2\" class=\"readstatus blipIsRead\" id=\"blip-readstatus{id}\" style=\"visibility: hidden;\">&nbsp;</td>"
        ));
    } else {
        out.push_str(&format!("<td rowspan=\"2\" class=\"readstatus\" id=\"blip-readstatus{id}\">&nbsp;</td>"));
    }
    if view.can_reply {
        out.push_str(&format!(
            "<td rowspan=\"2\"><button id=\"reply-button-{id}\" class=\"ui-state-default ui-corner-all reply-button\">reply</button></td>"
        ));
    }
    out.push_str(&format!(
        "<td id=\"blip-contributor-{id}\" class=\"blipcontributors\" title=\"{}\">{}</td>",
        attr(&view.contributors_full),
        text(&view.contributors)
    ));
    out.push_str(&format!(
        "<td id=\"blip-last-edited-{id}\" class=\"bliplastedited\">{}</td>",
        text(&view.last_edited)
    ));
    out.push_str("</tr>\n<tr>");
    out.push_str(&format!("<td id=\"blip-content-{id}\" colspan=\"2\" class=\"blipcontent\">\n"));
    for piece in &view.content {
        push_piece(out, piece, identity);
    }
    out.push_str("</td></tr>\n</table>\n</div>\n");

    for reply in &view.replies {
        push_blip(out, reply, identity);
    }
    out.push_str("</div>\n");
}

fn push_piece(out: &mut String, piece: &ContentPiece, identity: &ServiceIdentity) {
    match piece {
        ContentPiece::Paragraph { text: body, class, style, emphasized } => {
            let mut style = style.clone();
            if *emphasized {
                style.push_str(" font-weight:bold;");
            }
            out.push_str(&format!(
                "<p class=\"{}\" style=\"{}\">{}</p>\n",
                attr(class),
                attr(style.trim_start()),
                text(body)
            ));
        }
        ContentPiece::InlineMarker => {
            out.push_str(&format!(
                "<img src=\"{}\" class=\"inline-identifier\">\n",
                attr(&identity.media_url("inline.png"))
            ));
        }
        ContentPiece::InlineSlot { blip_id, thread } => {
            out.push_str(&format!("<div id=\"inline-container-{}\" style=\"width: 100%;\">\n", attr(blip_id)));
            if let Some(thread) = thread {
                push_blip(out, thread, identity);
            }
            out.push_str("</div>\n");
        }
        ContentPiece::GadgetPlaceholder => {
            out.push_str(&format!(
                "<div class=\"gadget-container\"><img src=\"{}\"><p>{}</p></div>\n",
                attr(&identity.media_url("gadgetholder.png")),
                text(GADGET_NOTICE)
            ));
        }
    }
}

pub fn participants_to_html(badges: &[ParticipantBadge]) -> String {
    let mut out = String::new();
    for badge in badges {
        out.push_str(&format!(
            "<img id=\"participantImage_{}\" src=\"{}\" alt=\"{label}\" title=\"{label}\" height=\"40\" width=\"40\">\n",
            attr(&badge.id),
            attr(&badge.avatar_url),
            label = attr(&badge.label)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view(id: &str) -> BlipView {
        BlipView {
            blip_id: id.to_string(),
            sub_reply: false,
            read: false,
            can_mark_read: true,
            can_reply: true,
            contributors: "Alice".into(),
            contributors_full: "Alice".into(),
            last_edited: "9:07 5-03-2010".into(),
            content: vec![ContentPiece::Paragraph {
                text: "<b>hi</b>".into(),
                class: "blip-text-h1".into(),
                style: String::new(),
                emphasized: true,
            }],
            replies: Vec::new(),
        }
    }

    #[test]
    fn escapes_text_and_marks_emphasis() {
        let html = thread_to_html(&view("root"), &ServiceIdentity::default());
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains("style=\"font-weight:bold;\""));
        assert!(html.contains("id=\"reply-button-root\""));
        assert!(html.contains("class=\"readstatus\" id=\"blip-readstatusroot\""));
    }

    #[test]
    fn nests_inline_threads_and_indents_sub_replies() {
        let mut inline = view("inl");
        inline.sub_reply = true;
        inline.read = true;
        inline.can_reply = false;
        let mut reply = view("r");
        reply.sub_reply = true;
        let mut root = view("root");
        root.content.push(ContentPiece::InlineMarker);
        root.content.push(ContentPiece::InlineSlot { blip_id: "inl".into(), thread: Some(Box::new(inline)) });
        root.content.push(ContentPiece::GadgetPlaceholder);
        root.replies.push(reply);

        let html = thread_to_html(&root, &ServiceIdentity::default());
        let slot = html.find("id=\"inline-container-inl\"").unwrap();
        let inline_blip = html.find("id=\"blip-children-container-inl\" class=\"subreply\"").unwrap();
        assert!(slot < inline_blip);
        assert!(html.contains("readstatus blipIsRead\" id=\"blip-readstatusinl\""));
        assert!(!html.contains("reply-button-inl"));
        assert!(html.contains("class=\"gadget-container\""));
        assert!(html.contains("id=\"blip-children-container-r\" class=\"subreply\""));
    }

    #[test]
    fn participants_render_as_avatars() {
        let html = participants_to_html(&[ParticipantBadge {
            id: "a@b.c".into(),
            avatar_url: "http://x/y.png".into(),
            label: "A \"quoted\" (a@b.c)".into(),
        }]);
        assert!(html.contains("id=\"participantImage_a@b.c\""));
        assert!(html.contains("alt=\"A &quot;quoted&quot; (a@b.c)\""));
    }
}
