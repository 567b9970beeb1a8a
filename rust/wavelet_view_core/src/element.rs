//! Positioned content markers inside a blip's text.

use serde_json::{Map, Value};

use crate::snapshot::RawElement;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    /// Line break carrying paragraph style.
    Line,
    /// Anchor of an inline reply; the `id` property names the child blip.
    InlineBlip,
    Gadget,
    Other(String),
}

impl ElementKind {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "LINE" => ElementKind::Line,
            "INLINE_BLIP" => ElementKind::InlineBlip,
            "GADGET" => ElementKind::Gadget,
            other => ElementKind::Other(other.to_string()),
        }
    }
}

/// A borrowed view over one raw element and the offset it sits at.
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    position: usize,
    raw: &'a RawElement,
}

impl<'a> Element<'a> {
    pub fn new(position: usize, raw: &'a RawElement) -> Self {
        Self { position, raw }
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn kind(&self) -> ElementKind {
        ElementKind::parse(&self.raw.kind)
    }

    pub fn properties(&self) -> Option<&'a Map<String, Value>> {
        self.raw.properties.as_ref()
    }

    pub fn property(&self, key: &str) -> Option<&'a Value> {
        self.properties()?.get(key)
    }

    /// String form of a property; numbers and booleans are rendered.
    pub fn property_str(&self, key: &str) -> Option<String> {
        match self.property(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The blip an inline anchor points at.
    pub fn inline_blip_id(&self) -> Option<String> {
        match self.kind() {
            ElementKind::InlineBlip => self.property_str("id"),
            _ => None,
        }
    }

    pub fn css_classes(&self) -> String {
        if self.kind() != ElementKind::Line {
            return String::new();
        }
        match self.property_str("lineType") {
            Some(line_type) => format!("blip-text-{line_type}"),
            None => String::new(),
        }
    }

    pub fn inline_style(&self, indent_px: u32) -> String {
        if self.kind() != ElementKind::Line {
            return String::new();
        }
        let mut style = String::new();
        let indent = self.property_str("indent").and_then(|v| v.trim().parse::<f64>().ok());
        if let Some(level) = indent {
            style.push_str(&format!("margin-left: {}px;", level * f64::from(indent_px)));
        }
        match self.property_str("alignment").as_deref() {
            Some("l") => style.push_str("text-align: left;"),
            Some("c") => style.push_str("text-align: center;"),
            Some("r") => style.push_str("text-align: right;"),
            _ => {}
        }
        style
    }
}
