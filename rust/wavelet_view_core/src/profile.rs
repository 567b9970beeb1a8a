//! Participant display names and avatars.

use std::collections::HashMap;

use crate::config::ServiceIdentity;
use crate::session::Session;
use crate::snapshot::RawProfile;

/// The shape a participant id takes, checked in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum IdShape<'a> {
    /// The robot's own account.
    Service,
    /// `<ident>+<name>.<encoded public email>@<domain>`: an anonymous public reply.
    PublicProxy { name: &'a str },
    /// `<ident>+<encoded address>@<domain>`: someone replying by email.
    EmailProxy { encoded: &'a str },
    Other,
}

#[derive(Debug, Clone, Default)]
pub struct Profiles {
    identity: ServiceIdentity,
    table: HashMap<String, RawProfile>,
}

impl Profiles {
    pub fn new(identity: ServiceIdentity, table: HashMap<String, RawProfile>) -> Self {
        Self { identity, table }
    }

    fn shape<'a>(&self, id: &'a str) -> IdShape<'a> {
        if id == self.identity.robot_email() {
            return IdShape::Service;
        }
        let Some(rest) = id.strip_prefix(&self.identity.proxy_prefix()) else {
            return IdShape::Other;
        };
        let public_marker = format!(".{}", self.identity.encoded_public_email());
        if let Some(pos) = rest.find(&public_marker) {
            return IdShape::PublicProxy { name: &rest[..pos] };
        }
        match rest.strip_suffix(&self.identity.proxy_suffix()) {
            Some(encoded) => IdShape::EmailProxy { encoded },
            None => IdShape::Other,
        }
    }

    pub fn display_name(&self, id: &str, session: &Session) -> String {
        let via = &self.identity.display_name;
        match self.shape(id) {
            IdShape::Service => via.clone(),
            IdShape::PublicProxy { name } => format!("{name}(via {via} Public)"),
            IdShape::EmailProxy { encoded } => {
                let address = encoded.replacen(&self.identity.proxy_at_token, "@", 1);
                let shown = session.mask_if_public(&address, &self.identity.proxy_at_token);
                format!("{shown}(via {via})")
            }
            IdShape::Other => self
                .table
                .get(id)
                .and_then(|p| p.display_name.clone())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| id.to_string()),
        }
    }

    pub fn avatar_url(&self, id: &str) -> String {
        let media = |file: &str| self.identity.media_url(file);
        match self.shape(id) {
            IdShape::Service => media("icon.png"),
            IdShape::PublicProxy { .. } => media("icon_public.png"),
            IdShape::EmailProxy { .. } => media("icon_proxyfor.png"),
            IdShape::Other => self
                .table
                .get(id)
                .and_then(|p| p.thumb_url.clone())
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| media("icon_waver.png")),
        }
    }

    /// `"<display name> (<masked id>)"`, used for avatar tooltips.
    pub fn display_name_and_raw(&self, id: &str, session: &Session) -> String {
        format!(
            "{} ({})",
            self.display_name(id, session),
            session.mask_if_public(id, &self.identity.proxy_at_token)
        )
    }

    /// Display names joined by `", "`. A non-zero `max_len` truncates the
    /// result to `max_len - 3` characters followed by `...`.
    pub fn participants_to_string(&self, ids: &[String], max_len: usize, session: &Session) -> String {
        let joined = ids
            .iter()
            .map(|id| self.display_name(id, session))
            .collect::<Vec<_>>()
            .join(", ");
        if max_len > 0 && joined.chars().count() > max_len {
            let kept: String = joined.chars().take(max_len.saturating_sub(3)).collect();
            format!("{kept}...")
        } else {
            joined
        }
    }
}
