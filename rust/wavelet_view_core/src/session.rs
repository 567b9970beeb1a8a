//! The viewer's session: visibility, permissions and the unread counter.

/// Permission marker the server sends for viewers allowed to reply.
pub const READ_WRITE: &str = "rw";

/// What replaces the masked part of an address.
const MASK: &str = "******";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    public: bool,
    read_write: bool,
    unread: u32,
}

impl Session {
    pub fn new(public: bool, rw_permission: Option<&str>) -> Self {
        Self { public, read_write: rw_permission == Some(READ_WRITE), unread: 0 }
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Only the explicit read-write marker grants write access.
    pub fn can_write(&self) -> bool {
        self.read_write
    }

    pub fn increment_unread(&mut self, qty: u32) {
        self.unread = self.unread.saturating_add(qty);
    }

    /// Clamped at zero.
    pub fn decrement_unread(&mut self, qty: u32) {
        self.unread = self.unread.saturating_sub(qty);
    }

    pub fn unread_count(&self) -> u32 {
        self.unread
    }

    /// Masks `email` when the session is public, otherwise returns it as is.
    pub fn mask_if_public(&self, email: &str, proxy_at_token: &str) -> String {
        if self.public {
            mask_email(email, proxy_at_token)
        } else {
            email.to_string()
        }
    }
}

/// `user@example.com` becomes `user@******.com`. An address that is
/// proxy-encoded (`user<token>example.com`) is masked the same way, with the
/// token turned back into `@`.
pub fn mask_email(email: &str, proxy_at_token: &str) -> String {
    let mut masked = email.to_string();

    if let (Some(at), Some(dot)) = (masked.rfind('@'), masked.rfind('.')) {
        if dot > at {
            masked = format!("{}{}{}", &masked[..=at], MASK, &masked[dot..]);
        }
    }

    if !proxy_at_token.is_empty() {
        if let Some(token) = masked.find(proxy_at_token) {
            if let Some(rel_dot) = masked[token..].find('.') {
                let dot = token + rel_dot;
                masked = format!("{}@{}{}", &masked[..token], MASK, &masked[dot..]);
            }
        }
    }

    masked
}

/// Unread count as shown next to the page title.
pub fn friendly_unread_count(count: u32) -> String {
    match count {
        0 => String::new(),
        n if n >= 100 => " (99+)".to_string(),
        n => format!(" ({n})"),
    }
}
