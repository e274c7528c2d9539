use std::time::{Duration, Instant};

use serde::Serialize;

/// How long a notice stays visible
pub const NOTICE_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Transient message for the user (e.g., "Setup published")
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    pub at: Instant,
}

impl Notice {
    pub fn new(text: impl Into<String>, kind: NoticeKind) -> Self {
        Self {
            text: text.into(),
            kind,
            at: Instant::now(),
        }
    }

    pub fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.at) < NOTICE_TTL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expires_after_ttl() {
        let notice = Notice::new("Saved", NoticeKind::Success);
        assert!(notice.is_live(notice.at));
        assert!(notice.is_live(notice.at + Duration::from_millis(2999)));
        assert!(!notice.is_live(notice.at + NOTICE_TTL));
    }
}
