//! User-visible, non-fatal notices

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    PlacementRejected,
    AssetLoadFailed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    /// Seconds since the notice was raised
    pub age: f32,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Notices shown as toasts until they exceed `lifetime` seconds
#[derive(Debug)]
pub struct NoticeBoard {
    notices: Vec<Notice>,
    lifetime: f32,
}

impl NoticeBoard {
    pub fn new(lifetime: f32) -> Self {
        Self {
            notices: Vec::new(),
            lifetime,
        }
    }

    pub fn push(&mut self, kind: NoticeKind, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.notices.push(Notice {
            kind,
            message,
            age: 0.0,
        });
    }

    /// Ages every notice and drops the expired ones
    pub fn advance(&mut self, dt: f32) {
        let lifetime = self.lifetime;
        self.notices.retain_mut(|notice| {
            notice.age += dt;
            notice.age < lifetime
        });
    }

    pub fn active(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn count(&self, kind: NoticeKind) -> usize {
        self.notices.iter().filter(|n| n.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notices_expire_after_lifetime() {
        let mut board = NoticeBoard::new(3.0);
        board.push(NoticeKind::PlacementRejected, "blocked");
        board.advance(2.0);
        board.push(NoticeKind::AssetLoadFailed, "no model");
        assert_eq!(board.active().len(), 2);

        board.advance(1.5);
        assert_eq!(board.active().len(), 1);
        assert_eq!(board.count(NoticeKind::AssetLoadFailed), 1);
        assert_eq!(board.drain()[0].to_string(), "no model");
        assert!(board.active().is_empty());
    }
}
