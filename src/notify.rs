//! Short-lived confirmation and error notifications ("toasts").

use std::time::Duration;

/// Default time a notification stays visible.
pub const DEFAULT_NOTIFICATION_MS: u64 = 2500;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A visible notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub kind: NotificationKind,
    /// Increases with every notification shown
    pub generation: u64,
}

impl Notification {
    pub fn is_error(&self) -> bool {
        self.kind == NotificationKind::Error
    }
}

/// Dismissal the caller must schedule after showing a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DismissTicket {
    pub generation: u64,
    pub delay: Duration,
}

/// Holds the single visible notification. A new one replaces the old one
/// immediately; the old dismissal timer then finds a newer generation and
/// leaves it alone.
#[derive(Debug, Clone)]
pub struct Notifier {
    current: Option<Notification>,
    next_generation: u64,
    duration: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_NOTIFICATION_MS))
    }
}

impl Notifier {
    pub fn new(duration: Duration) -> Self {
        Self {
            current: None,
            next_generation: 1,
            duration,
        }
    }

    /// The visible notification, if any.
    pub fn current(&self) -> Option<&Notification> {
        self.current.as_ref()
    }

    pub fn show(&mut self, message: impl Into<String>, kind: NotificationKind) -> DismissTicket {
        let generation = self.next_generation;
        self.next_generation += 1;
        let message = message.into();
        match kind {
            NotificationKind::Success => log::info!("{}", message),
            NotificationKind::Error => log::warn!("{}", message),
        }
        self.current = Some(Notification {
            message,
            kind,
            generation,
        });
        DismissTicket {
            generation,
            delay: self.duration,
        }
    }

    pub fn success(&mut self, message: impl Into<String>) -> DismissTicket {
        self.show(message, NotificationKind::Success)
    }

    pub fn error(&mut self, message: impl Into<String>) -> DismissTicket {
        self.show(message, NotificationKind::Error)
    }

    /// Dismiss the notification of `generation`. Returns `true` if it was
    /// still the visible one.
    pub fn dismiss(&mut self, generation: u64) -> bool {
        match &self.current {
            Some(n) if n.generation == generation => {
                self.current = None;
                true
            }
            _ => false,
        }
    }
}
