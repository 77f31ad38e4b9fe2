// User-visible notifications emitted by list controllers
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::database::models::{capitalized, Orderable};
use crate::types::Mutation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Transient toast shown after a mutation settles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    /// "Failed to save stop", "Failed to reorder FAQs"
    pub fn failed<T: Orderable>(mutation: Mutation) -> Self {
        let noun = match mutation {
            Mutation::Reorder | Mutation::Refresh => T::PLURAL,
            _ => T::LABEL,
        };
        Self::error(format!("Failed to {} {}", mutation.verb(), noun))
    }

    /// "Stop created", "FAQ deleted", "Section published"
    pub fn succeeded<T: Orderable>(outcome: &str) -> Self {
        Self::success(format!("{} {}", capitalized(T::LABEL), outcome))
    }

    pub fn is_error(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

/// Sink for notices; the controller never blocks on it
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => tracing::info!(notice = %notice.message),
            NoticeLevel::Error => tracing::warn!(notice = %notice.message),
        }
    }
}

/// Keeps every notice in memory; clones share the same log
#[derive(Debug, Default, Clone)]
pub struct NoticeLog {
    notices: Arc<Mutex<Vec<Notice>>>,
}

impl NoticeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all(&self) -> Vec<Notice> {
        self.notices.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn errors(&self) -> Vec<Notice> {
        self.all().into_iter().filter(Notice::is_error).collect()
    }

    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().ok().and_then(|n| n.last().cloned())
    }

    pub fn clear(&self) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.clear();
        }
    }
}

impl Notifier for NoticeLog {
    fn notify(&self, notice: Notice) {
        if let Ok(mut notices) = self.notices.lock() {
            notices.push(notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::{Stop, TourFaq, TourSection};

    #[test]
    fn failure_messages_name_the_entity() {
        assert_eq!(Notice::failed::<Stop>(Mutation::Create).message, "Failed to save stop");
        assert_eq!(Notice::failed::<Stop>(Mutation::Delete).message, "Failed to delete stop");
        assert_eq!(Notice::failed::<TourFaq>(Mutation::Reorder).message, "Failed to reorder FAQs");
        assert_eq!(
            Notice::failed::<TourSection>(Mutation::TogglePublished).message,
            "Failed to update section"
        );
    }

    #[test]
    fn success_messages_are_capitalized() {
        assert_eq!(Notice::succeeded::<TourSection>("published").message, "Section published");
        assert_eq!(Notice::succeeded::<TourFaq>("created").message, "FAQ created");
    }

    #[test]
    fn log_keeps_order() {
        let log = NoticeLog::new();
        log.notify(Notice::success("one"));
        log.notify(Notice::error("two"));

        assert_eq!(log.all().len(), 2);
        assert_eq!(log.errors(), vec![Notice::error("two")]);
        assert_eq!(log.last().map(|n| n.message), Some("two".to_string()));
    }
}
