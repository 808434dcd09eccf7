//! User Feedback Channel
//!
//! Controllers report outcomes through a [`Notifier`]. Notices are
//! fire-and-forget: nothing a notifier does can affect a mutation.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient message for the user (toast, snackbar, status line)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub description: String,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, kind: NoticeKind, title: &str, description: &str);
}

/// Writes notices to the log, for hosts without a UI
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, kind: NoticeKind, title: &str, description: &str) {
        match kind {
            NoticeKind::Success => log::info!("{}: {}", title, description),
            NoticeKind::Error => log::error!("{}: {}", title, description),
        }
    }
}

/// Forwards notices to a receiver the UI drains
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: mpsc::UnboundedSender<Notice>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn notify(&self, kind: NoticeKind, title: &str, description: &str) {
        let notice = Notice {
            kind,
            title: title.to_string(),
            description: description.to_string(),
        };
        // A closed receiver just means nobody is showing toasts anymore
        let _ = self.tx.send(notice);
    }
}
