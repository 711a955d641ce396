//! Narrow interfaces to the outside world: system notifications and audio
//! cues. Delivery lives with the host application; the engine only calls
//! these traits.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationCategory {
    BlockStarted,
    BlockPaused,
    BlockFinished,
    RestStarted,
    RestFinished,
    Reminder,
}

/// Buttons a notification may offer; routed back through
/// [`BlockEngine::handle_notification_action`](crate::BlockEngine::handle_notification_action).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationAction {
    SkipRest,
    PauseBlock,
    ResumeBlock,
    SkipBlock,
    DismissReminder,
}

impl NotificationCategory {
    pub fn actions(self) -> Vec<NotificationAction> {
        match self {
            NotificationCategory::BlockStarted => {
                vec![NotificationAction::PauseBlock, NotificationAction::SkipBlock]
            }
            NotificationCategory::BlockPaused => vec![NotificationAction::ResumeBlock],
            NotificationCategory::RestStarted => vec![NotificationAction::SkipRest],
            NotificationCategory::Reminder => vec![NotificationAction::DismissReminder],
            NotificationCategory::BlockFinished | NotificationCategory::RestFinished => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
    pub actions: Vec<NotificationAction>,
}

impl Notification {
    pub fn new(title: impl Into<String>, body: impl Into<String>, category: NotificationCategory) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            category,
            actions: category.actions(),
        }
    }
}

/// Fire-and-forget notification delivery.
pub trait Notifier: Send {
    fn send(&self, notification: Notification);
    fn cancel_pending(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cue {
    /// Block start.
    Windup,
    /// Block end and audible reminders.
    Ding,
}

/// Audio playback. Volumes are in `[0, 2]`.
pub trait AudioCues: Send {
    fn play(&self, cue: Cue, volume: f64);
    /// Start the in-progress ticking loop.
    fn start_loop(&self, volume: f64);
    fn stop_loop(&self);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl Notifier for NullSink {
    fn send(&self, _notification: Notification) {}
    fn cancel_pending(&self) {}
}

impl AudioCues for NullSink {
    fn play(&self, _cue: Cue, _volume: f64) {}
    fn start_loop(&self, _volume: f64) {}
    fn stop_loop(&self) {}
}

/// Writes notifications and cues to the `tracing` log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl Notifier for LogSink {
    fn send(&self, notification: Notification) {
        tracing::info!(
            category = ?notification.category,
            title = %notification.title,
            body = %notification.body,
            "notification"
        );
    }

    fn cancel_pending(&self) {
        tracing::debug!("pending notifications cancelled");
    }
}

impl AudioCues for LogSink {
    fn play(&self, cue: Cue, volume: f64) {
        tracing::debug!(?cue, volume, "play cue");
    }

    fn start_loop(&self, volume: f64) {
        tracing::debug!(volume, "ticking loop started");
    }

    fn stop_loop(&self) {
        tracing::debug!("ticking loop stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reminder_notification_offers_dismiss() {
        let n = Notification::new("Focus", "Stretch", NotificationCategory::Reminder);
        assert_eq!(n.actions, vec![NotificationAction::DismissReminder]);
    }

    #[test]
    fn finished_notification_has_no_actions() {
        let n = Notification::new("Done", "", NotificationCategory::BlockFinished);
        assert!(n.actions.is_empty());
    }
}
