// ============================================================================
// discprep-core/src/notifications/abstraction.rs
// ============================================================================
//
// NOTIFICATION ABSTRACTION: Notification Types and Sender Trait
//
// KEY COMPONENTS:
// - NotificationType: The events a rip reports
// - NotificationSender: Trait implemented by delivery backends
// - NullNotificationSender: No-op backend used when no topic is configured

use std::path::PathBuf;
use std::time::Duration;

use crate::error::CoreResult;

// ============================================================================
// NOTIFICATION TYPES
// ============================================================================

/// Events worth a push notification.
#[derive(Debug, Clone)]
pub enum NotificationType {
    /// The layout is published and waits for a reviewer
    AwaitingReview {
        /// "Title (Year)"
        movie: String,
        /// Where the reviewer can edit the layout, when known
        review_url: Option<String>,
    },

    /// All enabled titles were transcoded into the library
    RipComplete {
        movie: String,
        output_dir: PathBuf,
        titles: usize,
        duration: Duration,
    },

    /// The pipeline stopped with an error
    RipFailed {
        /// Volume label or movie name
        subject: String,
        message: String,
    },
}

impl NotificationType {
    /// Gets the title for this notification type.
    pub fn get_title(&self) -> String {
        match self {
            NotificationType::AwaitingReview { .. } => "Awaiting Review".to_string(),
            NotificationType::RipComplete { .. } => "Rip Complete".to_string(),
            NotificationType::RipFailed { .. } => "Rip Failed".to_string(),
        }
    }

    /// Gets the message body for this notification type.
    pub fn get_message(&self) -> String {
        match self {
            NotificationType::AwaitingReview { movie, review_url } => match review_url {
                Some(url) => format!("{} is waiting for review: {}", movie, url),
                None => format!("{} is waiting for review", movie),
            },
            NotificationType::RipComplete {
                movie,
                output_dir,
                titles,
                duration,
            } => {
                let secs = duration.as_secs();
                let elapsed = if secs >= 3600 {
                    format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
                } else {
                    format!("{}m {}s", secs / 60, secs % 60)
                };
                format!(
                    "{} is ready in your library ({} title(s), {}) at {}",
                    movie,
                    titles,
                    elapsed,
                    output_dir.display()
                )
            }
            NotificationType::RipFailed { subject, message } => {
                format!("{} failed: {}", subject, message)
            }
        }
    }

    /// Gets the priority level (1-5, with 5 being highest).
    pub fn get_priority(&self) -> u8 {
        match self {
            NotificationType::AwaitingReview { .. } => 3,
            NotificationType::RipComplete { .. } => 4,
            NotificationType::RipFailed { .. } => 5,
        }
    }

    /// ntfy tag for this event.
    pub fn tag(&self) -> &'static str {
        match self {
            NotificationType::AwaitingReview { .. } => "review",
            NotificationType::RipComplete { .. } => "complete",
            NotificationType::RipFailed { .. } => "error",
        }
    }
}

// ============================================================================
// NOTIFICATION SENDER
// ============================================================================

/// Delivers notifications to some backend.
pub trait NotificationSender {
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()>;
}

/// No-op sender for runs without a notification topic.
#[derive(Debug, Clone, Default)]
pub struct NullNotificationSender;

impl NotificationSender for NullNotificationSender {
    fn send_notification(&self, _notification: &NotificationType) -> CoreResult<()> {
        Ok(())
    }
}
