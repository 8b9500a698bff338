//! Notification system for rip status updates.
//!
//! Push notifications are delivered through ntfy.sh when a topic is configured.
mod abstraction;
mod ntfy;

pub use abstraction::{NotificationSender, NotificationType, NullNotificationSender};
pub use ntfy::NtfyNotificationSender;
