// ============================================================================
// discprep-core/src/notifications/ntfy.rs
// ============================================================================
//
// NTFY IMPLEMENTATION: Notification Delivery Using ntfy.sh
//
// The topic is configured as a single URL ("https://ntfy.sh/my-topic"); the
// host part becomes the dispatcher base URL and the path the topic.

use crate::error::{CoreError, CoreResult};
use crate::notifications::{NotificationSender, NotificationType};

use ntfy::DispatcherBuilder;
use ntfy::payload::{Payload, Priority as NtfyPriority};

/// Sends notifications to an ntfy server.
///
/// # Examples
///
/// ```rust,no_run
/// use discprep_core::notifications::{NotificationSender, NotificationType, NtfyNotificationSender};
///
/// let sender = NtfyNotificationSender::new("https://ntfy.sh/your_topic").unwrap();
/// let notification = NotificationType::RipFailed {
///     subject: "HEAT".to_string(),
///     message: "Disc read error".to_string(),
/// };
/// sender.send_notification(&notification).unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct NtfyNotificationSender {
    base_url: String,
    topic: String,
}

impl NtfyNotificationSender {
    /// Creates a sender for a topic URL.
    ///
    /// # Arguments
    ///
    /// * `topic_url` - Full topic URL, e.g. "https://ntfy.sh/your_topic"
    ///
    /// # Returns
    ///
    /// * `Ok(NtfyNotificationSender)` - A sender for the topic
    /// * `Err(CoreError::NotificationError)` - If the URL is not https or lacks a host or topic
    pub fn new(topic_url: &str) -> CoreResult<Self> {
        let (base_url, topic) = split_topic_url(topic_url)?;
        Ok(Self { base_url, topic })
    }
}

fn split_topic_url(topic_url: &str) -> CoreResult<(String, String)> {
    let after_scheme = topic_url.strip_prefix("https://").ok_or_else(|| {
        CoreError::NotificationError(format!(
            "Invalid ntfy topic URL '{}': must start with https://",
            topic_url
        ))
    })?;

    let (host, topic) = after_scheme.split_once('/').unwrap_or((after_scheme, ""));
    if host.is_empty() {
        return Err(CoreError::NotificationError(format!(
            "URL '{}' must have a non-empty host",
            topic_url
        )));
    }
    let topic = topic.trim_end_matches('/');
    if topic.is_empty() {
        return Err(CoreError::NotificationError(format!(
            "URL '{}' is missing topic path",
            topic_url
        )));
    }

    Ok((format!("https://{}", host), topic.to_string()))
}

impl NotificationSender for NtfyNotificationSender {
    fn send_notification(&self, notification: &NotificationType) -> CoreResult<()> {
        let dispatcher = DispatcherBuilder::new(&self.base_url)
            .build_blocking()
            .map_err(|e| {
                CoreError::NotificationError(format!(
                    "Failed to build ntfy dispatcher for {}: {}",
                    self.base_url, e
                ))
            })?;

        let priority = map_priority(notification.get_priority()).unwrap_or_else(|| {
            log::warn!(
                "Invalid ntfy priority value provided: {}",
                notification.get_priority()
            );
            NtfyPriority::Default
        });

        let tags = vec!["discprep".to_string(), notification.tag().to_string()];

        let payload = Payload::new(&self.topic)
            .message(notification.get_message())
            .title(notification.get_title())
            .priority(priority)
            .tags(tags);

        dispatcher.send(&payload).map_err(|e| {
            CoreError::NotificationError(format!(
                "Failed to send ntfy notification to {}/{}: {}",
                self.base_url, self.topic, e
            ))
        })?;
        log::debug!("Sent notification: {}", notification.get_title());
        Ok(())
    }
}

/// Maps a numeric priority (1-5) to the ntfy priority.
fn map_priority(p: u8) -> Option<NtfyPriority> {
    match p {
        1 => Some(NtfyPriority::Min),
        2 => Some(NtfyPriority::Low),
        3 => Some(NtfyPriority::Default),
        4 => Some(NtfyPriority::High),
        5 => Some(NtfyPriority::Max),
        _ => None,
    }
}
