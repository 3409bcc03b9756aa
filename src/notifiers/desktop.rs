//! Desktop notification target.
//!
//! Sends system notifications using the platform's native notification system.

use crate::error::BridgeError;
use crate::notifiers::{Notification, Notifier};
use async_trait::async_trait;
use notify_rust::Timeout;

/// Notifier for the local desktop.
pub struct DesktopNotifier;

#[async_trait]
impl Notifier for DesktopNotifier {
    fn notifier_type(&self) -> &str {
        "desktop"
    }

    async fn show(&self, notification: &Notification) -> crate::error::Result<()> {
        let mut desktop = notify_rust::Notification::new();
        desktop
            .appname("Kodi")
            .summary(&notification.title)
            .body(notification.body.as_deref().unwrap_or(""))
            .timeout(Timeout::Milliseconds(notification.duration_ms));

        if let Some(icon) = &notification.icon {
            desktop.icon(icon);
        }

        desktop
            .show()
            .map_err(|e| BridgeError::SendFailed(format!("Failed to send desktop notification: {}", e)))?;

        Ok(())
    }
}
