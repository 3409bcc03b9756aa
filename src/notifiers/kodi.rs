//! On-screen notifications inside Kodi.

use crate::error::Result;
use crate::notifiers::{Notification, Notifier};
use crate::rpc::{self, JsonRpc};
use async_trait::async_trait;
use std::sync::Arc;

/// Shows notifications through Kodi's `GUI.ShowNotification`.
pub struct KodiNotifier {
    rpc: Arc<dyn JsonRpc>,
}

impl KodiNotifier {
    pub fn new(rpc: Arc<dyn JsonRpc>) -> Self {
        Self { rpc }
    }
}

#[async_trait]
impl Notifier for KodiNotifier {
    fn notifier_type(&self) -> &str {
        "kodi"
    }

    async fn show(&self, notification: &Notification) -> Result<()> {
        let request = rpc::show_notification(
            &notification.title,
            notification.body.as_deref().unwrap_or(""),
            notification.icon.as_deref(),
            notification.duration_ms,
        );
        self.rpc.call(&request).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::testing::RecordingRpc;
    use serde_json::json;

    #[tokio::test]
    async fn test_show_sends_gui_notification() {
        let rpc = Arc::new(RecordingRpc::default());
        let notifier = KodiNotifier::new(rpc.clone());

        notifier
            .show(&Notification {
                title: "Mail".to_string(),
                body: None,
                duration_ms: 6000,
                icon: Some("/tmp/temp-notification-icon".to_string()),
            })
            .await
            .unwrap();

        let calls = rpc.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0]["method"], "GUI.ShowNotification");
        assert_eq!(
            calls[0]["params"],
            json!({
                "title": "Mail",
                "message": "",
                "image": "/tmp/temp-notification-icon",
                "displaytime": 6000
            })
        );
    }
}
