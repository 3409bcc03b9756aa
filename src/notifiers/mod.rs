//! Notification display targets.
//!
//! This module defines the notifier trait and the targets a notification can be shown on.

use crate::error::Result;
use crate::rpc::JsonRpc;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub mod desktop;
pub mod kodi;

/// A notification ready to be displayed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: Option<String>,
    pub duration_ms: u32,
    pub icon: Option<String>,
}

/// Trait for notification display targets.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the notifier type name.
    fn notifier_type(&self) -> &str;

    /// Shows a notification.
    async fn show(&self, notification: &Notification) -> Result<()>;
}

/// Selects where notifications are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// On the Kodi screen via `GUI.ShowNotification` (default).
    #[default]
    Kodi,
    /// On the local desktop via the platform notification service.
    Desktop,
}

impl NotifierKind {
    /// Lists all notifier names.
    pub fn all() -> &'static [NotifierKind] {
        &[NotifierKind::Kodi, NotifierKind::Desktop]
    }

    pub fn name(&self) -> &'static str {
        match self {
            NotifierKind::Kodi => "kodi",
            NotifierKind::Desktop => "desktop",
        }
    }

    /// Builds the notifier; the Kodi target shares the bridge's JSON-RPC connection.
    pub fn build(&self, rpc: Arc<dyn JsonRpc>) -> Arc<dyn Notifier> {
        match self {
            NotifierKind::Kodi => Arc::new(kodi::KodiNotifier::new(rpc)),
            NotifierKind::Desktop => Arc::new(desktop::DesktopNotifier),
        }
    }
}

/// Notifier that records what it was asked to show.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    pub shown: std::sync::Mutex<Vec<Notification>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn shown(&self) -> Vec<Notification> {
        self.shown.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl Notifier for RecordingNotifier {
    fn notifier_type(&self) -> &str {
        "recording"
    }

    async fn show(&self, notification: &Notification) -> Result<()> {
        self.shown.lock().unwrap().push(notification.clone());
        Ok(())
    }
}
