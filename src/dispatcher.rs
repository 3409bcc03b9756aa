//! Push dispatch.
//!
//! [`MessageDispatcher`] turns each push into an action on Kodi: mirrored
//! notifications are displayed, dismissing the tracked playback notification controls
//! the player, links are played and notes either run a configured `kcmd::` command or
//! are displayed.
//!
//! Every failure is returned to [`MessageDispatcher::on_message`], which logs it;
//! nothing a push contains can make dispatch fail.

use crate::error::{error_chain, BridgeError, Result};
use crate::icon;
use crate::localize::{format_localized, Localizer, EXECUTED_COMMAND, PUSH_ERROR};
use crate::log::Logger;
use crate::message::{single_line, PushMessage};
use crate::notifiers::{Notification, Notifier};
use crate::playback;
use crate::rpc::{self, JsonRpc};
use crate::template::{self, TemplateValues};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

/// File name of the decoded mirror icon inside the temp directory.
pub const ICON_FILE_NAME: &str = "temp-notification-icon";

static COMMAND_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^kcmd::([a-zA-Z0-9_.-]+)").expect("command pattern is valid"));

static YOUTUBE_LINKS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        r"https?://youtu\.be/([a-zA-Z0-9_-]+)",
        r"https?://www\.youtube\.com/watch\?v=([a-zA-Z0-9_-]+)",
    ]
    .map(|pattern| {
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("youtube pattern is valid")
    })
});

/// A custom command runnable with a `kcmd::<name>` note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KodiCommand {
    /// JSON-RPC request template; `<$params[i]>` is the i-th `||`-separated body part.
    #[serde(alias = "JSONRPC")]
    pub jsonrpc: String,

    /// Notification body template; `<$result>` is the JSON-RPC result.
    #[serde(default)]
    pub notification: Option<String>,
}

/// Command name to definition.
pub type CommandTable = HashMap<String, KodiCommand>;

/// Player action taken when the tracked playback notification is dismissed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DismissAction {
    Pause,
    #[default]
    Stop,
    Next,
    /// Any other configured value; dismissals are ignored.
    #[serde(other)]
    Unsupported,
}

impl FromStr for DismissAction {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "pause" => DismissAction::Pause,
            "stop" => DismissAction::Stop,
            "next" => DismissAction::Next,
            _ => DismissAction::Unsupported,
        })
    }
}

impl fmt::Display for DismissAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DismissAction::Pause => "pause",
            DismissAction::Stop => "stop",
            DismissAction::Next => "next",
            DismissAction::Unsupported => "unsupported",
        };
        f.write_str(name)
    }
}

/// Mutable dispatcher settings.
#[derive(Debug, Clone)]
pub struct DispatcherSettings {
    /// Notification display time in milliseconds.
    pub notification_time: u32,
    pub notification_icon: Option<String>,
    /// Directory the decoded mirror icon is written to.
    pub temp_path: PathBuf,
    /// Id of the notification Kodi pushed when playback started.
    pub playback_notification_id: Option<String>,
    pub dismiss_action: DismissAction,
    pub commands: CommandTable,
    pub commands_notification_icon: Option<String>,
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            notification_time: 6000,
            notification_icon: None,
            temp_path: std::env::temp_dir(),
            playback_notification_id: None,
            dismiss_action: DismissAction::Stop,
            commands: CommandTable::new(),
            commands_notification_icon: None,
        }
    }
}

/// Dispatches pushes to Kodi.
pub struct MessageDispatcher {
    settings: DispatcherSettings,
    rpc: Arc<dyn JsonRpc>,
    notifier: Arc<dyn Notifier>,
    logger: Arc<dyn Logger>,
    localizer: Arc<dyn Localizer>,
}

impl MessageDispatcher {
    pub fn new(
        settings: DispatcherSettings,
        rpc: Arc<dyn JsonRpc>,
        notifier: Arc<dyn Notifier>,
        logger: Arc<dyn Logger>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            settings,
            rpc,
            notifier,
            logger,
            localizer,
        }
    }

    pub fn settings(&self) -> &DispatcherSettings {
        &self.settings
    }

    pub fn logger(&self) -> &dyn Logger {
        self.logger.as_ref()
    }

    /// Path the icon of the last mirrored notification is written to.
    pub fn icon_path(&self) -> PathBuf {
        self.settings.temp_path.join(ICON_FILE_NAME)
    }

    /// Handles one push. Errors are logged and never returned.
    pub async fn on_message(&self, message: &PushMessage) {
        self.logger.info(&format!("New push ({}) received", message.kind()));

        if let Err(e) = self.handle(message).await {
            self.logger.error(&format!(
                "Failed to handle {} push: {}",
                message.kind(),
                error_chain(&e)
            ));
        }
    }

    async fn handle(&self, message: &PushMessage) -> Result<()> {
        match message {
            PushMessage::Mirror {
                icon,
                body,
                application_name,
            } => {
                self.on_mirror(icon.as_deref(), body.as_deref(), application_name.as_deref())
                    .await
            }
            PushMessage::Dismissal { notification_id, .. } => {
                self.on_dismissal(notification_id.as_deref()).await
            }
            PushMessage::Link { url, .. } => self.on_link(url.as_deref()).await,
            PushMessage::Note { title, body } => {
                if self.execute_kodi_cmd(message).await? {
                    return Ok(());
                }
                let title = title.as_deref().unwrap_or_default();
                let body = single_line(body.as_deref().unwrap_or_default());
                self.show(title, Some(body), self.settings.notification_icon.clone())
                    .await
            }
            PushMessage::Unknown => Ok(()),
        }
    }

    async fn on_mirror(
        &self,
        icon: Option<&str>,
        body: Option<&str>,
        application_name: Option<&str>,
    ) -> Result<()> {
        let title = application_name.ok_or_else(|| {
            BridgeError::InvalidMessage("mirror push without application_name".to_string())
        })?;

        let icon = match icon {
            Some(encoded) => {
                let path = self.icon_path();
                icon::write_icon(encoded, &path)?;
                Some(path.to_string_lossy().into_owned())
            }
            None => self.settings.notification_icon.clone(),
        };

        let body = body.map(|b| single_line(b.trim_end_matches('\n')));

        self.show(title, body, icon).await
    }

    // TODO: also compare package_name and source_device_iden once playback pushes record them
    async fn on_dismissal(&self, notification_id: Option<&str>) -> Result<()> {
        match (&self.settings.playback_notification_id, notification_id) {
            (Some(tracked), Some(id)) if tracked == id => {}
            _ => return Ok(()),
        }

        let action = self.settings.dismiss_action;
        if action == DismissAction::Unsupported {
            return Ok(());
        }
        self.logger.info(&format!("Execute action on dismiss push: {}", action));

        let players = self.rpc.call(&rpc::get_active_players()).await?;
        let Some(player_id) = players
            .as_array()
            .and_then(|players| players.first())
            .and_then(|player| player.get("playerid"))
        else {
            return Ok(());
        };

        let request = match action {
            DismissAction::Pause => rpc::play_pause(player_id),
            DismissAction::Stop => rpc::stop(player_id),
            DismissAction::Next => rpc::go_to_next(player_id),
            DismissAction::Unsupported => return Ok(()),
        };
        self.rpc.call(&request).await?;

        Ok(())
    }

    async fn on_link(&self, url: Option<&str>) -> Result<()> {
        let url = url.ok_or_else(|| BridgeError::InvalidMessage("link push without url".to_string()))?;

        match youtube_video_id(url) {
            Some(id) => playback::play_youtube_video(self.rpc.as_ref(), self.logger.as_ref(), id).await?,
            None => playback::play_media(self.rpc.as_ref(), self.logger.as_ref(), url).await?,
        };

        Ok(())
    }

    /// Runs the `kcmd::<name>` command named by a note's title.
    ///
    /// Returns `Ok(true)` once a configured command was found, whether or not it
    /// succeeded; its outcome is shown as a notification. Returns `Ok(false)` when the
    /// push is not a command or names an unknown one.
    ///
    /// # Errors
    ///
    /// Returns an error only if the outcome notification cannot be shown.
    pub async fn execute_kodi_cmd(&self, message: &PushMessage) -> Result<bool> {
        let PushMessage::Note { title, body } = message else {
            return Ok(false);
        };
        if self.settings.commands.is_empty() {
            return Ok(false);
        }
        let Some(name) = title
            .as_deref()
            .and_then(|t| COMMAND_TITLE.captures(t))
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
        else {
            return Ok(false);
        };

        let Some(command) = self.settings.commands.get(name) else {
            self.logger.warn(&format!("No \"{}\" cmd found!", name));
            return Ok(false);
        };

        let title = format_localized(&self.localizer.localize(EXECUTED_COMMAND), name);
        let notification = match self.run_command(name, command, body.as_deref()).await {
            Ok(body) => self.notification(title, Some(body), self.settings.commands_notification_icon.clone()),
            Err(e) => {
                self.logger.error(&format!("Command \"{}\" failed: {}", name, error_chain(&e)));
                self.notification(
                    format!("ERROR: {}", title),
                    Some(e.to_string()),
                    self.settings.commands_notification_icon.clone(),
                )
            }
        };

        self.notifier.show(&notification).await?;
        Ok(true)
    }

    async fn run_command(&self, name: &str, command: &KodiCommand, body: Option<&str>) -> Result<String> {
        let params: Vec<&str> = match body {
            Some(body) if !body.is_empty() => body.split("||").collect(),
            _ => Vec::new(),
        };

        let mut values = TemplateValues::new();
        values.insert("params".to_string(), json!(params));
        let request = template::render(&command.jsonrpc, &values)?;

        self.logger.info(&format!("Executing cmd \"{}\": {}", name, request));
        let result = self.rpc.call(&request).await?;
        self.logger.info(&format!("Result for cmd \"{}\": {}", name, result));

        let Some(notification) = &command.notification else {
            return Ok(String::new());
        };
        let mut values = TemplateValues::new();
        values.insert("result".to_string(), result);
        Ok(template::render(notification, &values)?)
    }

    /// Reports a push stream error on screen.
    pub async fn on_error(&self, error: &str) {
        self.logger.error(error);

        let title = self.localizer.localize(PUSH_ERROR);
        if let Err(e) = self
            .show(&title, Some(error.to_string()), self.settings.notification_icon.clone())
            .await
        {
            self.logger.error(&format!("Failed to report stream error: {}", error_chain(&e)));
        }
    }

    pub fn on_open(&self) {
        self.logger.info("Socket opened");
    }

    pub fn on_close(&self) {
        self.logger.info("Socket closed");
    }

    fn notification(&self, title: String, body: Option<String>, icon: Option<String>) -> Notification {
        Notification {
            title,
            body,
            duration_ms: self.settings.notification_time,
            icon,
        }
    }

    async fn show(&self, title: &str, body: Option<String>, icon: Option<String>) -> Result<()> {
        let notification = self.notification(title.to_string(), body, icon);
        self.notifier.show(&notification).await
    }

    pub fn set_notification_time(&mut self, notification_time: u32) {
        self.settings.notification_time = notification_time;
    }

    pub fn set_notification_icon(&mut self, notification_icon: Option<String>) {
        self.settings.notification_icon = notification_icon;
    }

    pub fn set_temp_path(&mut self, temp_path: PathBuf) {
        self.settings.temp_path = temp_path;
    }

    pub fn set_playback_notification_id(&mut self, playback_notification_id: Option<String>) {
        self.settings.playback_notification_id = playback_notification_id;
    }

    pub fn set_dismiss_action(&mut self, dismiss_action: DismissAction) {
        self.settings.dismiss_action = dismiss_action;
    }

    pub fn set_commands(&mut self, commands: CommandTable) {
        self.settings.commands = commands;
    }

    pub fn set_commands_notification_icon(&mut self, commands_notification_icon: Option<String>) {
        self.settings.commands_notification_icon = commands_notification_icon;
    }
}

/// Extracts the video id from youtu.be and youtube.com/watch links.
pub fn youtube_video_id(url: &str) -> Option<&str> {
    YOUTUBE_LINKS
        .iter()
        .find_map(|re| re.captures(url).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
}
