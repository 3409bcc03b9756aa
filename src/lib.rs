//! Pushkodi - forwards Pushbullet pushes to Kodi.
//!
//! This library receives frames from the Pushbullet event stream and turns the pushes
//! they carry into actions on a Kodi host through its JSON-RPC interface.
//!
//! # Architecture
//!
//! - **Message**: typed pushes and stream frames
//! - **Dispatcher**: decides what each push does on Kodi
//! - **Template**: `<$placeholder>` substitution for custom commands
//! - **Rpc**: the JSON-RPC transport and request shapes
//! - **Notifiers**: where notifications are displayed (Kodi, desktop)
//! - **Config**: configuration from `~/.config/pushkodi/config.json`
//!
//! # Examples
//!
//! Dispatching a frame:
//!
//! ```no_run
//! use pushkodi::{process_frame, CatalogLocalizer, Config, FileLogger, MessageDispatcher};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.json")?;
//!     let rpc = Arc::new(config.kodi.client());
//!     let dispatcher = MessageDispatcher::new(
//!         config.dispatcher_settings(),
//!         rpc.clone(),
//!         config.notifier.build(rpc),
//!         Arc::new(FileLogger::new(None, false)),
//!         Arc::new(CatalogLocalizer::new(config.string_overrides())),
//!     );
//!
//!     let frame = r#"{"type": "push", "push": {"type": "note", "title": "Hi", "body": "from phone"}}"#;
//!     process_frame(frame, &dispatcher).await;
//!
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod icon;
pub mod localize;
pub mod log;
pub mod message;
pub mod notifiers;
pub mod playback;
pub mod rpc;
pub mod template;

// Re-export commonly used types at the crate root
pub use config::{Config, KodiConfig};
pub use dispatcher::{CommandTable, DismissAction, DispatcherSettings, KodiCommand, MessageDispatcher};
pub use error::{BridgeError, Result};
pub use localize::{CatalogLocalizer, Localizer};
pub use log::{FileLogger, Level, Logger};
pub use message::{PushMessage, StreamFrame};
pub use notifiers::{Notification, Notifier, NotifierKind};
pub use rpc::{HttpJsonRpc, JsonRpc};

/// What happened to one stream frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A push was handed to the dispatcher
    Dispatched(&'static str),
    /// Keep-alive or tickle frame
    Idle,
    /// The frame could not be decoded
    Invalid(String),
}

/// Decodes one stream frame and dispatches the push it carries.
///
/// The raw frame is logged at debug level before decoding, so pushes of
/// unrecognized types keep their wire `type` and payload in the log.
/// Decoding failures are logged through the dispatcher's logger and reported as
/// [`FrameOutcome::Invalid`]; they never abort the stream.
pub async fn process_frame(frame_json: &str, dispatcher: &MessageDispatcher) -> FrameOutcome {
    dispatcher
        .logger()
        .debug(&format!("Frame received: {}", frame_json.trim()));

    match StreamFrame::from_json(frame_json) {
        Ok(StreamFrame::Push(message)) => {
            dispatcher.on_message(&message).await;
            FrameOutcome::Dispatched(message.kind())
        }
        Ok(StreamFrame::Idle) => FrameOutcome::Idle,
        Err(e) => {
            let reason = e.to_string();
            dispatcher.logger().error(&format!("Dropping frame: {}", reason));
            FrameOutcome::Invalid(reason)
        }
    }
}
