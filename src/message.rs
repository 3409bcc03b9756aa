//! Pushbullet push types.
//!
//! Pushes arrive as JSON objects tagged by `type`. Only the four kinds the bridge
//! acts on are modelled; everything else decodes to [`PushMessage::Unknown`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single push received from the Pushbullet stream.
///
/// Every field is optional at decode time; handlers reject pushes missing what they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PushMessage {
    /// A notification mirrored from a phone.
    Mirror {
        #[serde(default)]
        icon: Option<String>,
        #[serde(default)]
        body: Option<String>,
        #[serde(default)]
        application_name: Option<String>,
    },

    /// A mirrored notification was dismissed on a device.
    Dismissal {
        #[serde(default, deserialize_with = "deserialize_opt_id")]
        notification_id: Option<String>,
        #[serde(default)]
        package_name: Option<String>,
        #[serde(default)]
        source_device_iden: Option<String>,
    },

    /// A link push.
    Link {
        #[serde(default)]
        url: Option<String>,
        #[serde(default)]
        title: Option<String>,
    },

    /// A note push; may carry a `kcmd::` command in its title.
    Note {
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        body: Option<String>,
    },

    /// Any other push type (file, address, ...).
    #[serde(other)]
    Unknown,
}

impl PushMessage {
    /// Decodes a push from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or lacks a `type`.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let message = serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(json))
            .map_err(|e| anyhow::anyhow!("Failed to parse push JSON: {}", e))?;
        Ok(message)
    }

    /// Decodes a push from an already parsed JSON value.
    pub fn from_value(value: Value) -> anyhow::Result<Self> {
        let message = serde_path_to_error::deserialize(value)
            .map_err(|e| anyhow::anyhow!("Failed to parse push: {}", e))?;
        Ok(message)
    }

    /// The push's `type` tag as it appears on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            PushMessage::Mirror { .. } => "mirror",
            PushMessage::Dismissal { .. } => "dismissal",
            PushMessage::Link { .. } => "link",
            PushMessage::Note { .. } => "note",
            PushMessage::Unknown => "unknown",
        }
    }
}

/// One frame read from the Pushbullet event stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamFrame {
    /// An ephemeral push wrapped as `{"type": "push", "push": {...}}`, or a bare push.
    Push(PushMessage),
    /// Keep-alive (`nop`) or change notification (`tickle`); nothing to do.
    Idle,
}

impl StreamFrame {
    /// Decodes a stream frame from one line of JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the line is not JSON or the wrapped push cannot be decoded.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let value: Value = serde_path_to_error::deserialize(&mut serde_json::Deserializer::from_str(json))
            .map_err(|e| anyhow::anyhow!("Failed to parse stream frame: {}", e))?;

        match value.get("type").and_then(Value::as_str) {
            Some("nop") | Some("tickle") => Ok(StreamFrame::Idle),
            Some("push") => match value.get("push") {
                Some(inner) => Ok(StreamFrame::Push(PushMessage::from_value(inner.clone())?)),
                None => anyhow::bail!("push frame without a 'push' object"),
            },
            _ => Ok(StreamFrame::Push(PushMessage::from_value(value)?)),
        }
    }
}

/// Accepts notification ids sent either as numbers or strings.
pub(crate) fn deserialize_opt_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected a number or string id, found {}",
            other
        ))),
    }
}

/// Joins multi-line text for single-line notification displays.
pub fn single_line(text: &str) -> String {
    text.replace('\n', " / ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mirror() {
        let json = r#"{"type": "mirror", "application_name": "Mail", "body": "hi\nthere\n", "icon": "AAAA"}"#;
        let message = PushMessage::from_json(json).unwrap();
        assert_eq!(
            message,
            PushMessage::Mirror {
                icon: Some("AAAA".to_string()),
                body: Some("hi\nthere\n".to_string()),
                application_name: Some("Mail".to_string()),
            }
        );
        assert_eq!(message.kind(), "mirror");
    }

    #[test]
    fn test_numeric_notification_id() {
        let json = r#"{"notification_id": 1812, "package_name": "com.podkicker", "notification_tag": null, "type": "dismissal"}"#;
        match PushMessage::from_json(json).unwrap() {
            PushMessage::Dismissal { notification_id, package_name, .. } => {
                assert_eq!(notification_id.as_deref(), Some("1812"));
                assert_eq!(package_name.as_deref(), Some("com.podkicker"));
            }
            other => panic!("unexpected push: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type() {
        let message = PushMessage::from_json(r#"{"type": "file", "file_url": "x"}"#).unwrap();
        assert_eq!(message, PushMessage::Unknown);
    }

    #[test]
    fn test_missing_type_is_error() {
        assert!(PushMessage::from_json(r#"{"body": "x"}"#).is_err());
        assert!(PushMessage::from_json(r#"{"type": "note", "body": 5}"#).is_err());
    }

    #[test]
    fn test_stream_frames() {
        let frame = StreamFrame::from_json(r#"{"type": "push", "push": {"type": "note", "title": "t"}}"#).unwrap();
        assert_eq!(
            frame,
            StreamFrame::Push(PushMessage::Note {
                title: Some("t".to_string()),
                body: None,
            })
        );

        assert_eq!(StreamFrame::from_json(r#"{"type": "nop"}"#).unwrap(), StreamFrame::Idle);
        assert_eq!(
            StreamFrame::from_json(r#"{"type": "tickle", "subtype": "push"}"#).unwrap(),
            StreamFrame::Idle
        );

        let bare = StreamFrame::from_json(r#"{"type": "link", "url": "http://a"}"#).unwrap();
        assert!(matches!(bare, StreamFrame::Push(PushMessage::Link { .. })));

        assert!(StreamFrame::from_json(r#"{"type": "push"}"#).is_err());
        assert!(StreamFrame::from_json("not json").is_err());
    }

    #[test]
    fn test_single_line() {
        assert_eq!(single_line("a\nb"), "a / b");
        assert_eq!(single_line("plain"), "plain");
    }
}
