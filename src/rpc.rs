//! Kodi JSON-RPC access.
//!
//! Requests are passed around as raw JSON strings because custom commands come from
//! user templates. The fixed request shapes the bridge sends itself are built here.

use crate::error::{BridgeError, Result};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Kodi's default JSON-RPC endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://localhost:8080/jsonrpc";

/// Playlist id of Kodi's video playlist.
pub const VIDEO_PLAYLIST: u32 = 1;

/// Remote-procedure interface of the media host.
#[async_trait]
pub trait JsonRpc: Send + Sync {
    /// Executes a JSON-RPC request and returns its `result` member.
    async fn call(&self, request: &str) -> Result<Value>;
}

/// Shared HTTP client with connection pooling.
static HTTP_CLIENT: OnceCell<Client> = OnceCell::new();

/// Initialize or get the HTTP client.
fn get_http_client() -> Result<&'static Client> {
    HTTP_CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION"),
            ))
            .build()
            .map_err(|e| BridgeError::Network(format!("Failed to build HTTP client: {}", e)))
    })
}

/// JSON-RPC over Kodi's HTTP transport.
#[derive(Debug, Clone)]
pub struct HttpJsonRpc {
    endpoint: String,
    credentials: Option<(String, Option<String>)>,
}

impl HttpJsonRpc {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            credentials: None,
        }
    }

    /// Enables HTTP basic authentication.
    pub fn with_credentials(mut self, username: impl Into<String>, password: Option<String>) -> Self {
        self.credentials = Some((username.into(), password));
        self
    }
}

#[async_trait]
impl JsonRpc for HttpJsonRpc {
    async fn call(&self, request: &str) -> Result<Value> {
        let client = get_http_client()?;

        let mut builder = client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .body(request.to_string());

        if let Some((username, password)) = &self.credentials {
            builder = builder.basic_auth(username, password.as_ref());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| BridgeError::Network(format!("Failed to reach Kodi: {}", e)))?;

        if !response.status().is_success() {
            return Err(BridgeError::Network(format!(
                "Kodi request failed with status: {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| BridgeError::Network(format!("Invalid JSON-RPC response: {}", e)))?;

        extract_result(data)
    }
}

/// Pulls the `result` out of a JSON-RPC response, turning `error` into an `Err`.
pub fn extract_result(mut response: Value) -> Result<Value> {
    if let Some(error) = response.get("error") {
        if !error.is_null() {
            let message = error
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| error.to_string());
            return Err(BridgeError::Rpc(message));
        }
    }

    Ok(response
        .get_mut("result")
        .map(Value::take)
        .unwrap_or(Value::Null))
}

fn request(method: &str, params: Option<Value>) -> String {
    let mut body = json!({
        "jsonrpc": "2.0",
        "method": method,
        "id": 1,
    });
    if let Some(params) = params {
        body["params"] = params;
    }
    body.to_string()
}

pub fn get_active_players() -> String {
    request("Player.GetActivePlayers", None)
}

pub fn play_pause(player_id: &Value) -> String {
    request("Player.PlayPause", Some(json!({ "playerid": player_id })))
}

pub fn stop(player_id: &Value) -> String {
    request("Player.Stop", Some(json!({ "playerid": player_id })))
}

pub fn go_to_next(player_id: &Value) -> String {
    request("Player.GoTo", Some(json!({ "playerid": player_id, "to": "next" })))
}

pub fn playlist_clear(playlist_id: u32) -> String {
    request("Playlist.Clear", Some(json!({ "playlistid": playlist_id })))
}

pub fn playlist_add_file(playlist_id: u32, file: &str) -> String {
    request(
        "Playlist.Add",
        Some(json!({ "playlistid": playlist_id, "item": { "file": file } })),
    )
}

pub fn player_open_playlist(playlist_id: u32, position: u32) -> String {
    request(
        "Player.Open",
        Some(json!({ "item": { "playlistid": playlist_id, "position": position } })),
    )
}

/// `GUI.ShowNotification`; Kodi treats `image` as a path or one of its stock icons.
pub fn show_notification(title: &str, message: &str, image: Option<&str>, display_time_ms: u32) -> String {
    let mut params = json!({
        "title": title,
        "message": message,
        "displaytime": display_time_ms,
    });
    if let Some(image) = image {
        params["image"] = Value::String(image.to_string());
    }
    request("GUI.ShowNotification", Some(params))
}

/// Scriptable in-memory JSON-RPC endpoint.
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    pub struct RecordingRpc {
        raw: Mutex<Vec<String>>,
        results: HashMap<String, Value>,
        failures: HashMap<String, String>,
    }

    impl RecordingRpc {
        /// Answers `method` with `result`; unscripted methods answer `"OK"`.
        pub fn respond(mut self, method: &str, result: Value) -> Self {
            self.results.insert(method.to_string(), result);
            self
        }

        /// Answers `method` with a JSON-RPC error.
        pub fn fail(mut self, method: &str, message: &str) -> Self {
            self.failures.insert(method.to_string(), message.to_string());
            self
        }

        pub fn raw_calls(&self) -> Vec<String> {
            self.raw.lock().unwrap().clone()
        }

        pub fn calls(&self) -> Vec<Value> {
            self.raw_calls()
                .iter()
                .filter_map(|r| serde_json::from_str(r).ok())
                .collect()
        }

        pub fn methods(&self) -> Vec<String> {
            self.calls()
                .iter()
                .filter_map(|c| c["method"].as_str().map(str::to_string))
                .collect()
        }
    }

    #[async_trait]
    impl JsonRpc for RecordingRpc {
        async fn call(&self, request: &str) -> Result<Value> {
            self.raw.lock().unwrap().push(request.to_string());

            let parsed: Value = serde_json::from_str(request)
                .map_err(|_| BridgeError::Rpc("Parse error.".to_string()))?;
            let method = parsed["method"].as_str().unwrap_or_default();

            if let Some(message) = self.failures.get(method) {
                return Err(BridgeError::Rpc(message.clone()));
            }
            Ok(self.results.get(method).cloned().unwrap_or_else(|| json!("OK")))
        }
    }
}
