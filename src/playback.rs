//! Starting playback on Kodi.

use crate::error::Result;
use crate::log::Logger;
use crate::rpc::{self, JsonRpc, VIDEO_PLAYLIST};
use serde_json::Value;

const YOUTUBE_PLUGIN_URL: &str = "plugin://plugin.video.youtube/?path=/root/video&action=play_video&videoid=";

/// Replaces the video playlist with `url` and starts playing it.
///
/// The three requests are sent in sequence; a failure stops the sequence without
/// undoing the earlier requests.
pub async fn play_media(rpc: &dyn JsonRpc, logger: &dyn Logger, url: &str) -> Result<Value> {
    logger.info(&format!("Play media: {}", url));

    rpc.call(&rpc::playlist_clear(VIDEO_PLAYLIST)).await?;
    rpc.call(&rpc::playlist_add_file(VIDEO_PLAYLIST, url)).await?;
    rpc.call(&rpc::player_open_playlist(VIDEO_PLAYLIST, 0)).await
}

/// Plays a YouTube video through Kodi's YouTube add-on.
pub async fn play_youtube_video(rpc: &dyn JsonRpc, logger: &dyn Logger, id: &str) -> Result<Value> {
    logger.info(&format!("Opening Youtube video ({}) plugin", id));

    play_media(rpc, logger, &youtube_plugin_url(id)).await
}

pub fn youtube_plugin_url(id: &str) -> String {
    format!("{}{}", YOUTUBE_PLUGIN_URL, id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::MemoryLogger;
    use crate::rpc::testing::RecordingRpc;
    use serde_json::json;

    #[tokio::test]
    async fn test_play_media_sequence() {
        let rpc = RecordingRpc::default();
        let logger = MemoryLogger::default();

        play_media(&rpc, &logger, "http://host/movie.mkv").await.unwrap();

        let calls = rpc.calls();
        assert_eq!(rpc.methods(), vec!["Playlist.Clear", "Playlist.Add", "Player.Open"]);
        assert_eq!(calls[0]["params"], json!({"playlistid": 1}));
        assert_eq!(
            calls[1]["params"],
            json!({"playlistid": 1, "item": {"file": "http://host/movie.mkv"}})
        );
        assert_eq!(calls[2]["params"], json!({"item": {"playlistid": 1, "position": 0}}));
    }

    #[tokio::test]
    async fn test_play_media_stops_on_failure() {
        let rpc = RecordingRpc::default().fail("Playlist.Add", "Invalid params.");
        let logger = MemoryLogger::default();

        let result = play_media(&rpc, &logger, "bogus").await;

        assert!(result.is_err());
        assert_eq!(rpc.methods(), vec!["Playlist.Clear", "Playlist.Add"]);
    }

    #[tokio::test]
    async fn test_play_youtube_video() {
        let rpc = RecordingRpc::default();
        let logger = MemoryLogger::default();

        play_youtube_video(&rpc, &logger, "abc123").await.unwrap();

        assert_eq!(
            rpc.calls()[1]["params"]["item"]["file"],
            "plugin://plugin.video.youtube/?path=/root/video&action=play_video&videoid=abc123"
        );
        assert!(logger.contains(crate::log::Level::Info, "abc123"));
    }
}
