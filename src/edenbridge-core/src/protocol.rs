//! UDP message formats
//!
//! Inbound commands arrive as one JSON object per datagram, keyed by `cmd`.
//! Outbound notifications tell the bot about new stills and the cloud
//! uploader about finished recordings.

use serde::{Deserialize, Serialize};

use crate::media::{MediaFile, PHOTO_EXTENSION, VIDEO_EXTENSION};

/// Command received on the listen socket
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Photo burst; `count == 0` means the configured maximum
    TakePhoto {
        #[serde(default)]
        count: i64,
    },
    /// Recording with periodic snapshots
    TakeVideo {
        #[serde(default = "default_init_photo")]
        init_photo: bool,
    },
    /// Leave the command loop
    Stop,
    /// Any other `cmd` value
    #[serde(other)]
    Unknown,
}

fn default_init_photo() -> bool { true }

impl Command {
    pub fn decode(payload: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(payload)
    }
}

/// Downstream listener a notification is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sink {
    /// Messaging bot
    Bot,
    /// Cloud uploader
    Cloud,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    SendPhoto,
    UploadFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    #[serde(rename = "JPG")]
    Jpg,
    #[serde(rename = "H264")]
    H264,
}

/// Channel the bot should forward a still through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Server {
    Telegram,
    Email,
}

/// Message about a captured file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub cmd: NotificationKind,
    pub file_type: FileType,
    pub file_name: String,
    pub extension: String,
    pub date: String,
    pub time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<Server>,
}

impl Notification {
    /// `send_photo` for the bot
    pub fn photo(file: &MediaFile, server: Server) -> Self {
        Self {
            cmd: NotificationKind::SendPhoto,
            file_type: FileType::Jpg,
            file_name: file.file_name.clone(),
            extension: PHOTO_EXTENSION.to_string(),
            date: file.stamp.date.clone(),
            time: file.stamp.time.clone(),
            server: Some(server),
        }
    }

    /// `upload_file` for the cloud uploader
    pub fn video(file: &MediaFile) -> Self {
        Self {
            cmd: NotificationKind::UploadFile,
            file_type: FileType::H264,
            file_name: file.file_name.clone(),
            extension: VIDEO_EXTENSION.to_string(),
            date: file.stamp.date.clone(),
            time: file.stamp.time.clone(),
            server: None,
        }
    }

    pub fn sink(&self) -> Sink {
        match self.cmd {
            NotificationKind::SendPhoto => Sink::Bot,
            NotificationKind::UploadFile => Sink::Cloud,
        }
    }

    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Number of stills a `take_photo` request produces
pub fn burst_count(requested: i64, max_photo_count: u32) -> u32 {
    if requested == 0 {
        return max_photo_count;
    }
    requested.clamp(1, i64::from(max_photo_count.max(1))) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaStamp;
    use serde_json::{json, Value};
    use std::path::Path;

    fn stamp() -> MediaStamp {
        MediaStamp {
            date: "2019-06-02".to_string(),
            time: "07-05-09".to_string(),
        }
    }

    #[test]
    fn test_decode_commands() {
        assert_eq!(
            Command::decode(br#"{"cmd": "take_photo", "count": 3}"#).unwrap(),
            Command::TakePhoto { count: 3 }
        );
        assert_eq!(
            Command::decode(br#"{"cmd": "take_photo"}"#).unwrap(),
            Command::TakePhoto { count: 0 }
        );
        assert_eq!(
            Command::decode(br#"{"cmd": "take_video"}"#).unwrap(),
            Command::TakeVideo { init_photo: true }
        );
        assert_eq!(
            Command::decode(br#"{"cmd": "take_video", "init_photo": false}"#).unwrap(),
            Command::TakeVideo { init_photo: false }
        );
        assert_eq!(Command::decode(br#"{"cmd": "stop"}"#).unwrap(), Command::Stop);
    }

    #[test]
    fn test_decode_unknown_command() {
        assert_eq!(
            Command::decode(br#"{"cmd": "self_destruct", "now": true}"#).unwrap(),
            Command::Unknown
        );
    }

    #[test]
    fn test_decode_malformed() {
        assert!(Command::decode(b"take_photo").is_err());
        assert!(Command::decode(br#"{"count": 2}"#).is_err());
        assert!(Command::decode(br#"{"cmd": "take_photo", "count": "two"}"#).is_err());
    }

    #[test]
    fn test_burst_count() {
        assert_eq!(burst_count(0, 5), 5);
        assert_eq!(burst_count(1, 5), 1);
        assert_eq!(burst_count(3, 5), 3);
        assert_eq!(burst_count(5, 5), 5);
        assert_eq!(burst_count(50, 5), 5);
        assert_eq!(burst_count(-2, 5), 1);
    }

    #[test]
    fn test_photo_notification_wire_format() {
        let file = MediaFile::photo(Path::new("photos"), stamp(), 0);
        let msg = Notification::photo(&file, Server::Telegram);
        assert_eq!(msg.sink(), Sink::Bot);

        let value: Value = serde_json::from_slice(&msg.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "cmd": "send_photo",
                "file_type": "JPG",
                "file_name": "2019-06-02_07-05-09_photo0",
                "extension": ".jpg",
                "date": "2019-06-02",
                "time": "07-05-09",
                "server": "telegram",
            })
        );
    }

    #[test]
    fn test_video_notification_wire_format() {
        let file = MediaFile::video(Path::new("videos"), stamp());
        let msg = Notification::video(&file);
        assert_eq!(msg.sink(), Sink::Cloud);

        let value: Value = serde_json::from_slice(&msg.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "cmd": "upload_file",
                "file_type": "H264",
                "file_name": "07-05-09_video0",
                "extension": ".h264",
                "date": "2019-06-02",
                "time": "07-05-09",
            })
        );
    }
}
