//! File naming for captured media

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

pub const PHOTO_EXTENSION: &str = ".jpg";
pub const VIDEO_EXTENSION: &str = ".h264";

/// Date and time strings stamped into file names and notifications
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStamp {
    /// `%Y-%m-%d`
    pub date: String,
    /// `%H-%M-%S`
    pub time: String,
}

impl MediaStamp {
    pub fn now() -> Self {
        Self::from_datetime(Local::now())
    }

    pub fn from_datetime(at: DateTime<Local>) -> Self {
        Self {
            date: at.format("%Y-%m-%d").to_string(),
            time: at.format("%H-%M-%S").to_string(),
        }
    }
}

/// A media file about to be written by the camera
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFile {
    pub stamp: MediaStamp,
    /// File stem, without directory or extension
    pub file_name: String,
    pub path: PathBuf,
}

impl MediaFile {
    /// `<dir>/<date>_<time>_photo<index>.jpg`
    pub fn photo(dir: &Path, stamp: MediaStamp, index: u64) -> Self {
        let file_name = format!("{}_{}_photo{}", stamp.date, stamp.time, index);
        let path = dir.join(format!("{}{}", file_name, PHOTO_EXTENSION));
        Self { stamp, file_name, path }
    }

    /// `<dir>/<time>_video0.h264`
    pub fn video(dir: &Path, stamp: MediaStamp) -> Self {
        let file_name = format!("{}_video0", stamp.time);
        let path = dir.join(format!("{}{}", file_name, VIDEO_EXTENSION));
        Self { stamp, file_name, path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> MediaStamp {
        let at = Local.with_ymd_and_hms(2019, 6, 2, 7, 5, 9).unwrap();
        MediaStamp::from_datetime(at)
    }

    #[test]
    fn test_stamp_format() {
        let s = stamp();
        assert_eq!(s.date, "2019-06-02");
        assert_eq!(s.time, "07-05-09");
    }

    #[test]
    fn test_photo_name() {
        let file = MediaFile::photo(Path::new("/srv/photos"), stamp(), 3);
        assert_eq!(file.file_name, "2019-06-02_07-05-09_photo3");
        assert_eq!(
            file.path,
            PathBuf::from("/srv/photos/2019-06-02_07-05-09_photo3.jpg")
        );
    }

    #[test]
    fn test_photo_index_beyond_u32() {
        let file = MediaFile::photo(Path::new("p"), stamp(), 5_000_000_000);
        assert_eq!(file.file_name, "2019-06-02_07-05-09_photo5000000000");
    }

    #[test]
    fn test_video_name() {
        let file = MediaFile::video(Path::new("videos"), stamp());
        assert_eq!(file.file_name, "07-05-09_video0");
        assert_eq!(file.path, PathBuf::from("videos/07-05-09_video0.h264"));
    }
}
