// Track telemetry and the scrobble records built from it

use chrono::{DateTime, Utc};

use crate::host::{HostApi, MetaDataType};
use crate::text_cleanup::TextCleaner;

/// Shortest duration (seconds) the remote service accepts without filtering
pub const SERVICE_CUTOFF_SECONDS: f64 = 30.0;

/// Duration reported for tracks under [`SERVICE_CUTOFF_SECONDS`]
pub const SCROBBLE_MIN_SECONDS: u32 = 31;

/// Tag fields read from the host, in the order they are returned
pub const TAG_FIELDS: [MetaDataType; 4] = [
    MetaDataType::Artist,
    MetaDataType::TrackTitle,
    MetaDataType::Album,
    MetaDataType::AlbumArtist,
];

/// Track information as read from the host at one point in time
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackTelemetry {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub album_artist: String,
    pub duration_ms: f64,
}

impl TrackTelemetry {
    /// Build from a tag vector laid out as [`TAG_FIELDS`]; missing entries become empty
    pub fn from_tags(tags: &[String], duration_ms: f64) -> Self {
        let tag = |i: usize| tags.get(i).cloned().unwrap_or_default();
        Self {
            artist: tag(0),
            title: tag(1),
            album: tag(2),
            album_artist: tag(3),
            duration_ms,
        }
    }

    /// Tags of whatever is playing right now
    pub fn now_playing<H: HostApi + ?Sized>(host: &H, duration_ms: f64) -> Self {
        Self::from_tags(&host.now_playing_tags(&TAG_FIELDS), duration_ms)
    }

    /// Tags and duration of a library file
    pub fn for_file<H: HostApi + ?Sized>(host: &H, file: &str) -> Self {
        Self::from_tags(&host.file_tags(file, &TAG_FIELDS), host.file_duration(file))
    }
}

/// One track ready to be formatted into a submission
#[derive(Debug, Clone, PartialEq)]
pub struct ScrobbleRecord {
    pub artist: String,
    pub title: String,
    pub album: String,
    pub album_artist: String,
    /// Whole seconds, already clamped for the service cutoff
    pub duration: u32,
    pub started_at: DateTime<Utc>,
}

impl ScrobbleRecord {
    pub fn new(track: TrackTelemetry, started_at: DateTime<Utc>) -> Self {
        Self {
            duration: scrobble_duration(track.duration_ms),
            artist: track.artist,
            title: track.title,
            album: track.album,
            album_artist: track.album_artist,
            started_at,
        }
    }

    /// Apply tag cleanup to every text field
    pub fn cleaned(mut self, cleaner: &TextCleaner) -> Self {
        self.artist = cleaner.clean(&self.artist);
        self.title = cleaner.clean(&self.title);
        self.album = cleaner.clean(&self.album);
        self.album_artist = cleaner.clean(&self.album_artist);
        self
    }

    /// Unix seconds, truncated
    pub fn timestamp(&self) -> i64 {
        self.started_at.timestamp()
    }
}

/// Duration to report for a track of `duration_ms`.
///
/// Anything under the service's own cutoff is reported as
/// [`SCROBBLE_MIN_SECONDS`] so the service does not drop it; longer tracks
/// report their real length in whole seconds.
pub fn scrobble_duration(duration_ms: f64) -> u32 {
    let seconds = duration_ms / 1000.0;
    if !seconds.is_finite() || seconds < SERVICE_CUTOFF_SECONDS {
        SCROBBLE_MIN_SECONDS
    } else {
        seconds.trunc() as u32
    }
}
