// Scrobble decision engine
// Turns host notifications into scrobble records according to the active policy

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::host::{FileProperty, HostApi};
use crate::scrobbler::{ScrobbleRecord, TrackTelemetry};

/// How short tracks get picked up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScrobblePolicy {
    /// Scrobble as soon as a short track starts
    #[default]
    Immediate,
    /// Wait until the host bumps the play count, so skipped tracks are left out
    PlayCountConfirmed,
    /// Only scrobble the selection on explicit request
    ManualBatch,
}

/// Snapshot taken when a track starts under [`ScrobblePolicy::PlayCountConfirmed`]
#[derive(Debug, Clone, PartialEq)]
struct PlayCountSnapshot {
    play_count: String,
    duration_ms: f64,
}

#[derive(Debug)]
pub struct DecisionEngine {
    policy: ScrobblePolicy,
    armed: Option<PlayCountSnapshot>,
}

impl DecisionEngine {
    pub fn new(policy: ScrobblePolicy) -> Self {
        Self {
            policy,
            armed: None,
        }
    }

    pub fn policy(&self) -> ScrobblePolicy {
        self.policy
    }

    /// True while waiting for a play-count confirmation
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    pub fn on_track_changed<H: HostApi + ?Sized>(
        &mut self,
        host: &H,
        threshold_ms: f64,
        now: DateTime<Utc>,
    ) -> Option<ScrobbleRecord> {
        match self.policy {
            ScrobblePolicy::Immediate => {
                let duration_ms = host.now_playing_duration();
                if duration_ms >= threshold_ms {
                    log::debug!("Track is {}ms, host scrobbles it itself", duration_ms);
                    return None;
                }

                let record = ScrobbleRecord::new(TrackTelemetry::now_playing(host, duration_ms), now);
                log::info!(
                    "Short track started: {} - {} ({}ms)",
                    record.artist,
                    record.title,
                    duration_ms
                );
                Some(record)
            }
            ScrobblePolicy::PlayCountConfirmed => {
                let play_count = host
                    .now_playing_url()
                    .map(|url| host.file_property(&url, FileProperty::PlayCount))
                    .unwrap_or_default();
                let duration_ms = host.now_playing_duration();

                log::debug!(
                    "Armed with play count '{}' and duration {}ms",
                    play_count,
                    duration_ms
                );
                self.armed = Some(PlayCountSnapshot {
                    play_count,
                    duration_ms,
                });
                None
            }
            ScrobblePolicy::ManualBatch => None,
        }
    }

    /// Note: the emitted record carries the now-playing tags at this moment,
    /// not the tags of `file`.
    pub fn on_play_count_changed<H: HostApi + ?Sized>(
        &mut self,
        host: &H,
        file: &str,
        threshold_ms: f64,
        now: DateTime<Utc>,
    ) -> Option<ScrobbleRecord> {
        if self.policy != ScrobblePolicy::PlayCountConfirmed {
            return None;
        }
        let snapshot = self.armed.as_ref()?;

        if snapshot.duration_ms >= threshold_ms {
            return None;
        }

        let play_count = host.file_property(file, FileProperty::PlayCount);
        if play_count == snapshot.play_count {
            log::debug!("Play count for {} unchanged, treating as skipped", file);
            return None;
        }

        let duration_ms = snapshot.duration_ms;
        self.armed = None;

        let record = ScrobbleRecord::new(TrackTelemetry::now_playing(host, duration_ms), now);
        log::info!(
            "Play confirmed: {} - {} (play count now {})",
            record.artist,
            record.title,
            play_count
        );
        Some(record)
    }
}

/// Longest time a single track may occupy when back-dating a batch (24h)
pub const MAX_PLAYED_MS: f64 = 86_400_000.0;

/// Lay out `tracks` back to back so the last one ends at `now`.
///
/// Track i starts at `now - (d_i + ... + d_(N-1))`, i.e. back-dated by the
/// durations of itself and every track after it. Equivalently
/// `now - total + d_0 + ... + d_(i-1)`. Not threshold-gated.
///
/// Durations that are negative or not finite take no time; anything longer
/// than [`MAX_PLAYED_MS`] is capped.
pub fn plan_batch(tracks: Vec<TrackTelemetry>, now: DateTime<Utc>) -> Vec<ScrobbleRecord> {
    let played = |t: &TrackTelemetry| {
        if t.duration_ms.is_finite() && t.duration_ms > 0.0 {
            t.duration_ms.min(MAX_PLAYED_MS)
        } else {
            0.0
        }
    };

    let total_ms: f64 = tracks.iter().map(played).sum();
    let mut elapsed_ms = 0.0;

    tracks
        .into_iter()
        .map(|track| {
            let remaining_ms = total_ms - elapsed_ms;
            elapsed_ms += played(&track);
            let back = Duration::microseconds((remaining_ms * 1000.0).round() as i64);
            let started_at = now.checked_sub_signed(back).unwrap_or_else(|| {
                log::warn!("Cannot back-date {} by {}ms, using now", track.title, remaining_ms);
                now
            });
            ScrobbleRecord::new(track, started_at)
        })
        .collect()
}
