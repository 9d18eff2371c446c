// Common traits for scrobble submission

use anyhow::Result;

use super::batch::SubmissionBatch;

/// Remote API method used for submissions
pub const SCROBBLE_METHOD: &str = "track.scrobble";

/// API version passed along with every submission
pub const SCROBBLE_API_VERSION: u32 = 5;

/// Delivers a formatted batch to the scrobbling service
pub trait ScrobbleSubmitter {
    /// Short name for log lines
    fn name(&self) -> &str;

    /// Submit the whole batch in one call. No retries.
    fn submit(&self, batch: &SubmissionBatch) -> Result<()>;
}
