// Scrobbler module
// Records, submission formatting and the submitters that deliver them

pub mod batch;
pub mod host_method;
pub mod record;
pub mod traits;

pub use batch::{format, FormatError, SubmissionBatch};
pub use host_method::HostMethodSubmitter;
pub use record::{scrobble_duration, ScrobbleRecord, TrackTelemetry};
pub use traits::ScrobbleSubmitter;
