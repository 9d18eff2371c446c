// Positional parameter sets for track.scrobble submissions

use thiserror::Error;

use super::record::ScrobbleRecord;

#[derive(Debug, Error, PartialEq)]
pub enum FormatError {
    #[error("nothing to submit")]
    Empty,

    #[error("{0} records cannot share unindexed keys")]
    UnindexedBatch(usize),
}

/// Ordered key/value pairs handed to the host transport as-is
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionBatch {
    pairs: Vec<(String, String)>,
    tracks: usize,
}

impl SubmissionBatch {
    /// Unindexed keys for a single track
    pub fn single(record: &ScrobbleRecord) -> Self {
        let mut batch = Self::default();
        batch.push_record(record, None);
        batch
    }

    /// `key[i]` for every record, in record order
    pub fn indexed(records: &[ScrobbleRecord]) -> Self {
        let mut batch = Self::default();
        for (i, record) in records.iter().enumerate() {
            batch.push_record(record, Some(i));
        }
        batch
    }

    fn push_record(&mut self, record: &ScrobbleRecord, index: Option<usize>) {
        let key = |name: &str| match index {
            Some(i) => format!("{}[{}]", name, i),
            None => name.to_string(),
        };

        self.pairs.push((key("track"), record.title.clone()));
        self.pairs.push((key("artist"), record.artist.clone()));
        self.pairs.push((key("albumArtist"), record.album_artist.clone()));
        self.pairs.push((key("album"), record.album.clone()));
        self.pairs.push((key("duration"), record.duration.to_string()));
        self.pairs.push((key("timestamp"), record.timestamp().to_string()));
        self.tracks += 1;
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// Number of tracks in the batch
    pub fn len(&self) -> usize {
        self.tracks
    }

    pub fn is_empty(&self) -> bool {
        self.tracks == 0
    }
}

/// Build the submission for `records`.
pub fn format(records: &[ScrobbleRecord], indexed: bool) -> Result<SubmissionBatch, FormatError> {
    match (records, indexed) {
        ([], _) => Err(FormatError::Empty),
        ([record], false) => Ok(SubmissionBatch::single(record)),
        (records, false) => Err(FormatError::UnindexedBatch(records.len())),
        (records, true) => Ok(SubmissionBatch::indexed(records)),
    }
}
