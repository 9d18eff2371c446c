// Submitter backed by the API call found inside the host

use anyhow::{Context, Result};
use std::io::Read;

use super::batch::SubmissionBatch;
use super::traits::{ScrobbleSubmitter, SCROBBLE_API_VERSION, SCROBBLE_METHOD};
use crate::host::ResolvedMethod;

pub struct HostMethodSubmitter {
    name: String,
    method: ResolvedMethod,
}

impl HostMethodSubmitter {
    pub fn new(method: ResolvedMethod) -> Self {
        Self {
            name: format!("{}.{}", method.type_name, method.method),
            method,
        }
    }
}

impl ScrobbleSubmitter for HostMethodSubmitter {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&self, batch: &SubmissionBatch) -> Result<()> {
        log::debug!(
            "Calling {} via {} with {} parameters",
            SCROBBLE_METHOD,
            self.name,
            batch.pairs().len()
        );

        let mut reader = self
            .method
            .invoker
            .invoke(SCROBBLE_METHOD, SCROBBLE_API_VERSION, batch.pairs())
            .with_context(|| format!("Host call {} failed", self.name))?;

        // The call has gone through; the response is only logged
        let mut response = Vec::new();
        match reader.read_to_end(&mut response) {
            Ok(_) => log::debug!(
                "{} response: {}",
                SCROBBLE_METHOD,
                String::from_utf8_lossy(&response).trim()
            ),
            Err(e) => log::debug!("Could not read {} response: {}", SCROBBLE_METHOD, e),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ApiInvoker;
    use crate::scrobbler::record::{ScrobbleRecord, TrackTelemetry};
    use chrono::{TimeZone, Utc};
    use std::cell::RefCell;
    use std::io::Cursor;
    use std::rc::Rc;
    use std::sync::Arc;

    type Calls = Rc<RefCell<Vec<(String, u32, Vec<(String, String)>)>>>;

    struct Recording(Calls);

    impl ApiInvoker for Recording {
        fn invoke(&self, method: &str, api_version: u32, params: &[(String, String)]) -> Result<Box<dyn Read>> {
            self.0
                .borrow_mut()
                .push((method.to_string(), api_version, params.to_vec()));
            Ok(Box::new(Cursor::new(b"<lfm status=\"ok\"/>".to_vec())))
        }
    }

    struct Failing;

    impl ApiInvoker for Failing {
        fn invoke(&self, _method: &str, _api_version: u32, _params: &[(String, String)]) -> Result<Box<dyn Read>> {
            anyhow::bail!("rejected")
        }
    }

    struct Replying(&'static [u8]);

    impl ApiInvoker for Replying {
        fn invoke(&self, _method: &str, _api_version: u32, _params: &[(String, String)]) -> Result<Box<dyn Read>> {
            Ok(Box::new(Cursor::new(self.0.to_vec())))
        }
    }

    struct BrokenBody;

    impl Read for BrokenBody {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset"))
        }
    }

    struct BrokenReply;

    impl ApiInvoker for BrokenReply {
        fn invoke(&self, _method: &str, _api_version: u32, _params: &[(String, String)]) -> Result<Box<dyn Read>> {
            Ok(Box::new(BrokenBody))
        }
    }

    fn resolved(invoker: Arc<dyn ApiInvoker>) -> ResolvedMethod {
        ResolvedMethod {
            module: "MusicBee".to_string(),
            type_name: "T".to_string(),
            method: "m".to_string(),
            invoker,
        }
    }

    fn batch() -> SubmissionBatch {
        let record = ScrobbleRecord::new(
            TrackTelemetry::from_tags(&["A".to_string(), "T".to_string()], 5_000.0),
            Utc.timestamp_opt(1_000, 0).unwrap(),
        );
        SubmissionBatch::single(&record)
    }

    #[test]
    fn calls_track_scrobble_version_five() {
        let calls: Calls = Rc::default();
        let submitter = HostMethodSubmitter::new(resolved(Arc::new(Recording(calls.clone()))));

        submitter.submit(&batch()).unwrap();

        let calls = calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "track.scrobble");
        assert_eq!(calls[0].1, 5);
        assert_eq!(calls[0].2, batch().pairs().to_vec());
        assert_eq!(submitter.name(), "T.m");
    }

    #[test]
    fn propagates_host_failure() {
        let submitter = HostMethodSubmitter::new(resolved(Arc::new(Failing)));
        let err = submitter.submit(&batch()).unwrap_err();
        assert!(err.to_string().contains("Host call T.m failed"));
    }

    #[test]
    fn non_utf8_response_still_succeeds() {
        let submitter = HostMethodSubmitter::new(resolved(Arc::new(Replying(
            b"<lfm status=\"ok\"><track>Caf\xe9</track></lfm>",
        ))));
        assert!(submitter.submit(&batch()).is_ok());
    }

    #[test]
    fn unreadable_response_still_succeeds() {
        let submitter = HostMethodSubmitter::new(resolved(Arc::new(BrokenReply)));
        assert!(submitter.submit(&batch()).is_ok());
    }
}
