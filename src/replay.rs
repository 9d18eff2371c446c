// Replays a recorded host session through a PluginSession

use anyhow::{Context, Result};
use serde::Serialize;
use std::cell::RefCell;
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use crate::config::Config;
use crate::host::script::{ScriptEvent, ScriptedHost, SessionScript};
use crate::host::{ApiInvoker, NotificationType};
use crate::plugin::{Dispatch, PluginSession};

/// Writes each host API call as one JSON line
pub struct JsonLinesInvoker {
    out: RefCell<Box<dyn Write>>,
}

#[derive(Serialize)]
struct CallLine<'a> {
    method: &'a str,
    api_version: u32,
    params: &'a [(String, String)],
}

impl JsonLinesInvoker {
    pub fn new(out: Box<dyn Write>) -> Self {
        Self {
            out: RefCell::new(out),
        }
    }

    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl ApiInvoker for JsonLinesInvoker {
    fn invoke(&self, method: &str, api_version: u32, params: &[(String, String)]) -> Result<Box<dyn Read>> {
        let line = serde_json::to_string(&CallLine {
            method,
            api_version,
            params,
        })?;

        let mut out = self.out.borrow_mut();
        writeln!(out, "{}", line).context("Failed to write call")?;
        out.flush()?;

        Ok(Box::new(Cursor::new(b"<lfm status=\"ok\"/>".to_vec())))
    }
}

/// Totals for one replay run
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ReplaySummary {
    pub events: usize,
    pub submissions: usize,
    pub tracks: usize,
    /// Scrobbles that were due but had no submitter
    pub dropped: usize,
    pub resolver_error: Option<String>,
}

impl ReplaySummary {
    fn record(&mut self, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Nothing => {}
            Dispatch::Submitted { tracks } => {
                self.submissions += 1;
                self.tracks += tracks;
            }
            Dispatch::NoSubmitter => self.dropped += 1,
        }
    }
}

/// Drive every event in `script` through a fresh session.
///
/// Submission failures are logged and the replay carries on, the same way the
/// host swallows errors raised from a notification handler.
pub fn replay(script: &SessionScript, config: Config, invoker: Arc<dyn ApiInvoker>) -> Result<ReplaySummary> {
    let host = ScriptedHost::new(script, invoker);
    let mut session = PluginSession::new(config, host);
    let mut summary = ReplaySummary::default();

    log::info!(
        "Replaying {} events with policy {:?}, threshold {}ms",
        script.events.len(),
        session.policy(),
        session.threshold()
    );

    for event in &script.events {
        summary.events += 1;
        let result = match event {
            ScriptEvent::Startup => session.receive_notification("", NotificationType::PluginStartup),
            ScriptEvent::TrackChanged { file } => {
                session.host_mut().set_now_playing(file);
                session.receive_notification(file, NotificationType::TrackChanged)
            }
            ScriptEvent::PlayCountChanged { file, play_count } => {
                session.host_mut().set_play_count(file, play_count);
                session.receive_notification(file, NotificationType::PlayCountersChanged)
            }
            ScriptEvent::Select { files } => {
                session.host_mut().set_selection(files.clone());
                Ok(Dispatch::Nothing)
            }
            ScriptEvent::ScrobbleSelected => session.scrobble_selected(),
        };

        match result {
            Ok(dispatch) => summary.record(dispatch),
            Err(e) => log::error!("{:#}", e),
        }
    }

    summary.resolver_error = session.resolver_error().map(|e| e.to_string());
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ScrobblePolicy;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct SharedBuf(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.borrow_mut().write(buf)
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    const SESSION: &str = r#"{
        "api_revision": 56,
        "library": {
            "intro.mp3": { "artist": "Band", "title": "Intro", "album": "LP", "duration_ms": 8000, "play_count": "2" },
            "song.mp3": { "artist": "Band", "title": "Song", "album": "LP", "duration_ms": 200000, "play_count": "9" }
        },
        "modules": [
            { "name": "MusicBee, Version=3.5.0.0", "types": [
                { "name": "a", "methods": [
                    { "name": "x", "params": ["string"], "returns": "void" }
                ] },
                { "name": "b", "methods": [
                    { "name": "y", "params": ["string", "int", "string_pair_array"], "returns": "stream_reader", "visibility": "internal" }
                ] }
            ] }
        ],
        "events": [
            { "type": "startup" },
            { "type": "track_changed", "file": "intro.mp3" },
            { "type": "play_count_changed", "file": "intro.mp3", "play_count": "3" },
            { "type": "track_changed", "file": "song.mp3" },
            { "type": "select", "files": ["intro.mp3", "song.mp3"] },
            { "type": "scrobble_selected" }
        ]
    }"#;

    fn run(policy: ScrobblePolicy) -> (ReplaySummary, Vec<serde_json::Value>) {
        let script = SessionScript::parse(SESSION).unwrap();
        let buf = SharedBuf::default();
        let invoker = Arc::new(JsonLinesInvoker::new(Box::new(buf.clone())));
        let config = Config {
            policy,
            ..Config::default()
        };

        let summary = replay(&script, config, invoker).unwrap();
        let output = String::from_utf8(buf.0.borrow().clone()).unwrap();
        let lines = output
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (summary, lines)
    }

    #[test]
    fn immediate_replay() {
        let (summary, lines) = run(ScrobblePolicy::Immediate);

        // intro on track change, then the manual batch of two
        assert_eq!(summary.submissions, 2);
        assert_eq!(summary.tracks, 3);
        assert_eq!(summary.resolver_error, None);

        assert_eq!(lines[0]["method"], "track.scrobble");
        assert_eq!(lines[0]["api_version"], 5);
        assert_eq!(lines[0]["params"][0][0], "track");
        assert_eq!(lines[0]["params"][0][1], "Intro");
        assert_eq!(lines[0]["params"][4][1], "31");

        let batch = lines[1]["params"].as_array().unwrap();
        assert_eq!(batch.len(), 12);
        assert_eq!(batch[6][0], "track[1]");
        assert_eq!(batch[10][1], "200");
    }

    #[test]
    fn confirmed_replay() {
        let (summary, lines) = run(ScrobblePolicy::PlayCountConfirmed);
        assert_eq!(summary.submissions, 2);
        assert_eq!(lines[0]["params"][0][1], "Intro");
    }

    #[test]
    fn manual_replay_only_submits_batch() {
        let (summary, lines) = run(ScrobblePolicy::ManualBatch);
        assert_eq!(summary.submissions, 1);
        assert_eq!(summary.tracks, 2);
        assert_eq!(lines.len(), 1);
    }

    #[test]
    fn unresolved_method_drops_scrobbles() {
        let mut script = SessionScript::parse(SESSION).unwrap();
        script.modules[0].types.truncate(1);

        let invoker = Arc::new(JsonLinesInvoker::new(Box::new(std::io::sink())));
        let summary = replay(&script, Config::default(), invoker).unwrap();

        assert_eq!(summary.submissions, 0);
        assert_eq!(summary.dropped, 2);
        assert!(summary.resolver_error.unwrap().contains("no method"));
    }
}
