// Plugin session
// Owns everything that lives for one host session and routes host notifications

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::config::Config;
use crate::engine::{plan_batch, DecisionEngine, ScrobblePolicy};
use crate::host::{HostApi, MethodResolver, NotificationType, ResolverError};
use crate::scrobbler::{self, HostMethodSubmitter, ScrobbleRecord, ScrobbleSubmitter, TrackTelemetry};
use crate::text_cleanup::TextCleaner;
use crate::threshold::ThresholdResolver;

/// What a notification or command ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Nothing,
    Submitted { tracks: usize },
    /// A scrobble was due but there is nothing to send it through
    NoSubmitter,
}

enum Submitter {
    /// Startup has not been seen yet
    Pending,
    Ready(Box<dyn ScrobbleSubmitter>),
    Unavailable(ResolverError),
}

pub struct PluginSession<H: HostApi> {
    config: Config,
    host: H,
    engine: DecisionEngine,
    cleaner: TextCleaner,
    submitter: Submitter,
    clock: Box<dyn Fn() -> DateTime<Utc>>,
}

impl<H: HostApi> PluginSession<H> {
    pub fn new(config: Config, host: H) -> Self {
        Self {
            engine: DecisionEngine::new(config.policy),
            cleaner: TextCleaner::new(&config.cleanup),
            config,
            host,
            submitter: Submitter::Pending,
            clock: Box::new(Utc::now),
        }
    }

    /// Use `submitter` instead of resolving one from the host at startup
    pub fn with_submitter(mut self, submitter: Box<dyn ScrobbleSubmitter>) -> Self {
        self.submitter = Submitter::Ready(submitter);
        self
    }

    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn policy(&self) -> ScrobblePolicy {
        self.engine.policy()
    }

    /// Active threshold in milliseconds
    pub fn threshold(&self) -> f64 {
        ThresholdResolver::new(&self.config.user_threshold, self.host.api_revision()).resolve()
    }

    /// Drop the user override and return the default now in effect
    pub fn reset_threshold(&mut self) -> f64 {
        self.config.reset_user_threshold();
        ThresholdResolver::new("", self.host.api_revision()).default_threshold()
    }

    /// Why no submitter could be found, if resolution failed
    pub fn resolver_error(&self) -> Option<&ResolverError> {
        match &self.submitter {
            Submitter::Unavailable(e) => Some(e),
            _ => None,
        }
    }

    pub fn receive_notification(&mut self, source_file: &str, kind: NotificationType) -> Result<Dispatch> {
        match kind {
            NotificationType::PluginStartup => {
                self.startup();
                Ok(Dispatch::Nothing)
            }
            NotificationType::TrackChanged => {
                let threshold = self.threshold();
                let now = (self.clock)();
                match self.engine.on_track_changed(&self.host, threshold, now) {
                    Some(record) => self.submit(vec![record], false),
                    None => Ok(Dispatch::Nothing),
                }
            }
            NotificationType::PlayCountersChanged => {
                let threshold = self.threshold();
                let now = (self.clock)();
                match self
                    .engine
                    .on_play_count_changed(&self.host, source_file, threshold, now)
                {
                    Some(record) => self.submit(vec![record], false),
                    None => Ok(Dispatch::Nothing),
                }
            }
        }
    }

    /// Context-menu command: scrobble the host's current selection in one batch
    pub fn scrobble_selected(&mut self) -> Result<Dispatch> {
        let files = self.host.selected_files();
        if files.is_empty() {
            log::info!("Nothing selected");
            return Ok(Dispatch::Nothing);
        }

        let tracks: Vec<TrackTelemetry> = files
            .iter()
            .map(|file| TrackTelemetry::for_file(&self.host, file))
            .collect();
        let records = plan_batch(tracks, (self.clock)());

        log::info!("Scrobbling {} selected tracks", records.len());
        self.submit(records, true)
    }

    fn startup(&mut self) {
        if !matches!(self.submitter, Submitter::Pending) {
            return;
        }

        let resolver = MethodResolver::new(self.config.host_module.as_str());
        self.submitter = match resolver.resolve(&self.host.loaded_modules()) {
            Ok(method) => Submitter::Ready(Box::new(HostMethodSubmitter::new(method))),
            Err(e) => {
                log::error!("Short tracks will not be scrobbled: {}", e);
                Submitter::Unavailable(e)
            }
        };
    }

    fn submit(&self, records: Vec<ScrobbleRecord>, indexed: bool) -> Result<Dispatch> {
        let submitter = match &self.submitter {
            Submitter::Ready(submitter) => submitter,
            Submitter::Pending => {
                log::warn!("Scrobble due before startup, dropping it");
                return Ok(Dispatch::NoSubmitter);
            }
            Submitter::Unavailable(_) => return Ok(Dispatch::NoSubmitter),
        };

        let records: Vec<ScrobbleRecord> = records
            .into_iter()
            .map(|record| record.cleaned(&self.cleaner))
            .collect();

        let batch = scrobbler::format(&records, indexed).context("Failed to build submission")?;
        submitter
            .submit(&batch)
            .with_context(|| format!("Failed to submit {} scrobble(s) via {}", batch.len(), submitter.name()))?;

        for record in &records {
            log::info!("Scrobbled: {} - {}", record.artist, record.title);
        }

        Ok(Dispatch::Submitted {
            tracks: batch.len(),
        })
    }
}
