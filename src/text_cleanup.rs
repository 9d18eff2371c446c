// Tag cleanup applied before submission
// Strips configured regex patterns from artist/title/album text

use crate::config::CleanupConfig;
use regex::Regex;

#[derive(Debug, Clone, Default)]
pub struct TextCleaner {
    patterns: Vec<Regex>,
}

impl TextCleaner {
    /// Compile the configured patterns; invalid ones are skipped
    pub fn new(config: &CleanupConfig) -> Self {
        if !config.enabled {
            return Self::default();
        }

        let patterns = config
            .patterns
            .iter()
            .filter_map(|pattern| match Regex::new(pattern) {
                Ok(re) => Some(re),
                Err(e) => {
                    log::warn!("Invalid cleanup pattern '{}': {}", pattern, e);
                    None
                }
            })
            .collect();

        Self { patterns }
    }

    pub fn is_active(&self) -> bool {
        !self.patterns.is_empty()
    }

    /// Remove every pattern match, then trim. Untouched when inactive.
    pub fn clean(&self, text: &str) -> String {
        if !self.is_active() {
            return text.to_string();
        }

        let cleaned = self
            .patterns
            .iter()
            .fold(text.to_string(), |acc, re| re.replace_all(&acc, "").into_owned());

        cleaned.trim().to_string()
    }
}
