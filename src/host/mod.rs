// Host media player interface
// Everything the plugin reads from or calls on the player goes through here

pub mod module;
pub mod resolver;
pub mod script;

pub use module::{ApiInvoker, HostMethod, HostModule, HostType, ParamType, Visibility};
pub use resolver::{MethodResolver, ResolvedMethod, ResolverError};

use serde::{Deserialize, Serialize};

/// Tag fields the plugin asks the host for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaDataType {
    Artist,
    TrackTitle,
    Album,
    AlbumArtist,
}

/// File properties the plugin asks the host for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileProperty {
    PlayCount,
}

/// Notifications the host delivers to the plugin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    PluginStartup,
    TrackChanged,
    PlayCountersChanged,
}

/// Telemetry accessors exposed by the host.
///
/// Durations are milliseconds. Tag lookups return one string per requested
/// field, in request order; unknown values come back empty.
pub trait HostApi {
    fn api_revision(&self) -> i32;

    fn now_playing_url(&self) -> Option<String>;

    fn now_playing_duration(&self) -> f64;

    fn now_playing_tags(&self, fields: &[MetaDataType]) -> Vec<String>;

    fn file_tags(&self, file: &str, fields: &[MetaDataType]) -> Vec<String>;

    fn file_property(&self, file: &str, property: FileProperty) -> String;

    fn file_duration(&self, file: &str) -> f64;

    /// Files currently selected in the host's library view
    fn selected_files(&self) -> Vec<String>;

    /// Modules loaded into the host process, searched for the submission method
    fn loaded_modules(&self) -> Vec<HostModule>;
}
