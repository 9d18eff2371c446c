//! Scrobbles tracks that are too short for the media player's built-in
//! Last.fm integration.
//!
//! The host player drives a [`plugin::PluginSession`] with its notifications.
//! The session decides what to scrobble ([`engine`]), formats the submission
//! ([`scrobbler`]) and sends it through the API call found inside the host
//! ([`host::resolver`]).

pub mod config;
pub mod engine;
pub mod host;
pub mod plugin;
pub mod replay;
pub mod scrobbler;
pub mod text_cleanup;
pub mod threshold;
