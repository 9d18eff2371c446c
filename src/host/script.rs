// Host backed by a recorded session file
// Lets a captured player session be replayed through the plugin offline

use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::module::{ApiInvoker, HostMethod, HostModule, HostType, ParamType, Visibility};
use super::{FileProperty, HostApi, MetaDataType};

/// A recorded session: host state plus the notifications it produced
#[derive(Debug, Clone, Deserialize)]
pub struct SessionScript {
    pub api_revision: i32,
    #[serde(default)]
    pub library: HashMap<String, LibraryEntry>,
    #[serde(default)]
    pub selection: Vec<String>,
    #[serde(default)]
    pub modules: Vec<ModuleDecl>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

impl SessionScript {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read session file {:?}", path))?;
        Self::parse(&content).with_context(|| format!("Failed to parse session file {:?}", path))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LibraryEntry {
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub album_artist: String,
    pub duration_ms: f64,
    #[serde(default)]
    pub play_count: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDecl {
    pub name: String,
    #[serde(default)]
    pub types: Vec<TypeDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    #[serde(default)]
    pub methods: Vec<MethodDecl>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MethodDecl {
    pub name: String,
    pub params: Vec<ParamType>,
    pub returns: ParamType,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub is_static: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptEvent {
    Startup,
    TrackChanged { file: String },
    PlayCountChanged { file: String, play_count: String },
    Select { files: Vec<String> },
    ScrobbleSelected,
}

/// [`HostApi`] over a [`SessionScript`]. Every declared method is bound to the
/// same invoker, so which one gets called is decided purely by signature.
pub struct ScriptedHost {
    api_revision: i32,
    library: HashMap<String, LibraryEntry>,
    selection: Vec<String>,
    modules: Vec<ModuleDecl>,
    now_playing: Option<String>,
    invoker: Arc<dyn ApiInvoker>,
}

impl ScriptedHost {
    pub fn new(script: &SessionScript, invoker: Arc<dyn ApiInvoker>) -> Self {
        Self {
            api_revision: script.api_revision,
            library: script.library.clone(),
            selection: script.selection.clone(),
            modules: script.modules.clone(),
            now_playing: None,
            invoker,
        }
    }

    pub fn set_now_playing(&mut self, file: &str) {
        if !self.library.contains_key(file) {
            log::warn!("Now playing {} is not in the library", file);
        }
        self.now_playing = Some(file.to_string());
    }

    pub fn set_play_count(&mut self, file: &str, play_count: &str) {
        self.library.entry(file.to_string()).or_default().play_count = play_count.to_string();
    }

    pub fn set_selection(&mut self, files: Vec<String>) {
        self.selection = files;
    }

    fn entry(&self, file: &str) -> Option<&LibraryEntry> {
        self.library.get(file)
    }

    fn tags_of(&self, file: Option<&str>, fields: &[MetaDataType]) -> Vec<String> {
        let entry = file.and_then(|f| self.entry(f));
        fields
            .iter()
            .map(|field| {
                entry
                    .map(|e| match field {
                        MetaDataType::Artist => e.artist.clone(),
                        MetaDataType::TrackTitle => e.title.clone(),
                        MetaDataType::Album => e.album.clone(),
                        MetaDataType::AlbumArtist => e.album_artist.clone(),
                    })
                    .unwrap_or_default()
            })
            .collect()
    }
}

impl HostApi for ScriptedHost {
    fn api_revision(&self) -> i32 {
        self.api_revision
    }

    fn now_playing_url(&self) -> Option<String> {
        self.now_playing.clone()
    }

    fn now_playing_duration(&self) -> f64 {
        self.now_playing
            .as_deref()
            .map(|f| self.file_duration(f))
            .unwrap_or_default()
    }

    fn now_playing_tags(&self, fields: &[MetaDataType]) -> Vec<String> {
        self.tags_of(self.now_playing.as_deref(), fields)
    }

    fn file_tags(&self, file: &str, fields: &[MetaDataType]) -> Vec<String> {
        self.tags_of(Some(file), fields)
    }

    fn file_property(&self, file: &str, property: FileProperty) -> String {
        match property {
            FileProperty::PlayCount => self
                .entry(file)
                .map(|e| e.play_count.clone())
                .unwrap_or_default(),
        }
    }

    fn file_duration(&self, file: &str) -> f64 {
        self.entry(file).map(|e| e.duration_ms).unwrap_or_default()
    }

    fn selected_files(&self) -> Vec<String> {
        self.selection.clone()
    }

    fn loaded_modules(&self) -> Vec<HostModule> {
        self.modules
            .iter()
            .map(|module| {
                let types = module
                    .types
                    .iter()
                    .map(|t| {
                        let methods = t
                            .methods
                            .iter()
                            .map(|m| {
                                HostMethod::declared(m.name.clone(), m.params.clone(), m.returns.clone())
                                    .with_visibility(m.visibility, m.is_static)
                                    .bind(self.invoker.clone())
                            })
                            .collect();
                        HostType::new(t.name.clone(), methods)
                    })
                    .collect();
                HostModule::new(module.name.clone(), types)
            })
            .collect()
    }
}
