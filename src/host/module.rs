// Catalog of the types and methods a host module exposes

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Read;
use std::sync::Arc;

/// Parameter and return types as far as signature matching cares
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Int,
    Bool,
    /// Array of (string, string) pairs
    StringPairArray,
    /// Generic streaming reader over the response
    StreamReader,
    Void,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Private,
}

/// Something that can carry out a call on the host's API client
pub trait ApiInvoker {
    fn invoke(&self, method: &str, api_version: u32, params: &[(String, String)]) -> Result<Box<dyn Read>>;
}

#[derive(Clone)]
pub struct HostMethod {
    pub name: String,
    pub params: Vec<ParamType>,
    pub returns: ParamType,
    pub visibility: Visibility,
    pub is_static: bool,
    invoker: Option<Arc<dyn ApiInvoker>>,
}

impl HostMethod {
    /// A method known by signature only
    pub fn declared(name: impl Into<String>, params: Vec<ParamType>, returns: ParamType) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            visibility: Visibility::Public,
            is_static: true,
            invoker: None,
        }
    }

    pub fn with_visibility(mut self, visibility: Visibility, is_static: bool) -> Self {
        self.visibility = visibility;
        self.is_static = is_static;
        self
    }

    /// Attach the callable behind this method
    pub fn bind(mut self, invoker: Arc<dyn ApiInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn invoker(&self) -> Option<&Arc<dyn ApiInvoker>> {
        self.invoker.as_ref()
    }
}

impl fmt::Debug for HostMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostMethod")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("visibility", &self.visibility)
            .field("is_static", &self.is_static)
            .field("bound", &self.invoker.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HostType {
    pub name: String,
    pub methods: Vec<HostMethod>,
}

impl HostType {
    pub fn new(name: impl Into<String>, methods: Vec<HostMethod>) -> Self {
        Self {
            name: name.into(),
            methods,
        }
    }
}

/// One module (assembly) loaded in the host process
#[derive(Debug, Clone)]
pub struct HostModule {
    pub name: String,
    pub types: Vec<HostType>,
}

impl HostModule {
    pub fn new(name: impl Into<String>, types: Vec<HostType>) -> Self {
        Self {
            name: name.into(),
            types,
        }
    }
}
