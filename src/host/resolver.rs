// Finds the host's internal API call by its shape.
//
// The host has no stable entry point for submitting scrobbles and its type and
// method names are obfuscated, so the call is located by signature:
// (string, _, (string, string)[]) -> stream reader. The first match wins and
// nothing else is checked, so an unrelated method with the same shape would
// be picked just as happily.

use std::sync::Arc;
use thiserror::Error;

use super::module::{ApiInvoker, HostMethod, HostModule, ParamType};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ResolverError {
    #[error("no loaded module name contains '{0}'")]
    ModuleNotFound(String),

    #[error("no method in module '{module}' matches the API call signature ({types_scanned} types scanned)")]
    NoMatchingMethod { module: String, types_scanned: usize },

    #[error("method {type_name}.{method} matches but is not callable")]
    Unbound { type_name: String, method: String },
}

/// The located API call
#[derive(Clone)]
pub struct ResolvedMethod {
    pub module: String,
    pub type_name: String,
    pub method: String,
    pub invoker: Arc<dyn ApiInvoker>,
}

impl std::fmt::Debug for ResolvedMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}::{}.{}", self.module, self.type_name, self.method)
    }
}

pub struct MethodResolver {
    module_hint: String,
}

impl MethodResolver {
    pub fn new(module_hint: impl Into<String>) -> Self {
        Self {
            module_hint: module_hint.into(),
        }
    }

    pub fn resolve(&self, modules: &[HostModule]) -> Result<ResolvedMethod, ResolverError> {
        let module = modules
            .iter()
            .find(|m| m.name.contains(&self.module_hint))
            .ok_or_else(|| ResolverError::ModuleNotFound(self.module_hint.clone()))?;

        log::debug!(
            "Scanning {} types in module '{}' for the API call",
            module.types.len(),
            module.name
        );

        for host_type in &module.types {
            let Some(method) = host_type.methods.iter().find(|m| matches_api_call(m)) else {
                continue;
            };

            let invoker = method.invoker().cloned().ok_or_else(|| ResolverError::Unbound {
                type_name: host_type.name.clone(),
                method: method.name.clone(),
            })?;

            log::info!(
                "Resolved API call to {}.{} in '{}'",
                host_type.name,
                method.name,
                module.name
            );

            return Ok(ResolvedMethod {
                module: module.name.clone(),
                type_name: host_type.name.clone(),
                method: method.name.clone(),
                invoker,
            });
        }

        Err(ResolverError::NoMatchingMethod {
            module: module.name.clone(),
            types_scanned: module.types.len(),
        })
    }
}

/// Structural test only: visibility, static-ness and names are ignored
pub fn matches_api_call(method: &HostMethod) -> bool {
    method.params.len() == 3
        && method.params[0] == ParamType::String
        && method.params[2] == ParamType::StringPairArray
        && method.returns == ParamType::StreamReader
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::module::{HostType, Visibility};
    use anyhow::Result;
    use std::io::{Cursor, Read};

    struct Canned;

    impl ApiInvoker for Canned {
        fn invoke(&self, _method: &str, _api_version: u32, _params: &[(String, String)]) -> Result<Box<dyn Read>> {
            Ok(Box::new(Cursor::new(b"<lfm status=\"ok\"/>".to_vec())))
        }
    }

    fn api_call(name: &str) -> HostMethod {
        HostMethod::declared(
            name,
            vec![ParamType::String, ParamType::Int, ParamType::StringPairArray],
            ParamType::StreamReader,
        )
        .bind(Arc::new(Canned))
    }

    fn decoys() -> Vec<HostMethod> {
        vec![
            HostMethod::declared("a", vec![ParamType::String], ParamType::Void),
            // right shape, wrong return
            HostMethod::declared(
                "b",
                vec![ParamType::String, ParamType::Int, ParamType::StringPairArray],
                ParamType::String,
            ),
            // four parameters
            HostMethod::declared(
                "c",
                vec![
                    ParamType::String,
                    ParamType::Int,
                    ParamType::StringPairArray,
                    ParamType::Bool,
                ],
                ParamType::StreamReader,
            ),
            // pair array in the wrong slot
            HostMethod::declared(
                "d",
                vec![ParamType::StringPairArray, ParamType::Int, ParamType::String],
                ParamType::StreamReader,
            ),
        ]
    }

    fn module(types: Vec<HostType>) -> Vec<HostModule> {
        vec![
            HostModule::new("System.Xml", vec![HostType::new("XmlReader", vec![api_call("Create")])]),
            HostModule::new("MusicBee, Version=3.5", types),
        ]
    }

    #[test]
    fn finds_single_match() {
        let modules = module(vec![
            HostType::new("\u{2}a", decoys()),
            HostType::new(
                "\u{5}b",
                vec![api_call("\u{1}c").with_visibility(Visibility::Private, false)],
            ),
        ]);

        let resolved = MethodResolver::new("MusicBee").resolve(&modules).unwrap();
        assert_eq!(resolved.module, "MusicBee, Version=3.5");
        assert_eq!(resolved.type_name, "\u{5}b");
        assert_eq!(resolved.method, "\u{1}c");
    }

    #[test]
    fn first_match_wins() {
        let modules = module(vec![
            HostType::new("First", vec![api_call("one"), api_call("two")]),
            HostType::new("Second", vec![api_call("three")]),
        ]);

        let resolved = MethodResolver::new("MusicBee").resolve(&modules).unwrap();
        assert_eq!((resolved.type_name.as_str(), resolved.method.as_str()), ("First", "one"));
    }

    #[test]
    fn middle_parameter_is_not_checked() {
        let odd = HostMethod::declared(
            "odd",
            vec![ParamType::String, ParamType::Other("Uri".to_string()), ParamType::StringPairArray],
            ParamType::StreamReader,
        );
        assert!(matches_api_call(&odd));
    }

    #[test]
    fn no_match_is_reported() {
        let modules = module(vec![HostType::new("T", decoys())]);
        let err = MethodResolver::new("MusicBee").resolve(&modules).unwrap_err();
        assert_eq!(
            err,
            ResolverError::NoMatchingMethod {
                module: "MusicBee, Version=3.5".to_string(),
                types_scanned: 1,
            }
        );
    }

    #[test]
    fn missing_module_is_reported() {
        let err = MethodResolver::new("Foobar").resolve(&module(vec![])).unwrap_err();
        assert_eq!(err, ResolverError::ModuleNotFound("Foobar".to_string()));
    }

    #[test]
    fn unbound_match_is_reported() {
        let unbound = HostMethod::declared(
            "x",
            vec![ParamType::String, ParamType::Int, ParamType::StringPairArray],
            ParamType::StreamReader,
        );
        let modules = module(vec![HostType::new("T", vec![unbound])]);
        assert!(matches!(
            MethodResolver::new("MusicBee").resolve(&modules),
            Err(ResolverError::Unbound { .. })
        ));
    }
}
