// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Callable signatures for tooling.
//!
//! A [`ModuleCatalog`] lists the modules a host exposes, their callables and
//! each callable's parameters. Signatures can cross the bridge as typed
//! records via [`Parameter::to_record`].

use crate::record::{Record, RecordType, RecordTypeBuilder};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};
use thiserror::Error;

/// Tag under which parameters are sent.
pub const PARAMETER_TAG: &str = "Elixir.Serpent.Parameter";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntrospectError {
    #[error("no module named '{0}'")]
    UnknownModule(String),
}

/// How an argument binds to a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterKind {
    PositionalOnly,
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

impl ParameterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::PositionalOnly => "POSITIONAL_ONLY",
            Self::PositionalOrKeyword => "POSITIONAL_OR_KEYWORD",
            Self::VarPositional => "VAR_POSITIONAL",
            Self::KeywordOnly => "KEYWORD_ONLY",
            Self::VarKeyword => "VAR_KEYWORD",
        }
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One parameter of a callable.
///
/// `default` and `annotation` are rendered source text; `None` when absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    pub default: Option<String>,
    pub annotation: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>, kind: ParameterKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            annotation: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    /// Record type describing a parameter, ready to register.
    pub fn record_type() -> Arc<RecordType> {
        static TYPE: OnceLock<Arc<RecordType>> = OnceLock::new();
        TYPE.get_or_init(|| {
            Arc::new(
                RecordTypeBuilder::new("Parameter")
                    .tag(PARAMETER_TAG)
                    .string_field("name")
                    .string_field("kind")
                    .nil_field("default")
                    .nil_field("annotation")
                    .build(),
            )
        })
        .clone()
    }

    pub fn to_record(&self) -> Record {
        Record::blank(&Self::record_type())
            .with("name", self.name.as_str())
            .with("kind", self.kind.as_str())
            .with("default", self.default.clone())
            .with("annotation", self.annotation.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    Function,
    /// Parameters are those of the constructor.
    Class,
    /// Callable without an inspectable signature.
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callable {
    pub name: String,
    pub kind: CallableKind,
    pub parameters: Vec<Parameter>,
}

impl Callable {
    pub fn function(name: impl Into<String>, parameters: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            kind: CallableKind::Function,
            parameters,
        }
    }

    pub fn class(name: impl Into<String>, constructor: Vec<Parameter>) -> Self {
        Self {
            name: name.into(),
            kind: CallableKind::Class,
            parameters: constructor,
        }
    }

    pub fn other(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: CallableKind::Other,
            parameters: Vec::new(),
        }
    }

    /// Parameters as reported to tooling; empty for non-inspectable callables.
    pub fn signature(&self) -> &[Parameter] {
        match self.kind {
            CallableKind::Function | CallableKind::Class => &self.parameters,
            CallableKind::Other => &[],
        }
    }
}

/// Modules and their callables.
#[derive(Debug, Clone, Default)]
pub struct ModuleCatalog {
    modules: BTreeMap<String, BTreeMap<String, Callable>>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a module. Registering twice keeps its callables.
    pub fn register_module(&mut self, module: impl Into<String>) {
        self.modules.entry(module.into()).or_default();
    }

    /// Add a callable to a module, declaring the module if needed.
    pub fn add_callable(&mut self, module: impl Into<String>, callable: Callable) {
        let module = module.into();
        log::trace!("[serpent] catalog {} += {}", module, callable.name);
        self.modules
            .entry(module)
            .or_default()
            .insert(callable.name.clone(), callable);
    }

    /// Every callable of `module` with its parameters.
    pub fn module_functions(
        &self,
        module: &str,
    ) -> Result<BTreeMap<String, Vec<Parameter>>, IntrospectError> {
        let callables = self
            .modules
            .get(module)
            .ok_or_else(|| IntrospectError::UnknownModule(module.to_string()))?;
        Ok(callables
            .iter()
            .map(|(name, callable)| (name.clone(), callable.signature().to_vec()))
            .collect())
    }

    /// Names of all known modules, sorted.
    pub fn all_modules(&self) -> Vec<&str> {
        self.modules.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter;
    use crate::registry::StructRegistry;
    use crate::term::Term;
    use crate::value::Value;

    fn catalog() -> ModuleCatalog {
        let mut catalog = ModuleCatalog::new();
        catalog.add_callable(
            "snake",
            Callable::function(
                "bite",
                vec![
                    Parameter::new("target", ParameterKind::PositionalOrKeyword)
                        .with_annotation("str"),
                    Parameter::new("times", ParameterKind::KeywordOnly).with_default("1"),
                    Parameter::new("rest", ParameterKind::VarKeyword),
                ],
            ),
        );
        catalog.add_callable(
            "snake",
            Callable::class(
                "Venom",
                vec![Parameter::new("self", ParameterKind::PositionalOrKeyword)],
            ),
        );
        catalog.add_callable("snake", Callable::other("builtin_len"));
        catalog.register_module("empty");
        catalog
    }

    #[test]
    fn test_module_functions() {
        let functions = catalog().module_functions("snake").expect("module");
        assert_eq!(
            functions.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["Venom", "bite", "builtin_len"]
        );
        assert_eq!(functions["bite"].len(), 3);
        assert_eq!(functions["bite"][1].default.as_deref(), Some("1"));
        assert_eq!(functions["Venom"][0].name, "self");
        assert!(functions["builtin_len"].is_empty());
    }

    #[test]
    fn test_unknown_module() {
        assert_eq!(
            catalog().module_functions("nope").err(),
            Some(IntrospectError::UnknownModule("nope".into()))
        );
        assert!(catalog().module_functions("empty").expect("empty").is_empty());
    }

    #[test]
    fn test_all_modules_sorted() {
        assert_eq!(catalog().all_modules(), vec!["empty", "snake"]);
    }

    #[test]
    fn test_kind_rendering() {
        assert_eq!(ParameterKind::VarPositional.to_string(), "VAR_POSITIONAL");
        assert_eq!(ParameterKind::PositionalOnly.as_str(), "POSITIONAL_ONLY");
    }

    #[test]
    fn test_parameter_crosses_as_record() {
        let param = Parameter::new("times", ParameterKind::KeywordOnly).with_default("1");
        let record = param.to_record();
        assert_eq!(record.get("kind"), Some(&Value::from("KEYWORD_ONLY")));
        assert_eq!(record.get("annotation"), Some(&Value::Nil));

        let term = adapter::to_term(&record).expect("encode");
        let map = term.as_map().expect("map");
        assert_eq!(map.get(&Term::atom("default")), Some(&Term::binary("1")));

        let mut registry = StructRegistry::new();
        registry.register_type(Parameter::record_type()).expect("register");
        let back = adapter::from_term(None, map, Some(&registry)).expect("decode");
        assert_eq!(back, record);
    }
}
