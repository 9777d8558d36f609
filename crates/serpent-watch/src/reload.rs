// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Receiving side of reload notifications.
//!
//! A host registers each reloadable module under its dotted name together
//! with a hook that re-initializes it. Incoming `{reload, Name}` messages are
//! routed to the matching hook.

use serpent::Term;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReloadError {
    #[error("could not decode module name: {0}")]
    ModuleName(String),

    #[error("module '{0}' not found")]
    NotFound(String),

    #[error("reloading '{module}' failed: {reason}")]
    Hook { module: String, reason: String },

    #[error("not a reload message: {0}")]
    InvalidMessage(String),
}

/// Re-initializes one module; receives the module's dotted name.
pub type ReloadHook = Box<dyn Fn(&str) -> Result<(), String> + Send + Sync>;

/// Module name carried by a reload message.
pub fn decode_module_name(term: &Term) -> Result<String, ReloadError> {
    match term {
        Term::Binary(bytes) => {
            String::from_utf8(bytes.clone()).map_err(|e| ReloadError::ModuleName(e.to_string()))
        }
        Term::Text(name) => Ok(name.clone()),
        other => Err(ReloadError::ModuleName(other.to_string())),
    }
}

fn top_package(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Registry of reloadable modules.
#[derive(Default)]
pub struct ModuleReloader {
    modules: BTreeMap<String, ReloadHook>,
}

impl ModuleReloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `module` (dotted name). A second registration replaces the hook.
    pub fn register<F>(&mut self, module: impl Into<String>, hook: F)
    where
        F: Fn(&str) -> Result<(), String> + Send + Sync + 'static,
    {
        let module = module.into();
        tracing::debug!("registered reloadable module {}", module);
        self.modules.insert(module, Box::new(hook));
    }

    pub fn contains(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    /// Top-level packages with at least one registered module.
    pub fn packages(&self) -> Vec<&str> {
        let mut packages: Vec<&str> = self.modules.keys().map(|m| top_package(m)).collect();
        packages.sort_unstable();
        packages.dedup();
        packages
    }

    /// Reload `module`.
    ///
    /// Returns `Ok(false)` when no registered package owns the name, and
    /// [`ReloadError::NotFound`] when the package is known but the module is
    /// not.
    pub fn reload(&self, module: &str) -> Result<bool, ReloadError> {
        let package = top_package(module);
        let owned = self.modules.keys().any(|m| top_package(m) == package);
        if !owned {
            tracing::debug!("no package owns {}, ignoring reload", module);
            return Ok(false);
        }

        let hook = self
            .modules
            .get(module)
            .ok_or_else(|| ReloadError::NotFound(module.to_string()))?;
        hook(module).map_err(|reason| ReloadError::Hook {
            module: module.to_string(),
            reason,
        })?;
        tracing::info!("reloaded {}", module);
        Ok(true)
    }

    /// Handle a `{reload, Name}` message.
    pub fn handle_message(&self, message: &Term) -> Result<bool, ReloadError> {
        match message {
            Term::Tuple(items) if items.len() == 2 && items[0] == Term::atom("reload") => {
                let module = decode_module_name(&items[1])?;
                self.reload(&module)
            }
            other => Err(ReloadError::InvalidMessage(other.to_string())),
        }
    }
}

impl std::fmt::Debug for ModuleReloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleReloader")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting(reloader: &mut ModuleReloader, module: &str) -> Arc<AtomicUsize> {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = count.clone();
        reloader.register(module, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        count
    }

    #[test]
    fn test_decode_module_name() {
        assert_eq!(decode_module_name(&Term::binary("pkg.mod")).unwrap(), "pkg.mod");
        assert_eq!(decode_module_name(&Term::Text("pkg".into())).unwrap(), "pkg");
        assert!(matches!(
            decode_module_name(&Term::Integer(1)),
            Err(ReloadError::ModuleName(_))
        ));
        assert!(matches!(
            decode_module_name(&Term::Binary(vec![0xff])),
            Err(ReloadError::ModuleName(_))
        ));
    }

    #[test]
    fn test_reload_known_module() {
        let mut reloader = ModuleReloader::new();
        let count = counting(&mut reloader, "snake.venom");
        assert_eq!(reloader.reload("snake.venom"), Ok(true));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_reload_unknown_package_is_ignored() {
        let mut reloader = ModuleReloader::new();
        counting(&mut reloader, "snake.venom");
        assert_eq!(reloader.reload("lizard.tail"), Ok(false));
    }

    #[test]
    fn test_reload_unknown_module_in_known_package() {
        let mut reloader = ModuleReloader::new();
        counting(&mut reloader, "snake.venom");
        assert_eq!(
            reloader.reload("snake.fangs"),
            Err(ReloadError::NotFound("snake.fangs".into()))
        );
    }

    #[test]
    fn test_hook_failure_reported() {
        let mut reloader = ModuleReloader::new();
        reloader.register("snake", |_| Err("syntax error".to_string()));
        assert!(matches!(reloader.reload("snake"), Err(ReloadError::Hook { .. })));
    }

    #[test]
    fn test_handle_message() {
        let mut reloader = ModuleReloader::new();
        let count = counting(&mut reloader, "snake.venom");

        let message = Term::Tuple(vec![Term::atom("reload"), Term::binary("snake.venom")]);
        assert_eq!(reloader.handle_message(&message), Ok(true));
        assert_eq!(count.load(Ordering::SeqCst), 1);

        let bogus = Term::Tuple(vec![Term::atom("stop"), Term::binary("snake.venom")]);
        assert!(matches!(
            reloader.handle_message(&bogus),
            Err(ReloadError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_packages() {
        let mut reloader = ModuleReloader::new();
        counting(&mut reloader, "snake.venom");
        counting(&mut reloader, "snake.fangs");
        counting(&mut reloader, "lizard");
        assert_eq!(reloader.packages(), vec!["lizard", "snake"]);
        assert!(reloader.contains("snake.fangs"));
    }
}
