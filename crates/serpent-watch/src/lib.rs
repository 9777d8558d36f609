// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serpent source watcher
//!
//! Watches source trees and tells a BEAM process which modules to reload,
//! plus the receiving side that maps reload messages to module hooks.
//!
//! # Quick Start
//!
//! ```bash
//! # Watch one tree
//! serpent-watch --path priv/python --pid "<0.120.0>"
//!
//! # Using config file
//! serpent-watch --config serpent-watch.toml
//! ```
//!
//! # Configuration File
//!
//! ```toml
//! paths = ["priv/python"]
//! pid = "<0.120.0>"
//! extensions = ["py"]
//! debounce_ms = 500
//! poll_interval_ms = 250
//! log_level = "info"
//! ```

pub mod config;
pub mod notify;
pub mod reload;
pub mod watcher;

pub use config::{ConfigError, WatchConfig};
pub use notify::{ChannelNotifier, Notifier, NotifyError, StdoutNotifier};
pub use reload::{decode_module_name, ModuleReloader, ReloadError};
pub use watcher::{
    module_name, Debouncer, FileEvent, FileEventKind, FileWatcher, ReloadDispatcher, Scanner,
    WatchError,
};
