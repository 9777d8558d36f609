// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serpent source watcher CLI
//!
//! # Usage
//!
//! ```bash
//! # Watch two trees, notify a process
//! serpent-watch --path priv/python --path lib/py --pid "<0.120.0>"
//!
//! # Using configuration file, with a faster scan
//! serpent-watch --config serpent-watch.toml --poll-ms 100
//!
//! # Write an example configuration
//! serpent-watch gen-config --output serpent-watch.toml
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use serpent::Marshaler;
use serpent_watch::{FileWatcher, StdoutNotifier, WatchConfig};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Serpent source watcher
#[derive(Parser, Debug)]
#[command(name = "serpent-watch")]
#[command(about = "Watch source trees and emit {reload, Module} notifications")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory to watch (can repeat)
    #[arg(short, long)]
    path: Vec<PathBuf>,

    /// Target process identifier
    #[arg(long)]
    pid: Option<String>,

    /// Per-file debounce window (milliseconds)
    #[arg(long)]
    debounce_ms: Option<u64>,

    /// Scan interval (milliseconds)
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "serpent-watch.toml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(output),
            Commands::Validate { config } => cmd_validate(config),
        };
    }

    let config = build_config(&args)?;

    // Initialize logging
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let keep_running = Arc::new(AtomicBool::new(true));
    let flag = keep_running.clone();
    ctrlc::set_handler(move || flag.store(false, Ordering::SeqCst))
        .context("failed to install Ctrl-C handler")?;

    eprintln!("serpent-watch v{}", env!("CARGO_PKG_VERSION"));
    for path in &config.paths {
        eprintln!("Watching: {}", path.display());
    }
    eprintln!("Notifying: {}", config.pid);
    eprintln!("Press Ctrl+C to stop...");

    let watcher = FileWatcher::new(
        &config,
        Arc::new(StdoutNotifier),
        Arc::new(Marshaler::new()),
    );
    watcher.run_until(&keep_running)?;

    eprintln!("Shutting down...");
    Ok(())
}

fn build_config(args: &Args) -> anyhow::Result<WatchConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str::<WatchConfig>(&content)
                .with_context(|| format!("parsing {}", path.display()))?
        }
        None => WatchConfig::default(),
    };

    // Command line wins over the file
    if !args.path.is_empty() {
        config.paths = args.path.clone();
    }
    if let Some(ref pid) = args.pid {
        config.pid = pid.clone();
    }
    if let Some(ms) = args.debounce_ms {
        config.debounce_ms = ms;
    }
    if let Some(ms) = args.poll_ms {
        config.poll_interval_ms = ms;
    }
    if let Some(ref level) = args.log_level {
        config.log_level = level.clone();
    }

    config.validate()?;
    Ok(config)
}

fn cmd_gen_config(output: PathBuf) -> anyhow::Result<()> {
    let config = WatchConfig {
        paths: vec![PathBuf::from("priv/python")],
        pid: "<0.120.0>".into(),
        ..Default::default()
    };

    let toml_str = toml::to_string_pretty(&config)?;
    let content = format!(
        r#"# Serpent watcher configuration
# Generated by serpent-watch gen-config

{}
"#,
        toml_str
    );

    std::fs::write(&output, content)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: PathBuf) -> anyhow::Result<()> {
    match WatchConfig::from_file(&config_path) {
        Ok(config) => {
            println!("Configuration valid!");
            println!();
            println!("Target pid: {}", config.pid);
            println!("Extensions: {}", config.extensions.join(", "));
            println!("Debounce: {} ms, poll: {} ms", config.debounce_ms, config.poll_interval_ms);
            for (i, path) in config.paths.iter().enumerate() {
                println!("  [{}] {}", i, path.display());
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            std::process::exit(1);
        }
    }
}
