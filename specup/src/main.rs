//! specup - markdown specification compiler
//!
//! Reads the document set configuration, renders every document and, unless
//! running once, keeps rebuilding documents as their sources change.

#![deny(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Cli;
use specup::assets::AssetBundle;
use specup::markdown::{EngineOptions, MarkdownEngine};
use specup::page_shell::StandardShell;
use specup::watch::WatchConfig;
use specup::{document_config, Assembler, DocumentBuilder, Orchestrator, RunOptions};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Main entry point for the specup CLI application
fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:?}", e);
            std::process::exit(1);
        }
    }
}

/// Run the CLI application, returning the process exit code
fn run() -> Result<i32> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    // Configuration errors abort before anything is rendered
    let configs = document_config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    log::debug!("Loaded {} document(s) from {}", configs.len(), cli.config.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    runtime.block_on(async {
        let assets = load_assets(&cli).await?;

        let engine = Arc::new(MarkdownEngine::new(EngineOptions {
            html: !cli.no_html,
            linkify: !cli.no_linkify,
            typographer: !cli.no_typographer,
            ..EngineOptions::default()
        }));
        let builder = DocumentBuilder::new(Assembler::new(engine), Box::new(StandardShell), assets);
        let orchestrator = Orchestrator::new(
            builder,
            RunOptions {
                single_run: cli.no_watch,
                watch: WatchConfig {
                    debounce: Duration::from_millis(cli.debounce_ms),
                },
            },
        );

        let summary = orchestrator.run(&configs).await;
        if cli.no_watch {
            log::info!(
                "Rendered {} document(s), {} failed",
                summary.succeeded,
                summary.failed
            );
        }
        Ok::<i32, anyhow::Error>(summary.exit_code())
    })
}

/// Pick the asset bundle for the requested mode
async fn load_assets(cli: &Cli) -> Result<AssetBundle> {
    match (&cli.assets, cli.dev) {
        (root, true) => Ok(AssetBundle::development(
            root.as_deref().unwrap_or(Path::new(".")),
        )),
        (Some(root), false) => AssetBundle::compiled(root)
            .await
            .with_context(|| format!("Failed to load compiled assets from {}", root.display())),
        (None, false) => {
            log::debug!("No asset directory given; pages will carry no styles or scripts");
            Ok(AssetBundle::empty())
        }
    }
}
