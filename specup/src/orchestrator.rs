//! Multi-document orchestration
//!
//! Every configured document runs through its own pipeline:
//! 1. **Prepare**: make sure the output directory exists
//! 2. **Build**: assemble fragments, render, wrap in the page shell, write `index.html`
//! 3. **Watch** (unless single-run): rebuild on source changes
//!
//! Documents are driven concurrently on one task; a failure in one
//! document is logged and never reaches another.

use crate::assembler::{AssembleError, Assembler};
use crate::assets::AssetBundle;
use crate::document_config::DocumentConfig;
use crate::page_shell::{PageParts, PageShell};
use crate::watch::{FileWatcher, Rebuild, RebuildController, WatchConfig, WatchFilter};
use async_trait::async_trait;
use futures::future::join_all;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building one document
#[derive(Error, Debug)]
pub enum BuildError {
    #[error(transparent)]
    Assemble(#[from] AssembleError),

    #[error("Failed to write {path}: {source}", path = .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Run-wide options
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Render every document once and return instead of watching
    pub single_run: bool,

    /// Watcher settings used when not in single-run mode
    pub watch: WatchConfig,
}

/// Outcome of the first render of every document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
}

impl RunSummary {
    /// True when no document failed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit code for single-run mode
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Renders a document and writes its page
pub struct DocumentBuilder {
    assembler: Assembler,
    shell: Box<dyn PageShell>,
    assets: AssetBundle,
}

impl DocumentBuilder {
    pub fn new(assembler: Assembler, shell: Box<dyn PageShell>, assets: AssetBundle) -> Self {
        Self {
            assembler,
            shell,
            assets,
        }
    }

    /// Build one document and write it to its output file
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Path of the written page
    /// * `Err(BuildError)` - A fragment could not be read or the page could not be written
    pub async fn build(&self, config: &DocumentConfig) -> Result<PathBuf, BuildError> {
        let output = self.assembler.render(config).await?;

        let page = self.shell.compose(&PageParts {
            html: &output.html,
            toc: &output.toc,
            config,
            assets: &self.assets,
        });

        let path = config.output_file();
        tokio::fs::write(&path, page)
            .await
            .map_err(|source| BuildError::Write {
                path: path.clone(),
                source,
            })?;

        Ok(path)
    }

    /// Build one document, reporting the outcome to the log
    pub async fn build_logged(&self, config: &DocumentConfig) -> bool {
        log::info!("Rendering: {}", config.display_name());
        match self.build(config).await {
            Ok(path) => {
                log::info!("Wrote {}", path.display());
                true
            }
            Err(e) => {
                log::error!("Failed to render {}: {}", config.display_name(), e);
                false
            }
        }
    }
}

/// Rebuild target binding a builder to one document
struct DocumentJob<'a> {
    builder: &'a DocumentBuilder,
    config: &'a DocumentConfig,
}

#[async_trait(?Send)]
impl Rebuild for DocumentJob<'_> {
    async fn rebuild(&self) -> bool {
        self.builder.build_logged(self.config).await
    }
}

/// Drives the whole document set
pub struct Orchestrator {
    builder: DocumentBuilder,
    options: RunOptions,
}

impl Orchestrator {
    pub fn new(builder: DocumentBuilder, options: RunOptions) -> Self {
        Self { builder, options }
    }

    /// Build every document concurrently
    ///
    /// In single-run mode this returns once every document has been rendered
    /// once. Otherwise each document keeps rebuilding on changes and this
    /// only returns after all watchers have stopped.
    pub async fn run(&self, configs: &[DocumentConfig]) -> RunSummary {
        let results = join_all(configs.iter().map(|config| self.run_document(config))).await;

        let succeeded = results.iter().filter(|ok| **ok).count();
        RunSummary {
            succeeded,
            failed: results.len() - succeeded,
        }
    }

    /// Prepare, build and (optionally) watch one document
    async fn run_document(&self, config: &DocumentConfig) -> bool {
        if let Err(e) = tokio::fs::create_dir_all(&config.output_directory).await {
            log::error!(
                "Failed to create output directory {}: {}",
                config.output_directory.display(),
                e
            );
        }

        // Start watching before the first render so no edit slips through
        let watcher = if self.options.single_run {
            None
        } else {
            match FileWatcher::start(&config.source_directory, self.options.watch) {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    log::error!("{}; {} will not rebuild on changes", e, config.display_name());
                    None
                }
            }
        };

        let succeeded = self.builder.build_logged(config).await;

        if let Some((_guard, events)) = watcher {
            let filter = WatchFilter::new(&config.source_directory, &config.output_file());
            let job = DocumentJob {
                builder: &self.builder,
                config,
            };
            RebuildController::new(events, filter, job).run().await;
        }

        succeeded
    }
}
