//! specup - markdown specification compiler
//!
//! Compiles one or more markdown specifications into standalone HTML pages.
//! Documents may contain typed notice blocks (`::: notice warning Label`)
//! that receive stable, collision-free anchor ids, and every page gets a
//! generated table of contents.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]

pub mod anchor;
pub mod assembler;
pub mod assets;
pub mod document_config;
pub mod markdown;
pub mod notice;
pub mod orchestrator;
pub mod page_shell;
pub mod watch;

pub use assembler::{AssembleError, Assembler};
pub use document_config::DocumentConfig;
pub use markdown::{EngineOptions, MarkdownEngine, RenderOutput};
pub use orchestrator::{DocumentBuilder, Orchestrator, RunOptions, RunSummary};
