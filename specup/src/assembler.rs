//! Document assembly: fragment loading and rendering
//!
//! A document is the concatenation of its fragments in configured order,
//! rendered in a single pass of the markdown engine.

use crate::document_config::DocumentConfig;
use crate::markdown::{MarkdownEngine, RenderOutput};
use futures::future::try_join_all;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while assembling a document
#[derive(Error, Debug)]
pub enum AssembleError {
    #[error("Failed to read fragment {path}: {source}", path = .path.display())]
    FragmentRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Loads a document's fragments and renders them with a shared engine
#[derive(Debug, Clone)]
pub struct Assembler {
    engine: Arc<MarkdownEngine>,
}

impl Assembler {
    /// Create an assembler around a shared engine
    pub fn new(engine: Arc<MarkdownEngine>) -> Self {
        Self { engine }
    }

    /// The engine used for rendering
    pub fn engine(&self) -> &MarkdownEngine {
        &self.engine
    }

    /// Read every fragment and join them into one logical document
    ///
    /// Fragments are read concurrently but joined in configured order,
    /// separated by a single newline. The first failed read fails the load.
    ///
    /// # Parameters
    /// * `config` - Document whose fragments are loaded
    ///
    /// # Returns
    /// * `Ok(String)` - The concatenated markdown source
    /// * `Err(AssembleError)` - A fragment could not be read
    pub async fn load(&self, config: &DocumentConfig) -> Result<String, AssembleError> {
        let reads = config.fragment_files().into_iter().map(|path| async move {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => Ok(content),
                Err(source) => Err(AssembleError::FragmentRead { path, source }),
            }
        });

        let fragments = try_join_all(reads).await?;
        Ok(fragments.join("\n"))
    }

    /// Load and render a document
    ///
    /// Every call renders with fresh per-render state, so repeated renders of
    /// the same sources produce identical output.
    pub async fn render(&self, config: &DocumentConfig) -> Result<RenderOutput, AssembleError> {
        let document = self.load(config).await?;
        log::debug!(
            "Rendering {} ({} fragments, {} bytes)",
            config.display_name(),
            config.fragment_paths.len(),
            document.len()
        );
        Ok(self.engine.render(&document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document_config::{normalize_dir, RawDocumentConfig};
    use tempfile::TempDir;

    fn config_for(dir: &TempDir, fragments: &[&str]) -> DocumentConfig {
        DocumentConfig::from_raw(RawDocumentConfig {
            spec_directory: dir.path().to_str().unwrap().to_string(),
            markdown_paths: Some(fragments.iter().map(|f| f.to_string()).collect()),
            ..RawDocumentConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_load_preserves_fragment_order() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();
        std::fs::write(dir.path().join("b.md"), "# B").unwrap();

        let assembler = Assembler::new(Arc::new(MarkdownEngine::default()));
        let config = config_for(&dir, &["b.md", "a.md"]);

        assert_eq!(assembler.load(&config).await.unwrap(), "# B\n# A");
    }

    #[tokio::test]
    async fn test_render_fails_on_missing_fragment() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.md"), "# A").unwrap();

        let assembler = Assembler::new(Arc::new(MarkdownEngine::default()));
        let config = config_for(&dir, &["a.md", "missing.md"]);

        match assembler.render(&config).await {
            Err(AssembleError::FragmentRead { path, .. }) => {
                assert!(path.ends_with("missing.md"));
            }
            other => panic!("expected fragment read error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_default_fragment_is_spec_md() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("spec.md"), "## Only").unwrap();

        let assembler = Assembler::new(Arc::new(MarkdownEngine::default()));
        let config = DocumentConfig::from_raw(RawDocumentConfig {
            spec_directory: dir.path().to_str().unwrap().to_string(),
            ..RawDocumentConfig::default()
        })
        .unwrap();

        assert_eq!(
            config.source_directory,
            normalize_dir(dir.path().to_str().unwrap()).unwrap()
        );
        let output = assembler.render(&config).await.unwrap();
        assert!(output.html.contains("Only</h2>"));
        assert!(output.toc.contains("#only"));
    }
}
