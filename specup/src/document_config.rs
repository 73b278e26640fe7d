//! Document set configuration from specs.json (or specs.toml)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

/// Fragment used when a document does not list its markdown files
pub const DEFAULT_FRAGMENT: &str = "spec.md";

/// Name of the page written into each output directory
pub const OUTPUT_FILE_NAME: &str = "index.html";

/// Configuration file as it appears on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecsFile {
    /// One entry per document to build
    pub specs: Vec<RawDocumentConfig>,
}

/// A single document entry before path normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawDocumentConfig {
    /// Directory holding the markdown fragments
    #[serde(alias = "sourceDirectory")]
    pub spec_directory: String,

    /// Directory the page is written to (defaults to `spec_directory`)
    #[serde(default, alias = "outputDirectory", skip_serializing_if = "Option::is_none")]
    pub output_path: Option<String>,

    /// Fragments to concatenate, relative to `spec_directory`
    #[serde(default, alias = "fragmentPaths", skip_serializing_if = "Option::is_none")]
    pub markdown_paths: Option<Vec<String>>,

    /// Page title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Logo image URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    /// Target of the logo link
    #[serde(default, alias = "logoLink", skip_serializing_if = "Option::is_none")]
    pub logo_link: Option<String>,

    /// Source repository description, consumed by page scripts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,

    /// Unrecognized keys, passed through to the page shell
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A document entry with normalized directories
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentConfig {
    /// Source directory, always ending in exactly one `/`
    #[serde(rename = "spec_directory")]
    pub source_directory: PathBuf,

    /// Output directory, always ending in exactly one `/`
    #[serde(rename = "output_path")]
    pub output_directory: PathBuf,

    /// Fragments in document order
    #[serde(rename = "markdown_paths")]
    pub fragment_paths: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_link: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DocumentConfig {
    /// Normalize a raw entry
    ///
    /// # Parameters
    /// * `raw` - Entry as read from the configuration file
    ///
    /// # Returns
    /// * `Ok(DocumentConfig)` - Entry with normalized directories and default fragments
    /// * `Err(DocumentConfigError)` - A directory path was empty
    pub fn from_raw(raw: RawDocumentConfig) -> Result<Self, DocumentConfigError> {
        let source_directory = normalize_dir(&raw.spec_directory)?;
        let output_directory = match raw.output_path.as_deref() {
            Some(path) => normalize_dir(path)?,
            None => source_directory.clone(),
        };

        Ok(Self {
            source_directory,
            output_directory,
            fragment_paths: raw
                .markdown_paths
                .unwrap_or_else(|| vec![DEFAULT_FRAGMENT.to_string()]),
            title: raw.title,
            logo: raw.logo,
            logo_link: raw.logo_link,
            source: raw.source,
            extra: raw.extra,
        })
    }

    /// Absolute or relative paths of the fragments, in document order
    pub fn fragment_files(&self) -> Vec<PathBuf> {
        self.fragment_paths
            .iter()
            .map(|fragment| self.source_directory.join(fragment))
            .collect()
    }

    /// Path of the generated page
    pub fn output_file(&self) -> PathBuf {
        self.output_directory.join(OUTPUT_FILE_NAME)
    }

    /// Name used in log messages
    pub fn display_name(&self) -> String {
        match &self.title {
            Some(title) => title.clone(),
            None => self.source_directory.display().to_string(),
        }
    }
}

/// Normalize a directory path: trim, drop trailing separators, append one `/`
pub fn normalize_dir(raw: &str) -> Result<PathBuf, DocumentConfigError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(DocumentConfigError::EmptyDirectory);
    }

    let stripped = trimmed.trim_end_matches(['/', '\\']);
    Ok(PathBuf::from(format!("{}/", stripped)))
}

/// Load and normalize every document entry from a configuration file
///
/// The format is picked from the extension: `.toml` is read as TOML,
/// anything else as JSON.
///
/// # Parameters
/// * `path` - Path to the configuration file
///
/// # Returns
/// * `Ok(Vec<DocumentConfig>)` - At least one normalized document entry
/// * `Err(DocumentConfigError)` - Error reading, parsing or validating the file
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<DocumentConfig>, DocumentConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(DocumentConfigError::IoError)?;

    let is_toml = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        parse_toml(&content)
    } else {
        parse_json(&content)
    }
}

/// Parse a JSON configuration document
pub fn parse_json(content: &str) -> Result<Vec<DocumentConfig>, DocumentConfigError> {
    let file: SpecsFile = serde_json::from_str(content).map_err(DocumentConfigError::JsonError)?;
    normalize_all(file)
}

/// Parse a TOML configuration document
pub fn parse_toml(content: &str) -> Result<Vec<DocumentConfig>, DocumentConfigError> {
    let file: SpecsFile = toml::from_str(content).map_err(DocumentConfigError::TomlError)?;
    normalize_all(file)
}

fn normalize_all(file: SpecsFile) -> Result<Vec<DocumentConfig>, DocumentConfigError> {
    if file.specs.is_empty() {
        return Err(DocumentConfigError::NoDocuments);
    }
    file.specs.into_iter().map(DocumentConfig::from_raw).collect()
}

/// Errors that can occur when loading the document configuration
#[derive(Debug)]
#[allow(clippy::enum_variant_names)]
pub enum DocumentConfigError {
    /// IO error when reading the file
    IoError(std::io::Error),

    /// Error parsing JSON
    JsonError(serde_json::Error),

    /// Error parsing TOML
    TomlError(toml::de::Error),

    /// The document list is empty
    NoDocuments,

    /// A directory path is empty or whitespace
    EmptyDirectory,
}

impl std::fmt::Display for DocumentConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DocumentConfigError::IoError(e) => write!(f, "IO error: {}", e),
            DocumentConfigError::JsonError(e) => write!(f, "JSON parse error: {}", e),
            DocumentConfigError::TomlError(e) => write!(f, "TOML parse error: {}", e),
            DocumentConfigError::NoDocuments => write!(f, "no documents configured in `specs`"),
            DocumentConfigError::EmptyDirectory => write!(f, "document directory must not be empty"),
        }
    }
}

impl std::error::Error for DocumentConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DocumentConfigError::IoError(e) => Some(e),
            DocumentConfigError::JsonError(e) => Some(e),
            DocumentConfigError::TomlError(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_dir() {
        assert_eq!(normalize_dir("./spec").unwrap(), PathBuf::from("./spec/"));
        assert_eq!(normalize_dir("  ./spec/  ").unwrap(), PathBuf::from("./spec/"));
        assert_eq!(normalize_dir("docs//").unwrap(), PathBuf::from("docs/"));
        assert!(matches!(
            normalize_dir("   "),
            Err(DocumentConfigError::EmptyDirectory)
        ));
    }

    #[test]
    fn test_normalized_dir_keeps_single_trailing_separator() {
        let dir = normalize_dir("out/").unwrap();
        assert_eq!(dir.to_str().unwrap(), "out/");
    }

    #[test]
    fn test_parse_json_with_defaults() {
        let configs = parse_json(
            r#"{
                "specs": [
                    { "spec_directory": "./spec", "title": "My Spec", "logo": "logo.svg" }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(configs.len(), 1);
        let config = &configs[0];
        assert_eq!(config.source_directory, PathBuf::from("./spec/"));
        assert_eq!(config.output_directory, PathBuf::from("./spec/"));
        assert_eq!(config.fragment_paths, vec!["spec.md".to_string()]);
        assert_eq!(config.output_file(), PathBuf::from("./spec/index.html"));
        assert_eq!(config.title.as_deref(), Some("My Spec"));
        assert_eq!(config.logo.as_deref(), Some("logo.svg"));
    }

    #[test]
    fn test_parse_json_full_entry_with_passthrough() {
        let configs = parse_json(
            r#"{
                "specs": [{
                    "spec_directory": "src",
                    "output_path": "public/",
                    "markdown_paths": ["intro.md", "body.md"],
                    "logo_link": "https://example.com",
                    "source": { "host": "github", "account": "acme", "repo": "spec" },
                    "katex": true
                }]
            }"#,
        )
        .unwrap();

        let config = &configs[0];
        assert_eq!(config.output_directory, PathBuf::from("public/"));
        assert_eq!(
            config.fragment_files(),
            vec![PathBuf::from("src/intro.md"), PathBuf::from("src/body.md")]
        );
        assert_eq!(config.source.as_ref().unwrap()["repo"], "spec");
        assert_eq!(config.extra.get("katex"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_parse_json_camel_case_aliases() {
        let configs = parse_json(
            r#"{ "specs": [{ "sourceDirectory": "a", "outputDirectory": "b", "fragmentPaths": ["x.md"] }] }"#,
        )
        .unwrap();

        assert_eq!(configs[0].source_directory, PathBuf::from("a/"));
        assert_eq!(configs[0].output_directory, PathBuf::from("b/"));
        assert_eq!(configs[0].fragment_paths, vec!["x.md".to_string()]);
    }

    #[test]
    fn test_parse_toml() {
        let configs = parse_toml(
            r#"
[[specs]]
spec_directory = "docs"
title = "Docs"

[[specs]]
spec_directory = "api"
output_path = "site/api"
"#,
        )
        .unwrap();

        assert_eq!(configs.len(), 2);
        assert_eq!(configs[1].output_directory, PathBuf::from("site/api/"));
    }

    #[test]
    fn test_config_errors() {
        assert!(matches!(
            parse_json(r#"{ "specs": [] }"#),
            Err(DocumentConfigError::NoDocuments)
        ));
        assert!(matches!(
            parse_json(r#"{ "documents": [] }"#),
            Err(DocumentConfigError::JsonError(_))
        ));
        assert!(matches!(
            parse_json(r#"{ "specs": [{ "spec_directory": "" }] }"#),
            Err(DocumentConfigError::EmptyDirectory)
        ));
    }

    #[test]
    fn test_serialized_config_uses_file_keys() {
        let config = &parse_json(r#"{ "specs": [{ "spec_directory": "s", "title": "T" }] }"#)
            .unwrap()[0];
        let json = serde_json::to_value(config).unwrap();

        assert_eq!(json["spec_directory"], "s/");
        assert_eq!(json["output_path"], "s/");
        assert_eq!(json["markdown_paths"][0], "spec.md");
        assert_eq!(json["title"], "T");
        assert!(json.get("logo").is_none());
    }
}
