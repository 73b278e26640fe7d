//! Styling and scripting assets injected into every page
//!
//! The asset contents are opaque: they are either linked individually
//! (development) or inlined from the compiled bundle.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Stylesheets linked in the page head during development
const DEV_HEAD_CSS: &[&str] = &[
    "assets/css/custom-elements.css",
    "assets/css/prism.css",
    "assets/css/chart.css",
    "assets/css/font-awesome.css",
    "assets/css/index.css",
];

/// Scripts loaded in the page head during development
const DEV_HEAD_JS: &[&str] = &["assets/js/utils.js", "assets/js/custom-elements.js"];

/// Scripts loaded at the end of the body during development
const DEV_BODY_JS: &[&str] = &[
    "assets/js/markdown-it.js",
    "assets/js/prism.js",
    "assets/js/mermaid.js",
    "assets/js/chart.js",
    "assets/js/index.js",
];

const FONT_LINK: &str = "<link href=\"https://fonts.googleapis.com/css2?family=Heebo:wght@300;400&display=swap\" rel=\"stylesheet\">";

/// Errors that can occur while loading compiled assets
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Failed to read asset {path}: {source}", path = .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Markup injected into the page shell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssetBundle {
    /// Inserted at the end of `<head>`
    pub head: String,

    /// Inserted after the closing `</body>`
    pub body: String,

    /// Icon sprite inserted at the start of `<body>`
    pub svg: String,
}

impl AssetBundle {
    /// A bundle that injects nothing
    pub fn empty() -> Self {
        Self::default()
    }

    /// Link every asset file individually from `root`
    pub fn development(root: &Path) -> Self {
        let url = |asset: &str| root.join(asset).display().to_string();

        let mut head = String::new();
        for css in DEV_HEAD_CSS {
            head.push_str(&format!("<link href=\"{}\" rel=\"stylesheet\"/>", url(css)));
        }
        for js in DEV_HEAD_JS {
            head.push_str(&format!("<script src=\"{}\"></script>", url(js)));
        }

        let body = DEV_BODY_JS
            .iter()
            .map(|js| format!("<script src=\"{}\" data-manual></script>", url(js)))
            .collect::<String>();

        Self {
            head,
            body,
            svg: String::new(),
        }
    }

    /// Inline the compiled bundle found under `root/assets`
    ///
    /// The icon sprite is optional; a missing sprite is logged and skipped.
    ///
    /// # Returns
    /// * `Ok(AssetBundle)` - Bundle with inlined CSS and JavaScript
    /// * `Err(AssetError)` - A compiled stylesheet or script could not be read
    pub async fn compiled(root: &Path) -> Result<Self, AssetError> {
        let compiled = root.join("assets").join("compiled");
        let head_css = read_asset(compiled.join("head.css")).await?;
        let head_js = read_asset(compiled.join("head.js")).await?;
        let body_js = read_asset(compiled.join("body.js")).await?;

        let svg_path = root.join("assets").join("icons.svg");
        let svg = match read_asset(svg_path).await {
            Ok(svg) => svg,
            Err(e) => {
                log::warn!("{}; pages will have no icon sprite", e);
                String::new()
            }
        };

        Ok(Self {
            head: format!("{FONT_LINK}\n<style>{head_css}</style>\n<script>{head_js}</script>"),
            body: format!("<script>{body_js}</script>"),
            svg,
        })
    }
}

async fn read_asset(path: PathBuf) -> Result<String, AssetError> {
    match tokio::fs::read_to_string(&path).await {
        Ok(content) => Ok(content),
        Err(source) => Err(AssetError::Read { path, source }),
    }
}
