//! Page shell: wraps rendered fragments into a complete HTML page

use crate::assets::AssetBundle;
use crate::document_config::DocumentConfig;
use crate::markdown::escape_html;

/// Everything the shell needs to build one page
#[derive(Debug, Clone, Copy)]
pub struct PageParts<'a> {
    pub html: &'a str,
    pub toc: &'a str,
    pub config: &'a DocumentConfig,
    pub assets: &'a AssetBundle,
}

/// Builds the final page around rendered fragments
pub trait PageShell: Send + Sync {
    /// Produce the complete page markup
    fn compose(&self, parts: &PageParts<'_>) -> String;
}

/// Default page layout: header with logo, content article, TOC and issue panels
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardShell;

impl PageShell for StandardShell {
    fn compose(&self, parts: &PageParts<'_>) -> String {
        let config = parts.config;
        let title = config.title.as_deref().unwrap_or_default();
        let logo_link = config.logo_link.as_deref().unwrap_or("#_");
        let logo = config.logo.as_deref().unwrap_or_default();

        let mut features = Vec::new();
        if config.source.is_some() {
            features.push("source");
        }
        if config.logo.is_some() {
            features.push("logo");
        }

        let mut page = String::with_capacity(parts.html.len() + parts.toc.len() + 4096);
        page.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        page.push_str("<meta charset=\"utf-8\">\n");
        page.push_str("<meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\">\n");
        page.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1, shrink-to-fit=no\">\n");
        page.push_str(&format!("<title>{}</title>\n", escape_html(title)));
        page.push_str(&parts.assets.head);
        page.push_str("\n</head>\n");

        page.push_str(&format!("<body features=\"{}\">\n", features.join(" ")));
        page.push_str(&parts.assets.svg);
        page.push_str("\n<main>\n");
        page.push_str("<header id=\"header\" class=\"panel-header\">\n");
        page.push_str("<span id=\"toc_toggle\" panel-toggle=\"toc\"><svg icon><use xlink:href=\"#nested_list\"></use></svg></span>\n");
        page.push_str(&format!(
            "<a id=\"logo\" href=\"{}\"><img src=\"{}\" /></a>\n",
            escape_html(logo_link),
            escape_html(logo)
        ));
        page.push_str("<span issue-count animate panel-toggle=\"repo_issues\"><svg icon><use xlink:href=\"#github\"></use></svg></span>\n");
        page.push_str("</header>\n");
        page.push_str("<article id=\"content\">\n");
        page.push_str(parts.html);
        page.push_str("</article>\n</main>\n");

        page.push_str("<slide-panels id=\"slidepanels\">\n");
        page.push_str("<slide-panel id=\"repo_issues\" options=\"right\">\n");
        page.push_str("<header class=\"panel-header\"><span><svg icon><use xlink:href=\"#github\"></use></svg><span issue-count></span></span>");
        page.push_str("<span class=\"repo-issue-toggle\" panel-toggle=\"repo_issues\">✕</span></header>\n");
        page.push_str("<ul id=\"repo_issue_list\"></ul>\n");
        page.push_str("</slide-panel>\n");
        page.push_str("<slide-panel id=\"toc\">\n");
        page.push_str("<header class=\"panel-header\"><span>Table of Contents</span><span panel-toggle=\"toc\">✕</span></header>\n");
        page.push_str("<div id=\"toc_list\">\n");
        page.push_str(parts.toc);
        page.push_str("\n</div>\n</slide-panel>\n</slide-panels>\n");
        page.push_str("</body>\n");

        page.push_str(&format!(
            "<script>window.specConfig = {}</script>\n",
            config_json(config)
        ));
        page.push_str(&parts.assets.body);
        page.push_str("\n</html>\n");
        page
    }
}

/// Serialize the document config for page scripts, safe inside `<script>`
fn config_json(config: &DocumentConfig) -> String {
    match serde_json::to_string(config) {
        Ok(json) => json.replace("</", "<\\/"),
        Err(e) => {
            log::warn!("Could not serialize config for {}: {}", config.display_name(), e);
            "{}".to_string()
        }
    }
}
