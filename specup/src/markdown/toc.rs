//! Table of contents generation

use super::escape_html;

/// Table of contents settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocOptions {
    /// Class on the outermost list
    pub class_name: String,

    /// Shallowest heading level listed
    pub first_level: u8,

    /// Deepest heading level listed
    pub last_level: u8,

    /// Text of the self-link placed in every heading
    pub anchor_symbol: String,

    /// Class of the self-link placed in every heading
    pub anchor_class: String,
}

impl Default for TocOptions {
    fn default() -> Self {
        Self {
            class_name: "toc".to_string(),
            first_level: 2,
            last_level: 4,
            anchor_symbol: "§".to_string(),
            anchor_class: "toc-anchor".to_string(),
        }
    }
}

impl TocOptions {
    /// Whether headings of this level appear in the table of contents
    pub fn includes(&self, level: u8) -> bool {
        (self.first_level..=self.last_level).contains(&level)
    }
}

/// A heading collected while rendering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Render collected headings as nested lists
///
/// Deeper headings open a nested list inside the previous item; shallower
/// ones close lists until a list of the same or lower level is reached.
/// Returns an empty string when there are no entries.
pub fn render_toc(entries: &[TocEntry], options: &TocOptions) -> String {
    let mut html = String::new();
    // Levels of the currently open lists, outermost first
    let mut levels: Vec<u8> = Vec::new();

    for entry in entries {
        match levels.last().copied() {
            None => {
                html.push_str(&format!(
                    "<ul class=\"{}\">",
                    escape_html(&options.class_name)
                ));
                levels.push(entry.level);
            }
            Some(top) if entry.level > top => {
                html.push_str("<ul>");
                levels.push(entry.level);
            }
            Some(_) => {
                while levels.len() > 1 && levels.last().is_some_and(|top| entry.level < *top) {
                    html.push_str("</li></ul>");
                    levels.pop();
                }
                html.push_str("</li>");
            }
        }

        html.push_str(&format!(
            "<li><a href=\"#{}\">{}</a>",
            escape_html(&entry.id),
            escape_html(&entry.text)
        ));
    }

    for _ in levels {
        html.push_str("</li></ul>");
    }

    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(level: u8, id: &str) -> TocEntry {
        TocEntry {
            level,
            id: id.to_string(),
            text: id.to_uppercase(),
        }
    }

    #[test]
    fn test_empty_toc() {
        assert_eq!(render_toc(&[], &TocOptions::default()), "");
    }

    #[test]
    fn test_flat_toc() {
        let toc = render_toc(&[entry(2, "a"), entry(2, "b")], &TocOptions::default());

        assert_eq!(
            toc,
            "<ul class=\"toc\"><li><a href=\"#a\">A</a></li><li><a href=\"#b\">B</a></li></ul>"
        );
    }

    #[test]
    fn test_nested_toc() {
        let toc = render_toc(
            &[entry(2, "a"), entry(3, "a1"), entry(4, "a1x"), entry(2, "b")],
            &TocOptions::default(),
        );

        assert_eq!(
            toc,
            "<ul class=\"toc\"><li><a href=\"#a\">A</a>\
             <ul><li><a href=\"#a1\">A1</a>\
             <ul><li><a href=\"#a1x\">A1X</a></li></ul></li></ul></li>\
             <li><a href=\"#b\">B</a></li></ul>"
        );
    }

    #[test]
    fn test_toc_starting_deep_stays_balanced() {
        let toc = render_toc(&[entry(3, "deep"), entry(2, "shallow")], &TocOptions::default());

        assert_eq!(toc.matches("<ul").count(), toc.matches("</ul>").count());
        assert_eq!(toc.matches("<li>").count(), toc.matches("</li>").count());
    }

    #[test]
    fn test_includes_levels() {
        let options = TocOptions::default();
        assert!(!options.includes(1));
        assert!(options.includes(2));
        assert!(options.includes(4));
        assert!(!options.includes(5));
    }
}
