//! Notice block extension
//!
//! Notice blocks are typed callouts written as a colon-fenced container:
//!
//! ```text
//! ::: notice warning Deprecated
//! This API is going away.
//! :::
//! ```
//!
//! The parameter string after the container name is `<type> [<label>]`.
//! Only the five notice types below are accepted. Anything else is not an
//! error: the marker line simply stays ordinary markdown.

use crate::anchor::IdentifierAllocator;
use crate::markdown::escape_html;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Container name that must follow the colon fence
pub const CONTAINER_NAME: &str = "notice";

/// The closed set of notice types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeType {
    Note,
    Issue,
    Example,
    Warning,
    Todo,
}

impl NoticeType {
    /// All notice types, in declaration order
    pub const ALL: [NoticeType; 5] = [
        NoticeType::Note,
        NoticeType::Issue,
        NoticeType::Example,
        NoticeType::Warning,
        NoticeType::Todo,
    ];

    /// Look up a type tag (case-sensitive)
    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == tag)
    }

    /// The tag as written in markdown and used as CSS class
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeType::Note => "note",
            NoticeType::Issue => "issue",
            NoticeType::Example => "example",
            NoticeType::Warning => "warning",
            NoticeType::Todo => "todo",
        }
    }
}

impl fmt::Display for NoticeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Container boundary seen by the notice renderer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoticeEvent {
    /// Opening marker with its parameter string (text after `notice`)
    Open { params: String },
    /// Closing marker
    Close,
}

/// Parsed notice parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeParams<'a> {
    pub kind: NoticeType,
    pub label: Option<&'a str>,
}

fn params_regex() -> &'static Regex {
    static PARAMS: OnceLock<Regex> = OnceLock::new();
    PARAMS.get_or_init(|| {
        Regex::new(r"^\s*(\w+)(?:\s+(.*?))?\s*$").expect("notice params regex is valid")
    })
}

/// Split a parameter string into type and optional label
///
/// Returns `None` when the leading word is not a notice type.
pub fn parse_params(params: &str) -> Option<NoticeParams<'_>> {
    let captures = params_regex().captures(params)?;
    let kind = NoticeType::from_tag(captures.get(1)?.as_str())?;
    let label = captures
        .get(2)
        .map(|m| m.as_str())
        .filter(|label| !label.trim().is_empty());

    Some(NoticeParams { kind, label })
}

/// Decide whether a container line is a notice block
///
/// # Returns
/// * `Some(NoticeType)` - The matched type tag; the line opens a container
/// * `None` - Not a notice; the line falls through to ordinary markdown
pub fn validate(params: &str) -> Option<NoticeType> {
    parse_params(params).map(|parsed| parsed.kind)
}

/// Render the markup for a container boundary
///
/// Opening events allocate the anchor id from `allocator`, so events must be
/// rendered in document order.
pub fn render(allocator: &mut IdentifierAllocator, event: &NoticeEvent) -> String {
    match event {
        NoticeEvent::Open { params } => match parse_params(params) {
            Some(NoticeParams { kind, label }) => {
                let id = escape_html(&allocator.allocate(kind, label));
                format!(
                    "<div id=\"{id}\" class=\"notice {kind}\"><a class=\"notice-link\" href=\"#{id}\">{}</a>\n",
                    kind.as_str().to_uppercase()
                )
            }
            None => String::new(),
        },
        NoticeEvent::Close => "</div>\n".to_string(),
    }
}
