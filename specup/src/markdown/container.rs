//! Colon-fenced container scanning
//!
//! pulldown-cmark has no container syntax, so notice markers are found in a
//! line pass before parsing. Each accepted marker line is replaced by a
//! sentinel HTML comment; the comment survives parsing as an HTML block and
//! is swapped for the notice markup while rewriting the event stream.
//!
//! The pass tracks just enough block structure to nest containers in block
//! quotes and list items. A container opened inside one of those closes
//! where the enclosing block ends, and its sentinels repeat the quote
//! markers and indentation of the opening line. Colon fence lines that are
//! not accepted get their first colon backslash-escaped: they render the
//! same, but the definition list extension no longer reads them as `:`
//! definitions.

use crate::notice::{self, NoticeEvent, CONTAINER_NAME};

/// Base of the sentinel tag; a numeric suffix is added when the input already contains it
const SENTINEL_TAG: &str = "specup-notice";

/// Minimum length of a container fence
const MIN_COLONS: usize = 3;

/// Result of the container pass
#[derive(Debug)]
pub struct ScannedDocument {
    /// Markdown source with marker lines replaced by sentinels
    pub source: String,

    /// Container boundaries, indexed by sentinel number
    pub events: Vec<NoticeEvent>,

    /// Sentinel tag; never occurs in the scanned input
    tag: String,
}

impl ScannedDocument {
    fn new(text: &str) -> Self {
        Self {
            source: String::with_capacity(text.len()),
            events: Vec::new(),
            tag: sentinel_tag(text),
        }
    }

    /// Build the sentinel comment for a container boundary
    pub fn sentinel(&self, index: usize) -> String {
        format!("<!-- {}:{} -->", self.tag, index)
    }

    /// Recover the boundary index from an HTML event produced by a sentinel
    pub fn parse_sentinel(&self, html: &str) -> Option<usize> {
        html.trim()
            .strip_prefix("<!-- ")?
            .strip_prefix(self.tag.as_str())?
            .strip_prefix(':')?
            .strip_suffix(" -->")?
            .parse()
            .ok()
    }

    fn push_sentinel(&mut self, prefix: &str, event: NoticeEvent) {
        let sentinel = self.sentinel(self.events.len());
        self.source.push_str(prefix);
        self.source.push_str(&sentinel);
        self.source.push('\n');
        self.events.push(event);
    }
}

/// Pick a sentinel tag that appears nowhere in `text`
fn sentinel_tag(text: &str) -> String {
    let mut tag = SENTINEL_TAG.to_string();
    let mut suffix = 0;
    while text.contains(&tag) {
        suffix += 1;
        tag = format!("{SENTINEL_TAG}-{suffix}");
    }
    tag
}

/// Find notice containers and replace their marker lines with sentinels
pub fn scan(text: &str) -> ScannedDocument {
    let mut scanner = Scanner::new(text);
    for line in text.split_inclusive('\n') {
        scanner.line(Line::split(line));
    }
    scanner.finish()
}

/// A notice container that has not been closed yet
#[derive(Debug)]
struct OpenContainer {
    colons: usize,

    /// Block quote depth of the opening marker
    depth: usize,

    /// Content indent of the enclosing list item, zero outside lists
    base: usize,

    /// Quote markers and indentation repeated on implicit closing sentinels
    prefix: String,
}

/// A list item that following lines may still belong to
#[derive(Debug, Clone, Copy)]
struct ListItem {
    depth: usize,
    indent: usize,
}

/// An open code fence
#[derive(Debug, Clone, Copy)]
struct CodeFence {
    marker: char,
    len: usize,
    depth: usize,
    base: usize,
}

/// One input line split into block quote markers and content
struct Line<'t> {
    raw: &'t str,
    quote: &'t str,
    depth: usize,
    body: &'t str,
    ending: &'t str,
}

impl<'t> Line<'t> {
    fn split(raw: &'t str) -> Self {
        let content = raw.trim_end_matches(['\n', '\r']);
        let ending = &raw[content.len()..];

        let mut consumed = 0;
        let mut depth = 0;
        loop {
            let rest = &content[consumed..];
            let spaces = indent_of(rest);
            if spaces > 3 || !rest[spaces..].starts_with('>') {
                break;
            }
            consumed += spaces + 1;
            if content[consumed..].starts_with(' ') {
                consumed += 1;
            }
            depth += 1;
        }

        Self {
            raw,
            quote: &content[..consumed],
            depth,
            body: &content[consumed..],
            ending,
        }
    }

    fn is_blank(&self) -> bool {
        self.body.trim().is_empty()
    }

    fn indent(&self) -> usize {
        indent_of(self.body)
    }
}

/// A line made of a colon run: `<indent>:::<rest>`
struct ColonMarker<'t> {
    indent: &'t str,
    colons: usize,
    /// The colon run together with the rest of the line
    fence: &'t str,
    rest: &'t str,
}

struct Scanner {
    doc: ScannedDocument,
    open: Vec<OpenContainer>,
    lists: Vec<ListItem>,
    fence: Option<CodeFence>,

    /// Blank lines held back so implicit closes land before them
    blanks: String,

    /// The previous line was paragraph text, so the next one may continue it lazily
    paragraph: bool,
}

impl Scanner {
    fn new(text: &str) -> Self {
        Self {
            doc: ScannedDocument::new(text),
            open: Vec::new(),
            lists: Vec::new(),
            fence: None,
            blanks: String::new(),
            paragraph: false,
        }
    }

    fn line(&mut self, line: Line<'_>) {
        if let Some(fence) = self.fence {
            let left = line.depth < fence.depth || (!line.is_blank() && line.indent() < fence.base);
            if !left {
                if closes_code_fence(line.body, fence) {
                    self.fence = None;
                }
                self.push_verbatim(&line, false);
                return;
            }
            self.fence = None;
        }

        if line.is_blank() {
            // A blank line missing quote markers ends those quotes
            self.close_while(|c| c.depth > line.depth);
            self.lists.retain(|item| item.depth <= line.depth);
            self.blanks.push_str(line.raw);
            self.paragraph = false;
            return;
        }

        let indent = line.indent();
        let marker = colon_marker(line.body);
        let opener = marker
            .as_ref()
            .and_then(|m| container_params(m.rest))
            .filter(|params| notice::validate(params).is_some());
        let lazy = self.paragraph && opener.is_none() && !interrupts_paragraph(line.body);

        if !lazy {
            self.lists.retain(|item| {
                item.depth < line.depth || (item.depth == line.depth && item.indent <= indent)
            });
            let base = self.base(line.depth);
            self.close_while(|c| c.depth > line.depth || (c.depth == line.depth && c.base > base));

            if indent <= base + 3 {
                if let Some(content) = list_item_indent(line.body) {
                    self.lists.push(ListItem {
                        depth: line.depth,
                        indent: content,
                    });
                }
                if let Some(fence) = opens_code_fence(line.body) {
                    self.fence = Some(CodeFence {
                        depth: line.depth,
                        base,
                        ..fence
                    });
                    self.push_verbatim(&line, false);
                    return;
                }
            }
        }

        let base = self.base(line.depth);
        let Some(marker) = marker.filter(|m| m.indent.len() <= base + 3) else {
            let heading = line.body.trim_start().starts_with('#');
            self.push_verbatim(&line, !heading);
            return;
        };

        if marker.rest.trim().is_empty() {
            let closes = self.open.last().is_some_and(|c| {
                c.depth == line.depth && indent >= c.base && marker.colons >= c.colons
            });
            if closes {
                self.open.pop();
                self.push_marker(&line, &marker, NoticeEvent::Close);
                return;
            }
        } else if let Some(params) = opener {
            self.open.push(OpenContainer {
                colons: marker.colons,
                depth: line.depth,
                base,
                prefix: format!("{}{}", line.quote, marker.indent),
            });
            self.push_marker(
                &line,
                &marker,
                NoticeEvent::Open {
                    params: params.to_string(),
                },
            );
            return;
        }

        self.flush_blanks();
        self.doc.source.push_str(line.quote);
        self.doc.source.push_str(marker.indent);
        self.doc.source.push('\\');
        self.doc.source.push_str(marker.fence);
        self.doc.source.push_str(line.ending);
        self.paragraph = true;
    }

    /// Containers still open at the end of the document close implicitly
    fn finish(mut self) -> ScannedDocument {
        if !self.open.is_empty() && !self.doc.source.is_empty() && !self.doc.source.ends_with('\n')
        {
            self.doc.source.push('\n');
        }
        self.close_while(|_| true);
        self.flush_blanks();
        self.doc
    }

    /// Content indent of the innermost list item at the given quote depth
    fn base(&self, depth: usize) -> usize {
        self.lists
            .iter()
            .rev()
            .find(|item| item.depth == depth)
            .map_or(0, |item| item.indent)
    }

    fn close_while(&mut self, cond: impl Fn(&OpenContainer) -> bool) {
        while self.open.last().is_some_and(&cond) {
            if let Some(container) = self.open.pop() {
                self.doc.push_sentinel(&container.prefix, NoticeEvent::Close);
            }
        }
    }

    fn flush_blanks(&mut self) {
        self.doc.source.push_str(&self.blanks);
        self.blanks.clear();
    }

    fn push_verbatim(&mut self, line: &Line<'_>, paragraph: bool) {
        self.flush_blanks();
        self.doc.source.push_str(line.raw);
        self.paragraph = paragraph;
    }

    fn push_marker(&mut self, line: &Line<'_>, marker: &ColonMarker<'_>, event: NoticeEvent) {
        self.flush_blanks();
        let prefix = format!("{}{}", line.quote, marker.indent);
        self.doc.push_sentinel(&prefix, event);
        self.paragraph = false;
    }
}

fn indent_of(text: &str) -> usize {
    text.len() - text.trim_start_matches(' ').len()
}

/// Match a colon fence line
fn colon_marker(body: &str) -> Option<ColonMarker<'_>> {
    let (indent, fence) = body.split_at(indent_of(body));
    let colons = fence.len() - fence.trim_start_matches(':').len();
    if colons < MIN_COLONS {
        return None;
    }
    Some(ColonMarker {
        indent,
        colons,
        fence,
        rest: &fence[colons..],
    })
}

/// Return the parameter string when the marker names the notice container
fn container_params(rest: &str) -> Option<&str> {
    let after_name = rest.trim_start().strip_prefix(CONTAINER_NAME)?;
    match after_name.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(after_name.trim()),
        Some(_) => None,
    }
}

/// Lines that start a new block instead of continuing a paragraph
fn interrupts_paragraph(body: &str) -> bool {
    body.trim_start().starts_with(['#', '>', '<'])
        || list_item_indent(body).is_some()
        || opens_code_fence(body).is_some()
}

/// Content indent of a list item opened on this line
fn list_item_indent(body: &str) -> Option<usize> {
    let indent = indent_of(body);
    let rest = &body[indent..];
    let marker_len = if rest.starts_with(['-', '*', '+']) {
        1
    } else {
        let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
        if digits == 0 || digits > 9 || !rest[digits..].starts_with(['.', ')']) {
            return None;
        }
        digits + 1
    };

    let after = &rest[marker_len..];
    if after.trim().is_empty() {
        return Some(indent + marker_len + 1);
    }
    match indent_of(after) {
        0 => None,
        spaces if spaces > 4 => Some(indent + marker_len + 1),
        spaces => Some(indent + marker_len + spaces),
    }
}

fn fence_run(body: &str) -> Option<(char, usize, &str)> {
    let trimmed = body.trim_start_matches(' ');
    let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = trimmed.len() - trimmed.trim_start_matches(marker).len();
    if len < 3 {
        return None;
    }
    Some((marker, len, &trimmed[len..]))
}

fn opens_code_fence(body: &str) -> Option<CodeFence> {
    let (marker, len, info) = fence_run(body)?;
    if marker == '`' && info.contains('`') {
        return None;
    }
    Some(CodeFence {
        marker,
        len,
        depth: 0,
        base: 0,
    })
}

fn closes_code_fence(body: &str, fence: CodeFence) -> bool {
    indent_of(body) <= fence.base + 3
        && matches!(
            fence_run(body),
            Some((marker, len, rest)) if marker == fence.marker && len >= fence.len && rest.trim().is_empty()
        )
}
