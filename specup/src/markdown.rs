//! Markdown engine with the notice extension
//!
//! Wraps pulldown-cmark with the stock extensions this tool relies on, the
//! notice container syntax, heading anchors, bare URL linking and table of
//! contents capture. All mutable state of a render lives in a
//! [`RenderContext`]; the engine itself is immutable and can be shared
//! between documents.

use crate::anchor::{HeadingSlugger, IdentifierAllocator};
use crate::notice::{self, NoticeEvent};
use pulldown_cmark::{
    html, CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream,
};

mod container;
mod linkify;
mod toc;

pub use container::{scan, ScannedDocument};
pub use toc::{render_toc, TocEntry, TocOptions};

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineOptions {
    /// Pass raw HTML through; when off it is rendered as text
    pub html: bool,

    /// Turn bare URLs into links
    pub linkify: bool,

    /// Smart quotes, dashes and ellipses
    pub typographer: bool,

    /// Table of contents and heading anchor settings
    pub toc: TocOptions,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            html: true,
            linkify: true,
            typographer: true,
            toc: TocOptions::default(),
        }
    }
}

/// Fragments produced by one render
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderOutput {
    /// Document body
    pub html: String,

    /// Table of contents markup (empty when the document has no listed headings)
    pub toc: String,
}

/// Mutable state of a single render
#[derive(Debug, Default)]
pub struct RenderContext {
    notices: IdentifierAllocator,
    headings: HeadingSlugger,
    toc_entries: Vec<TocEntry>,
}

impl RenderContext {
    /// Create an empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all state left over from a previous render
    pub fn reset(&mut self) {
        self.notices.reset();
        self.headings.reset();
        self.toc_entries.clear();
    }

    /// Headings collected by the last render
    pub fn toc_entries(&self) -> &[TocEntry] {
        &self.toc_entries
    }
}

/// Markdown to HTML renderer
#[derive(Debug, Clone, Default)]
pub struct MarkdownEngine {
    options: EngineOptions,
}

impl MarkdownEngine {
    /// Create an engine with the given options
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    /// The options this engine was built with
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// pulldown-cmark extensions enabled for every render
    pub fn parser_options(&self) -> Options {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_FOOTNOTES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        options.insert(Options::ENABLE_MATH);
        options.insert(Options::ENABLE_DEFINITION_LIST);
        options.insert(Options::ENABLE_SUPERSCRIPT);
        options.insert(Options::ENABLE_SUBSCRIPT);
        if self.options.typographer {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        options
    }

    /// Render a document with fresh per-render state
    pub fn render(&self, text: &str) -> RenderOutput {
        let mut ctx = RenderContext::new();
        self.render_with(text, &mut ctx)
    }

    /// Render a document, resetting and then filling `ctx`
    pub fn render_with(&self, text: &str, ctx: &mut RenderContext) -> RenderOutput {
        ctx.reset();

        let scanned = container::scan(text);
        // Smart punctuation splits text runs; linkify needs them whole
        let parser = TextMergeStream::new(Parser::new_ext(&scanned.source, self.parser_options()));
        let events = self.rewrite(parser, &scanned, ctx);

        let mut body = String::with_capacity(text.len() * 3 / 2);
        html::push_html(&mut body, events.into_iter());

        RenderOutput {
            html: body,
            toc: render_toc(&ctx.toc_entries, &self.options.toc),
        }
    }

    /// Apply the engine's extensions to the parser's event stream
    fn rewrite<'a>(
        &self,
        parser: impl Iterator<Item = Event<'a>>,
        scanned: &ScannedDocument,
        ctx: &mut RenderContext,
    ) -> Vec<Event<'a>> {
        let parsed: Vec<Event<'a>> = parser.collect();
        // Explicit heading ids win over generated ones wherever they appear
        for event in &parsed {
            if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
                if !ctx.headings.reserve(id) {
                    log::warn!("Duplicate heading id: {}", id);
                }
            }
        }

        let notices = &scanned.events;
        let mut out: Vec<Event<'a>> = Vec::new();
        let mut heading: Option<PendingHeading<'a>> = None;
        let mut rendered = vec![false; notices.len()];
        let mut open_notices = 0usize;
        // Nesting depth of links, images, code blocks and raw HTML blocks
        let mut opaque_depth = 0usize;

        for event in parsed {
            if let Event::Html(raw) | Event::InlineHtml(raw) = &event {
                if let Some(index) = scanned.parse_sentinel(raw) {
                    if let Some(boundary) = notices.get(index).filter(|_| !rendered[index]) {
                        rendered[index] = true;
                        match boundary {
                            NoticeEvent::Open { .. } => open_notices += 1,
                            NoticeEvent::Close if open_notices == 0 => continue,
                            NoticeEvent::Close => open_notices -= 1,
                        }
                        let markup = notice::render(&mut ctx.notices, boundary);
                        out.push(Event::Html(markup.into()));
                        continue;
                    }
                }
            }

            let event = match event {
                Event::Html(raw) | Event::InlineHtml(raw) if !self.options.html => Event::Text(raw),
                other => other,
            };

            match &event {
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    heading = Some(PendingHeading {
                        level: *level,
                        id: id.clone(),
                        classes: classes.clone(),
                        attrs: attrs.clone(),
                        text: String::new(),
                        events: Vec::new(),
                    });
                    continue;
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some(pending) = heading.take() {
                        out.extend(self.finish_heading(pending, ctx));
                        continue;
                    }
                }
                Event::Start(
                    Tag::Link { .. } | Tag::Image { .. } | Tag::CodeBlock(_) | Tag::HtmlBlock,
                ) => opaque_depth += 1,
                Event::End(TagEnd::Link | TagEnd::Image | TagEnd::CodeBlock | TagEnd::HtmlBlock) => {
                    opaque_depth = opaque_depth.saturating_sub(1)
                }
                _ => {}
            }

            let target = match heading.as_mut() {
                Some(pending) => {
                    pending.collect_text(&event);
                    &mut pending.events
                }
                None => &mut out,
            };

            match event {
                Event::Text(text) if self.options.linkify && opaque_depth == 0 => {
                    push_linkified(target, text)
                }
                other => target.push(other),
            }
        }

        // A heading is always closed by the parser; flush defensively all the same
        if let Some(pending) = heading.take() {
            out.extend(self.finish_heading(pending, ctx));
        }
        for _ in 0..open_notices {
            out.push(Event::Html(notice::render(&mut ctx.notices, &NoticeEvent::Close).into()));
        }

        out
    }

    /// Emit a buffered heading with its id and self-link, recording it for the TOC
    fn finish_heading<'a>(
        &self,
        pending: PendingHeading<'a>,
        ctx: &mut RenderContext,
    ) -> Vec<Event<'a>> {
        let level = pending.level as usize as u8;
        let id = match &pending.id {
            Some(explicit) => explicit.to_string(),
            None => ctx.headings.allocate(&pending.text),
        };

        if self.options.toc.includes(level) {
            ctx.toc_entries.push(TocEntry {
                level,
                id: id.clone(),
                text: pending.text.trim().to_string(),
            });
        }

        let mut open = format!("<h{} id=\"{}\"", level, escape_html(&id));
        if !pending.classes.is_empty() {
            let classes: Vec<String> = pending.classes.iter().map(|c| c.to_string()).collect();
            open.push_str(&format!(" class=\"{}\"", escape_html(&classes.join(" "))));
        }
        for (key, value) in &pending.attrs {
            match value {
                Some(value) => open.push_str(&format!(
                    " {}=\"{}\"",
                    escape_html(key),
                    escape_html(value)
                )),
                None => open.push_str(&format!(" {}", escape_html(key))),
            }
        }
        open.push('>');
        open.push_str(&format!(
            "<a class=\"{}\" href=\"#{}\">{}</a>",
            escape_html(&self.options.toc.anchor_class),
            escape_html(&id),
            escape_html(&self.options.toc.anchor_symbol)
        ));

        let mut events = Vec::with_capacity(pending.events.len() + 2);
        events.push(Event::Html(open.into()));
        events.extend(pending.events);
        events.push(Event::Html(format!("</h{}>\n", level).into()));
        events
    }
}

/// Heading whose events are held back until its id is known
struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    text: String,
    events: Vec<Event<'a>>,
}

impl PendingHeading<'_> {
    fn collect_text(&mut self, event: &Event<'_>) {
        match event {
            Event::Text(text) | Event::Code(text) | Event::InlineMath(text) => {
                self.text.push_str(text)
            }
            Event::SoftBreak | Event::HardBreak => self.text.push(' '),
            _ => {}
        }
    }
}

fn push_linkified<'a>(target: &mut Vec<Event<'a>>, text: CowStr<'a>) {
    let Some(segments) = linkify::split_links(&text) else {
        target.push(Event::Text(text));
        return;
    };

    for segment in segments {
        match segment {
            linkify::Segment::Text(plain) => target.push(Event::Text(plain.to_string().into())),
            linkify::Segment::Link { text, href } => {
                target.push(Event::Start(Tag::Link {
                    link_type: LinkType::Autolink,
                    dest_url: href.into(),
                    title: CowStr::Borrowed(""),
                    id: CowStr::Borrowed(""),
                }));
                target.push(Event::Text(text.to_string().into()));
                target.push(Event::End(TagEnd::Link));
            }
        }
    }
}

/// Escape text for use in HTML content and attribute values
pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
