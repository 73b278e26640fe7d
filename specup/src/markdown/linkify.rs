//! Bare URL detection for plain text runs

use regex::Regex;
use std::sync::OnceLock;

/// Piece of a text run after URL detection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Link { text: &'a str, href: String },
}

fn url_regex() -> &'static Regex {
    static URL: OnceLock<Regex> = OnceLock::new();
    URL.get_or_init(|| {
        Regex::new(r#"(?i)\b(?:https?://|www\.)[^\s<>"]+"#).expect("linkify regex is valid")
    })
}

/// Characters that end a sentence rather than a URL
const TRAILING: &[char] = &['.', ',', ':', ';', '!', '?', '\'', '"', '*', '_'];

/// Trim trailing punctuation, keeping a closing parenthesis that balances one in the URL
fn trim_url(candidate: &str) -> &str {
    let mut url = candidate;
    loop {
        let Some(last) = url.chars().last() else {
            return url;
        };
        let unbalanced_paren = last == ')' && url.matches('(').count() < url.matches(')').count();
        if TRAILING.contains(&last) || unbalanced_paren {
            url = &url[..url.len() - last.len_utf8()];
        } else {
            return url;
        }
    }
}

/// Split text into plain and link segments
///
/// Returns `None` when the text contains no URL, so callers can keep the
/// original event untouched.
pub fn split_links(text: &str) -> Option<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for found in url_regex().find_iter(text) {
        let url = trim_url(found.as_str());
        if url.len() <= "www.".len() {
            continue;
        }

        let start = found.start();
        if start > cursor {
            segments.push(Segment::Text(&text[cursor..start]));
        }

        let href = if url.to_ascii_lowercase().starts_with("www.") {
            format!("http://{url}")
        } else {
            url.to_string()
        };
        segments.push(Segment::Link { text: url, href });
        cursor = start + url.len();
    }

    if segments.is_empty() {
        return None;
    }
    if cursor < text.len() {
        segments.push(Segment::Text(&text[cursor..]));
    }
    Some(segments)
}
