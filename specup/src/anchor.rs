//! Anchor id allocation for notice blocks and headings
//!
//! Both allocators hold per-render state only. A fresh (or reset) allocator
//! must be used for every document render, otherwise ids drift between
//! renders of the same document.

use crate::notice::NoticeType;
use std::collections::{HashMap, HashSet};

/// Allocates unique anchor ids for notice blocks within one rendered document
#[derive(Debug, Default)]
pub struct IdentifierAllocator {
    /// Next-ordinal bookkeeping for anonymous blocks, keyed by type
    ordinals: HashMap<NoticeType, usize>,

    /// Occurrence counts for labeled blocks, keyed by slug
    slugs: HashMap<String, usize>,

    /// Every id handed out since the last reset
    issued: HashSet<String>,
}

impl IdentifierAllocator {
    /// Create an empty allocator
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every id issued so far
    pub fn reset(&mut self) {
        self.ordinals.clear();
        self.slugs.clear();
        self.issued.clear();
    }

    /// Allocate the anchor id for a notice block
    ///
    /// # Parameters
    /// * `kind` - The validated notice type
    /// * `label` - Optional free-text label following the type tag
    ///
    /// # Returns
    /// * `String` - `slug`, `slug-2`, `slug-3`, ... for labeled blocks and
    ///   `type-1`, `type-2`, ... for anonymous ones
    pub fn allocate(&mut self, kind: NoticeType, label: Option<&str>) -> String {
        let slug = label.map(slugify).filter(|slug| !slug.is_empty());

        let id = match slug {
            Some(slug) => self.allocate_labeled(slug),
            None => self.allocate_anonymous(kind),
        };

        self.issued.insert(id.clone());
        id
    }

    fn allocate_labeled(&mut self, slug: String) -> String {
        let count = self.slugs.entry(slug.clone()).or_insert(0);
        *count += 1;

        let mut candidate = suffixed(&slug, *count);
        while self.issued.contains(&candidate) {
            *count += 1;
            candidate = suffixed(&slug, *count);
        }
        candidate
    }

    fn allocate_anonymous(&mut self, kind: NoticeType) -> String {
        let ordinal = self.ordinals.entry(kind).or_insert(0);
        *ordinal += 1;

        let mut candidate = format!("{}-{}", kind, ordinal);
        while self.issued.contains(&candidate) {
            *ordinal += 1;
            candidate = format!("{}-{}", kind, ordinal);
        }
        candidate
    }
}

/// Allocates unique heading ids for the table of contents
#[derive(Debug, Default)]
pub struct HeadingSlugger {
    seen: HashMap<String, usize>,
    issued: HashSet<String>,
}

impl HeadingSlugger {
    /// Create an empty slugger
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every heading id issued so far
    pub fn reset(&mut self) {
        self.seen.clear();
        self.issued.clear();
    }

    /// Reserve an id given explicitly in the source (`# Title {#id}`)
    ///
    /// Returns `false` when the id was already taken.
    pub fn reserve(&mut self, id: &str) -> bool {
        self.issued.insert(id.to_string())
    }

    /// Allocate an id for a heading with the given plain text
    pub fn allocate(&mut self, text: &str) -> String {
        let mut slug: String = slugify(text)
            .chars()
            .filter(|c| c.is_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if slug.is_empty() {
            slug.push_str("section");
        }

        let count = self.seen.entry(slug.clone()).or_insert(0);
        *count += 1;

        let mut candidate = suffixed(&slug, *count);
        while self.issued.contains(&candidate) {
            *count += 1;
            candidate = suffixed(&slug, *count);
        }

        self.issued.insert(candidate.clone());
        candidate
    }
}

/// Normalize free text into a slug
///
/// Lower-cases the trimmed text and replaces each run of whitespace with a
/// single hyphen. No other characters are touched.
pub fn slugify(text: &str) -> String {
    text.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// First occurrence stays bare, later ones carry their occurrence number
fn suffixed(slug: &str, occurrence: usize) -> String {
    if occurrence <= 1 {
        slug.to_string()
    } else {
        format!("{}-{}", slug, occurrence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("My Cool Note"), "my-cool-note");
        assert_eq!(slugify("  Padded \t  Label  "), "padded-label");
        assert_eq!(slugify("Already-Hyphenated"), "already-hyphenated");
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn test_labeled_collisions_start_suffix_at_two() {
        let mut allocator = IdentifierAllocator::new();

        assert_eq!(
            allocator.allocate(NoticeType::Note, Some("My Cool Note")),
            "my-cool-note"
        );
        assert_eq!(
            allocator.allocate(NoticeType::Warning, Some("my   cool note")),
            "my-cool-note-2"
        );
        assert_eq!(
            allocator.allocate(NoticeType::Note, Some("My Cool Note")),
            "my-cool-note-3"
        );
    }

    #[test]
    fn test_anonymous_ordinals_per_type() {
        let mut allocator = IdentifierAllocator::new();

        assert_eq!(allocator.allocate(NoticeType::Note, None), "note-1");
        assert_eq!(allocator.allocate(NoticeType::Issue, None), "issue-1");
        assert_eq!(allocator.allocate(NoticeType::Note, None), "note-2");
        assert_eq!(allocator.allocate(NoticeType::Todo, Some("")), "todo-1");
    }

    #[test]
    fn test_label_shaped_like_ordinal_does_not_collide() {
        let mut allocator = IdentifierAllocator::new();

        assert_eq!(allocator.allocate(NoticeType::Note, Some("Note 1")), "note-1");
        assert_eq!(allocator.allocate(NoticeType::Note, None), "note-2");
        assert_eq!(allocator.allocate(NoticeType::Note, Some("note 3")), "note-3");
        assert_eq!(allocator.allocate(NoticeType::Note, None), "note-4");
    }

    #[test]
    fn test_reset_restarts_numbering() {
        let mut allocator = IdentifierAllocator::new();
        allocator.allocate(NoticeType::Example, None);
        allocator.allocate(NoticeType::Example, Some("Dup"));
        allocator.allocate(NoticeType::Example, Some("Dup"));

        allocator.reset();

        assert_eq!(allocator.allocate(NoticeType::Example, None), "example-1");
        assert_eq!(allocator.allocate(NoticeType::Example, Some("Dup")), "dup");
    }

    #[test]
    fn test_heading_slugger_strips_punctuation_and_dedupes() {
        let mut slugger = HeadingSlugger::new();

        assert_eq!(slugger.allocate("What's New?"), "whats-new");
        assert_eq!(slugger.allocate("What's new"), "whats-new-2");
        assert_eq!(slugger.allocate("!!!"), "section");
    }

    #[test]
    fn test_heading_slugger_respects_reserved_ids() {
        let mut slugger = HeadingSlugger::new();
        assert!(slugger.reserve("overview"));
        assert!(!slugger.reserve("overview"));

        assert_eq!(slugger.allocate("Overview"), "overview-2");
    }
}
