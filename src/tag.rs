//! Grammar-symbol tags and the process-wide tag allocator.
//!
//! Grammars built in separate modules must not hard-code tag numbers. Each
//! module should obtain its tags from [`next_tag`] (or [`next_named_tag`]),
//! ideally while building its matchers and before any parsing starts.

use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicU32, Ordering},
};

use lazy_static::lazy_static;
use parking_lot::RwLock;

/// Identifies the grammar symbol a [`Match`](crate::Match) represents.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tag(u32);

impl Tag {
    /// Placeholder for matches which consumed nothing, such as the result of
    /// an [`optional`](crate::optional) whose inner matcher failed.
    pub const NONE: Tag = Tag(0);

    /// The generic tag for leaf tokens.
    pub const LITERAL: Tag = Tag(1);

    /// The boundary of the reserved range. Every tag handed out by the
    /// registry is strictly greater than this.
    pub const LAST: Tag = Tag(2);

    /// The raw identifier.
    pub fn id(self) -> u32 {
        self.0
    }

    /// The name recorded for this tag, if any.
    pub fn name(self) -> Option<&'static str> {
        match self {
            Tag::NONE => Some("None"),
            Tag::LITERAL => Some("Literal"),
            _ => TAG_NAMES.read().get(&self).copied(),
        }
    }

    /// Whether the tag is one of the reserved values.
    pub fn is_reserved(self) -> bool {
        self <= Tag::LAST
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "Tag({})", self.0),
        }
    }
}

static PREV_TAG: AtomicU32 = AtomicU32::new(2);

lazy_static! {
    static ref TAG_NAMES: RwLock<HashMap<Tag, &'static str>> = RwLock::new(HashMap::new());
}

/// Allocates a fresh tag, greater than every tag issued before it.
///
/// # Panics
///
/// Panics if the `u32` tag space is exhausted.
pub fn next_tag() -> Tag {
    let prev = PREV_TAG
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| prev.checked_add(1))
        .unwrap_or_else(|_| panic!("tag space exhausted"));
    Tag(prev + 1)
}

/// Allocates a fresh tag and records `name` for it, which is then used when
/// the tag is displayed.
pub fn next_named_tag(name: &'static str) -> Tag {
    let tag = next_tag();
    TAG_NAMES.write().insert(tag, name);
    tag
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tags_strictly_increase() {
        let a = next_tag();
        let b = next_tag();
        let c = next_tag();
        assert!(a > Tag::LAST);
        assert!(a < b && b < c);
        assert!(!a.is_reserved());
        assert!(Tag::LAST.is_reserved());
    }

    #[test]
    fn test_tags_unique_across_threads() {
        let handles: Vec<_> = (0..4)
            .map(|_| std::thread::spawn(|| (0..100).map(|_| next_tag()).collect::<Vec<_>>()))
            .collect();

        let mut all: Vec<Tag> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let len = all.len();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), len);
    }

    #[test]
    fn test_named_tag_display() {
        let tag = next_named_tag("PhoneNumber");
        assert_eq!(tag.name(), Some("PhoneNumber"));
        assert_eq!(tag.to_string(), "PhoneNumber");

        let anon = next_tag();
        assert_eq!(anon.to_string(), format!("Tag({})", anon.id()));
        assert_eq!(Tag::NONE.to_string(), "None");
        assert_eq!(Tag::LITERAL.to_string(), "Literal");
    }
}
