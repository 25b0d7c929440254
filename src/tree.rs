//! The tagged match tree produced by matchers.

use std::{
    any::Any,
    borrow::Cow,
    collections::HashMap,
    fmt,
    sync::OnceLock,
};

use crate::tag::Tag;

/// A node of the parse result.
///
/// A match is immutable once built, apart from its attachment slot, which a
/// later pass may fill exactly once (for example with an AST node evaluated
/// from this match).
#[derive(Debug)]
pub struct Match {
    tag: Tag,
    offset: usize,
    content: Vec<u8>,
    submatches: Vec<Match>,

    /// Name to index into `submatches`.
    names: HashMap<String, usize>,

    made: OnceLock<Box<dyn Any + Send + Sync>>,
}

impl Match {
    /// A match with no submatches.
    pub fn leaf(tag: Tag, content: Vec<u8>, offset: usize) -> Match {
        Match::composite(tag, offset, content, Vec::new())
    }

    /// The zero-length placeholder returned when an optional part is absent.
    pub fn empty(offset: usize) -> Match {
        Match::leaf(Tag::NONE, Vec::new(), offset)
    }

    /// A match built from ordered submatches.
    ///
    /// `content` must be every byte consumed while producing the match,
    /// including bytes not covered by any submatch.
    pub fn composite(tag: Tag, offset: usize, content: Vec<u8>, submatches: Vec<Match>) -> Match {
        Match {
            tag,
            offset,
            content,
            submatches,
            names: HashMap::new(),
            made: OnceLock::new(),
        }
    }

    /// A match built from labelled submatches. Submatches with an empty label
    /// are kept in order but can not be looked up by name. Content is the
    /// concatenation of the submatches' content.
    pub fn named<I, S>(tag: Tag, offset: usize, parts: I) -> Match
    where
        I: IntoIterator<Item = (S, Match)>,
        S: Into<String>,
    {
        let mut content = Vec::new();
        let mut submatches = Vec::new();
        let mut names = HashMap::new();

        for (name, m) in parts {
            let name = name.into();
            if !name.is_empty() {
                names.insert(name, submatches.len());
            }
            content.extend_from_slice(&m.content);
            submatches.push(m);
        }

        Match {
            names,
            ..Match::composite(tag, offset, content, submatches)
        }
    }

    /// What the match represents.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// Whether this is the placeholder for an absent optional part.
    pub fn is_none(&self) -> bool {
        self.tag == Tag::NONE
    }

    /// Absolute byte offset of the start of the match.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Every byte consumed to produce the match.
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// The content as text, replacing invalid UTF-8.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Number of bytes consumed.
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Whether the match consumed nothing.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// The ordered submatches.
    pub fn submatches(&self) -> &[Match] {
        &self.submatches
    }

    /// The submatch recorded under `name`.
    pub fn group(&self, name: &str) -> Option<&Match> {
        self.names.get(name).map(|&i| &self.submatches[i])
    }

    /// Every named submatch, in no particular order.
    pub fn groups(&self) -> impl Iterator<Item = (&str, &Match)> + '_ {
        self.names
            .iter()
            .map(move |(name, &i)| (name.as_str(), &self.submatches[i]))
    }

    /// Store a value derived from this match.
    ///
    /// # Errors
    ///
    /// The slot can only be filled once. If it is already full, `value` is
    /// handed back.
    pub fn attach<T>(&self, value: T) -> Result<(), T>
    where
        T: Any + Send + Sync,
    {
        if self.made.get().is_some() {
            return Err(value);
        }

        // Another thread may fill the slot first, in which case `pending` is
        // never taken and goes back to the caller.
        let mut pending = Some(value);
        self.made.get_or_init(|| match pending.take() {
            Some(v) => Box::new(v) as Box<dyn Any + Send + Sync>,
            None => Box::new(()),
        });

        pending.map_or(Ok(()), Err)
    }

    /// The attached value, if one of type `T` was stored.
    pub fn attachment<T>(&self) -> Option<&T>
    where
        T: Any,
    {
        self.made.get().and_then(|v| v.downcast_ref())
    }

    /// Whether a value has been attached.
    pub fn is_attached(&self) -> bool {
        self.made.get().is_some()
    }
}

impl PartialEq for Match {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.offset == other.offset
            && self.content == other.content
            && self.submatches == other.submatches
            && self.names == other.names
    }
}

impl Eq for Match {}

impl fmt::Display for Match {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:?})", self.tag, self.text())?;

        if !self.submatches.is_empty() {
            f.write_str("[")?;
            for (i, m) in self.submatches.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}", m)?;
            }
            f.write_str("]")?;
        }

        Ok(())
    }
}
