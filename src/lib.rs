#![warn(missing_docs)]

//! A streaming, backtracking recursive descent matching toolkit.
//!
//! Input is read incrementally from any [`std::io::Read`] source into a shared
//! [`Buffer`]. Parsing walks the input with [`Cursor`]s which fork to try an
//! alternative, commit to keep it, or are abandoned to roll it back. Only the
//! bytes some live cursor could still revisit are kept in memory.
//!
//! Grammars are built from [`Matcher`]s: predicate matchers over bytes or code
//! points ([`one_byte`], [`n_bytes`], [`one_codepoint`], [`n_codepoints`]) and
//! the structural combinators in [`combinator`]. A successful match produces a
//! [`Match`] tree tagged with [`Tag`]s from the process-wide registry.
//!
//! ```rust
//! use burrow::{n_bytes, optional, one_byte, parse, predicate, rules, seq, next_tag};
//!
//! let phone = next_tag();
//! let digits = |n| n_bytes(next_tag(), n, n, predicate::ascii_digit());
//! let hyphen = || optional(one_byte(burrow::Tag::LITERAL, predicate::in_set(b"-")));
//!
//! let grammar = seq(phone, rules![digits(3), hyphen(), digits(3), hyphen(), digits(4)]);
//!
//! let m = parse(&grammar, &b"555-555-5555"[..]).unwrap().unwrap();
//! assert_eq!(m.content(), b"555-555-5555");
//! ```

use std::{io::Read, sync::Arc};

pub mod buffer;
pub use buffer::{Buffer, BufferConfig, DecodePolicy, Decoded};

pub mod combinator;
pub use combinator::{
    first, longest, many, many_with_sep, optional, seq, seq_named, try_and_keep, First, Longest,
    Many, Optional, Seq, SeqNamed, TryAndKeep,
};

pub mod cursor;
pub use cursor::Cursor;

pub mod error;
pub use error::Error;

pub mod location;
pub use location::Location;

#[cfg(feature = "regex")]
pub mod pattern;
#[cfg(feature = "regex")]
pub use pattern::{pattern, Pattern};

pub mod predicate;
pub use predicate::{BytePred, CharPred, Pred};

pub mod tag;
pub use tag::{next_named_tag, next_tag, Tag};

pub mod trace;
pub use trace::{log_tracer, Outcome, Stage, Trace, Tracer};

pub mod tree;
pub use tree::Match;

pub mod unit;
pub use unit::{literal, n_bytes, n_codepoints, one_byte, one_codepoint, Bytes, CodePoints, Literal};

/// The outcome of a matcher attempt.
///
/// - `Ok(Some(m))` is a match; the cursor has moved past it.
/// - `Ok(None)` means the matcher does not apply here.
/// - `Err(e)` is a fault which aborts the whole parse.
pub type MatchResult = Result<Option<Match>, Error>;

/// Something which can match a prefix of the input at a cursor.
pub trait Matcher: Send + Sync {
    /// Attempt to match at `cursor`.
    ///
    /// On success the cursor is left after the consumed input. On a non-match
    /// the implementation must leave the cursor where it was, except where a
    /// combinator documents otherwise (see [`seq`]). On error the cursor's
    /// position is unspecified; the parse is over.
    ///
    /// In order to ease propagation of non-matches, the `bt!` macro provides
    /// similar semantics to the `?` operator: `bt!(expr)` either extracts the
    /// `Some` variant of `expr` or causes the caller to return `Ok(None)`.
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult;
}

impl<M> Matcher for &M
where
    M: Matcher + ?Sized,
{
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        (**self).try_match(cursor)
    }
}

impl<M> Matcher for Box<M>
where
    M: Matcher + ?Sized,
{
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        (**self).try_match(cursor)
    }
}

impl<M> Matcher for Arc<M>
where
    M: Matcher + ?Sized,
{
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        (**self).try_match(cursor)
    }
}

/// A shared, type-erased matcher, as taken by the combinators.
pub type Rule = Arc<dyn Matcher>;

/// Erase a matcher's type so it can be combined with others.
pub fn rule<M>(matcher: M) -> Rule
where
    M: Matcher + 'static,
{
    Arc::new(matcher)
}

/// A matcher defined by a closure. See [`from_fn`].
pub struct FromFn<F>(F);

/// Turn a closure into a [`Matcher`].
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: Fn(&mut Cursor) -> MatchResult + Send + Sync,
{
    FromFn(f)
}

impl<F> Matcher for FromFn<F>
where
    F: Fn(&mut Cursor) -> MatchResult + Send + Sync,
{
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        (self.0)(cursor)
    }
}

/// Match `matcher` against the start of `source`.
///
/// Non-matches leave nothing consumed; the source is read only as far as the
/// matcher needed to look.
pub fn parse<M, R>(matcher: &M, source: R) -> MatchResult
where
    M: Matcher + ?Sized,
    R: Read + Send + 'static,
{
    Cursor::from_reader(source).parse(matcher)
}

/// Shorthand for backtracking, similar to the `?` operator.
///
/// Takes an expression yielding `Option<T>` as its sole argument.
/// `bt!(Some(val))` yields `val`, while `bt!(None)` causes the calling function
/// to return `Ok(None)`.
#[macro_export]
macro_rules! bt {
    ($e:expr) => {
        match $e {
            Some(val) => val,
            None => return Ok(None),
        }
    };
}

/// Builds a `Vec<Rule>` from a list of matchers.
///
/// ## Example
/// ```rust
/// # use burrow::{first, literal, rules, Tag};
/// let keyword = first(rules![
///     literal(Tag::LITERAL, "if"),
///     literal(Tag::LITERAL, "else"),
/// ]);
/// ```
#[macro_export]
macro_rules! rules {
    ( $( $m:expr ),* $(,)? ) => {
        vec![ $( $crate::rule($m) ),* ]
    };
}
