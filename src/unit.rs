//! Matchers which consume runs of single units: bytes or code points.

use std::fmt;

use crate::{
    cursor::Cursor,
    error::Error,
    predicate::{BytePred, CharPred},
    tag::Tag,
    trace::{Outcome, Stage, Trace},
    tree::Match,
    MatchResult, Matcher,
};

/// Bytes examined per peek while scanning a run.
const SCAN_CHUNK: usize = 64;

/// Run a primitive scan on a fork of `cursor`, reporting to the tracer.
///
/// `scan` returns the bytes it consumed, or `None` if the input does not
/// match. The fork is committed only on a match.
pub(crate) fn primitive<C, F>(
    cursor: &mut Cursor,
    matcher: &'static str,
    config: &C,
    tag: Tag,
    scan: F,
) -> MatchResult
where
    C: fmt::Debug,
    F: FnOnce(&mut Cursor) -> Result<Option<Vec<u8>>, Error>,
{
    let offset = cursor.position();
    cursor.trace(|| Trace {
        stage: Stage::Try,
        matcher,
        config,
        tag,
        offset,
        outcome: None,
    });

    let mut fork = cursor.fork();
    let content = match scan(&mut fork) {
        Ok(content) => content,
        Err(e) => {
            cursor.trace(|| Trace {
                stage: Stage::Fail,
                matcher,
                config,
                tag,
                offset,
                outcome: Some(Outcome::Failed(&e)),
            });
            return Err(e);
        }
    };

    let content = match content {
        Some(content) => content,
        None => {
            fork.abandon();
            return Ok(None);
        }
    };

    let m = Match::leaf(tag, content, offset);
    cursor.trace(|| Trace {
        stage: Stage::Got,
        matcher,
        config,
        tag,
        offset,
        outcome: Some(Outcome::Matched(&m)),
    });

    fork.commit(cursor)?;
    Ok(Some(m))
}

/// Matches between `min` and `max` bytes (inclusive), each satisfying a
/// predicate. The run is greedy.
#[derive(Clone, Debug)]
pub struct Bytes {
    tag: Tag,
    min: usize,
    max: usize,
    pred: BytePred,
}

/// Matches exactly one byte satisfying `pred`.
pub fn one_byte(tag: Tag, pred: BytePred) -> Bytes {
    n_bytes(tag, 1, 1, pred)
}

/// Matches at least `min` and at most `max` bytes satisfying `pred`. A `max`
/// below `min` is raised to `min`.
pub fn n_bytes(tag: Tag, min: usize, max: usize, pred: BytePred) -> Bytes {
    Bytes {
        tag,
        min,
        max: max.max(min),
        pred,
    }
}

impl Bytes {
    /// The tag of produced matches.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The inclusive bounds on the run length.
    pub fn bounds(&self) -> (usize, usize) {
        (self.min, self.max)
    }

    /// Also accept bytes matched by `other`, keeping this matcher's tag and
    /// bounds.
    pub fn and_also(self, other: &Bytes) -> Bytes {
        Bytes {
            pred: self.pred | other.pred.clone(),
            ..self
        }
    }

    /// Reject bytes matched by `other`, keeping this matcher's tag and
    /// bounds.
    pub fn but_not(self, other: &Bytes) -> Bytes {
        Bytes {
            pred: self.pred.but_not(other.pred.clone()),
            ..self
        }
    }

    fn scan(&self, fork: &mut Cursor) -> Result<Option<Vec<u8>>, Error> {
        let mut content = Vec::with_capacity(self.min.min(SCAN_CHUNK));

        while content.len() < self.max {
            let want = (self.max - content.len()).min(SCAN_CHUNK);
            let ahead = fork.peek(want)?;
            let n = ahead.iter().take_while(|&&b| self.pred.test(b)).count();

            content.extend_from_slice(&ahead[..n]);
            fork.advance(n)?;

            if n < want {
                break;
            }
        }

        if content.len() < self.min {
            return Ok(None);
        }
        Ok(Some(content))
    }
}

impl Matcher for Bytes {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        primitive(cursor, "Bytes", self, self.tag, |fork| self.scan(fork))
    }
}

/// Matches between `min` and `max` code points (inclusive), each satisfying a
/// predicate. The run is greedy and the match content is the raw bytes of the
/// code points.
#[derive(Clone, Debug)]
pub struct CodePoints {
    tag: Tag,
    min: usize,
    max: usize,
    pred: CharPred,
}

/// Matches exactly one code point satisfying `pred`.
pub fn one_codepoint(tag: Tag, pred: CharPred) -> CodePoints {
    n_codepoints(tag, 1, 1, pred)
}

/// Matches at least `min` and at most `max` code points satisfying `pred`.
/// A `max` below `min` is raised to `min`.
pub fn n_codepoints(tag: Tag, min: usize, max: usize, pred: CharPred) -> CodePoints {
    CodePoints {
        tag,
        min,
        max: max.max(min),
        pred,
    }
}

impl CodePoints {
    /// The tag of produced matches.
    pub fn tag(&self) -> Tag {
        self.tag
    }

    /// The inclusive bounds on the run length, in code points.
    pub fn bounds(&self) -> (usize, usize) {
        (self.min, self.max)
    }

    /// Also accept code points matched by `other`, keeping this matcher's tag
    /// and bounds.
    pub fn and_also(self, other: &CodePoints) -> CodePoints {
        CodePoints {
            pred: self.pred | other.pred.clone(),
            ..self
        }
    }

    /// Reject code points matched by `other`, keeping this matcher's tag and
    /// bounds.
    pub fn but_not(self, other: &CodePoints) -> CodePoints {
        CodePoints {
            pred: self.pred.but_not(other.pred.clone()),
            ..self
        }
    }

    fn scan(&self, fork: &mut Cursor) -> Result<Option<Vec<u8>>, Error> {
        let mut content = Vec::new();
        let mut count = 0;

        while count < self.max {
            let next = fork.peek_codepoints(1)?;
            match next.chars.first() {
                Some(&c) if self.pred.test(c) => {
                    content.extend(fork.read(next.len)?);
                    count += 1;
                }
                _ => break,
            }
        }

        if count < self.min {
            return Ok(None);
        }
        Ok(Some(content))
    }
}

impl Matcher for CodePoints {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        primitive(cursor, "CodePoints", self, self.tag, |fork| self.scan(fork))
    }
}

/// Matches an exact byte string.
#[derive(Clone, Debug)]
pub struct Literal {
    tag: Tag,
    bytes: Vec<u8>,
}

/// Matches exactly `bytes`.
pub fn literal<B>(tag: Tag, bytes: B) -> Literal
where
    B: Into<Vec<u8>>,
{
    Literal {
        tag,
        bytes: bytes.into(),
    }
}

impl Matcher for Literal {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        primitive(cursor, "Literal", self, self.tag, |fork| {
            if fork.peek(self.bytes.len())? != self.bytes {
                return Ok(None);
            }

            fork.advance(self.bytes.len())?;
            Ok(Some(self.bytes.clone()))
        })
    }
}
