//! Structural combinators: sequencing, choice, repetition and optionality.
//!
//! Every combinator is written purely against the [`Matcher`] contract: on
//! `Ok(None)` a matcher must leave its cursor where it found it. The one
//! exception is [`seq`] (and [`seq_named`]), which runs its steps directly on
//! the cursor it is given; wrap it in [`try_and_keep`] when a failure part way
//! through must not consume input.

use crate::{
    cursor::Cursor,
    rule,
    tag::Tag,
    tree::Match,
    MatchResult, Matcher, Rule,
};

/// Applies each step in order. See [`seq`].
#[derive(Clone)]
pub struct Seq {
    tag: Tag,
    steps: Vec<Rule>,
}

/// Matches each of `steps` in turn, producing a match whose submatches are the
/// steps' matches in order.
///
/// Fails as soon as any step fails, without rolling back the steps which
/// already matched.
pub fn seq<I>(tag: Tag, steps: I) -> Seq
where
    I: IntoIterator<Item = Rule>,
{
    Seq {
        tag,
        steps: steps.into_iter().collect(),
    }
}

impl Matcher for Seq {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        let offset = cursor.position();
        let mut content = Vec::new();
        let mut submatches = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let m = crate::bt!(step.try_match(cursor)?);
            content.extend_from_slice(m.content());
            submatches.push(m);
        }

        Ok(Some(Match::composite(self.tag, offset, content, submatches)))
    }
}

/// Applies each labelled step in order. See [`seq_named`].
#[derive(Clone)]
pub struct SeqNamed {
    tag: Tag,
    steps: Vec<(String, Rule)>,
}

/// Like [`seq`], but each step carries a label under which its match can be
/// found with [`Match::group`]. Steps labelled with the empty string are
/// unnamed.
pub fn seq_named<I, S>(tag: Tag, steps: I) -> SeqNamed
where
    I: IntoIterator<Item = (S, Rule)>,
    S: Into<String>,
{
    SeqNamed {
        tag,
        steps: steps
            .into_iter()
            .map(|(name, step)| (name.into(), step))
            .collect(),
    }
}

impl Matcher for SeqNamed {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        let offset = cursor.position();
        let mut parts = Vec::with_capacity(self.steps.len());

        for (name, step) in &self.steps {
            let m = crate::bt!(step.try_match(cursor)?);
            parts.push((name.as_str(), m));
        }

        Ok(Some(Match::named(self.tag, offset, parts)))
    }
}

/// Ordered choice. See [`first`].
#[derive(Clone)]
pub struct First {
    alternatives: Vec<Rule>,
}

/// Tries each alternative in order and returns the first match.
pub fn first<I>(alternatives: I) -> First
where
    I: IntoIterator<Item = Rule>,
{
    First {
        alternatives: alternatives.into_iter().collect(),
    }
}

impl Matcher for First {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        for alternative in &self.alternatives {
            let mut fork = cursor.fork();
            match alternative.try_match(&mut fork)? {
                Some(m) => {
                    fork.commit(cursor)?;
                    return Ok(Some(m));
                }
                None => fork.abandon(),
            }
        }

        Ok(None)
    }
}

/// Longest-match choice. See [`longest`].
#[derive(Clone)]
pub struct Longest {
    alternatives: Vec<Rule>,
}

/// Tries every alternative from the same starting point and keeps the one
/// whose match has the most content. Ties go to the alternative listed first.
pub fn longest<I>(alternatives: I) -> Longest
where
    I: IntoIterator<Item = Rule>,
{
    Longest {
        alternatives: alternatives.into_iter().collect(),
    }
}

impl Matcher for Longest {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        let mut best: Option<(usize, Match, Cursor)> = None;

        for (i, alternative) in self.alternatives.iter().enumerate() {
            let mut fork = cursor.fork();
            let m = match alternative.try_match(&mut fork)? {
                Some(m) => m,
                None => {
                    fork.abandon();
                    continue;
                }
            };

            let better = match &best {
                Some((_, current, _)) => m.len() > current.len(),
                None => true,
            };

            if better {
                if let Some((_, _, beaten)) = best.replace((i, m, fork)) {
                    beaten.abandon();
                }
            } else {
                fork.abandon();
            }
        }

        match best {
            Some((i, m, fork)) => {
                tracing::trace!(alternative = i, len = m.len(), "longest alternative selected");
                fork.commit(cursor)?;
                Ok(Some(m))
            }
            None => Ok(None),
        }
    }
}

/// Repetition, with or without a separator. See [`many`] and
/// [`many_with_sep`].
#[derive(Clone)]
pub struct Many {
    tag: Tag,
    min: usize,
    max: Option<usize>,
    element: Rule,
    separator: Option<Rule>,
}

/// Matches `element` as many times as possible, succeeding if it matched at
/// least `min` times.
pub fn many<M>(tag: Tag, min: usize, element: M) -> Many
where
    M: Matcher + 'static,
{
    Many {
        tag,
        min,
        max: None,
        element: rule(element),
        separator: None,
    }
}

/// Like [`many`], but `separator` must match between consecutive elements.
///
/// Separators are part of the produced match's content but do not appear
/// among its submatches. A separator not followed by an element is not
/// consumed.
pub fn many_with_sep<M, S>(tag: Tag, min: usize, element: M, separator: S) -> Many
where
    M: Matcher + 'static,
    S: Matcher + 'static,
{
    Many {
        separator: Some(rule(separator)),
        ..many(tag, min, element)
    }
}

impl Many {
    /// Stop after `max` elements.
    pub fn at_most(self, max: usize) -> Many {
        Many {
            max: Some(max.max(self.min)),
            ..self
        }
    }
}

impl Matcher for Many {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        let offset = cursor.position();
        let mut fork = cursor.fork();
        let mut content = Vec::new();
        let mut elements = Vec::new();

        while self.max.map_or(true, |max| elements.len() < max) {
            let mut step = fork.fork();
            let before = step.position();
            let mut consumed = Vec::new();

            if let (Some(separator), false) = (&self.separator, elements.is_empty()) {
                match separator.try_match(&mut step)? {
                    Some(sep) => consumed.extend_from_slice(sep.content()),
                    None => break,
                }
            }

            let m = match self.element.try_match(&mut step)? {
                Some(m) => m,
                None => break,
            };

            // An element which consumed nothing would match forever, and is
            // not counted.
            if step.position() == before {
                step.abandon();
                break;
            }

            consumed.extend_from_slice(m.content());
            step.commit(&mut fork)?;
            content.extend(consumed);
            elements.push(m);
        }

        if elements.len() < self.min {
            fork.abandon();
            return Ok(None);
        }

        tracing::trace!(tag = %self.tag, count = elements.len(), "repetition matched");
        fork.commit(cursor)?;
        Ok(Some(Match::composite(self.tag, offset, content, elements)))
    }
}

/// Makes a matcher optional. See [`optional`].
#[derive(Clone)]
pub struct Optional {
    inner: Rule,
}

/// Returns `inner`'s match, or a zero-length match tagged [`Tag::NONE`] when
/// `inner` does not match. Never fails to match.
pub fn optional<M>(inner: M) -> Optional
where
    M: Matcher + 'static,
{
    Optional { inner: rule(inner) }
}

impl Matcher for Optional {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        let offset = cursor.position();
        match cursor.parse(&self.inner)? {
            Some(m) => Ok(Some(m)),
            None => Ok(Some(Match::empty(offset))),
        }
    }
}

/// Runs a matcher atomically. See [`try_and_keep`].
#[derive(Clone)]
pub struct TryAndKeep {
    inner: Rule,
}

/// Runs `inner` on a fork, keeping its progress only if it matches. On a
/// non-match the cursor is exactly where it was.
pub fn try_and_keep<M>(inner: M) -> TryAndKeep
where
    M: Matcher + 'static,
{
    TryAndKeep { inner: rule(inner) }
}

impl Matcher for TryAndKeep {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        cursor.parse(&self.inner)
    }
}
