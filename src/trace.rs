//! Observational hooks for following a parse.
//!
//! Attach a [`Tracer`] to a root cursor with
//! [`Cursor::with_tracer`](crate::Cursor::with_tracer). Primitive matchers then
//! report each attempt as it is tried, when it produces a match, and when it
//! fails with an error. Reports never influence matching.

use std::{fmt, sync::Arc};

use crate::{error::Error, tag::Tag, tree::Match};

/// The point in a matcher attempt being reported.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    /// The matcher is about to read input.
    Try,
    /// The matcher produced a match.
    Got,
    /// The matcher failed with an error.
    Fail,
}

/// What an attempt produced.
#[derive(Copy, Clone, Debug)]
pub enum Outcome<'a> {
    /// The match produced at [`Stage::Got`].
    Matched(&'a Match),
    /// The error raised at [`Stage::Fail`].
    Failed(&'a Error),
}

/// A single report from a matcher.
#[derive(Copy, Clone)]
pub struct Trace<'a> {
    /// Where in the attempt this report was made.
    pub stage: Stage,

    /// The matcher's name.
    pub matcher: &'static str,

    /// The matcher's configuration.
    pub config: &'a dyn fmt::Debug,

    /// The tag the matcher produces.
    pub tag: Tag,

    /// Absolute byte offset the attempt started at.
    pub offset: usize,

    /// The match or error, for `Got` and `Fail`.
    pub outcome: Option<Outcome<'a>>,
}

impl fmt::Debug for Trace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Trace")
            .field("stage", &self.stage)
            .field("matcher", &self.matcher)
            .field("tag", &self.tag)
            .field("offset", &self.offset)
            .field("outcome", &self.outcome)
            .finish()
    }
}

impl fmt::Display for Trace<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage {
            Stage::Try => "TRY",
            Stage::Got => "GOT",
            Stage::Fail => "ERR",
        };

        write!(
            f,
            "{} {}({:?}) @{}",
            stage, self.matcher, self.config, self.offset
        )?;

        match self.outcome {
            Some(Outcome::Matched(m)) => write!(f, " = {}", m),
            Some(Outcome::Failed(e)) => write!(f, ": {}", e),
            None => Ok(()),
        }
    }
}

/// A callback receiving [`Trace`] reports.
pub type Tracer = Arc<dyn Fn(&Trace<'_>) + Send + Sync>;

/// A tracer which forwards every report to the `tracing` facade at `TRACE`
/// level under the `burrow::trace` target.
pub fn log_tracer() -> Tracer {
    Arc::new(|t: &Trace<'_>| {
        tracing::trace!(target: "burrow::trace", stage = ?t.stage, tag = %t.tag, "{}", t);
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let m = Match::leaf(Tag::LITERAL, b"ab".to_vec(), 4);
        let config = "cfg";

        let got = Trace {
            stage: Stage::Got,
            matcher: "Bytes",
            config: &config,
            tag: Tag::LITERAL,
            offset: 4,
            outcome: Some(Outcome::Matched(&m)),
        };
        assert_eq!(got.to_string(), format!("GOT Bytes(\"cfg\") @4 = {}", m));

        let err = Error::InvalidUtf8 { offset: 9 };
        let fail = Trace {
            stage: Stage::Fail,
            outcome: Some(Outcome::Failed(&err)),
            ..got
        };
        assert_eq!(
            fail.to_string(),
            "ERR Bytes(\"cfg\") @4: invalid UTF-8 sequence at byte 9"
        );

        let tried = Trace {
            stage: Stage::Try,
            outcome: None,
            ..got
        };
        assert_eq!(tried.to_string(), "TRY Bytes(\"cfg\") @4");
    }

    #[test]
    fn test_log_tracer_does_not_panic_without_subscriber() {
        let m = Match::empty(0);
        let tracer = log_tracer();
        tracer(&Trace {
            stage: Stage::Got,
            matcher: "Optional",
            config: &(),
            tag: Tag::NONE,
            offset: 0,
            outcome: Some(Outcome::Matched(&m)),
        });
    }
}
