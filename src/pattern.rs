//! Regular-expression matching over bounded lookahead.
//!
//! Available with the `regex` feature. Because the input is a stream, a
//! pattern only ever sees a fixed-size window of lookahead; matches longer
//! than the window are cut off at the window's end.

use std::fmt;

use regex::bytes::Regex;

use crate::{cursor::Cursor, tag::Tag, unit::primitive, MatchResult, Matcher};

/// Matches a regular expression anchored at the cursor.
#[derive(Clone)]
pub struct Pattern {
    tag: Tag,
    regex: Regex,
    source: String,
    window: usize,
}

/// Build a matcher for `re`, which is anchored at the cursor and evaluated
/// against at most `window` bytes of lookahead.
///
/// # Errors
///
/// Returns an error if `re` is not a valid regular expression.
pub fn pattern(tag: Tag, re: &str, window: usize) -> Result<Pattern, regex::Error> {
    Ok(Pattern {
        tag,
        regex: Regex::new(&format!("^(?:{})", re))?,
        source: re.to_owned(),
        window,
    })
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("tag", &self.tag)
            .field("regex", &self.source)
            .field("window", &self.window)
            .finish()
    }
}

impl Matcher for Pattern {
    fn try_match(&self, cursor: &mut Cursor) -> MatchResult {
        primitive(cursor, "Pattern", self, self.tag, |fork| {
            let ahead = fork.peek(self.window)?;
            let end = match self.regex.find(&ahead) {
                Some(m) => m.end(),
                None => return Ok(None),
            };

            fork.advance(end)?;
            Ok(Some(ahead[..end].to_vec()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::test_util::Chunks;

    #[test]
    fn test_pattern_is_anchored() {
        let number = pattern(Tag::LITERAL, r"-?[0-9]+(\.[0-9]+)?", 32).unwrap();

        let mut cursor = Cursor::from_bytes("-12.5e3");
        let m = number.try_match(&mut cursor).unwrap().unwrap();
        assert_eq!(m.content(), b"-12.5");
        assert_eq!(cursor.position(), 5);

        let mut cursor = Cursor::from_bytes("x12");
        assert!(number.try_match(&mut cursor).unwrap().is_none());
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_pattern_across_chunks() {
        let ident = pattern(Tag::LITERAL, "[a-z_]+", 64).unwrap();
        let mut cursor = Cursor::from_reader(Chunks::new(vec!["sna", "ke_c", "ase!"]));
        let m = ident.try_match(&mut cursor).unwrap().unwrap();
        assert_eq!(m.content(), b"snake_case");
    }

    #[test]
    fn test_pattern_limited_by_window() {
        let run = pattern(Tag::LITERAL, "a+", 3).unwrap();
        let mut cursor = Cursor::from_bytes("aaaaa");
        assert_eq!(run.try_match(&mut cursor).unwrap().unwrap().len(), 3);
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(pattern(Tag::LITERAL, "(", 8).is_err());
    }
}
