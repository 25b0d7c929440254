//! Predicates over single bytes or code points.
//!
//! Predicates are plain functions with no parsing state. They combine with
//! `|` (union), `!` (complement) and `-` (difference):
//!
//! ```rust
//! # use burrow::predicate::{in_range, in_set};
//! let hex = in_range(b'0', b'9') | in_range(b'a', b'f') | in_range(b'A', b'F');
//! let not_zero = hex.clone() - in_set(b"0");
//! assert!(hex.test(b'c'));
//! assert!(!not_zero.test(b'0'));
//! assert!((!hex).test(b'g'));
//! ```

use std::{
    fmt,
    ops::{BitOr, Not, Sub},
    sync::Arc,
};

/// A shareable predicate over units of type `T`.
pub struct Pred<T>(Arc<dyn Fn(T) -> bool + Send + Sync>);

/// A predicate over bytes.
pub type BytePred = Pred<u8>;

/// A predicate over code points.
pub type CharPred = Pred<char>;

impl<T> Clone for Pred<T> {
    fn clone(&self) -> Self {
        Pred(Arc::clone(&self.0))
    }
}

impl<T> fmt::Debug for Pred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Pred")
    }
}

impl<T: 'static> Pred<T> {
    /// Wrap a function.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(T) -> bool + Send + Sync + 'static,
    {
        Pred(Arc::new(f))
    }

    /// Matches every unit.
    pub fn always() -> Self {
        Pred::new(|_| true)
    }

    /// Matches nothing.
    pub fn never() -> Self {
        Pred::new(|_| false)
    }

    /// Whether `unit` satisfies the predicate.
    pub fn test(&self, unit: T) -> bool {
        (self.0)(unit)
    }

    /// Matches units matching `self` but not `other`.
    pub fn but_not(self, other: Pred<T>) -> Self
    where
        T: Copy,
    {
        Pred::new(move |u| self.test(u) && !other.test(u))
    }
}

impl<T: Copy + 'static> BitOr for Pred<T> {
    type Output = Pred<T>;

    fn bitor(self, rhs: Pred<T>) -> Pred<T> {
        Pred::new(move |u| self.test(u) || rhs.test(u))
    }
}

impl<T: 'static> Not for Pred<T> {
    type Output = Pred<T>;

    fn not(self) -> Pred<T> {
        Pred::new(move |u| !self.test(u))
    }
}

impl<T: Copy + 'static> Sub for Pred<T> {
    type Output = Pred<T>;

    fn sub(self, rhs: Pred<T>) -> Pred<T> {
        self.but_not(rhs)
    }
}

/// Matches any unit listed in `set`.
pub fn in_set<T>(set: &[T]) -> Pred<T>
where
    T: Copy + PartialEq + Send + Sync + 'static,
{
    let set = set.to_vec();
    Pred::new(move |u| set.contains(&u))
}

/// Matches any unit between `lo` and `hi`, inclusive.
pub fn in_range<T>(lo: T, hi: T) -> Pred<T>
where
    T: Copy + PartialOrd + Send + Sync + 'static,
{
    Pred::new(move |u| lo <= u && u <= hi)
}

/// Matches a unit matching any of `preds`. With no predicates, matches
/// nothing.
pub fn any_of<T, I>(preds: I) -> Pred<T>
where
    T: Copy + 'static,
    I: IntoIterator<Item = Pred<T>>,
{
    let mut preds: Vec<_> = preds.into_iter().collect();
    match preds.len() {
        0 => Pred::never(),
        1 => preds.remove(0),
        _ => Pred::new(move |u| preds.iter().any(|p| p.test(u))),
    }
}

/// Matches a unit matching none of `preds`.
pub fn none_of<T, I>(preds: I) -> Pred<T>
where
    T: Copy + 'static,
    I: IntoIterator<Item = Pred<T>>,
{
    !any_of(preds)
}

/// ASCII `0` through `9`.
pub fn ascii_digit() -> BytePred {
    in_range(b'0', b'9')
}

/// ASCII letters.
pub fn ascii_alpha() -> BytePred {
    in_range(b'a', b'z') | in_range(b'A', b'Z')
}

/// Space, tab, carriage return, line feed and form feed.
pub fn ascii_whitespace() -> BytePred {
    Pred::new(|b: u8| b.is_ascii_whitespace())
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_set_and_range() {
        let p = in_set(b"-+");
        assert!(p.test(b'-'));
        assert!(!p.test(b'*'));

        let r = in_range('a', 'c');
        assert!(r.test('a') && r.test('c'));
        assert!(!r.test('d'));
    }

    #[test]
    fn test_any_of_edge_cases() {
        let none: BytePred = any_of(vec![]);
        assert!(!none.test(b'a'));

        let everything: BytePred = none_of(vec![]);
        assert!(everything.test(b'a'));

        let one = any_of(vec![ascii_digit()]);
        assert!(one.test(b'5'));
    }

    #[test]
    fn test_ascii_helpers() {
        assert!(ascii_alpha().test(b'Q'));
        assert!(!ascii_alpha().test(b'1'));
        assert!(ascii_whitespace().test(b'\n'));
    }

    proptest! {
        #[test]
        fn prop_union(lo in any::<u8>(), hi in any::<u8>(), set in any::<Vec<u8>>(), b in any::<u8>()) {
            let (p1, p2) = (in_range(lo, hi), in_set(&set));
            let expected = p1.test(b) || p2.test(b);
            prop_assert_eq!((p1 | p2).test(b), expected);
        }

        #[test]
        fn prop_complement(lo in any::<char>(), hi in any::<char>(), c in any::<char>()) {
            let p = in_range(lo, hi);
            let expected = !p.test(c);
            prop_assert_eq!((!p).test(c), expected);
        }

        #[test]
        fn prop_difference(lo in any::<u8>(), hi in any::<u8>(), set in any::<Vec<u8>>(), b in any::<u8>()) {
            let (p1, p2) = (in_range(lo, hi), in_set(&set));
            let expected = p1.test(b) && !p2.test(b);
            prop_assert_eq!((p1.clone() - p2.clone()).test(b), expected);
            prop_assert_eq!(p1.but_not(p2).test(b), expected);
        }

        #[test]
        fn prop_any_of_is_union(sets in proptest::collection::vec(any::<Vec<u8>>(), 0..4), b in any::<u8>()) {
            let expected = sets.iter().any(|s| s.contains(&b));
            let preds: Vec<BytePred> = sets.iter().map(|s| in_set(s)).collect();
            prop_assert_eq!(any_of(preds.clone()).test(b), expected);
            prop_assert_eq!(none_of(preds).test(b), !expected);
        }
    }
}
