//! Speculative read positions over a shared [`Buffer`].
//!
//! Cursors form a tree. The root is created for the whole parse; every
//! speculative attempt forks a child from the cursor it was handed, reads
//! ahead on the child, and then either commits the child back into its parent
//! or abandons it. Abandoning costs nothing: the child's reads never touched
//! the parent, and the bytes it saw remain in the buffer for the parent to
//! read again.
//!
//! Memory is reclaimed only when a commit reaches the root, either from the
//! root itself or from one of its direct children. At that point no cursor
//! can need the bytes before the committed position, so the buffer drops
//! them.

use std::{io::Read, sync::Arc};

use crate::{
    buffer::{Buffer, Decoded},
    error::Error,
    location::Location,
    trace::{Trace, Tracer},
    MatchResult, Matcher,
};

/// A read position over a shared [`Buffer`].
#[derive(Clone)]
pub struct Cursor {
    buffer: Arc<Buffer>,

    /// Absolute stream position.
    pos: usize,

    /// Generations below the root. The root is zero.
    depth: usize,

    tracer: Option<Tracer>,
}

impl std::fmt::Debug for Cursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("pos", &self.pos)
            .field("depth", &self.depth)
            .field("traced", &self.tracer.is_some())
            .finish()
    }
}

impl Cursor {
    /// Create a root cursor at the start of `buffer`'s window.
    pub fn new(buffer: Arc<Buffer>) -> Cursor {
        let pos = buffer.window_start();
        Cursor {
            buffer,
            pos,
            depth: 0,
            tracer: None,
        }
    }

    /// Create a root cursor over a byte source with a default [`Buffer`].
    pub fn from_reader<R>(source: R) -> Cursor
    where
        R: Read + Send + 'static,
    {
        Cursor::new(Arc::new(Buffer::new(source)))
    }

    /// Create a root cursor over in-memory input.
    pub fn from_bytes<B>(bytes: B) -> Cursor
    where
        B: Into<Vec<u8>>,
    {
        Cursor::from_reader(std::io::Cursor::new(bytes.into()))
    }

    /// Attach a tracing hook. Cursors forked from this one inherit it.
    pub fn with_tracer(mut self, tracer: Tracer) -> Cursor {
        self.tracer = Some(tracer);
        self
    }

    /// The shared buffer.
    pub fn buffer(&self) -> &Arc<Buffer> {
        &self.buffer
    }

    /// Generations between this cursor and the root.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Whether this is the root of its cursor tree.
    pub fn is_root(&self) -> bool {
        self.depth == 0
    }

    /// Absolute byte offset from the start of the stream.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Byte offset relative to the start of the buffer's window.
    pub fn offset(&self) -> usize {
        self.pos.saturating_sub(self.buffer.window_start())
    }

    /// Line and column of the cursor in the input text.
    pub fn location(&self) -> Result<Location, Error> {
        self.buffer.location_at(self.pos)
    }

    /// Whether the input is exhausted at this cursor.
    pub fn is_at_end(&self) -> Result<bool, Error> {
        self.buffer.at_end(self.pos)
    }

    /// Start a speculative child at the same position. No I/O is performed.
    pub fn fork(&self) -> Cursor {
        Cursor {
            buffer: Arc::clone(&self.buffer),
            pos: self.pos,
            depth: self.depth + 1,
            tracer: self.tracer.clone(),
        }
    }

    /// Keep this child's progress by moving `parent` to its position.
    ///
    /// When `parent` is the root, every byte before the committed position is
    /// discarded from the buffer and both cursors end up at offset zero of the
    /// new window.
    pub fn commit(self, parent: &mut Cursor) -> Result<(), Error> {
        debug_assert_eq!(
            self.depth,
            parent.depth + 1,
            "committed into a cursor which is not its parent"
        );

        if parent.is_root() {
            self.buffer.discard_to(self.pos)?;
        }
        parent.pos = self.pos;
        Ok(())
    }

    /// Drop this child's progress. The parent is untouched.
    pub fn abandon(self) {}

    /// Commit the root cursor to its own position, discarding every byte
    /// before it. Does nothing on a non-root cursor.
    pub fn reclaim(&mut self) -> Result<(), Error> {
        if self.is_root() {
            self.buffer.discard_to(self.pos)?;
        }
        Ok(())
    }

    /// Returns up to `len` bytes at the cursor without advancing.
    pub fn peek(&self, len: usize) -> Result<Vec<u8>, Error> {
        self.buffer.peek_at(self.pos, len)
    }

    /// Decodes up to `count` code points at the cursor without advancing.
    pub fn peek_codepoints(&self, count: usize) -> Result<Decoded, Error> {
        self.buffer.decode_at(self.pos, count)
    }

    /// Reads up to `len` bytes, advancing past the bytes returned.
    pub fn read(&mut self, len: usize) -> Result<Vec<u8>, Error> {
        let bytes = self.peek(len)?;
        self.pos += bytes.len();
        Ok(bytes)
    }

    /// Reads up to `count` code points, advancing past the bytes they span.
    pub fn read_codepoints(&mut self, count: usize) -> Result<Vec<char>, Error> {
        let decoded = self.peek_codepoints(count)?;
        self.pos += decoded.len;
        Ok(decoded.chars)
    }

    /// Skip `n` bytes, or fewer if the input ends first. Returns the number of
    /// bytes skipped.
    pub fn advance(&mut self, n: usize) -> Result<usize, Error> {
        Ok(self.read(n)?.len())
    }

    /// Run `matcher` speculatively.
    ///
    /// The cursor only moves if the matcher succeeds; on a non-match or an
    /// error it is left where it was.
    pub fn parse<M>(&mut self, matcher: &M) -> MatchResult
    where
        M: Matcher + ?Sized,
    {
        let mut fork = self.fork();

        let m = match matcher.try_match(&mut fork)? {
            Some(m) => m,
            None => {
                fork.abandon();
                return Ok(None);
            }
        };

        fork.commit(self)?;
        Ok(Some(m))
    }

    pub(crate) fn trace<'a, F>(&self, event: F)
    where
        F: FnOnce() -> Trace<'a>,
    {
        if let Some(tracer) = &self.tracer {
            tracer(&event());
        }
    }
}
