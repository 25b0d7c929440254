//! A shared, growable window over a forward-only byte source.
//!
//! The [`Buffer`] pulls bytes from its source on demand and keeps them until
//! they are explicitly discarded. This retained window is what lets cursors
//! rewind: a cursor never seeks the source, it simply re-reads bytes still held
//! by the window.

use std::{char::REPLACEMENT_CHARACTER, fmt, io::Read};

use parking_lot::Mutex;

use crate::{error::Error, location::Location};

const DEFAULT_CHUNK_SIZE: usize = 4096;

/// How malformed UTF-8 is treated when decoding code points.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Invalid bytes decode to U+FFFD, one byte at a time. A sequence cut short
    /// by the end of the stream decodes to a single U+FFFD covering the whole
    /// truncated tail, and decoding stops there.
    Lenient,

    /// Invalid or truncated sequences are reported as
    /// [`Error::InvalidUtf8`].
    Strict,
}

impl Default for DecodePolicy {
    fn default() -> Self {
        DecodePolicy::Lenient
    }
}

/// Tuning knobs for a [`Buffer`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BufferConfig {
    chunk_size: usize,
    initial_capacity: usize,
    decode: DecodePolicy,
}

impl Default for BufferConfig {
    fn default() -> Self {
        BufferConfig {
            chunk_size: DEFAULT_CHUNK_SIZE,
            initial_capacity: DEFAULT_CHUNK_SIZE,
            decode: DecodePolicy::default(),
        }
    }
}

impl BufferConfig {
    /// Number of bytes requested from the source per read. Values below one
    /// are raised to one.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Initial allocation of the window.
    pub fn with_initial_capacity(mut self, initial_capacity: usize) -> Self {
        self.initial_capacity = initial_capacity;
        self
    }

    /// Policy for malformed UTF-8.
    pub fn with_decode_policy(mut self, decode: DecodePolicy) -> Self {
        self.decode = decode;
        self
    }

    /// Number of bytes requested from the source per read.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Initial allocation of the window.
    pub fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    /// Policy for malformed UTF-8.
    pub fn decode_policy(&self) -> DecodePolicy {
        self.decode
    }
}

/// Code points decoded from the window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    /// The decoded code points, in order.
    pub chars: Vec<char>,

    /// The number of bytes spanned by `chars`.
    pub len: usize,
}

/// Width of the UTF-8 sequence introduced by `lead`, or zero if `lead` can not
/// start a sequence.
fn utf8_width(lead: u8) -> usize {
    match lead {
        0x00..=0x7f => 1,
        0xc2..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf4 => 4,
        _ => 0,
    }
}

fn is_continuation(b: u8) -> bool {
    b & 0xc0 == 0x80
}

/// Length of `bytes` without a trailing, incomplete multi-byte sequence.
fn complete_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(4) {
        let b = bytes[len - back];
        if is_continuation(b) {
            continue;
        }
        return if utf8_width(b) > back { len - back } else { len };
    }
    len
}

struct Window {
    source: Box<dyn Read + Send>,

    /// Retained bytes. Everything before `head` has been discarded and is
    /// waiting to be compacted away.
    bytes: Vec<u8>,
    head: usize,

    /// Absolute stream offset of `bytes[head]`.
    start: usize,

    /// Line and column of the start of `carry`, or of `bytes[head]` when
    /// `carry` is empty.
    location: Location,

    /// Discarded bytes of a code point which continues into the window.
    carry: Vec<u8>,

    eof: bool,
    config: BufferConfig,
}

impl Window {
    fn len(&self) -> usize {
        self.bytes.len() - self.head
    }

    fn retained(&self) -> &[u8] {
        &self.bytes[self.head..]
    }

    /// Pull from the source until at least `want` bytes are retained or the
    /// source is exhausted.
    fn fill(&mut self, want: usize) -> Result<(), Error> {
        while self.len() < want && !self.eof {
            let old = self.bytes.len();
            self.bytes.resize(old + self.config.chunk_size, 0);

            match self.source.read(&mut self.bytes[old..]) {
                Ok(0) => {
                    self.bytes.truncate(old);
                    self.eof = true;
                    tracing::trace!(end = self.start + self.len(), "source exhausted");
                }
                Ok(n) => {
                    self.bytes.truncate(old + n);
                    tracing::trace!(read = n, retained = self.len(), "refilled window");
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {
                    self.bytes.truncate(old);
                }
                Err(e) => {
                    self.bytes.truncate(old);
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    /// Convert an absolute stream position into an offset into the window.
    fn relative(&self, pos: usize) -> Result<usize, Error> {
        pos.checked_sub(self.start).ok_or(Error::Reclaimed {
            offset: pos,
            window_start: self.start,
        })
    }

    fn peek(&mut self, offset: usize, len: usize) -> Result<&[u8], Error> {
        self.fill(offset.saturating_add(len))?;

        let end = offset.saturating_add(len).min(self.len());
        let begin = offset.min(end);
        Ok(&self.retained()[begin..end])
    }

    fn invalid(&self, offset: usize) -> Result<(), Error> {
        match self.config.decode {
            DecodePolicy::Lenient => Ok(()),
            DecodePolicy::Strict => Err(Error::InvalidUtf8 {
                offset: self.start + offset,
            }),
        }
    }

    fn decode(&mut self, offset: usize, count: usize) -> Result<Decoded, Error> {
        // Every code point takes at least one byte, so what is already read
        // bounds the reservation.
        let mut chars = Vec::with_capacity(count.min(self.len()));
        let mut at = offset;

        while chars.len() < count {
            self.fill(at + 1)?;
            if at >= self.len() {
                break;
            }

            let width = utf8_width(self.retained()[at]);
            if width == 0 {
                self.invalid(at)?;
                chars.push(REPLACEMENT_CHARACTER);
                at += 1;
                continue;
            }

            // A multi-byte sequence may straddle the edge of what has been read
            // so far; keep pulling until it is complete or the source ends.
            self.fill(at + width)?;

            if at + width > self.len() {
                let tail = &self.retained()[at + 1..];
                if tail.iter().copied().all(is_continuation) {
                    // A sequence cut short by the end of the stream decodes
                    // as a single one-byte replacement.
                    self.invalid(at)?;
                    chars.push(REPLACEMENT_CHARACTER);
                    at += 1;
                    break;
                }

                self.invalid(at)?;
                chars.push(REPLACEMENT_CHARACTER);
                at += 1;
                continue;
            }

            let decoded = std::str::from_utf8(&self.retained()[at..at + width])
                .ok()
                .and_then(|s| s.chars().next());

            match decoded {
                Some(c) => {
                    chars.push(c);
                    at += width;
                }
                None => {
                    self.invalid(at)?;
                    chars.push(REPLACEMENT_CHARACTER);
                    at += 1;
                }
            }
        }

        Ok(Decoded {
            chars,
            len: at - offset,
        })
    }

    fn discard(&mut self, n: usize) {
        let n = n.min(self.len());
        if n == 0 {
            return;
        }

        let (head, end) = (self.head, self.head + n);
        self.carry.extend_from_slice(&self.bytes[head..end]);
        let located = complete_len(&self.carry);
        self.location.advance(&self.carry[..located]);
        self.carry.drain(..located);
        self.head = end;
        self.start += n;

        if self.head >= self.config.chunk_size && self.head * 2 >= self.bytes.len() {
            self.bytes.drain(..self.head);
            self.head = 0;
            tracing::trace!(retained = self.len(), "compacted window");
        }

        tracing::trace!(discarded = n, window_start = self.start, "discarded input");
    }
}

/// A window of input shared by every [`Cursor`](crate::Cursor) of a parse.
///
/// Offsets taken by the public methods are relative to the start of the
/// window. Every operation holds the buffer's lock for its whole duration,
/// so cursors may be driven from several threads.
pub struct Buffer {
    window: Mutex<Window>,
}

impl fmt::Debug for Buffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let window = self.window.lock();
        f.debug_struct("Buffer")
            .field("window_start", &window.start)
            .field("window_len", &window.len())
            .field("eof", &window.eof)
            .field("config", &window.config)
            .finish()
    }
}

impl Buffer {
    /// Wrap a byte source using the default configuration.
    pub fn new<R>(source: R) -> Buffer
    where
        R: Read + Send + 'static,
    {
        Buffer::with_config(source, BufferConfig::default())
    }

    /// Wrap a byte source.
    pub fn with_config<R>(source: R, config: BufferConfig) -> Buffer
    where
        R: Read + Send + 'static,
    {
        Buffer {
            window: Mutex::new(Window {
                source: Box::new(source),
                bytes: Vec::with_capacity(config.initial_capacity),
                head: 0,
                start: 0,
                location: Location::new(),
                carry: Vec::new(),
                eof: false,
                config,
            }),
        }
    }

    /// Returns up to `length` bytes starting `offset` bytes into the window,
    /// without consuming them.
    ///
    /// Fewer bytes are returned only when the source is exhausted.
    pub fn peek(&self, offset: usize, length: usize) -> Result<Vec<u8>, Error> {
        Ok(self.window.lock().peek(offset, length)?.to_vec())
    }

    /// Decodes up to `count` code points starting `offset` bytes into the
    /// window.
    ///
    /// A multi-byte character is never split between two results, even if the
    /// source delivered it in pieces.
    pub fn peek_codepoints(&self, offset: usize, count: usize) -> Result<Decoded, Error> {
        self.window.lock().decode(offset, count)
    }

    /// Permanently drop the first `n` bytes of the window.
    pub fn discard(&self, n: usize) {
        self.window.lock().discard(n)
    }

    /// Absolute stream offset of the first retained byte.
    pub fn window_start(&self) -> usize {
        self.window.lock().start
    }

    /// Number of bytes currently retained.
    pub fn window_len(&self) -> usize {
        self.window.lock().len()
    }

    /// The decoding policy in use.
    pub fn decode_policy(&self) -> DecodePolicy {
        self.window.lock().config.decode
    }

    pub(crate) fn peek_at(&self, pos: usize, length: usize) -> Result<Vec<u8>, Error> {
        let mut window = self.window.lock();
        let offset = window.relative(pos)?;
        Ok(window.peek(offset, length)?.to_vec())
    }

    pub(crate) fn decode_at(&self, pos: usize, count: usize) -> Result<Decoded, Error> {
        let mut window = self.window.lock();
        let offset = window.relative(pos)?;
        window.decode(offset, count)
    }

    pub(crate) fn at_end(&self, pos: usize) -> Result<bool, Error> {
        let mut window = self.window.lock();
        let offset = window.relative(pos)?;
        window.fill(offset + 1)?;
        Ok(offset >= window.len())
    }

    /// Discard everything before the absolute position `pos`.
    pub(crate) fn discard_to(&self, pos: usize) -> Result<(), Error> {
        let mut window = self.window.lock();
        let offset = window.relative(pos)?;
        window.discard(offset);
        Ok(())
    }

    pub(crate) fn location_at(&self, pos: usize) -> Result<Location, Error> {
        let window = self.window.lock();
        let offset = window.relative(pos)?;
        let end = offset.min(window.len());
        let ahead = &window.retained()[..end];
        if window.carry.is_empty() {
            return Ok(window.location.after(ahead));
        }
        Ok(window.location.after(&[&window.carry[..], ahead].concat()))
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use std::{collections::VecDeque, io};

    /// A reader which hands out its input in fixed pieces, one per `read`.
    pub struct Chunks(VecDeque<Vec<u8>>);

    impl Chunks {
        pub fn new<I, C>(chunks: I) -> Self
        where
            I: IntoIterator<Item = C>,
            C: AsRef<[u8]>,
        {
            Chunks(chunks.into_iter().map(|c| c.as_ref().to_vec()).collect())
        }
    }

    impl io::Read for Chunks {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let chunk = match self.0.pop_front() {
                Some(chunk) => chunk,
                None => return Ok(0),
            };

            let n = chunk.len().min(buf.len());
            buf[..n].copy_from_slice(&chunk[..n]);
            if n < chunk.len() {
                self.0.push_front(chunk[n..].to_vec());
            }
            Ok(n)
        }
    }

    /// A reader which yields its prefix and then fails.
    pub struct Failing(pub Vec<u8>);

    impl io::Read for Failing {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "source failed"));
            }

            let n = self.0.len().min(buf.len());
            buf[..n].copy_from_slice(&self.0[..n]);
            self.0.drain(..n);
            Ok(n)
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::{test_util::*, *};

    fn buffer_of(chunks: &[&[u8]]) -> Buffer {
        Buffer::new(Chunks::new(chunks.iter().copied()))
    }

    #[test]
    fn test_peek_is_non_destructive() {
        let buf = buffer_of(&[b"hello", b" world"]);
        assert_eq!(buf.peek(0, 5).unwrap(), b"hello");
        assert_eq!(buf.peek(0, 5).unwrap(), b"hello");
        assert_eq!(buf.peek(3, 5).unwrap(), b"lo wo");
        assert_eq!(buf.window_start(), 0);
    }

    #[test]
    fn test_peek_short_at_end_of_stream() {
        let buf = buffer_of(&[b"abc"]);
        assert_eq!(buf.peek(1, 10).unwrap(), b"bc");
        assert_eq!(buf.peek(3, 1).unwrap(), b"");
        assert_eq!(buf.peek(7, 1).unwrap(), b"");
    }

    #[test]
    fn test_discard_advances_window() {
        let buf = buffer_of(&[b"abc", b"def"]);
        assert_eq!(buf.peek(0, 6).unwrap(), b"abcdef");

        buf.discard(4);
        assert_eq!(buf.window_start(), 4);
        assert_eq!(buf.window_len(), 2);
        assert_eq!(buf.peek(0, 6).unwrap(), b"ef");
    }

    #[test]
    fn test_discard_compacts() {
        let config = BufferConfig::default().with_chunk_size(2);
        let buf = Buffer::with_config(io::Cursor::new(b"abcdefgh".to_vec()), config);
        assert_eq!(buf.peek(0, 8).unwrap(), b"abcdefgh");

        buf.discard(6);
        assert_eq!(buf.peek(0, 8).unwrap(), b"gh");
        assert_eq!(buf.window.lock().head, 0);
    }

    #[test]
    fn test_io_error_propagates() {
        let buf = Buffer::new(Failing(b"ab".to_vec()));
        assert_eq!(buf.peek(0, 2).unwrap(), b"ab");
        assert!(matches!(buf.peek(0, 3), Err(Error::Io(_))));
    }

    #[test]
    fn test_interrupted_read_is_retried() {
        struct Flaky(bool);

        impl io::Read for Flaky {
            fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
                if !self.0 {
                    self.0 = true;
                    return Err(io::ErrorKind::Interrupted.into());
                }
                buf[0] = b'x';
                Ok(1)
            }
        }

        let buf = Buffer::new(Flaky(false));
        assert_eq!(buf.peek(0, 1).unwrap(), b"x");
    }

    #[test]
    fn test_codepoint_split_across_refills() {
        // U+20AC EURO SIGN is E2 82 AC.
        let buf = buffer_of(&[&[0xe2], &[0x82, 0xac], b"!"]);
        let decoded = buf.peek_codepoints(0, 1).unwrap();
        assert_eq!(decoded.chars, vec!['\u{20ac}']);
        assert_eq!(decoded.len, 3);

        let decoded = buf.peek_codepoints(0, 2).unwrap();
        assert_eq!(decoded.chars, vec!['\u{20ac}', '!']);
        assert_eq!(decoded.len, 4);
    }

    #[test]
    fn test_codepoints_split_byte_by_byte() {
        let text = "añ€😀";
        let chunks: Vec<_> = text.bytes().map(|b| vec![b]).collect();
        let buf = Buffer::new(Chunks::new(chunks));

        let decoded = buf.peek_codepoints(0, 10).unwrap();
        assert_eq!(decoded.chars, text.chars().collect::<Vec<_>>());
        assert_eq!(decoded.len, text.len());
    }

    #[test]
    fn test_codepoints_at_offset() {
        let buf = buffer_of(&["xyñz".as_bytes()]);
        let decoded = buf.peek_codepoints(2, 2).unwrap();
        assert_eq!(decoded.chars, vec!['ñ', 'z']);
        assert_eq!(decoded.len, 3);
    }

    #[test]
    fn test_truncated_tail_is_lenient_by_default() {
        // First two bytes of a three byte sequence, then end of stream.
        let buf = buffer_of(&[b"a", &[0xe2, 0x82]]);
        let decoded = buf.peek_codepoints(0, 5).unwrap();
        assert_eq!(decoded.chars, vec!['a', REPLACEMENT_CHARACTER]);
        assert_eq!(decoded.len, 2);

        // The stranded continuation byte is its own replacement.
        let decoded = buf.peek_codepoints(2, 5).unwrap();
        assert_eq!(decoded.chars, vec![REPLACEMENT_CHARACTER]);
        assert_eq!(decoded.len, 1);
    }

    #[test]
    fn test_codepoint_count_is_not_preallocated() {
        let buf = buffer_of(&["añ".as_bytes(), b"b"]);
        let decoded = buf.peek_codepoints(0, usize::MAX).unwrap();
        assert_eq!(decoded.chars, vec!['a', 'ñ', 'b']);
        assert_eq!(decoded.len, 4);
    }

    #[test]
    fn test_truncated_tail_is_fault_when_strict() {
        let config = BufferConfig::default().with_decode_policy(DecodePolicy::Strict);
        let buf = Buffer::with_config(Chunks::new(vec![b"a".to_vec(), vec![0xe2, 0x82]]), config);

        assert_eq!(buf.peek_codepoints(0, 1).unwrap().chars, vec!['a']);
        assert!(matches!(
            buf.peek_codepoints(0, 2),
            Err(Error::InvalidUtf8 { offset: 1 })
        ));
    }

    #[test]
    fn test_invalid_bytes_are_replaced_one_at_a_time() {
        let buf = buffer_of(&[&[0xff, b'a', 0xe2, b'b']]);
        let decoded = buf.peek_codepoints(0, 4).unwrap();
        assert_eq!(
            decoded.chars,
            vec![REPLACEMENT_CHARACTER, 'a', REPLACEMENT_CHARACTER, 'b']
        );
        assert_eq!(decoded.len, 4);
    }

    #[test]
    fn test_reclaimed_position_is_a_fault() {
        let buf = buffer_of(&[b"abcdef"]);
        buf.peek(0, 6).unwrap();
        buf.discard_to(4).unwrap();

        assert_eq!(buf.peek_at(4, 2).unwrap(), b"ef");
        assert!(matches!(
            buf.peek_at(2, 1),
            Err(Error::Reclaimed {
                offset: 2,
                window_start: 4
            })
        ));
    }

    #[test]
    fn test_location_follows_discards() {
        let buf = buffer_of(&[b"ab\ncd\nef"]);
        buf.peek(0, 8).unwrap();

        assert_eq!(buf.location_at(4).unwrap(), Location::new().after(b"ab\nc"));
        buf.discard_to(3).unwrap();
        let loc = buf.location_at(7).unwrap();
        assert_eq!((loc.line(), loc.col()), (3, 2));
    }

    #[test]
    fn test_location_across_a_split_code_point() {
        let text = "a\u{ff21}b";
        let buf = buffer_of(&[text.as_bytes()]);
        buf.peek(0, text.len()).unwrap();

        // Discard up to the middle of the fullwidth letter.
        buf.discard_to(2).unwrap();
        assert_eq!(buf.location_at(text.len()).unwrap(), Location::new().after(text.as_bytes()));

        buf.discard_to(4).unwrap();
        let loc = buf.location_at(text.len()).unwrap();
        assert_eq!((loc.line(), loc.col()), (1, 5));
    }

    #[test]
    fn test_complete_len() {
        assert_eq!(complete_len(b""), 0);
        assert_eq!(complete_len(b"ab"), 2);
        assert_eq!(complete_len(&[b'a', 0xe2, 0x82]), 1);
        assert_eq!(complete_len(&[b'a', 0xe2, 0x82, 0xac]), 4);
        assert_eq!(complete_len(&[0x82, 0xac]), 2);
        assert_eq!(complete_len(&[b'a', 0xff]), 2);
    }

    #[test]
    fn test_at_end() {
        let buf = buffer_of(&[b"ab"]);
        assert!(!buf.at_end(0).unwrap());
        assert!(!buf.at_end(1).unwrap());
        assert!(buf.at_end(2).unwrap());
    }
}
