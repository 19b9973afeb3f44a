use std::fmt;
use std::ops::Deref;

use crate::byte_range::ByteRange;

/// A non-owning view into an emitted record, paired with its coordinates in the source.
///
/// Borrowing `'a` from whatever buffer backs the spliterator is how the "caller must be done with
/// one view before asking for the next" rule gets enforced: nothing at runtime checks it, the
/// borrow checker simply refuses to compile a program that calls `next()` again while a `Span`
/// from the previous call is still alive.
#[derive(Clone, Copy)]
pub struct Span<'a> {
    range: ByteRange,
    bytes: &'a [u8],
}

impl<'a> fmt::Debug for Span<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Span")
            .field("range", &self.range)
            .field("bytes", &bstr::BStr::new(self.bytes))
            .finish()
    }
}

impl<'a> Span<'a> {
    pub(crate) fn new(range: ByteRange, bytes: &'a [u8]) -> Self {
        Self { range, bytes }
    }

    pub fn range(&self) -> ByteRange {
        self.range
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> Deref for Span<'a> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        self.bytes
    }
}

impl<'a> AsRef<[u8]> for Span<'a> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

impl<'a> PartialEq<[u8]> for Span<'a> {
    fn eq(&self, other: &[u8]) -> bool {
        self.bytes == other
    }
}

impl<'a> PartialEq<&[u8]> for Span<'a> {
    fn eq(&self, other: &&[u8]) -> bool {
        self.bytes == *other
    }
}
