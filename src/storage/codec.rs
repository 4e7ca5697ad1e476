//! Fixed-size encoding for keys, values and handles.
//!
//! Every slot in a serialized block has the same width, so a block's
//! on-disk size depends only on the order and the encoded lengths.

use crate::common::BlockHandle;

/// A type with a fixed-width little-endian byte encoding.
///
/// `encode` must write exactly `ENCODED_LEN` bytes and `decode` must accept
/// exactly the bytes `encode` produced.
///
/// # Example
/// ```
/// use bptree_store::FixedCodec;
///
/// let mut buf = [0u8; 4];
/// 7u32.encode(&mut buf);
/// assert_eq!(u32::decode(&buf), 7);
/// ```
pub trait FixedCodec: Sized {
    /// Number of bytes in the encoding.
    const ENCODED_LEN: usize;

    /// Write the encoding into `out[..ENCODED_LEN]`.
    fn encode(&self, out: &mut [u8]);

    /// Read a value from `bytes[..ENCODED_LEN]`.
    fn decode(bytes: &[u8]) -> Self;
}

macro_rules! impl_fixed_codec_for_int {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FixedCodec for $ty {
                const ENCODED_LEN: usize = std::mem::size_of::<$ty>();

                #[inline]
                fn encode(&self, out: &mut [u8]) {
                    out[..Self::ENCODED_LEN].copy_from_slice(&self.to_le_bytes());
                }

                #[inline]
                fn decode(bytes: &[u8]) -> Self {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(&bytes[..Self::ENCODED_LEN]);
                    <$ty>::from_le_bytes(buf)
                }
            }
        )*
    };
}

impl_fixed_codec_for_int!(u8, u16, u32, u64, u128, i8, i16, i32, i64, i128);

impl<const N: usize> FixedCodec for [u8; N] {
    const ENCODED_LEN: usize = N;

    #[inline]
    fn encode(&self, out: &mut [u8]) {
        out[..N].copy_from_slice(self);
    }

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        let mut buf = [0u8; N];
        buf.copy_from_slice(&bytes[..N]);
        buf
    }
}

impl FixedCodec for BlockHandle {
    const ENCODED_LEN: usize = 4;

    #[inline]
    fn encode(&self, out: &mut [u8]) {
        self.0.encode(out);
    }

    #[inline]
    fn decode(bytes: &[u8]) -> Self {
        BlockHandle(u32::decode(bytes))
    }
}

/// Sequential little-endian writer over a preallocated buffer.
pub(crate) struct ByteWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> ByteWriter<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn put<T: FixedCodec>(&mut self, value: &T) {
        value.encode(&mut self.buf[self.pos..]);
        self.pos += T::ENCODED_LEN;
    }

    /// Leave `len` bytes untouched (they stay zeroed).
    pub(crate) fn skip(&mut self, len: usize) {
        self.pos += len;
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }
}

/// Sequential little-endian reader, the inverse of [`ByteWriter`].
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn get<T: FixedCodec>(&mut self) -> T {
        let value = T::decode(&self.buf[self.pos..]);
        self.pos += T::ENCODED_LEN;
        value
    }

    pub(crate) fn skip(&mut self, len: usize) {
        self.pos += len;
    }

    #[cfg(test)]
    pub(crate) fn position(&self) -> usize {
        self.pos
    }
}
