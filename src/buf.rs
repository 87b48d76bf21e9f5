use {
    crate::{
        error::{Error, Result},
        io::{Read, Write},
    },
    alloc::{vec, vec::Vec},
    core::{cmp::min, ops::Drop},
    zeroize::Zeroize,
};

/// A fixed-capacity buffer sized at runtime.
///
/// Holds at most one segment, so memory stays bounded by the
/// segment size no matter how long the stream is.
#[derive(Clone, Debug)]
pub(crate) struct Buf {
    /// Contents are data[read..write].
    /// Read at data[read], write at data[write].
    data: Vec<u8>,
    /// Read offset.
    read: usize,
    /// Write offset.
    write: usize,
    /// Upper bound for `write` when filling through [`Write`].
    limit: usize,
}

impl PartialEq<Vec<u8>> for Buf {
    fn eq(&self, other: &Vec<u8>) -> bool {
        *self.remaining_slice() == other[..]
    }
}

impl Buf {
    pub fn new(capacity: usize) -> Self {
        Self {
            data: vec![0u8; capacity],
            read: 0,
            write: 0,
            limit: capacity,
        }
    }

    /// Reports whether all bytes have been read.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Reports whether the buffer reached its limit and no more
    /// data can be written.
    pub fn is_full(&self) -> bool {
        self.write >= self.limit
    }

    /// Returns the number of unread bytes in the buffer.
    pub fn len(&self) -> usize {
        self.write - self.read
    }

    /// Restricts writes to the first `limit` bytes.
    pub fn set_limit(&mut self, limit: usize) {
        debug_assert!(limit <= self.data.len());
        self.limit = min(limit, self.data.len());
    }

    /// Resets the buffer to empty.
    pub fn reset(&mut self) {
        self.read = 0;
        self.write = 0;
    }

    /// Discards all but the first n unread bytes in the buffer.
    pub fn truncate(&mut self, n: usize) {
        if n == 0 {
            self.reset();
            return;
        }
        self.write = self.read + min(n, self.len());
    }

    /// Extends the unread portion by `n` bytes past the limit,
    /// returning the whole unread portion.
    ///
    /// Used to append a tag to a sealed segment in place.
    pub fn extend(&mut self, n: usize) -> &mut [u8] {
        debug_assert!(self.write + n <= self.data.len());
        self.write = min(self.write + n, self.data.len());
        self.as_mut_slice()
    }

    /// Returns the buffer's remaining capacity.
    pub fn remaining_capacity_mut(&mut self) -> &mut [u8] {
        let end = self.limit.max(self.write);
        &mut self.data[self.write..end]
    }

    /// Returns the unread portion of the buffer.
    pub fn remaining_slice(&self) -> &[u8] {
        &self.data[self.read..self.write]
    }

    /// Returns the unread portion of the buffer as a mutable
    /// slice.
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.data[self.read..self.write]
    }

    /// Splits the unread portion of the buffer at mid, returning
    /// [0, mid) and [mid, len).
    pub fn split_at_mut(&mut self, mid: usize) -> (&mut [u8], &mut [u8]) {
        self.as_mut_slice().split_at_mut(mid)
    }

    /// Reads from `src` until the buffer holds `want` unread
    /// bytes, the limit is reached or `src` reaches EOF.
    pub fn read_from<R: Read + ?Sized>(
        &mut self,
        src: &mut R,
        want: usize,
    ) -> Result<usize> {
        let target = min(self.read + want, self.limit);
        let mut n = 0;
        while self.write < target {
            let m = src.read(&mut self.data[self.write..target])?;
            if m == 0 {
                break;
            }
            self.write += m;
            n += m;
        }
        Ok(n)
    }

    /// Writes the entire contents of the buffer to `dst`.
    pub fn write_to<W: Write + ?Sized>(
        &mut self,
        dst: &mut W,
    ) -> Result<usize> {
        let start = self.read;
        while !self.is_empty() {
            let m = dst.write(self.remaining_slice())?;
            if m == 0 {
                return Err(Error::ShortWrite(self.read - start));
            }
            self.read += m;
        }
        let n = self.read - start;
        self.reset();
        Ok(n)
    }
}

impl Drop for Buf {
    fn drop(&mut self) {
        self.data.zeroize();
    }
}

impl Read for Buf {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let src = self.remaining_slice();
        let n = min(src.len(), buf.len());
        buf[..n].copy_from_slice(&src[..n]);
        self.read += n;
        Ok(n)
    }
}

impl Write for Buf {
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        let dst = self.remaining_capacity_mut();
        let n = min(dst.len(), buf.len());
        dst[..n].copy_from_slice(&buf[..n]);
        self.write += n;
        Ok(n)
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, core::cmp};

    fn read_all<R: Read>(r: &mut R) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let nr = r.read(&mut buf)?;
            if nr == 0 {
                break;
            }
            data.extend_from_slice(&buf[..nr]);
        }
        Ok(data)
    }

    struct SmallByteReader<'a, R: Read> {
        r: &'a mut R,
        n: usize,
    }

    impl<'a, R: Read> SmallByteReader<'a, R> {
        fn new(r: &'a mut R) -> Self {
            Self { r, n: 0 }
        }
    }

    impl<R: Read> Read for SmallByteReader<'_, R> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            if buf.is_empty() {
                return Ok(0);
            }
            self.n = (self.n % 3) + 1;
            let n = cmp::min(self.n, buf.len());
            self.r.read(&mut buf[..n])
        }
    }

    #[test]
    fn test_buf_read() {
        const CONTENT: &str = "hello, world!";
        let mut b = Buf::new(4096);
        Write::write(&mut b, CONTENT.as_bytes()).unwrap();
        assert_eq!(Read::read(&mut b, &mut [0u8; 0][..]).unwrap(), 0);

        let mut sbr = SmallByteReader::new(&mut b);
        let data = read_all(&mut sbr).unwrap();
        assert_eq!(data, CONTENT.as_bytes());
        assert_eq!(0, Read::read(&mut b, &mut [0u8; 10][..]).unwrap());
    }

    #[test]
    fn test_buf_limit() {
        let mut b = Buf::new(8);
        b.set_limit(5);
        assert_eq!(Write::write(&mut b, &[1u8; 8]).unwrap(), 5);
        assert!(b.is_full());

        let all = b.extend(3);
        assert_eq!(all.len(), 8);
        assert_eq!(b.len(), 8);
    }

    #[test]
    fn test_buf_read_from_stops_at_want() {
        let src = [7u8; 100];
        let mut b = Buf::new(64);
        let mut rd = &src[..];
        let mut sbr = SmallByteReader::new(&mut rd);

        let n = b.read_from(&mut sbr, 10).unwrap();
        assert_eq!(n, 10);
        assert_eq!(b, vec![7u8; 10]);

        // Capped by capacity, not by `want`.
        let n = b.read_from(&mut sbr, 1000).unwrap();
        assert_eq!(n, 54);
        assert!(b.is_full());
    }

    #[test]
    fn test_buf_read_from_eof() {
        let src = [1u8, 2, 3];
        let mut b = Buf::new(16);
        let n = b.read_from(&mut &src[..], 16).unwrap();
        assert_eq!(n, 3);
        assert_eq!(b, vec![1, 2, 3]);
    }

    #[test]
    fn test_buf_write_to() {
        let mut b = Buf::new(32);
        Write::write(&mut b, &[42u8; 32]).unwrap();

        let mut sink = Vec::new();
        let nw = b.write_to(&mut sink).unwrap();
        assert_eq!(nw, 32);
        assert_eq!(sink, vec![42u8; 32]);
        assert!(b.is_empty());
    }
}
