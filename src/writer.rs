use {
    crate::{
        buf::Buf,
        error::{Error, Result},
        header::Header,
        io::Write,
        kdf::RawKey,
        params::{StreamParams, NONCE_PREFIX_SIZE},
        segment::{SegmentCipher, SegmentNonce},
    },
    alloc::vec::Vec,
    rand_core::{CryptoRng, RngCore},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum State {
    Open,
    Closed,
    /// A segment could not be sealed or written; the sink holds
    /// a partial segment.
    Failed,
}

/// Encrypts a stream.
///
/// Plaintext is buffered and sealed one segment at a time. The
/// stream must be finished with [`EncryptingStream::close`],
/// which writes the final segment; without it the ciphertext is
/// rejected as truncated.
pub struct EncryptingStream<W: Write> {
    /// The underlying ciphertext stream.
    sink: W,
    /// Seals individual segments.
    cipher: SegmentCipher,
    /// Random per-stream nonce prefix.
    nonce_prefix: [u8; NONCE_PREFIX_SIZE],
    /// Index of the segment being buffered.
    segment: u32,
    /// Plaintext of the current segment, plus room for its tag.
    buf: Buf,
    /// Additional authenticated data.
    associated_data: Vec<u8>,
    params: StreamParams,
    state: State,
}

impl<W: Write> EncryptingStream<W> {
    /// Creates an [`EncryptingStream`] and writes the header to
    /// `sink`.
    pub(crate) fn new<R: RngCore + CryptoRng + ?Sized>(
        mut sink: W,
        rng: &mut R,
        key: &RawKey,
        params: StreamParams,
        associated_data: &[u8],
    ) -> Result<Self> {
        let header = Header::generate(rng, params.derived_key_size())?;
        let cipher =
            SegmentCipher::derive(&params, key, header.salt(), associated_data)?;
        header.write_to(&mut sink)?;

        let tag_size = cipher.tag_size();
        let mut buf = Buf::new(params.plaintext_segment_size() + tag_size);
        buf.set_limit(params.segment_plaintext_size(0));

        tracing::debug!(
            segment_size = params.ciphertext_segment_size(),
            tag_size,
            "opened encrypting stream"
        );

        Ok(EncryptingStream {
            sink,
            cipher,
            nonce_prefix: *header.nonce_prefix(),
            segment: 0,
            buf,
            associated_data: associated_data.to_vec(),
            params,
            state: State::Open,
        })
    }

    /// Returns a reference to the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Returns a mutable reference to the underlying sink.
    ///
    /// Writing to it directly corrupts the ciphertext.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Reports whether the stream has been closed.
    pub fn is_closed(&self) -> bool {
        self.state != State::Open
    }

    fn seal_segment(&mut self, last: bool) -> Result<()> {
        let nonce = SegmentNonce::new(&self.nonce_prefix, self.segment, last);
        let n = self.buf.len();
        let tag_size = self.cipher.tag_size();
        let (plaintext, tag) = self.buf.extend(tag_size).split_at_mut(n);
        self.cipher
            .seal(&nonce, &self.associated_data, plaintext, tag)?;
        self.buf.write_to(&mut self.sink)?;

        tracing::trace!(segment = self.segment, len = n, last, "sealed segment");

        if !last {
            self.segment =
                self.segment.checked_add(1).ok_or(Error::CounterOverflow)?;
            self.buf
                .set_limit(self.params.segment_plaintext_size(self.segment));
        }
        Ok(())
    }

    fn check_open(&self) -> Result<()> {
        match self.state {
            State::Open => Ok(()),
            State::Closed | State::Failed => Err(Error::StreamClosed),
        }
    }

    fn do_write(&mut self, buf: &[u8]) -> Result<usize> {
        self.check_open()?;
        let mut n = 0;
        while n < buf.len() {
            n += self.buf.write(&buf[n..])?;
            // Seal as soon as the segment is full so that the
            // final segment is never full.
            if self.buf.is_full() {
                if let Err(err) = self.seal_segment(false) {
                    self.state = State::Failed;
                    return Err(err);
                }
            }
        }
        Ok(n)
    }

    fn do_flush(&mut self) -> Result<()> {
        self.check_open()?;
        self.sink.flush()
    }

    /// Seals the buffered plaintext as the final segment and
    /// flushes the sink.
    ///
    /// The final segment is written even if it is empty. Closing
    /// a closed stream does nothing; writes after closing fail
    /// with [`Error::StreamClosed`].
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            State::Closed => return Ok(()),
            State::Failed => return Err(Error::StreamClosed),
            State::Open => {}
        }
        let res = self.seal_segment(true).and_then(|_| self.sink.flush());
        self.state = match res {
            Ok(()) => State::Closed,
            Err(_) => State::Failed,
        };
        tracing::debug!(
            segments = u64::from(self.segment) + 1,
            "closed encrypting stream"
        );
        res
    }
}

impl<W: Write> Drop for EncryptingStream<W> {
    fn drop(&mut self) {
        if self.state == State::Open {
            tracing::warn!(
                segment = self.segment,
                "encrypting stream dropped without close; ciphertext is incomplete"
            );
        }
    }
}

#[cfg(not(feature = "std"))]
#[cfg_attr(docsrs, doc(cfg(not(feature = "std"))))]
impl<W: Write> Write for EncryptingStream<W> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        self.do_write(buf)
    }

    fn flush(&mut self) -> Result<()> {
        self.do_flush()
    }
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl<W: Write> std::io::Write for EncryptingStream<W> {
    #[inline]
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        crate::error::map_res(self.do_write(buf))
    }

    /// Flushes the sink. Does not finish the stream; see
    /// [`EncryptingStream::close`].
    fn flush(&mut self) -> std::io::Result<()> {
        crate::error::map_res(self.do_flush())
    }
}
