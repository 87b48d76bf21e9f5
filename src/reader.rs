use {
    crate::{
        buf::Buf,
        error::{Error, OtherError, Result},
        header::Header,
        io::{Read, Write},
        kdf::RawKey,
        params::{StreamParams, NONCE_PREFIX_SIZE},
        segment::{SegmentCipher, SegmentNonce},
    },
    alloc::{sync::Arc, vec::Vec},
};

const ABORTED: &str = "decrypting stream aborted after an I/O error";

/// The kind of the I/O error that aborted a stream.
#[cfg(feature = "std")]
type AbortKind = std::io::ErrorKind;
#[cfg(not(feature = "std"))]
type AbortKind = ();

/// Why a stream stopped for good.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Fault {
    Authentication,
    InvalidCiphertext(&'static str),
    /// The source failed; the segment in flight is lost.
    Aborted(AbortKind),
}

impl From<&Error> for Fault {
    fn from(err: &Error) -> Self {
        match err {
            Error::Authentication => Fault::Authentication,
            Error::InvalidCiphertext(msg) => Fault::InvalidCiphertext(*msg),
            #[cfg(feature = "std")]
            err => Fault::Aborted(err.io_kind()),
            #[cfg(not(feature = "std"))]
            _ => Fault::Aborted(()),
        }
    }
}

impl From<Fault> for Error {
    fn from(f: Fault) -> Self {
        match f {
            Fault::Authentication => Error::Authentication,
            Fault::InvalidCiphertext(msg) => Error::InvalidCiphertext(msg),
            #[cfg(feature = "std")]
            Fault::Aborted(kind) => {
                Error::Other(OtherError::new(std::io::Error::new(kind, ABORTED)))
            }
            #[cfg(not(feature = "std"))]
            Fault::Aborted(()) => Error::Other(OtherError::new(ABORTED)),
        }
    }
}

enum State {
    /// Nothing has been read yet.
    HeaderPending,
    /// Segments are being decrypted.
    Reading {
        cipher: SegmentCipher,
        nonce_prefix: [u8; NONCE_PREFIX_SIZE],
    },
    /// The last segment was verified; only buffered plaintext
    /// remains.
    Exhausted,
    Failed(Fault),
}

/// Decrypts a stream.
///
/// The header is parsed by the first read. Plaintext is only
/// returned from segments that have been fully verified; the
/// first failure ends the stream and every later read reports
/// it again.
///
/// A segment is recognized as the last one by reading a single
/// byte past it: if the source has nothing more to give, the
/// segment must authenticate as the last segment.
pub struct DecryptingStream<R: Read> {
    /// The underlying ciphertext stream.
    source: R,
    key: Arc<RawKey>,
    params: StreamParams,
    /// Additional authenticated data.
    associated_data: Vec<u8>,
    state: State,
    /// Index of the next segment to decrypt.
    segment: u32,
    /// Ciphertext of the current segment plus one look-ahead
    /// byte, then its plaintext once verified.
    buf: Buf,
    /// The look-ahead byte, carried into the next segment.
    carry: Option<u8>,
}

impl<R: Read> DecryptingStream<R> {
    pub(crate) fn new(
        source: R,
        key: Arc<RawKey>,
        params: StreamParams,
        associated_data: &[u8],
    ) -> Self {
        DecryptingStream {
            source,
            key,
            params,
            associated_data: associated_data.to_vec(),
            state: State::HeaderPending,
            segment: 0,
            buf: Buf::new(params.ciphertext_segment_size() + 1),
            carry: None,
        }
    }

    /// Returns a reference to the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Reports whether the last segment has been verified and
    /// all of its plaintext returned.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, State::Exhausted) && self.buf.is_empty()
    }

    fn read_header(&mut self) -> Result<()> {
        let header =
            Header::read_from(&mut self.source, self.params.derived_key_size())?;
        let cipher = SegmentCipher::derive(
            &self.params,
            &self.key,
            header.salt(),
            &self.associated_data,
        )?;
        tracing::debug!(
            segment_size = self.params.ciphertext_segment_size(),
            "opened decrypting stream"
        );
        self.state = State::Reading {
            cipher,
            nonce_prefix: *header.nonce_prefix(),
        };
        Ok(())
    }

    /// Reads, verifies and decrypts the next segment into `buf`.
    fn next_segment(&mut self) -> Result<()> {
        let State::Reading {
            cipher,
            nonce_prefix,
        } = &self.state
        else {
            return Ok(());
        };

        let want = self.params.segment_ciphertext_size(self.segment);
        self.buf.reset();
        if let Some(b) = self.carry.take() {
            self.buf.write(&[b])?;
        }
        self.buf.read_from(&mut self.source, want + 1)?;

        let n = self.buf.len();
        let last = n <= want;
        if !last {
            self.carry = Some(self.buf.remaining_slice()[want]);
            self.buf.truncate(want);
        }

        let tag_size = cipher.tag_size();
        if n < tag_size {
            return Err(Error::InvalidCiphertext(if n == 0 {
                "missing final segment"
            } else {
                "truncated segment"
            }));
        }
        let len = self.buf.len() - tag_size;

        let nonce = SegmentNonce::new(nonce_prefix, self.segment, last);
        let (ciphertext, tag) = self.buf.split_at_mut(len);
        if let Err(err) =
            cipher.open(&nonce, &self.associated_data, ciphertext, tag)
        {
            // Tell a misplaced end of stream apart from tampering.
            let flipped = SegmentNonce::new(nonce_prefix, self.segment, !last);
            if cipher
                .open(&flipped, &self.associated_data, ciphertext, tag)
                .is_ok()
            {
                return Err(Error::InvalidCiphertext(if last {
                    "ciphertext truncated after a segment boundary"
                } else {
                    "data after the final segment"
                }));
            }
            return Err(err);
        }
        self.buf.truncate(len);

        tracing::trace!(segment = self.segment, len, last, "opened segment");

        if last {
            self.state = State::Exhausted;
            tracing::debug!(
                segments = u64::from(self.segment) + 1,
                "decrypting stream exhausted"
            );
        } else {
            self.segment = self
                .segment
                .checked_add(1)
                .ok_or(Error::CounterOverflow)?;
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<()> {
        let res = match self.state {
            State::HeaderPending => self.read_header(),
            _ => self.next_segment(),
        };
        if let Err(err) = &res {
            let fault = Fault::from(err);
            tracing::debug!(error = %err, "decrypting stream failed");
            self.state = State::Failed(fault);
            self.buf.reset();
            self.carry = None;
        }
        res
    }

    fn do_read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            match self.state {
                State::Failed(fault) => return Err(fault.into()),
                State::HeaderPending => self.advance()?,
                _ if !self.buf.is_empty() => return self.buf.read(buf),
                State::Exhausted => return Ok(0),
                // Only the last segment can be empty, so this
                // loops at most once more.
                State::Reading { .. } => self.advance()?,
            }
        }
    }
}

#[cfg(not(feature = "std"))]
#[cfg_attr(docsrs, doc(cfg(not(feature = "std"))))]
impl<R: Read> Read for DecryptingStream<R> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.do_read(buf)
    }
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl<R: Read> std::io::Read for DecryptingStream<R> {
    #[inline]
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        crate::error::map_res(self.do_read(buf))
    }
}
