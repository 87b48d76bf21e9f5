use {
    crate::{
        error::Result,
        io::{Read, Write},
        kdf::RawKey,
        params::StreamParams,
        reader::DecryptingStream,
        writer::EncryptingStream,
    },
    alloc::{sync::Arc, vec},
    core::fmt,
    rand_core::{CryptoRng, RngCore},
    zeroize::Zeroize,
};

/// A streaming AEAD primitive: a key bound to its stream
/// parameters.
///
/// The primitive is immutable. Every stream it opens derives its
/// own key from a fresh salt, so any number of streams may be
/// opened concurrently, from any thread.
#[derive(Clone)]
pub struct StreamingAead {
    key: Arc<RawKey>,
    params: StreamParams,
}

impl fmt::Debug for StreamingAead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingAead")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl StreamingAead {
    /// Creates a primitive from a raw key.
    ///
    /// Fails with [`Error::InvalidKeyParams`][crate::Error::InvalidKeyParams]
    /// if the parameters are below the scheme's minimums or the
    /// key does not have `key_size` bytes.
    pub fn new(key: &[u8], params: impl Into<StreamParams>) -> Result<Self> {
        let params = params.into();
        params.validate_key(key)?;
        Ok(Self {
            key: Arc::new(RawKey::new(key)),
            params,
        })
    }

    /// Creates a primitive with a fresh random key.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(
        params: impl Into<StreamParams>,
        rng: &mut R,
    ) -> Result<Self> {
        let params = params.into();
        params.validate()?;
        let mut key = vec![0u8; params.key_size()];
        let res = rng
            .try_fill_bytes(&mut key)
            .map_err(Into::into)
            .and_then(|_| Self::new(&key, params));
        key.zeroize();
        res
    }

    /// Returns the primitive's parameters.
    pub fn params(&self) -> &StreamParams {
        &self.params
    }

    /// Returns the number of bytes an encrypting stream writes
    /// for `plaintext_len` bytes of plaintext, or `None` if that
    /// overflows a `u64`.
    pub fn ciphertext_size(&self, plaintext_len: u64) -> Option<u64> {
        self.params.ciphertext_size(plaintext_len)
    }

    /// Opens a stream that encrypts to `sink`, using the OS
    /// random number generator for the header.
    ///
    /// The header is written immediately. The stream must be
    /// finished with [`EncryptingStream::close`].
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn new_encrypting_stream<W: Write>(
        &self,
        sink: W,
        associated_data: &[u8],
    ) -> Result<EncryptingStream<W>> {
        self.new_encrypting_stream_with_rng(
            sink,
            associated_data,
            &mut rand_core::OsRng,
        )
    }

    /// Opens a stream that encrypts to `sink`, drawing the salt
    /// and nonce prefix from `rng`.
    pub fn new_encrypting_stream_with_rng<W, R>(
        &self,
        sink: W,
        associated_data: &[u8],
        rng: &mut R,
    ) -> Result<EncryptingStream<W>>
    where
        W: Write,
        R: RngCore + CryptoRng + ?Sized,
    {
        EncryptingStream::new(sink, rng, &self.key, self.params, associated_data)
    }

    /// Opens a stream that decrypts from `source`.
    ///
    /// Nothing is read until the first read from the returned
    /// stream.
    pub fn new_decrypting_stream<R: Read>(
        &self,
        source: R,
        associated_data: &[u8],
    ) -> DecryptingStream<R> {
        DecryptingStream::new(
            source,
            Arc::clone(&self.key),
            self.params,
            associated_data,
        )
    }
}
