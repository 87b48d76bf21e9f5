use {
    alloc::boxed::Box,
    core::{convert::From, error, fmt, result},
};

/// Result is a specialized [`result::Result`] for this module.
pub type Result<T> = result::Result<T, Error>;

#[cfg(feature = "std")]
pub(crate) fn map_res<T>(res: Result<T>) -> std::io::Result<T> {
    res.map_err(|err| match err {
        // Keep the original I/O error intact.
        Error::Other(OtherError { inner }) => {
            match inner.downcast::<std::io::Error>() {
                Ok(err) => *err,
                Err(inner) => {
                    std::io::Error::new(std::io::ErrorKind::Other, inner)
                }
            }
        }
        err => std::io::Error::new(err.io_kind(), err),
    })
}

/// An arbitrary error.
#[derive(Debug)]
pub struct OtherError {
    inner: Box<dyn error::Error + Send + Sync>,
}

impl OtherError {
    /// Allocate an [`OtherError`].
    pub fn new<E>(err: E) -> Self
    where
        E: Into<Box<dyn error::Error + Send + Sync>>,
    {
        Self { inner: err.into() }
    }
}

impl fmt::Display for OtherError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl error::Error for OtherError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.inner.source()
    }
}

/// Error is the error type returned by this module.
#[derive(Debug)]
pub enum Error {
    /// The key or the stream parameters are unusable.
    ///
    /// Returned when constructing a
    /// [`StreamingAead`][crate::StreamingAead], never while
    /// streaming.
    InvalidKeyParams(&'static str),
    /// The ciphertext is malformed: a bad or short header, a
    /// truncated segment, a missing final segment or data after
    /// the final segment.
    InvalidCiphertext(&'static str),
    /// A segment could not be authenticated.
    ///
    /// Deliberately does not say why: a wrong key, wrong
    /// associated data and a modified ciphertext all look the
    /// same.
    Authentication,
    /// The stream was already closed.
    StreamClosed,
    /// The plaintext could not be encrypted.
    Encryption(aead::Error),
    /// The CSPRNG failed.
    Rand(rand_core::Error),
    /// Too many segments were written and the counter
    /// overflowed.
    CounterOverflow,
    /// The entire buffer could not be written.
    ///
    /// It contains the number of bytes written.
    ShortWrite(usize),
    /// Unexpected EOF while reading.
    ///
    /// It contains the number of bytes read.
    UnexpectedEof(usize),
    /// Some other error occurred.
    Other(OtherError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidKeyParams(msg) => {
                write!(f, "invalid key parameters: {}", msg)
            }
            Error::InvalidCiphertext(msg) => {
                write!(f, "invalid ciphertext: {}", msg)
            }
            Error::Authentication => write!(f, "authentication error"),
            Error::StreamClosed => write!(f, "stream closed"),
            Error::Encryption(err) => write!(f, "encryption error: {}", err),
            Error::CounterOverflow => write!(f, "counter overflow"),
            Error::Rand(err) => write!(f, "CSPRNG failure: {}", err),
            Error::ShortWrite(n) => write!(f, "short write of {} bytes", n),
            Error::UnexpectedEof(n) => {
                write!(f, "unexpected EOF after {} bytes", n)
            }
            Error::Other(err) => write!(f, "{}", err),
        }
    }
}

impl Error {
    /// Returns the [`std::io::ErrorKind`] the error surfaces as
    /// through `std::io`.
    #[cfg(feature = "std")]
    #[cfg_attr(docsrs, doc(cfg(feature = "std")))]
    pub fn io_kind(&self) -> std::io::ErrorKind {
        use std::io::ErrorKind;

        match self {
            Error::UnexpectedEof(_) => ErrorKind::UnexpectedEof,
            Error::ShortWrite(_) => ErrorKind::WriteZero,
            Error::InvalidCiphertext(_) | Error::Authentication => {
                ErrorKind::InvalidData
            }
            Error::InvalidKeyParams(_) => ErrorKind::InvalidInput,
            Error::StreamClosed => ErrorKind::BrokenPipe,
            Error::Other(OtherError { inner }) => inner
                .downcast_ref::<std::io::Error>()
                .map_or(ErrorKind::Other, std::io::Error::kind),
            _ => ErrorKind::Other,
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Other(err) => Some(err),
            _ => None,
        }
    }
}

impl From<hkdf::InvalidLength> for Error {
    fn from(_: hkdf::InvalidLength) -> Self {
        Error::InvalidKeyParams("derived key too long for the HKDF hash")
    }
}

impl From<cipher::InvalidLength> for Error {
    fn from(_: cipher::InvalidLength) -> Self {
        Error::InvalidKeyParams("invalid AES key length")
    }
}

impl From<aead::Error> for Error {
    fn from(value: aead::Error) -> Self {
        Error::Encryption(value)
    }
}

impl From<rand_core::Error> for Error {
    fn from(value: rand_core::Error) -> Self {
        Error::Rand(value)
    }
}

impl From<OtherError> for Error {
    fn from(value: OtherError) -> Self {
        Error::Other(value)
    }
}

#[cfg(feature = "std")]
#[cfg_attr(docsrs, doc(cfg(feature = "std")))]
impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        // Errors from our own streams travel through
        // `std::io::Error`; recover them as-is.
        if value.get_ref().is_some_and(|err| err.is::<Error>()) {
            if let Some(inner) = value.into_inner() {
                if let Ok(err) = inner.downcast::<Error>() {
                    return *err;
                }
            }
            return Error::Other(OtherError::new("unrecoverable I/O error"));
        }
        match value.kind() {
            std::io::ErrorKind::UnexpectedEof => Error::UnexpectedEof(0),
            std::io::ErrorKind::WriteZero => Error::ShortWrite(0),
            _ => Error::Other(OtherError::new(value)),
        }
    }
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::*;

    #[test]
    fn test_io_round_trip_keeps_variant() {
        let err = map_res::<()>(Err(Error::Authentication)).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
        assert!(matches!(Error::from(err), Error::Authentication));

        let err = map_res::<()>(Err(Error::InvalidCiphertext("short")))
            .unwrap_err();
        assert!(matches!(Error::from(err), Error::InvalidCiphertext("short")));
    }

    #[test]
    fn test_foreign_io_error_passes_through() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "nope");
        let err = Error::from(io);
        assert!(matches!(err, Error::Other(_)));
        assert_eq!(err.io_kind(), std::io::ErrorKind::PermissionDenied);

        let io = map_res::<()>(Err(err)).unwrap_err();
        assert_eq!(io.kind(), std::io::ErrorKind::PermissionDenied);
    }
}
