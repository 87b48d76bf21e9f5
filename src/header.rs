use {
    crate::{
        error::{Error, Result},
        io::{read_full, Read, Write},
        params::NONCE_PREFIX_SIZE,
    },
    alloc::{vec, vec::Vec},
    rand_core::{CryptoRng, RngCore},
};

/// The preamble written once in front of the first segment:
///
/// ```text
///    len salt nonce_prefix
///     1    S       7        bytes
/// ```
///
/// `S` is the derived key size and `len` is the size of the
/// whole header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) struct Header {
    salt: Vec<u8>,
    nonce_prefix: [u8; NONCE_PREFIX_SIZE],
}

impl Header {
    /// Returns the size of a header with a `salt_size` salt.
    pub const fn size(salt_size: usize) -> usize {
        1 + salt_size + NONCE_PREFIX_SIZE
    }

    /// Draws a fresh salt, then a fresh nonce prefix, from
    /// `rng`.
    pub fn generate<R: RngCore + CryptoRng + ?Sized>(
        rng: &mut R,
        salt_size: usize,
    ) -> Result<Self> {
        let mut salt = vec![0u8; salt_size];
        rng.try_fill_bytes(&mut salt)?;
        let mut nonce_prefix = [0u8; NONCE_PREFIX_SIZE];
        rng.try_fill_bytes(&mut nonce_prefix)?;
        Ok(Self { salt, nonce_prefix })
    }

    pub fn salt(&self) -> &[u8] {
        &self.salt
    }

    pub fn nonce_prefix(&self) -> &[u8; NONCE_PREFIX_SIZE] {
        &self.nonce_prefix
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let len = Self::size(self.salt.len());
        let mut b = Vec::with_capacity(len);
        // The largest salt is 32 bytes, so this never truncates.
        b.push(len as u8);
        b.extend_from_slice(&self.salt);
        b.extend_from_slice(&self.nonce_prefix);
        b
    }

    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> Result<()> {
        w.write_all(&self.to_bytes())
    }

    /// Reads a header with a `salt_size` salt from `r`.
    pub fn read_from<R: Read + ?Sized>(
        r: &mut R,
        salt_size: usize,
    ) -> Result<Self> {
        let want = Self::size(salt_size);
        let mut len = [0u8; 1];
        if read_full(r, &mut len)? == 0 {
            return Err(Error::InvalidCiphertext("missing header"));
        }
        if len[0] as usize != want {
            return Err(Error::InvalidCiphertext("invalid header length"));
        }
        let mut rest = vec![0u8; want - 1];
        if read_full(r, &mut rest)? != rest.len() {
            return Err(Error::InvalidCiphertext("truncated header"));
        }
        let (salt, prefix) = rest.split_at(salt_size);
        let mut nonce_prefix = [0u8; NONCE_PREFIX_SIZE];
        nonce_prefix.copy_from_slice(prefix);
        Ok(Self {
            salt: salt.to_vec(),
            nonce_prefix,
        })
    }
}

#[cfg(test)]
mod tests {
    use {super::*, rand_core::OsRng};

    #[test]
    fn test_header_layout() {
        let hdr = Header::generate(&mut OsRng, 16).unwrap();
        let b = hdr.to_bytes();
        assert_eq!(b.len(), 24);
        assert_eq!(b[0], 24);
        assert_eq!(&b[1..17], hdr.salt());
        assert_eq!(&b[17..], hdr.nonce_prefix());

        let got = Header::read_from(&mut &b[..], 16).unwrap();
        assert_eq!(got, hdr);
    }

    #[test]
    fn test_header_fresh_per_stream() {
        let a = Header::generate(&mut OsRng, 32).unwrap();
        let b = Header::generate(&mut OsRng, 32).unwrap();
        assert_ne!(a.salt(), b.salt());
    }

    #[test]
    fn test_header_errors() {
        let hdr = Header::generate(&mut OsRng, 32).unwrap().to_bytes();

        let empty: &[u8] = &[];
        assert!(matches!(
            Header::read_from(&mut &empty[..], 32),
            Err(Error::InvalidCiphertext("missing header"))
        ));
        // Configured for a 16-byte salt.
        assert!(matches!(
            Header::read_from(&mut &hdr[..], 16),
            Err(Error::InvalidCiphertext("invalid header length"))
        ));
        for n in 1..hdr.len() {
            assert!(matches!(
                Header::read_from(&mut &hdr[..n], 32),
                Err(Error::InvalidCiphertext("truncated header"))
            ));
        }
    }
}
