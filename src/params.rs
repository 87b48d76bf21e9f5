use crate::{
    error::{Error, Result},
    hash::HashType,
};

/// Size in bytes of the random nonce prefix stored in the
/// header.
pub const NONCE_PREFIX_SIZE: usize = 7;

/// Size in bytes of a segment nonce:
///
/// ```text
///    prefix counter last
///       7       4     1  bytes
/// ```
pub const NONCE_SIZE: usize = NONCE_PREFIX_SIZE + 4 + 1;

/// The smallest raw key accepted by either scheme.
pub const MIN_KEY_SIZE: usize = 16;

/// The smallest HMAC tag accepted by AES-CTR-HMAC.
pub const MIN_TAG_SIZE: usize = 10;

/// The size of an AES-GCM tag.
pub const GCM_TAG_SIZE: usize = 16;

/// The size of the HMAC subkey derived for AES-CTR-HMAC.
pub const HMAC_KEY_SIZE: usize = 32;

/// Parameters for AES-GCM with HKDF-derived stream keys.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AesGcmHkdfParams {
    /// Size in bytes of the raw key.
    pub key_size: usize,
    /// Hash used by HKDF.
    pub hkdf_hash: HashType,
    /// Size in bytes of the derived AES key; 16 or 32.
    pub derived_key_size: usize,
    /// Size in bytes of every ciphertext segment but the last.
    pub ciphertext_segment_size: usize,
    /// Bytes reserved by the caller in front of the header.
    #[cfg_attr(feature = "serde", serde(default))]
    pub first_segment_offset: usize,
}

impl AesGcmHkdfParams {
    /// Creates the parameters with no first segment offset.
    pub const fn new(
        key_size: usize,
        hkdf_hash: HashType,
        derived_key_size: usize,
        ciphertext_segment_size: usize,
    ) -> Self {
        Self {
            key_size,
            hkdf_hash,
            derived_key_size,
            ciphertext_segment_size,
            first_segment_offset: 0,
        }
    }

    /// Set the number of bytes reserved in front of the header.
    ///
    /// The streams neither write nor read these bytes; they only
    /// shrink the first segment.
    pub const fn with_first_segment_offset(mut self, offset: usize) -> Self {
        self.first_segment_offset = offset;
        self
    }
}

/// Parameters for AES-CTR with HMAC and HKDF-derived stream
/// keys.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AesCtrHmacParams {
    /// Size in bytes of the raw key.
    pub key_size: usize,
    /// Hash used by HKDF.
    pub hkdf_hash: HashType,
    /// Size in bytes of the derived AES key; 16 or 32.
    pub derived_key_size: usize,
    /// Hash used by HMAC.
    pub mac_hash: HashType,
    /// Size in bytes of the truncated HMAC tag.
    pub tag_size: usize,
    /// Size in bytes of every ciphertext segment but the last.
    pub ciphertext_segment_size: usize,
    /// Bytes reserved by the caller in front of the header.
    #[cfg_attr(feature = "serde", serde(default))]
    pub first_segment_offset: usize,
}

impl AesCtrHmacParams {
    /// Creates the parameters with no first segment offset.
    pub const fn new(
        key_size: usize,
        hkdf_hash: HashType,
        derived_key_size: usize,
        mac_hash: HashType,
        tag_size: usize,
        ciphertext_segment_size: usize,
    ) -> Self {
        Self {
            key_size,
            hkdf_hash,
            derived_key_size,
            mac_hash,
            tag_size,
            ciphertext_segment_size,
            first_segment_offset: 0,
        }
    }

    /// Set the number of bytes reserved in front of the header.
    ///
    /// The streams neither write nor read these bytes; they only
    /// shrink the first segment.
    pub const fn with_first_segment_offset(mut self, offset: usize) -> Self {
        self.first_segment_offset = offset;
        self
    }
}

/// Stream parameters for one of the supported schemes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum StreamParams {
    /// AES-GCM-HKDF.
    AesGcmHkdf(AesGcmHkdfParams),
    /// AES-CTR-HMAC.
    AesCtrHmac(AesCtrHmacParams),
}

impl From<AesGcmHkdfParams> for StreamParams {
    fn from(value: AesGcmHkdfParams) -> Self {
        StreamParams::AesGcmHkdf(value)
    }
}

impl From<AesCtrHmacParams> for StreamParams {
    fn from(value: AesCtrHmacParams) -> Self {
        StreamParams::AesCtrHmac(value)
    }
}

impl StreamParams {
    /// Size in bytes of the raw key.
    pub const fn key_size(&self) -> usize {
        match self {
            StreamParams::AesGcmHkdf(p) => p.key_size,
            StreamParams::AesCtrHmac(p) => p.key_size,
        }
    }

    /// Hash used by HKDF.
    pub const fn hkdf_hash(&self) -> HashType {
        match self {
            StreamParams::AesGcmHkdf(p) => p.hkdf_hash,
            StreamParams::AesCtrHmac(p) => p.hkdf_hash,
        }
    }

    /// Size in bytes of the derived AES key, which is also the
    /// size of the salt.
    pub const fn derived_key_size(&self) -> usize {
        match self {
            StreamParams::AesGcmHkdf(p) => p.derived_key_size,
            StreamParams::AesCtrHmac(p) => p.derived_key_size,
        }
    }

    /// Size in bytes of every ciphertext segment but the last.
    pub const fn ciphertext_segment_size(&self) -> usize {
        match self {
            StreamParams::AesGcmHkdf(p) => p.ciphertext_segment_size,
            StreamParams::AesCtrHmac(p) => p.ciphertext_segment_size,
        }
    }

    /// Bytes reserved by the caller in front of the header.
    pub const fn first_segment_offset(&self) -> usize {
        match self {
            StreamParams::AesGcmHkdf(p) => p.first_segment_offset,
            StreamParams::AesCtrHmac(p) => p.first_segment_offset,
        }
    }

    /// Size in bytes of each segment's tag.
    pub const fn tag_size(&self) -> usize {
        match self {
            StreamParams::AesGcmHkdf(_) => GCM_TAG_SIZE,
            StreamParams::AesCtrHmac(p) => p.tag_size,
        }
    }

    /// Size in bytes of the header.
    pub const fn header_len(&self) -> usize {
        1 + self.derived_key_size() + NONCE_PREFIX_SIZE
    }

    /// Offset of the first segment's ciphertext from the start
    /// of the ciphertext, counting the reserved offset.
    pub const fn ciphertext_offset(&self) -> usize {
        self.header_len() + self.first_segment_offset()
    }

    /// Size in bytes of the plaintext held by every full segment
    /// but the first.
    pub const fn plaintext_segment_size(&self) -> usize {
        self.ciphertext_segment_size() - self.tag_size()
    }

    /// Size in bytes of the plaintext held by a full first
    /// segment.
    pub const fn first_plaintext_segment_size(&self) -> usize {
        self.plaintext_segment_size() - self.ciphertext_offset()
    }

    /// Size in bytes of the plaintext held by full segment
    /// `index`.
    pub(crate) const fn segment_plaintext_size(&self, index: u32) -> usize {
        if index == 0 {
            self.first_plaintext_segment_size()
        } else {
            self.plaintext_segment_size()
        }
    }

    /// Size in bytes of full ciphertext segment `index`,
    /// excluding the header.
    pub(crate) const fn segment_ciphertext_size(&self, index: u32) -> usize {
        self.segment_plaintext_size(index) + self.tag_size()
    }

    /// Returns the number of bytes an encrypting stream writes
    /// for `plaintext_len` bytes of plaintext, or `None` if that
    /// does not fit in a `u64`.
    ///
    /// The reserved first segment offset is not included. The
    /// parameters must be valid, see [`StreamParams::validate`].
    pub fn ciphertext_size(&self, plaintext_len: u64) -> Option<u64> {
        let first = self.first_plaintext_segment_size() as u64;
        let full = self.plaintext_segment_size() as u64;
        // Every full segment is sealed as soon as it fills, so
        // the last segment is never full and may be empty.
        let full_segments = match plaintext_len.checked_sub(first) {
            None => 0,
            Some(rest) => 1 + rest / full,
        };
        (full_segments + 1)
            .checked_mul(self.tag_size() as u64)?
            .checked_add(plaintext_len)?
            .checked_add(self.header_len() as u64)
    }

    /// Checks the parameters, and that `key` is usable with
    /// them.
    pub fn validate_key(&self, key: &[u8]) -> Result<()> {
        self.validate()?;
        if key.len() != self.key_size() {
            return Err(Error::InvalidKeyParams(
                "key length does not match key_size",
            ));
        }
        Ok(())
    }

    /// Checks the parameters against the minimums of the scheme.
    pub fn validate(&self) -> Result<()> {
        if self.key_size() < self.derived_key_size() {
            return Err(Error::InvalidKeyParams(
                "key_size must not be smaller than derived_key_size",
            ));
        }
        if self.key_size() < MIN_KEY_SIZE {
            return Err(Error::InvalidKeyParams(
                "key_size must not be smaller than 16 bytes",
            ));
        }
        match self.derived_key_size() {
            16 | 32 => {}
            _ => {
                return Err(Error::InvalidKeyParams(
                    "derived_key_size must be 16 or 32 bytes",
                ))
            }
        }
        if let StreamParams::AesCtrHmac(p) = self {
            if p.tag_size < MIN_TAG_SIZE {
                return Err(Error::InvalidKeyParams(
                    "tag_size must not be smaller than 10 bytes",
                ));
            }
            if p.tag_size > p.mac_hash.output_size() {
                return Err(Error::InvalidKeyParams(
                    "tag_size is larger than the HMAC output",
                ));
            }
        }
        let overhead = self
            .first_segment_offset()
            .saturating_add(self.header_len())
            .saturating_add(self.tag_size());
        if self.ciphertext_segment_size() <= overhead {
            return Err(Error::InvalidKeyParams(
                "ciphertext_segment_size is too small",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gcm(key: usize, derived: usize, segment: usize) -> StreamParams {
        AesGcmHkdfParams::new(key, HashType::Sha256, derived, segment).into()
    }

    fn ctr(
        key: usize,
        derived: usize,
        mac: HashType,
        tag: usize,
        segment: usize,
    ) -> StreamParams {
        AesCtrHmacParams::new(key, HashType::Sha256, derived, mac, tag, segment)
            .into()
    }

    #[test]
    fn test_sizes() {
        let p = ctr(16, 16, HashType::Sha256, 32, 4096);
        assert_eq!(p.header_len(), 24);
        assert_eq!(p.plaintext_segment_size(), 4064);
        assert_eq!(p.first_plaintext_segment_size(), 4040);
        assert_eq!(p.ciphertext_size(9), Some(65));
        assert_eq!(p.ciphertext_size(0), Some(24 + 32));

        let p = gcm(32, 32, 1 << 20);
        assert_eq!(p.header_len(), 40);
        assert_eq!(p.tag_size(), GCM_TAG_SIZE);
    }

    #[test]
    fn test_ciphertext_size_at_boundaries() {
        let p = gcm(16, 16, 64);
        let first = p.first_plaintext_segment_size() as u64;
        let full = p.plaintext_segment_size() as u64;
        let tag = p.tag_size() as u64;
        let hdr = p.header_len() as u64;

        assert_eq!(p.ciphertext_size(first - 1), Some(hdr + first - 1 + tag));
        // A full first segment is followed by an empty last one.
        assert_eq!(p.ciphertext_size(first), Some(hdr + first + 2 * tag));
        assert_eq!(
            p.ciphertext_size(first + 2 * full),
            Some(hdr + first + 2 * full + 4 * tag)
        );
    }

    #[test]
    fn test_ciphertext_size_overflow() {
        let p = gcm(16, 16, 64);
        assert_eq!(p.ciphertext_size(u64::MAX), None);
        assert_eq!(p.ciphertext_size(u64::MAX - 24), None);

        // One byte past a plaintext whose ciphertext fits.
        let p = gcm(16, 16, 1 << 20);
        let n = u64::MAX / 2;
        let want = p.ciphertext_size(n).unwrap();
        assert!(want > n);
        assert_eq!(p.ciphertext_size(u64::MAX - (want - n) + 1), None);
    }

    #[test]
    fn test_first_segment_offset() {
        let p: StreamParams = AesGcmHkdfParams::new(16, HashType::Sha256, 16, 64)
            .with_first_segment_offset(8)
            .into();
        assert_eq!(p.ciphertext_offset(), 24 + 8);
        assert_eq!(p.first_plaintext_segment_size(), 64 - 16 - 32);
        p.validate().unwrap();

        let p: StreamParams = AesGcmHkdfParams::new(16, HashType::Sha256, 16, 64)
            .with_first_segment_offset(24)
            .into();
        assert!(matches!(p.validate(), Err(Error::InvalidKeyParams(_))));
    }

    #[test]
    fn test_validate_key_size() {
        let err = gcm(63, 65, 55).validate().unwrap_err();
        assert!(
            matches!(err, Error::InvalidKeyParams(msg) if msg.starts_with("key_size must not be smaller than"))
        );
        let err = ctr(63, 65, HashType::Sha256, 55, 2).validate().unwrap_err();
        assert!(
            matches!(err, Error::InvalidKeyParams(msg) if msg.starts_with("key_size must not be smaller than"))
        );

        assert!(gcm(15, 15, 4096).validate().is_err());
        assert!(gcm(24, 24, 4096).validate().is_err());
        assert!(gcm(32, 16, 4096).validate().is_ok());
        assert!(gcm(32, 32, 4096).validate().is_ok());
    }

    #[test]
    fn test_validate_tag_size() {
        assert!(ctr(16, 16, HashType::Sha256, 9, 4096).validate().is_err());
        assert!(ctr(16, 16, HashType::Sha256, 10, 4096).validate().is_ok());
        assert!(ctr(16, 16, HashType::Sha1, 20, 4096).validate().is_ok());
        assert!(ctr(16, 16, HashType::Sha1, 21, 4096).validate().is_err());
        assert!(ctr(16, 16, HashType::Sha512, 64, 4096).validate().is_ok());
    }

    #[test]
    fn test_validate_segment_size() {
        // header 24 + tag 16 leaves nothing for plaintext.
        assert!(gcm(16, 16, 40).validate().is_err());
        assert!(gcm(16, 16, 41).validate().is_ok());
        // header 24 + tag 32.
        assert!(ctr(16, 16, HashType::Sha256, 32, 56).validate().is_err());
        assert!(ctr(16, 16, HashType::Sha256, 32, 57).validate().is_ok());
    }

    #[test]
    fn test_validate_key() {
        let p = gcm(16, 16, 4096);
        assert!(p.validate_key(&[0u8; 16]).is_ok());
        assert!(p.validate_key(&[0u8; 17]).is_err());
        assert!(p.validate_key(&[0u8; 15]).is_err());
    }
}
