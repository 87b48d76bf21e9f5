//! Per-stream key derivation.

use {
    crate::{
        error::{Error, Result},
        hash::HashType,
    },
    alloc::vec::Vec,
    core::fmt,
    hkdf::Hkdf,
    sha1::Sha1,
    sha2::{Sha256, Sha384, Sha512},
    zeroize::{Zeroize, Zeroizing},
};

/// HKDF info label for AES-GCM-HKDF stream keys.
pub const AES_GCM_HKDF_INFO: &[u8] = b"streaming-aead aes-gcm-hkdf";

/// HKDF info label for AES-CTR-HMAC stream keys.
pub const AES_CTR_HMAC_INFO: &[u8] = b"streaming-aead aes-ctr-hmac";

/// The raw key a primitive was constructed with.
pub(crate) struct RawKey(Vec<u8>);

impl RawKey {
    pub fn new(key: &[u8]) -> Self {
        Self(key.to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl Drop for RawKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl fmt::Debug for RawKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawKey(<{} bytes>)", self.0.len())
    }
}

/// Key material derived for exactly one stream.
pub(crate) type DerivedKey = Zeroizing<Vec<u8>>;

/// Derives `out_len` bytes of stream key material.
///
/// HKDF-Extract uses `salt` as the salt and `ikm` as the input
/// keying material; HKDF-Expand uses `label || ad` as its info.
pub(crate) fn derive(
    ikm: &[u8],
    salt: &[u8],
    label: &[u8],
    ad: &[u8],
    hash: HashType,
    out_len: usize,
) -> Result<DerivedKey> {
    let mut key = Zeroizing::new(alloc::vec![0u8; out_len]);
    let info = [label, ad];
    match hash {
        HashType::Sha1 => {
            Hkdf::<Sha1>::new(Some(salt), ikm).expand_multi_info(&info, &mut key)
        }
        HashType::Sha256 => Hkdf::<Sha256>::new(Some(salt), ikm)
            .expand_multi_info(&info, &mut key),
        HashType::Sha384 => Hkdf::<Sha384>::new(Some(salt), ikm)
            .expand_multi_info(&info, &mut key),
        HashType::Sha512 => Hkdf::<Sha512>::new(Some(salt), ikm)
            .expand_multi_info(&info, &mut key),
    }
    .map_err(Error::from)?;
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    // RFC 5869, test case 1.
    #[test]
    fn test_rfc5869_sha256() {
        let ikm = [0x0bu8; 22];
        let salt: Vec<u8> = (0x00u8..=0x0c).collect();
        let info: Vec<u8> = (0xf0u8..=0xf9).collect();
        let okm = derive(&ikm, &salt, &info[..4], &info[4..], HashType::Sha256, 42)
            .unwrap();
        let want = [
            0x3c, 0xb2, 0x5f, 0x25, 0xfa, 0xac, 0xd5, 0x7a, 0x90, 0x43, 0x4f,
            0x64, 0xd0, 0x36, 0x2f, 0x2a, 0x2d, 0x2d, 0x0a, 0x90, 0xcf, 0x1a,
            0x5a, 0x4c, 0x5d, 0xb0, 0x2d, 0x56, 0xec, 0xc4, 0xc5, 0xbf, 0x34,
            0x00, 0x72, 0x08, 0xd5, 0xb8, 0x87, 0x18, 0x58, 0x65,
        ];
        assert_eq!(&okm[..], &want[..]);
    }

    #[test]
    fn test_derive_binds_inputs() {
        let ikm = [7u8; 16];
        let salt = [1u8; 16];
        let base =
            derive(&ikm, &salt, AES_GCM_HKDF_INFO, b"ad", HashType::Sha256, 16)
                .unwrap();
        let again =
            derive(&ikm, &salt, AES_GCM_HKDF_INFO, b"ad", HashType::Sha256, 16)
                .unwrap();
        assert_eq!(base, again);

        for other in [
            derive(&ikm, &[2u8; 16], AES_GCM_HKDF_INFO, b"ad", HashType::Sha256, 16),
            derive(&ikm, &salt, AES_CTR_HMAC_INFO, b"ad", HashType::Sha256, 16),
            derive(&ikm, &salt, AES_GCM_HKDF_INFO, b"ae", HashType::Sha256, 16),
            derive(&ikm, &salt, AES_GCM_HKDF_INFO, b"ad", HashType::Sha512, 16),
            derive(&[8u8; 16], &salt, AES_GCM_HKDF_INFO, b"ad", HashType::Sha256, 16),
        ] {
            assert_ne!(base, other.unwrap());
        }
    }

    #[test]
    fn test_derive_too_long() {
        // HKDF-SHA1 output is capped at 255 * 20 bytes.
        let err = derive(&[0u8; 16], &[0u8; 16], b"", b"", HashType::Sha1, 255 * 20 + 1)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidKeyParams(_)));
    }

    #[test]
    fn test_raw_key_debug_hides_bytes() {
        let key = RawKey::new(&[0xAAu8; 16]);
        assert_eq!(alloc::format!("{:?}", key), "RawKey(<16 bytes>)");
    }
}
