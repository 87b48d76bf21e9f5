//! Sealing and opening of individual segments.

mod ctr_hmac;
mod gcm;

use {
    crate::{
        error::Result,
        kdf::{self, RawKey},
        params::{StreamParams, HMAC_KEY_SIZE, NONCE_PREFIX_SIZE, NONCE_SIZE},
    },
    byteorder::{BigEndian, ByteOrder},
    ctr_hmac::CtrHmacSegment,
    gcm::GcmSegment,
};

const CTR_IDX: usize = NONCE_PREFIX_SIZE;
const LAST_IDX: usize = NONCE_SIZE - 1;

/// The nonce of one segment.
///
/// It is a function of the stream's nonce prefix, the segment's
/// index and whether it is the last segment, so it is never
/// random and never repeats within a stream.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) struct SegmentNonce([u8; NONCE_SIZE]);

impl SegmentNonce {
    pub fn new(
        prefix: &[u8; NONCE_PREFIX_SIZE],
        index: u32,
        last: bool,
    ) -> Self {
        let mut nonce = [0u8; NONCE_SIZE];
        nonce[..CTR_IDX].copy_from_slice(prefix);
        BigEndian::write_u32(&mut nonce[CTR_IDX..LAST_IDX], index);
        nonce[LAST_IDX] = last as u8;
        Self(nonce)
    }

    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.0
    }
}

/// Encrypts and authenticates segments with a stream's derived
/// key.
pub(crate) enum SegmentCipher {
    Gcm(GcmSegment),
    CtrHmac(CtrHmacSegment),
}

impl SegmentCipher {
    /// Derives the stream key for `salt` and `ad` and builds the
    /// matching segment cipher.
    pub fn derive(
        params: &StreamParams,
        key: &RawKey,
        salt: &[u8],
        ad: &[u8],
    ) -> Result<Self> {
        match params {
            StreamParams::AesGcmHkdf(p) => {
                let derived = kdf::derive(
                    key.as_bytes(),
                    salt,
                    kdf::AES_GCM_HKDF_INFO,
                    ad,
                    p.hkdf_hash,
                    p.derived_key_size,
                )?;
                Ok(SegmentCipher::Gcm(GcmSegment::new(&derived)?))
            }
            StreamParams::AesCtrHmac(p) => {
                let derived = kdf::derive(
                    key.as_bytes(),
                    salt,
                    kdf::AES_CTR_HMAC_INFO,
                    ad,
                    p.hkdf_hash,
                    p.derived_key_size + HMAC_KEY_SIZE,
                )?;
                let (aes_key, hmac_key) =
                    derived.split_at(p.derived_key_size);
                Ok(SegmentCipher::CtrHmac(CtrHmacSegment::new(
                    aes_key,
                    hmac_key,
                    p.mac_hash,
                    p.tag_size,
                )?))
            }
        }
    }

    /// Size in bytes of the tag appended to each segment.
    pub fn tag_size(&self) -> usize {
        match self {
            SegmentCipher::Gcm(c) => c.tag_size(),
            SegmentCipher::CtrHmac(c) => c.tag_size(),
        }
    }

    /// Encrypts `buf` in place and writes its tag to `tag`.
    pub fn seal(
        &self,
        nonce: &SegmentNonce,
        ad: &[u8],
        buf: &mut [u8],
        tag: &mut [u8],
    ) -> Result<()> {
        match self {
            SegmentCipher::Gcm(c) => c.seal(nonce, ad, buf, tag),
            SegmentCipher::CtrHmac(c) => c.seal(nonce, buf, tag),
        }
    }

    /// Verifies `tag` and decrypts `buf` in place.
    ///
    /// `buf` is left untouched if verification fails.
    pub fn open(
        &self,
        nonce: &SegmentNonce,
        ad: &[u8],
        buf: &mut [u8],
        tag: &[u8],
    ) -> Result<()> {
        match self {
            SegmentCipher::Gcm(c) => c.open(nonce, ad, buf, tag),
            SegmentCipher::CtrHmac(c) => c.open(nonce, buf, tag),
        }
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            error::Error,
            hash::HashType,
            params::{AesCtrHmacParams, AesGcmHkdfParams},
        },
        alloc::vec::Vec,
    };

    const PREFIX: [u8; NONCE_PREFIX_SIZE] = [1, 2, 3, 4, 5, 6, 7];

    fn ciphers() -> Vec<SegmentCipher> {
        let key = RawKey::new(&[0x42u8; 32]);
        let salt = [9u8; 32];
        [
            StreamParams::from(AesGcmHkdfParams::new(
                32,
                HashType::Sha256,
                16,
                4096,
            )),
            AesGcmHkdfParams::new(32, HashType::Sha512, 32, 4096).into(),
            AesCtrHmacParams::new(
                32,
                HashType::Sha256,
                16,
                HashType::Sha256,
                32,
                4096,
            )
            .into(),
            AesCtrHmacParams::new(
                32,
                HashType::Sha1,
                32,
                HashType::Sha512,
                16,
                4096,
            )
            .into(),
        ]
        .iter()
        .map(|p| {
            SegmentCipher::derive(p, &key, &salt[..p.derived_key_size()], b"ad")
                .unwrap()
        })
        .collect()
    }

    #[test]
    fn test_nonce_layout() {
        let n = SegmentNonce::new(&PREFIX, 0x01020304, true);
        assert_eq!(
            n.as_bytes(),
            &[1, 2, 3, 4, 5, 6, 7, 0x01, 0x02, 0x03, 0x04, 0x01]
        );
        let n = SegmentNonce::new(&PREFIX, 0, false);
        assert_eq!(&n.as_bytes()[NONCE_PREFIX_SIZE..], &[0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_seal_open() {
        for c in ciphers() {
            let nonce = SegmentNonce::new(&PREFIX, 3, false);
            let plaintext = b"segment plaintext".to_vec();
            let mut buf = plaintext.clone();
            let mut tag = alloc::vec![0u8; c.tag_size()];
            c.seal(&nonce, b"ad", &mut buf, &mut tag).unwrap();
            assert_ne!(buf, plaintext);

            c.open(&nonce, b"ad", &mut buf, &tag).unwrap();
            assert_eq!(buf, plaintext);
        }
    }

    #[test]
    fn test_open_rejects_wrong_nonce_and_tag() {
        for c in ciphers() {
            let nonce = SegmentNonce::new(&PREFIX, 3, false);
            let mut buf = b"segment plaintext".to_vec();
            let mut tag = alloc::vec![0u8; c.tag_size()];
            c.seal(&nonce, b"ad", &mut buf, &mut tag).unwrap();
            let sealed = buf.clone();

            for wrong in [
                SegmentNonce::new(&PREFIX, 3, true),
                SegmentNonce::new(&PREFIX, 4, false),
                SegmentNonce::new(&[0u8; NONCE_PREFIX_SIZE], 3, false),
            ] {
                let err = c.open(&wrong, b"ad", &mut buf, &tag).unwrap_err();
                assert!(matches!(err, Error::Authentication));
                assert_eq!(buf, sealed);
            }

            let mut bad = tag.clone();
            bad[0] ^= 1;
            assert!(matches!(
                c.open(&nonce, b"ad", &mut buf, &bad),
                Err(Error::Authentication)
            ));
            buf[0] ^= 0x80;
            assert!(matches!(
                c.open(&nonce, b"ad", &mut buf, &tag),
                Err(Error::Authentication)
            ));
        }
    }

    #[test]
    fn test_empty_segment() {
        for c in ciphers() {
            let nonce = SegmentNonce::new(&PREFIX, 0, true);
            let mut tag = alloc::vec![0u8; c.tag_size()];
            c.seal(&nonce, b"ad", &mut [], &mut tag).unwrap();
            c.open(&nonce, b"ad", &mut [], &tag).unwrap();
        }
    }
}
