use {
    super::SegmentNonce,
    crate::{
        error::{Error, Result},
        hash::HashType,
        params::NONCE_SIZE,
    },
    aes::{Aes128, Aes256},
    alloc::vec::Vec,
    cipher::{KeyIvInit, StreamCipher},
    hmac::{digest::KeyInit, Hmac, Mac},
    sha1::Sha1,
    sha2::{Sha256, Sha384, Sha512},
    zeroize::Zeroizing,
};

type Aes128Ctr = ctr::Ctr128BE<Aes128>;
type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// A keyed HMAC, cloned for every segment.
#[derive(Clone)]
enum Prf {
    Sha1(Hmac<Sha1>),
    Sha256(Hmac<Sha256>),
    Sha384(Hmac<Sha384>),
    Sha512(Hmac<Sha512>),
}

impl Prf {
    fn new(hash: HashType, key: &[u8]) -> Result<Self> {
        Ok(match hash {
            HashType::Sha1 => Prf::Sha1(keyed(key)?),
            HashType::Sha256 => Prf::Sha256(keyed(key)?),
            HashType::Sha384 => Prf::Sha384(keyed(key)?),
            HashType::Sha512 => Prf::Sha512(keyed(key)?),
        })
    }
}

fn keyed<M: Mac + KeyInit>(key: &[u8]) -> Result<M> {
    <M as KeyInit>::new_from_slice(key)
        .map_err(|_| Error::InvalidKeyParams("invalid HMAC key length"))
}

fn sign<M: Mac + Clone>(mac: &M, nonce: &[u8], ct: &[u8], tag: &mut [u8]) {
    let mut mac = mac.clone();
    mac.update(nonce);
    mac.update(ct);
    let full = mac.finalize().into_bytes();
    tag.copy_from_slice(&full[..tag.len()]);
}

fn verify<M: Mac + Clone>(mac: &M, nonce: &[u8], ct: &[u8], tag: &[u8]) -> bool {
    let mut mac = mac.clone();
    mac.update(nonce);
    mac.update(ct);
    // Constant time.
    mac.verify_truncated_left(tag).is_ok()
}

/// AES-CTR then HMAC over a single segment.
///
/// The tag is `HMAC(nonce || ciphertext)` truncated to the
/// configured size. The CTR IV is the segment nonce followed by
/// a 32-bit big-endian block counter starting at zero.
pub(crate) struct CtrHmacSegment {
    aes_key: Zeroizing<Vec<u8>>,
    prf: Prf,
    tag_size: usize,
}

impl CtrHmacSegment {
    pub fn new(
        aes_key: &[u8],
        hmac_key: &[u8],
        mac_hash: HashType,
        tag_size: usize,
    ) -> Result<Self> {
        if !matches!(aes_key.len(), 16 | 32) {
            return Err(Error::InvalidKeyParams("invalid AES key length"));
        }
        if tag_size > mac_hash.output_size() {
            return Err(Error::InvalidKeyParams(
                "tag_size is larger than the HMAC output",
            ));
        }
        Ok(Self {
            aes_key: Zeroizing::new(aes_key.to_vec()),
            prf: Prf::new(mac_hash, hmac_key)?,
            tag_size,
        })
    }

    pub fn tag_size(&self) -> usize {
        self.tag_size
    }

    fn apply_keystream(&self, nonce: &SegmentNonce, buf: &mut [u8]) -> Result<()> {
        let mut iv = [0u8; 16];
        iv[..NONCE_SIZE].copy_from_slice(nonce.as_bytes());
        if self.aes_key.len() == 16 {
            Aes128Ctr::new_from_slices(&self.aes_key, &iv)?.apply_keystream(buf);
        } else {
            Aes256Ctr::new_from_slices(&self.aes_key, &iv)?.apply_keystream(buf);
        }
        Ok(())
    }

    fn sign(&self, nonce: &SegmentNonce, ct: &[u8], tag: &mut [u8]) {
        let nonce = nonce.as_bytes();
        match &self.prf {
            Prf::Sha1(m) => sign(m, nonce, ct, tag),
            Prf::Sha256(m) => sign(m, nonce, ct, tag),
            Prf::Sha384(m) => sign(m, nonce, ct, tag),
            Prf::Sha512(m) => sign(m, nonce, ct, tag),
        }
    }

    fn verify(&self, nonce: &SegmentNonce, ct: &[u8], tag: &[u8]) -> bool {
        let nonce = nonce.as_bytes();
        match &self.prf {
            Prf::Sha1(m) => verify(m, nonce, ct, tag),
            Prf::Sha256(m) => verify(m, nonce, ct, tag),
            Prf::Sha384(m) => verify(m, nonce, ct, tag),
            Prf::Sha512(m) => verify(m, nonce, ct, tag),
        }
    }

    pub fn seal(
        &self,
        nonce: &SegmentNonce,
        buf: &mut [u8],
        tag: &mut [u8],
    ) -> Result<()> {
        if tag.len() != self.tag_size {
            return Err(Error::InvalidKeyParams("tag buffer has the wrong size"));
        }
        self.apply_keystream(nonce, buf)?;
        self.sign(nonce, buf, tag);
        Ok(())
    }

    pub fn open(
        &self,
        nonce: &SegmentNonce,
        buf: &mut [u8],
        tag: &[u8],
    ) -> Result<()> {
        // Never decrypt unauthenticated ciphertext.
        if tag.len() != self.tag_size || !self.verify(nonce, buf, tag) {
            return Err(Error::Authentication);
        }
        self.apply_keystream(nonce, buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_is_truncated_hmac() {
        let hmac_key = [3u8; 32];
        let seg =
            CtrHmacSegment::new(&[1u8; 16], &hmac_key, HashType::Sha256, 16)
                .unwrap();
        let nonce = SegmentNonce::new(&[5u8; 7], 1, false);
        let mut buf = *b"hello";
        let mut tag = [0u8; 16];
        seg.seal(&nonce, &mut buf, &mut tag).unwrap();

        let mut mac = <Hmac<Sha256> as KeyInit>::new_from_slice(&hmac_key).unwrap();
        mac.update(nonce.as_bytes());
        mac.update(&buf);
        let full = mac.finalize().into_bytes();
        assert_eq!(&tag[..], &full[..16]);
    }

    #[test]
    fn test_keystream_matches_ctr_iv() {
        let key = [1u8; 32];
        let seg =
            CtrHmacSegment::new(&key, &[3u8; 32], HashType::Sha512, 64).unwrap();
        let nonce = SegmentNonce::new(&[5u8; 7], 9, true);
        let mut buf = [0u8; 40];
        let mut tag = [0u8; 64];
        seg.seal(&nonce, &mut buf, &mut tag).unwrap();

        let mut iv = [0u8; 16];
        iv[..NONCE_SIZE].copy_from_slice(nonce.as_bytes());
        let mut want = [0u8; 40];
        Aes256Ctr::new(&key.into(), &iv.into()).apply_keystream(&mut want);
        assert_eq!(buf, want);
    }

    #[test]
    fn test_rejects_bad_keys() {
        assert!(CtrHmacSegment::new(&[0u8; 24], &[0u8; 32], HashType::Sha256, 16)
            .is_err());
        assert!(CtrHmacSegment::new(&[0u8; 16], &[0u8; 32], HashType::Sha1, 21)
            .is_err());
    }
}
