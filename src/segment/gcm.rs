use {
    super::SegmentNonce,
    crate::error::{Error, Result},
    aead::{AeadCore, AeadInPlace, KeyInit, Nonce, Tag},
    aes_gcm::{Aes128Gcm, Aes256Gcm},
    typenum::Unsigned,
};

/// AES-GCM over a single segment.
///
/// The stream's associated data is passed to every segment as
/// GCM associated data.
pub(crate) enum GcmSegment {
    Aes128(Aes128Gcm),
    Aes256(Aes256Gcm),
}

impl GcmSegment {
    pub fn new(key: &[u8]) -> Result<Self> {
        let invalid = |_| Error::InvalidKeyParams("invalid AES key length");
        match key.len() {
            16 => Aes128Gcm::new_from_slice(key)
                .map(GcmSegment::Aes128)
                .map_err(invalid),
            32 => Aes256Gcm::new_from_slice(key)
                .map(GcmSegment::Aes256)
                .map_err(invalid),
            _ => Err(Error::InvalidKeyParams("invalid AES key length")),
        }
    }

    pub fn tag_size(&self) -> usize {
        match self {
            GcmSegment::Aes128(_) => <Aes128Gcm as AeadCore>::TagSize::USIZE,
            GcmSegment::Aes256(_) => <Aes256Gcm as AeadCore>::TagSize::USIZE,
        }
    }

    pub fn seal(
        &self,
        nonce: &SegmentNonce,
        ad: &[u8],
        buf: &mut [u8],
        tag: &mut [u8],
    ) -> Result<()> {
        match self {
            GcmSegment::Aes128(aead) => seal(aead, nonce, ad, buf, tag),
            GcmSegment::Aes256(aead) => seal(aead, nonce, ad, buf, tag),
        }
    }

    pub fn open(
        &self,
        nonce: &SegmentNonce,
        ad: &[u8],
        buf: &mut [u8],
        tag: &[u8],
    ) -> Result<()> {
        match self {
            GcmSegment::Aes128(aead) => open(aead, nonce, ad, buf, tag),
            GcmSegment::Aes256(aead) => open(aead, nonce, ad, buf, tag),
        }
    }
}

fn seal<A: AeadInPlace>(
    aead: &A,
    nonce: &SegmentNonce,
    ad: &[u8],
    buf: &mut [u8],
    tag: &mut [u8],
) -> Result<()> {
    let t = aead.encrypt_in_place_detached(
        Nonce::<A>::from_slice(nonce.as_bytes()),
        ad,
        buf,
    )?;
    tag.copy_from_slice(&t);
    Ok(())
}

fn open<A: AeadInPlace>(
    aead: &A,
    nonce: &SegmentNonce,
    ad: &[u8],
    buf: &mut [u8],
    tag: &[u8],
) -> Result<()> {
    if tag.len() != A::TagSize::USIZE {
        return Err(Error::Authentication);
    }
    // aes-gcm checks the tag before applying the keystream, so
    // a failed open leaves `buf` as it was.
    aead.decrypt_in_place_detached(
        Nonce::<A>::from_slice(nonce.as_bytes()),
        ad,
        buf,
        Tag::<A>::from_slice(tag),
    )
    .map_err(|_| Error::Authentication)
}
