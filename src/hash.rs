use {
    crate::error::{Error, Result},
    core::{fmt, result},
};

/// Hash functions usable for HKDF and HMAC.
#[repr(u32)]
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum HashType {
    /// SHA-1.
    Sha1 = 1,
    /// SHA-384.
    Sha384 = 2,
    /// SHA-256.
    Sha256 = 3,
    /// SHA-512.
    Sha512 = 4,
}

impl HashType {
    /// Size in bytes of the hash's output.
    pub const fn output_size(&self) -> usize {
        match self {
            HashType::Sha1 => 20,
            HashType::Sha256 => 32,
            HashType::Sha384 => 48,
            HashType::Sha512 => 64,
        }
    }

    /// Returns the canonical name of the hash.
    pub const fn name(&self) -> &'static str {
        match self {
            HashType::Sha1 => "SHA1",
            HashType::Sha256 => "SHA256",
            HashType::Sha384 => "SHA384",
            HashType::Sha512 => "SHA512",
        }
    }
}

impl fmt::Display for HashType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> result::Result<(), fmt::Error> {
        f.write_str(self.name())
    }
}

impl fmt::Debug for HashType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> result::Result<(), fmt::Error> {
        fmt::Display::fmt(self, f)
    }
}

impl TryFrom<u32> for HashType {
    type Error = Error;

    fn try_from(v: u32) -> Result<HashType> {
        match v {
            x if x == HashType::Sha1 as u32 => Ok(HashType::Sha1),
            x if x == HashType::Sha384 as u32 => Ok(HashType::Sha384),
            x if x == HashType::Sha256 as u32 => Ok(HashType::Sha256),
            x if x == HashType::Sha512 as u32 => Ok(HashType::Sha512),
            _ => Err(Error::InvalidKeyParams("unsupported hash type")),
        }
    }
}

impl core::str::FromStr for HashType {
    type Err = Error;

    fn from_str(s: &str) -> Result<HashType> {
        match s {
            "SHA1" | "sha1" | "SHA-1" => Ok(HashType::Sha1),
            "SHA256" | "sha256" | "SHA-256" => Ok(HashType::Sha256),
            "SHA384" | "sha384" | "SHA-384" => Ok(HashType::Sha384),
            "SHA512" | "sha512" | "SHA-512" => Ok(HashType::Sha512),
            _ => Err(Error::InvalidKeyParams("unsupported hash type")),
        }
    }
}
