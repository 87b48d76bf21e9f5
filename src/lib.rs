//! **streaming-aead** implements segmented streaming AEAD.
//!
//! A streaming AEAD encrypts an arbitrarily long plaintext with
//! one left-to-right pass and decrypts it the same way, using
//! memory proportional to the segment size rather than to the
//! message.
//!
//! The plaintext is broken into segments and each segment is
//! encrypted and authenticated separately. Every stream derives
//! a fresh key with [HKDF][hkdf] from the raw key, a random salt
//! and the associated data, and every segment is sealed under a
//! nonce made of a random per-stream prefix, the segment's index
//! and a flag marking the last segment:
//!
//! ```text
//!    prefix counter last
//!       56     32     8  bits
//! ```
//!
//! The last-segment flag signals the end of the stream. Without
//! it the stream could be silently truncated at a segment
//! boundary; the counter stops segments from being reordered.
//! This is the construction of Hoang, Reyhanitabar, Rogaway and
//! Vizár ([oae2]).
//!
//! Two schemes share the same framing:
//!
//! - AES-GCM-HKDF: each segment is AES-GCM with the stream's
//!   associated data.
//! - AES-CTR-HMAC: each segment is AES-CTR followed by a
//!   truncated HMAC over the nonce and ciphertext.
//!
//! A ciphertext looks like:
//!
//! ```text
//! [len][salt][nonce prefix] [segment 0 || tag] [segment 1 || tag] ... [last || tag]
//! ```
//!
//! The header shares the first segment's budget, and a plaintext
//! that exactly fills its segments is followed by an empty last
//! segment, so the last segment is never full.
//!
//! As always, it is not a good idea to act on a plaintext until
//! the entire message has been verified.
//!
//! # Example
//!
//! ```
//! # #[cfg(feature = "std")]
//! # fn main() -> streaming_aead::Result<()> {
//! use std::io::{Read, Write};
//! use streaming_aead::{AesGcmHkdfParams, HashType, StreamingAead};
//!
//! let params = AesGcmHkdfParams::new(16, HashType::Sha256, 16, 4096);
//! let aead = StreamingAead::generate(params, &mut rand_core::OsRng)?;
//!
//! let mut ciphertext = Vec::new();
//! let mut w = aead.new_encrypting_stream(&mut ciphertext, b"context")?;
//! w.write_all(b"hello, world!").map_err(streaming_aead::Error::from)?;
//! w.close()?;
//! drop(w);
//!
//! let mut r = aead.new_decrypting_stream(&ciphertext[..], b"context");
//! let mut plaintext = Vec::new();
//! r.read_to_end(&mut plaintext).map_err(streaming_aead::Error::from)?;
//! assert_eq!(plaintext, b"hello, world!");
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "std"))]
//! # fn main() {}
//! ```
//!
//! [oae2]: https://eprint.iacr.org/2015/189.pdf
//! [hkdf]: https://tools.ietf.org/html/rfc5869

#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs, rust_2018_idioms)]
#![cfg_attr(not(any(feature = "std", test)), no_std)]

extern crate alloc;

mod buf;
mod error;
mod hash;
mod header;
mod io;
pub mod kdf;
mod params;
mod primitive;
mod reader;
mod segment;
mod writer;

pub use error::*;
pub use hash::*;
pub use io::*;
pub use params::*;
pub use primitive::*;
pub use reader::*;
pub use writer::*;
