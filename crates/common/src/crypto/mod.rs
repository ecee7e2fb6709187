//! Cryptographic primitives for the bundle envelope
//!
//! Encrypted bundles use hybrid (envelope) encryption:
//!
//! - **Member encryption**: every member is encrypted with one per-bundle
//!   AES-256-GCM [`Secret`] and a per-member random nonce
//! - **Key wrap**: the secret itself travels inside the archive, wrapped
//!   with RSA-OAEP (SHA-256 hash and MGF1) under the recipient's public key
//!
//! Both operations are pure functions over byte buffers so they can be
//! tested against fixed vectors independent of archive or filesystem
//! logic. The wire format is fixed by the bundle producer:
//!
//! - `.key` member: RSA-OAEP wrapped AES-256 key, raw bytes
//! - `.iv` member: raw 12-byte GCM nonce
//! - `.enc` member: `ciphertext || 16-byte auth tag`

mod envelope;
mod secret;

pub use envelope::{unwrap_key, wrap_key, KeyUnwrapError};
pub use secret::{Secret, SecretError, NONCE_SIZE, SECRET_SIZE, TAG_SIZE};
