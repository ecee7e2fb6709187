//! Bundle archives: classification, validation, extraction, assembly
//!
//! A bundle is a zip archive whose members all live under at least one
//! directory segment (conventionally the bundle key). Member roles are
//! signaled purely by trailing suffix:
//!
//! - `.key` — the RSA-OAEP wrapped AES-256 bundle key (exactly one per
//!   encrypted bundle)
//! - `.iv`  — raw GCM nonce, paired with a `.enc` sibling by base name
//! - `.enc` — AES-256-GCM ciphertext with trailing 16-byte auth tag
//! - anything else — opaque payload, copied unchanged
//!
//! [`EnvelopeUnpacker`] is the consumer side: one classification pass
//! over the opened archive, layout invariants enforced before any
//! content I/O, then a single extraction pass in enumeration order.
//! [`Bundler`] is the producer side used to assemble bundles for
//! submission.

mod member;
mod pack;
mod unpack;

pub use member::{ArchiveMember, MemberRole};
pub use pack::{Bundler, PackError};
pub use unpack::{EnvelopeUnpacker, UnpackError};
