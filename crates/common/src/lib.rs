/**
 * Bundle assembly and extraction.
 *  Classifies archive members, enforces
 *  layout invariants, and drives the
 *  envelope crypto for encrypted bundles.
 */
pub mod bundle;
/**
 * Cryptographic operations.
 *  - Symmetric member encryption (AES-256-GCM)
 *  - Asymmetric key wrap/unwrap (RSA-OAEP)
 */
pub mod crypto;
/**
 * Bundle identifier parsing and the
 *  table of known file-sharing hosts.
 */
pub mod identifier;

pub mod prelude {
    pub use crate::bundle::{Bundler, EnvelopeUnpacker, MemberRole, UnpackError};
    pub use crate::crypto::{Secret, SecretError};
    pub use crate::identifier::{BundleIdentifier, Host, IdentifierError};
}
