//! Asymmetric wrap/unwrap of the per-bundle symmetric key
//!
//! The bundle producer generates one AES-256 key per bundle and ships it
//! inside the archive as a `.key` member, encrypted with RSA-OAEP
//! (SHA-256 hash, SHA-256 MGF1, empty label) under the recipient's
//! public key. Unwrapping is the only asymmetric operation in the
//! protocol and happens at most once per bundle.

use rsa::{
    pkcs8::{DecodePrivateKey, DecodePublicKey},
    rand_core::OsRng,
    Oaep, RsaPrivateKey, RsaPublicKey,
};
use sha2::Sha256;

use super::{Secret, SECRET_SIZE};

/// Error surfaced by key wrap/unwrap operations
///
/// Deliberately opaque: malformed keys, wrong keys, and corrupted
/// ciphertext all map to the same variant with the same message. OAEP
/// padding failures are a classic decryption oracle, so the internal
/// cause is never exposed in an externally observable signal.
#[derive(Debug, thiserror::Error)]
pub enum KeyUnwrapError {
    #[error("failed to unwrap bundle key")]
    UnwrapFailed,

    #[error("failed to wrap bundle key")]
    WrapFailed,
}

/// Unwrap a bundle secret from the raw bytes of a `.key` member
///
/// `pem` must hold an unencrypted PKCS#8 private key.
///
/// # Errors
///
/// Returns [`KeyUnwrapError::UnwrapFailed`] for any failure: malformed
/// PEM, wrong key, corrupted ciphertext, or an unwrapped key of the
/// wrong size.
pub fn unwrap_key(pem: &str, wrapped: &[u8]) -> Result<Secret, KeyUnwrapError> {
    let private_key =
        RsaPrivateKey::from_pkcs8_pem(pem).map_err(|_| KeyUnwrapError::UnwrapFailed)?;

    let key_bytes = private_key
        .decrypt(Oaep::new::<Sha256>(), wrapped)
        .map_err(|_| KeyUnwrapError::UnwrapFailed)?;

    if key_bytes.len() != SECRET_SIZE {
        return Err(KeyUnwrapError::UnwrapFailed);
    }
    Secret::from_slice(&key_bytes).map_err(|_| KeyUnwrapError::UnwrapFailed)
}

/// Wrap a bundle secret under a recipient's public key
///
/// `pem` must hold an SPKI (`PUBLIC KEY`) PEM, the format the bundle
/// producer distributes. The output is the raw byte content of a `.key`
/// member.
///
/// # Errors
///
/// Returns [`KeyUnwrapError::WrapFailed`] if the PEM is malformed or
/// encryption fails.
pub fn wrap_key(pem: &str, secret: &Secret) -> Result<Vec<u8>, KeyUnwrapError> {
    let public_key = RsaPublicKey::from_public_key_pem(pem).map_err(|_| KeyUnwrapError::WrapFailed)?;

    public_key
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), secret.bytes())
        .map_err(|_| KeyUnwrapError::WrapFailed)
}

#[cfg(test)]
mod test {
    use super::*;
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};

    fn test_keypair() -> (String, String) {
        let private_key = RsaPrivateKey::new(&mut OsRng, 2048).unwrap();
        let public_key = RsaPublicKey::from(&private_key);
        (
            private_key
                .to_pkcs8_pem(LineEnding::LF)
                .unwrap()
                .to_string(),
            public_key.to_public_key_pem(LineEnding::LF).unwrap(),
        )
    }

    #[test]
    fn test_wrap_unwrap_roundtrip() {
        let (private_pem, public_pem) = test_keypair();
        let secret = Secret::generate();

        let wrapped = wrap_key(&public_pem, &secret).unwrap();
        // OAEP output is one modulus worth of bytes, never the raw key
        assert_eq!(wrapped.len(), 256);

        let unwrapped = unwrap_key(&private_pem, &wrapped).unwrap();
        assert_eq!(secret.bytes(), unwrapped.bytes());
    }

    #[test]
    fn test_unwrap_with_wrong_key_fails() {
        let (_, public_pem) = test_keypair();
        let (other_private_pem, _) = test_keypair();

        let wrapped = wrap_key(&public_pem, &Secret::generate()).unwrap();
        assert!(matches!(
            unwrap_key(&other_private_pem, &wrapped),
            Err(KeyUnwrapError::UnwrapFailed)
        ));
    }

    #[test]
    fn test_unwrap_corrupted_ciphertext_fails() {
        let (private_pem, public_pem) = test_keypair();

        let mut wrapped = wrap_key(&public_pem, &Secret::generate()).unwrap();
        wrapped[10] ^= 0xFF;

        assert!(matches!(
            unwrap_key(&private_pem, &wrapped),
            Err(KeyUnwrapError::UnwrapFailed)
        ));
    }

    #[test]
    fn test_unwrap_with_malformed_pem_fails() {
        assert!(matches!(
            unwrap_key("not a pem", b"irrelevant"),
            Err(KeyUnwrapError::UnwrapFailed)
        ));
    }
}
