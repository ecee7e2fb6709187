//! Member encryption using AES-256-GCM
//!
//! One `Secret` protects all encrypted members of a single bundle. The
//! nonce is not part of the ciphertext blob: it travels as a separate
//! `.iv` archive member paired with the `.enc` member by base name.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Key, Nonce,
};
use zeroize::Zeroize;

/// Size of a GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the symmetric key in bytes (256 bits)
pub const SECRET_SIZE: usize = 32;
/// Size of the GCM authentication tag trailing every ciphertext
pub const TAG_SIZE: usize = 16;

/// Errors that can occur during member encryption/decryption
#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    /// Tag verification failed: the member was tampered with or the wrong
    /// key was unwrapped. No plaintext is produced in this case.
    #[error("authentication failed, ciphertext rejected")]
    AuthenticationFailure,

    #[error("invalid nonce size, expected {NONCE_SIZE}, got {0}")]
    BadNonce(usize),

    #[error("invalid secret size, expected {SECRET_SIZE}, got {0}")]
    BadKeySize(usize),
}

/// The per-bundle 256-bit symmetric key
///
/// Exists only for the duration of one pack or unpack operation and is
/// zeroed on drop; it is never written to disk. Ciphertext blobs are
/// `ciphertext || 16-byte auth tag`, with the nonce supplied separately.
pub struct Secret([u8; SECRET_SIZE]);

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl From<[u8; SECRET_SIZE]> for Secret {
    fn from(bytes: [u8; SECRET_SIZE]) -> Self {
        Secret(bytes)
    }
}

impl Secret {
    /// Generate a new random secret using a cryptographically secure RNG
    pub fn generate() -> Self {
        let mut buff = [0; SECRET_SIZE];
        getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
        Self(buff)
    }

    /// Create a secret from a byte slice
    ///
    /// # Errors
    ///
    /// Returns an error if the slice length is not exactly `SECRET_SIZE` bytes.
    pub fn from_slice(data: &[u8]) -> Result<Self, SecretError> {
        if data.len() != SECRET_SIZE {
            return Err(SecretError::BadKeySize(data.len()));
        }
        let mut buff = [0; SECRET_SIZE];
        buff.copy_from_slice(data);
        Ok(buff.into())
    }

    /// Get a reference to the secret key bytes
    pub fn bytes(&self) -> &[u8] {
        self.0.as_ref()
    }

    /// Encrypt a member payload
    ///
    /// Returns `ciphertext || 16-byte auth tag`. The caller owns the nonce
    /// and must store it alongside the ciphertext (as the `.iv` member).
    ///
    /// # Errors
    ///
    /// Returns an error if the nonce is not exactly `NONCE_SIZE` bytes.
    pub fn encrypt(&self, nonce: &[u8], plaintext: &[u8]) -> Result<Vec<u8>, SecretError> {
        if nonce.len() != NONCE_SIZE {
            return Err(SecretError::BadNonce(nonce.len()));
        }

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.bytes()));
        cipher
            .encrypt(Nonce::from_slice(nonce), plaintext)
            .map_err(|_| SecretError::AuthenticationFailure)
    }

    /// Decrypt a member payload
    ///
    /// `blob` is `ciphertext || 16-byte auth tag`; decryption and tag
    /// verification are a single atomic operation. On tag mismatch no
    /// plaintext byte is ever returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The nonce is not exactly `NONCE_SIZE` bytes
    /// - Authentication fails (tampered data or wrong key)
    pub fn decrypt(&self, nonce: &[u8], blob: &[u8]) -> Result<Vec<u8>, SecretError> {
        if nonce.len() != NONCE_SIZE {
            return Err(SecretError::BadNonce(nonce.len()));
        }

        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(self.bytes()));
        cipher
            .decrypt(Nonce::from_slice(nonce), blob)
            .map_err(|_| SecretError::AuthenticationFailure)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn nonce() -> [u8; NONCE_SIZE] {
        let mut buff = [0; NONCE_SIZE];
        getrandom::getrandom(&mut buff).unwrap();
        buff
    }

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let secret = Secret::generate();
        let nonce = nonce();
        let data = b"hello world, this is a test message for encryption";

        let blob = secret.encrypt(&nonce, data).unwrap();
        assert_eq!(blob.len(), data.len() + TAG_SIZE);

        let decrypted = secret.decrypt(&nonce, &blob).unwrap();
        assert_eq!(data.as_slice(), decrypted.as_slice());
    }

    #[test]
    fn test_tampered_tag_is_rejected() {
        let secret = Secret::generate();
        let nonce = nonce();
        let mut blob = secret.encrypt(&nonce, b"payload").unwrap();

        // flip one bit in the trailing tag
        let last = blob.len() - 1;
        blob[last] ^= 0x01;

        assert!(matches!(
            secret.decrypt(&nonce, &blob),
            Err(SecretError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_tampered_ciphertext_is_rejected() {
        let secret = Secret::generate();
        let nonce = nonce();
        let mut blob = secret.encrypt(&nonce, b"some longer payload bytes").unwrap();
        blob[0] ^= 0xFF;

        assert!(matches!(
            secret.decrypt(&nonce, &blob),
            Err(SecretError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_wrong_key_is_rejected() {
        let nonce = nonce();
        let blob = Secret::generate().encrypt(&nonce, b"payload").unwrap();

        assert!(matches!(
            Secret::generate().decrypt(&nonce, &blob),
            Err(SecretError::AuthenticationFailure)
        ));
    }

    #[test]
    fn test_nonce_size_validation() {
        let secret = Secret::generate();
        assert!(matches!(
            secret.decrypt(&[0u8; 16], b"0123456789abcdef"),
            Err(SecretError::BadNonce(16))
        ));
        assert!(matches!(
            secret.encrypt(&[0u8; 8], b"payload"),
            Err(SecretError::BadNonce(8))
        ));
    }

    #[test]
    fn test_secret_size_validation() {
        assert!(matches!(
            Secret::from_slice(&[1u8; 16]),
            Err(SecretError::BadKeySize(16))
        ));
        assert!(Secret::from_slice(&[1u8; SECRET_SIZE]).is_ok());
    }

    #[test]
    fn test_empty_plaintext() {
        let secret = Secret::generate();
        let nonce = nonce();

        // an empty plaintext still produces a full tag
        let blob = secret.encrypt(&nonce, b"").unwrap();
        assert_eq!(blob.len(), TAG_SIZE);
        assert_eq!(secret.decrypt(&nonce, &blob).unwrap(), b"");
    }
}
