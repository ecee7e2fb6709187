use std::io::{Cursor, Write};

use zip::{write::SimpleFileOptions, CompressionMethod, ZipWriter};

use crate::crypto::{wrap_key, KeyUnwrapError, Secret, SecretError, NONCE_SIZE};

/// Alphabet for bundle keys, matching the producer that established the
/// identifier convention (no 0/1/I/L/O). 32 characters, so a random byte
/// maps to an index without bias.
const KEY_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZ";
const KEY_LENGTH: usize = 8;

/// Errors that can occur while assembling a bundle
#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error(transparent)]
    Wrap(#[from] KeyUnwrapError),

    #[error("failed to encrypt member: {0}")]
    Encrypt(#[from] SecretError),

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Assembles one bundle archive, the producer counterpart of
/// [`EnvelopeUnpacker`](super::EnvelopeUnpacker)
///
/// Every member is placed under the bundle key directory. In encrypted
/// mode the AES-256 secret is generated lazily on the first `add` and
/// wrapped exactly once as `<key>/<key>.key`; each member then becomes a
/// `.iv`/`.enc` pair with a fresh random nonce. In plaintext mode
/// members are stored verbatim.
pub struct Bundler {
    key: String,
    public_key_pem: Option<String>,
    secret: Option<Secret>,
    has_references: bool,
    files: Vec<(String, Vec<u8>)>,
}

impl Bundler {
    /// Create a bundler; pass a public-key PEM to produce an encrypted bundle
    pub fn new(public_key_pem: Option<String>) -> Self {
        Self {
            key: generate_bundle_key(),
            public_key_pem,
            secret: None,
            has_references: false,
            files: Vec::new(),
        }
    }

    /// The random bundle key, also the archive's top-level directory
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Local file name for the assembled archive
    pub fn archive_name(&self) -> String {
        format!("{}.zip", self.key)
    }

    /// Add one member to the bundle
    ///
    /// `refs` marks the bundle as carrying reference exports, which is
    /// reflected in the identifier tag.
    pub fn add(&mut self, path: &str, data: &[u8], refs: bool) -> Result<(), PackError> {
        self.has_references = self.has_references || refs;

        if let Some(pem) = self.public_key_pem.clone() {
            if self.secret.is_none() {
                let secret = Secret::generate();
                let wrapped = wrap_key(&pem, &secret)?;
                self.files
                    .push((format!("{key}/{key}.key", key = self.key), wrapped));
                self.secret = Some(secret);
            }
            let secret = self.secret.as_ref().expect("secret set above");

            let mut nonce = [0u8; NONCE_SIZE];
            getrandom::getrandom(&mut nonce).expect("failed to generate random bytes");
            let blob = secret.encrypt(&nonce, data)?;

            self.files
                .push((format!("{}/{}.iv", self.key, path), nonce.to_vec()));
            self.files
                .push((format!("{}/{}.enc", self.key, path), blob));
        } else {
            self.files
                .push((format!("{}/{}", self.key, path), data.to_vec()));
        }

        Ok(())
    }

    /// The identifier a consumer needs to fetch this bundle back
    pub fn id(&self, host_tag: &str, remote_id: &str) -> String {
        format!(
            "{}-{}-{}{}{}",
            self.key,
            host_tag,
            remote_id,
            if self.has_references { ".refs" } else { "" },
            if self.public_key_pem.is_some() {
                ".enc"
            } else {
                ""
            },
        )
    }

    /// Serialize all members into an in-memory zip archive
    pub fn finish(&self) -> Result<Vec<u8>, PackError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.files {
            writer.start_file(name.as_str(), options)?;
            writer.write_all(data)?;
        }

        Ok(writer.finish()?.into_inner())
    }
}

fn generate_bundle_key() -> String {
    let mut buff = [0u8; KEY_LENGTH];
    getrandom::getrandom(&mut buff).expect("failed to generate random bytes");
    buff.iter()
        .map(|byte| KEY_ALPHABET[(byte % KEY_ALPHABET.len() as u8) as usize] as char)
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_bundle_key_shape() {
        let key = generate_bundle_key();
        assert_eq!(key.len(), KEY_LENGTH);
        assert!(key.bytes().all(|b| KEY_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_plain_bundle_members() {
        let mut bundler = Bundler::new(None);
        bundler.add("debug.txt", b"log contents", false).unwrap();

        let key = bundler.key().to_string();
        assert_eq!(bundler.files.len(), 1);
        assert_eq!(bundler.files[0].0, format!("{key}/debug.txt"));
        assert_eq!(bundler.files[0].1, b"log contents");
    }

    #[test]
    fn test_identifier_tags() {
        let plain = Bundler::new(None);
        assert_eq!(
            plain.id("0x0", "XYZ"),
            format!("{}-0x0-XYZ", plain.key())
        );

        let mut with_refs = Bundler::new(None);
        with_refs.add("a.txt", b"x", true).unwrap();
        assert!(with_refs.id("0x0", "XYZ").ends_with(".refs"));
    }
}
