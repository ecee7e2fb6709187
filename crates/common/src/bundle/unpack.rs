use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::crypto::{unwrap_key, KeyUnwrapError, Secret, SecretError, TAG_SIZE};

use super::{ArchiveMember, MemberRole};

/// Errors that can occur while validating or extracting a bundle
///
/// All are fatal to the unpack operation: no retries, no silent
/// recovery. Every variant carries enough context (member name,
/// expected vs. observed counts) to diagnose without re-running.
#[derive(Debug, thiserror::Error)]
pub enum UnpackError {
    #[error("unexpected bundle layout: {reason}: '{name}'")]
    UnexpectedLayout { name: String, reason: &'static str },

    #[error("bundle is marked encrypted but contains no .key member")]
    MissingKey,

    #[error("expected exactly one .key member, found {0}")]
    MultipleKeys(usize),

    #[error("ciphertext member '{0}' has no .iv member with the same base name")]
    OrphanedCiphertext(String),

    #[error("ciphertext member '{name}' is {len} bytes, shorter than the 16-byte auth tag")]
    ShortCiphertext { name: String, len: usize },

    #[error(transparent)]
    KeyUnwrap(#[from] KeyUnwrapError),

    #[error("failed to decrypt member '{name}': {source}")]
    Decrypt { name: String, source: SecretError },

    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Extracts one bundle archive into a destination root
///
/// Given an opened archive and, if the bundle is encrypted, the raw
/// private-key PEM, produce the full set of output files under
/// `dest_root`, or fail with no partial side effects: all output is
/// staged in a temporary directory under the destination root and only
/// moved into place once every member has been written.
///
/// The operation is strictly sequential: classify, unwrap the key at
/// most once, then decrypt/copy members in enumeration order. It is not
/// safe to run twice concurrently for the same bundle; callers
/// serialize per identifier.
pub struct EnvelopeUnpacker {
    encrypted: bool,
    private_key_pem: Option<String>,
}

impl EnvelopeUnpacker {
    /// Build an unpacker for a plaintext bundle
    pub fn plain() -> Self {
        Self {
            encrypted: false,
            private_key_pem: None,
        }
    }

    /// Build an unpacker for an encrypted bundle
    pub fn encrypted(private_key_pem: String) -> Self {
        Self {
            encrypted: true,
            private_key_pem: Some(private_key_pem),
        }
    }

    /// Unpack the archive into `dest_root`
    ///
    /// Returns the destination paths of all written files, in member
    /// enumeration order.
    pub fn unpack<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        dest_root: &Path,
    ) -> Result<Vec<PathBuf>, UnpackError> {
        let members = self.classify(archive)?;
        let secret = self.unwrap_bundle_key(archive, &members)?;
        let pairing = pair_nonces(&members)?;

        tracing::debug!(
            members = members.len(),
            encrypted = self.encrypted,
            "bundle layout accepted"
        );

        fs::create_dir_all(dest_root)?;
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(dest_root)?;

        let mut written = Vec::new();
        for member in &members {
            match member.role {
                MemberRole::WrappedKey | MemberRole::Nonce => continue,
                MemberRole::Plain => {
                    let data = read_member(archive, &member.name)?;
                    write_staged(staging.path(), &member.name, &data)?;
                    written.push(member.name.clone());
                }
                MemberRole::Ciphertext => {
                    let blob = read_member(archive, &member.name)?;
                    if blob.len() < TAG_SIZE {
                        return Err(UnpackError::ShortCiphertext {
                            name: member.name.clone(),
                            len: blob.len(),
                        });
                    }

                    // pairing was established up front; missing entries were
                    // already rejected as OrphanedCiphertext
                    let nonce_name = &pairing[member.name.as_str()];
                    let nonce = read_member(archive, nonce_name)?;

                    let secret = secret.as_ref().ok_or(UnpackError::MissingKey)?;
                    let plaintext =
                        secret
                            .decrypt(&nonce, &blob)
                            .map_err(|source| UnpackError::Decrypt {
                                name: member.name.clone(),
                                source,
                            })?;

                    write_staged(staging.path(), member.stem(), &plaintext)?;
                    written.push(member.stem().to_string());
                }
            }
        }

        // every member extracted; move staged output into the destination
        let mut outputs = Vec::with_capacity(written.len());
        for rel in &written {
            let target = dest_root.join(rel);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(staging.path().join(rel), &target)?;
            outputs.push(target);
        }

        Ok(outputs)
    }

    /// Single classification pass over all member names
    ///
    /// Runs before any content I/O: layout violations are rejected on
    /// names alone.
    fn classify<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
    ) -> Result<Vec<ArchiveMember>, UnpackError> {
        let mut members = Vec::new();

        for index in 0..archive.len() {
            let entry = archive.by_index_raw(index)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            drop(entry);

            validate_name(&name)?;
            let member = ArchiveMember::new(name);

            if !self.encrypted && member.role != MemberRole::Plain {
                return Err(UnpackError::UnexpectedLayout {
                    name: member.name,
                    reason: "crypto-role member in a non-encrypted bundle",
                });
            }

            members.push(member);
        }

        let key_count = members
            .iter()
            .filter(|member| member.role == MemberRole::WrappedKey)
            .count();
        match (self.encrypted, key_count) {
            (false, _) | (true, 1) => Ok(members),
            (true, 0) => Err(UnpackError::MissingKey),
            (true, n) => Err(UnpackError::MultipleKeys(n)),
        }
    }

    /// Unwrap the bundle key, at most once, before any member decryption
    fn unwrap_bundle_key<R: Read + Seek>(
        &self,
        archive: &mut ZipArchive<R>,
        members: &[ArchiveMember],
    ) -> Result<Option<Secret>, UnpackError> {
        if !self.encrypted {
            return Ok(None);
        }

        let key_member = members
            .iter()
            .find(|member| member.role == MemberRole::WrappedKey)
            .ok_or(UnpackError::MissingKey)?;
        let pem = self.private_key_pem.as_ref().ok_or(UnpackError::MissingKey)?;

        let wrapped = read_member(archive, &key_member.name)?;
        let secret = unwrap_key(pem, &wrapped)?;
        tracing::debug!(member = %key_member.name, "bundle key unwrapped");
        Ok(Some(secret))
    }
}

/// Reject member names that could escape or pollute the destination
///
/// Every member must live under at least one directory segment; loose
/// top-level entries, absolute paths, and parent-directory traversal
/// segments are all rejected before any extraction happens.
fn validate_name(name: &str) -> Result<(), UnpackError> {
    if name.starts_with('/') {
        return Err(UnpackError::UnexpectedLayout {
            name: name.to_string(),
            reason: "absolute member path",
        });
    }
    if name.split('/').any(|segment| segment == "..") {
        return Err(UnpackError::UnexpectedLayout {
            name: name.to_string(),
            reason: "parent-directory traversal in member path",
        });
    }
    match name.split_once('/') {
        Some((dir, rest)) if !dir.is_empty() && !rest.is_empty() => Ok(()),
        _ => Err(UnpackError::UnexpectedLayout {
            name: name.to_string(),
            reason: "member has no directory segment",
        }),
    }
}

/// Pair every ciphertext member with its same-stem nonce member, up front
///
/// An unmatched ciphertext is an error; an unmatched nonce is silently
/// ignored. The asymmetry is deliberate: a nonce without work to do is
/// harmless, a ciphertext without a nonce can never be decrypted.
fn pair_nonces(members: &[ArchiveMember]) -> Result<HashMap<&str, String>, UnpackError> {
    let nonces: HashMap<&str, &str> = members
        .iter()
        .filter(|member| member.role == MemberRole::Nonce)
        .map(|member| (member.stem(), member.name.as_str()))
        .collect();

    let ciphertext_stems: HashSet<&str> = members
        .iter()
        .filter(|member| member.role == MemberRole::Ciphertext)
        .map(|member| member.stem())
        .collect();
    for (stem, name) in &nonces {
        if !ciphertext_stems.contains(stem) {
            tracing::debug!(member = %name, "ignoring nonce without ciphertext sibling");
        }
    }

    members
        .iter()
        .filter(|member| member.role == MemberRole::Ciphertext)
        .map(|member| {
            let nonce = nonces
                .get(member.stem())
                .ok_or_else(|| UnpackError::OrphanedCiphertext(member.name.clone()))?;
            Ok((member.name.as_str(), nonce.to_string()))
        })
        .collect()
}

fn read_member<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<Vec<u8>, UnpackError> {
    let mut entry = archive.by_name(name)?;
    let mut data = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut data)?;
    Ok(data)
}

fn write_staged(staging: &Path, rel: &str, data: &[u8]) -> Result<(), UnpackError> {
    let target = staging.join(rel);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, data)?;
    Ok(())
}
