use std::path::Path;

use serde::Serialize;
use url::Url;

/// Errors that can occur while parsing or resolving a bundle identifier
#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    #[error("'{0}' is not a valid bundle identifier, expected <key>-<host>-<remote>[.enc][.refs]")]
    InvalidIdentifier(String),

    #[error("unknown bundle host '{0}'")]
    UnknownHost(String),

    #[error("bundle is encrypted but no private key file was provided")]
    MissingKey,

    #[error("private key file '{0}' must have a .pem extension")]
    InvalidKeyFile(String),

    #[error("resolved download URL is invalid: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// A known file-sharing host
///
/// Hosts are an open extension point: adding a row to [`HOSTS`] is enough
/// to support a new bundle host, no protocol changes required. The
/// `download` field is a URL template with a `{remote}` placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Host {
    /// Host tag as it appears in bundle identifiers
    pub tag: &'static str,
    /// Download URL template, `{remote}` is replaced with the remote id
    pub download: &'static str,
    /// Endpoint accepting multipart bundle uploads
    pub upload: &'static str,
}

/// Table of hosts bundles may be fetched from
pub const HOSTS: &[Host] = &[Host {
    tag: "0x0",
    download: "https://0x0.st/{remote}.zip",
    upload: "https://0x0.st",
}];

impl Host {
    /// Look up a host by its identifier tag
    pub fn resolve(tag: &str) -> Option<&'static Host> {
        HOSTS.iter().find(|host| host.tag == tag)
    }

    /// Build the download URL for a remote id on this host
    pub fn download_url(&self, remote_id: &str) -> Result<Url, IdentifierError> {
        Ok(Url::parse(&self.download.replace("{remote}", remote_id))?)
    }
}

/// A parsed bundle identifier of the form `<key>-<host>-<remote>[.enc][.refs]`
///
/// Immutable once constructed. The identifier is the only user input the
/// protocol trusts: everything else (download URL, encryption requirement,
/// key-file preconditions) is derived from it before any network or
/// archive operation happens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleIdentifier {
    /// Bundle key, also the top-level directory inside the archive
    pub source_key: String,
    /// Tag of the host the bundle was uploaded to
    pub host_tag: String,
    /// Id of the bundle on the remote host
    pub remote_id: String,
    /// Whether members are protected by the encryption envelope
    pub encrypted: bool,
    /// Whether the bundle carries reference exports
    pub has_references: bool,
    /// Resolved download URL for the bundle archive
    pub resolved_url: Url,
}

impl BundleIdentifier {
    /// Parse an identifier string and resolve its download URL
    ///
    /// The identifier splits on `-` into exactly three fields. The third
    /// field may carry dotted tags: `.enc` marks the bundle as encrypted,
    /// `.refs` marks it as carrying reference exports. Unknown tags are
    /// ignored for forward compatibility.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` on any other field count and
    /// `UnknownHost` when the host tag is not in [`HOSTS`].
    pub fn parse(id: &str) -> Result<Self, IdentifierError> {
        let fields: Vec<&str> = id.split('-').collect();
        let [source_key, host_tag, remainder] = fields[..] else {
            return Err(IdentifierError::InvalidIdentifier(id.to_string()));
        };

        let mut tags = remainder.split('.');
        let remote_id = tags
            .next()
            .filter(|remote| !remote.is_empty())
            .ok_or_else(|| IdentifierError::InvalidIdentifier(id.to_string()))?;
        if source_key.is_empty() || host_tag.is_empty() {
            return Err(IdentifierError::InvalidIdentifier(id.to_string()));
        }

        let tags: Vec<&str> = tags.collect();
        let encrypted = tags.contains(&"enc");
        let has_references = tags.contains(&"refs");

        let host = Host::resolve(host_tag)
            .ok_or_else(|| IdentifierError::UnknownHost(host_tag.to_string()))?;
        let resolved_url = host.download_url(remote_id)?;

        Ok(Self {
            source_key: source_key.to_string(),
            host_tag: host_tag.to_string(),
            remote_id: remote_id.to_string(),
            encrypted,
            has_references,
            resolved_url,
        })
    }

    /// Check the private-key precondition for this identifier
    ///
    /// An encrypted bundle requires a private-key file with a `.pem`
    /// extension. Checked before any network or archive operation.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` when the bundle is encrypted and no path was
    /// given, and `InvalidKeyFile` when the path has the wrong extension.
    pub fn require_private_key(&self, key_path: Option<&Path>) -> Result<(), IdentifierError> {
        if !self.encrypted {
            return Ok(());
        }

        let path = key_path.ok_or(IdentifierError::MissingKey)?;
        let is_pem = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("pem"))
            .unwrap_or(false);
        if !is_pem {
            return Err(IdentifierError::InvalidKeyFile(path.display().to_string()));
        }

        Ok(())
    }
}
