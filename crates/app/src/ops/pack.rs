use std::path::PathBuf;

use clap::Args;

use common::bundle::{Bundler, PackError as BundlePackError};
use common::identifier::{Host, IdentifierError};

#[derive(Args, Debug, Clone)]
pub struct Pack {
    /// Files to include in the bundle
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// SPKI public key (.pem); when given, the bundle is encrypted
    #[arg(long)]
    pub public_key: Option<PathBuf>,

    /// Host to address the bundle to
    #[arg(long, default_value = "0x0")]
    pub host: String,

    /// Upload the bundle and print its fetchable identifier
    #[arg(long)]
    pub upload: bool,

    /// Expiry for uploaded bundles, in days
    #[arg(long, default_value_t = 7)]
    pub expire_days: u32,

    /// Mark the bundle as carrying reference exports
    #[arg(long)]
    pub refs: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum PackError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error("failed to read '{path}': {source}")]
    ReadInput {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("input '{0}' has no usable file name")]
    BadInputName(PathBuf),

    #[error(transparent)]
    Bundle(#[from] BundlePackError),

    #[error("upload failed: {0}")]
    Http(#[from] crate::http::HttpError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Pack {
    type Error = PackError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let host = Host::resolve(&self.host)
            .ok_or_else(|| IdentifierError::UnknownHost(self.host.clone()))?;

        let public_key_pem = match &self.public_key {
            Some(path) => Some(tokio::fs::read_to_string(path).await.map_err(|source| {
                PackError::ReadInput {
                    path: path.clone(),
                    source,
                }
            })?),
            None => None,
        };

        let mut bundler = Bundler::new(public_key_pem);
        for path in &self.files {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .ok_or_else(|| PackError::BadInputName(path.clone()))?;
            let data = tokio::fs::read(path)
                .await
                .map_err(|source| PackError::ReadInput {
                    path: path.clone(),
                    source,
                })?;
            bundler.add(name, &data, self.refs)?;
        }

        let archive = bundler.finish()?;

        if self.upload {
            tracing::info!(host = host.tag, bytes = archive.len(), "uploading bundle");
            let remote_id = crate::http::upload(
                &ctx.client,
                host.upload,
                &bundler.archive_name(),
                archive,
                expire_hours(self.expire_days),
            )
            .await?;
            return Ok(bundler.id(host.tag, &remote_id));
        }

        tokio::fs::create_dir_all(&ctx.logs_dir).await?;
        let target = ctx.logs_dir.join(bundler.archive_name());
        tokio::fs::write(&target, &archive).await?;
        Ok(format!(
            "wrote {} (upload it and fetch as {})",
            target.display(),
            bundler.id(host.tag, "<remote-id>")
        ))
    }
}

/// The host expiry field is in hours; saturate instead of overflowing on
/// absurd `--expire-days` values.
fn expire_hours(days: u32) -> u32 {
    days.saturating_mul(24)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::op::{Op, OpContext};

    #[test]
    fn test_expire_hours_saturates() {
        assert_eq!(expire_hours(7), 168);
        assert_eq!(expire_hours(u32::MAX), u32::MAX);
    }

    #[tokio::test]
    async fn test_pack_writes_local_archive() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("debug.txt");
        tokio::fs::write(&input, b"log contents").await.unwrap();

        let op = Pack {
            files: vec![input],
            public_key: None,
            host: "0x0".to_string(),
            upload: false,
            expire_days: 7,
            refs: false,
        };

        let ctx = OpContext::new(dir.path().join("logs")).unwrap();
        let output = op.execute(&ctx).await.unwrap();
        assert!(output.starts_with("wrote "), "got {output:?}");

        // exactly one archive lands in the logs dir
        let entries: Vec<_> = std::fs::read_dir(&ctx.logs_dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(entries.len(), 1);
        assert!(entries[0].ends_with(".zip"));
    }
}
