use std::path::PathBuf;

use clap::Args;
use zip::ZipArchive;

use common::bundle::{EnvelopeUnpacker, UnpackError};
use common::identifier::{BundleIdentifier, IdentifierError};

#[derive(Args, Debug, Clone)]
pub struct Fetch {
    /// Bundle identifier, <key>-<host>-<remote>[.enc][.refs]
    pub id: String,

    /// Path to the PKCS#8 private key (.pem); required for .enc bundles
    pub private_key: Option<PathBuf>,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Identifier(#[from] IdentifierError),

    #[error("failed to read private key '{path}': {source}")]
    ReadKey {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("download failed: {0}")]
    Http(#[from] crate::http::HttpError),

    #[error("failed to open downloaded archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error(transparent)]
    Unpack(#[from] UnpackError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait::async_trait]
impl crate::op::Op for Fetch {
    type Error = FetchError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        // All preconditions are checked before any network traffic
        let id = BundleIdentifier::parse(&self.id)?;
        id.require_private_key(self.private_key.as_deref())?;

        let unpacker = if id.encrypted {
            let path = self.private_key.as_ref().expect("checked above");
            let pem = tokio::fs::read_to_string(path)
                .await
                .map_err(|source| FetchError::ReadKey {
                    path: path.clone(),
                    source,
                })?;
            EnvelopeUnpacker::encrypted(pem)
        } else {
            EnvelopeUnpacker::plain()
        };

        tokio::fs::create_dir_all(&ctx.logs_dir).await?;

        // The download lands in a tempfile that is removed when this op
        // returns, success or failure
        let download = tempfile::Builder::new()
            .prefix(&format!("{}-", id.source_key))
            .suffix(".zip")
            .tempfile_in(&ctx.logs_dir)?;

        tracing::info!(url = %id.resolved_url, "downloading bundle");
        crate::http::download(&ctx.client, &id.resolved_url, download.path()).await?;

        let file = std::fs::File::open(download.path())?;
        let mut archive = ZipArchive::new(file)?;
        let outputs = unpacker.unpack(&mut archive, &ctx.logs_dir)?;

        tracing::info!(files = outputs.len(), "bundle extracted");
        Ok(outputs
            .iter()
            .map(|path| path.display().to_string())
            .collect::<Vec<_>>()
            .join("\n"))
    }
}
