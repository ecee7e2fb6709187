use std::path::PathBuf;

const USER_AGENT: &str = concat!("logdrop/", env!("CARGO_PKG_VERSION"));

/// Shared context handed to every operation
///
/// Holds the HTTP client for the fetch/upload collaborators and the
/// root directory bundles are extracted under.
pub struct OpContext {
    pub client: reqwest::Client,
    pub logs_dir: PathBuf,
}

impl OpContext {
    pub fn new(logs_dir: PathBuf) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self { client, logs_dir })
    }
}

/// One CLI operation
///
/// Each subcommand implements this with its own error type; the
/// `command_enum!` macro in `main.rs` generates the dispatch.
#[async_trait::async_trait]
pub trait Op {
    type Error: std::error::Error + Send + Sync + 'static;
    type Output: std::fmt::Display;

    async fn execute(&self, ctx: &OpContext) -> Result<Self::Output, Self::Error>;
}

macro_rules! command_enum {
    ($(($variant:ident, $op:ty)),* $(,)?) => {
        #[derive(Subcommand, Debug, Clone)]
        pub enum Command {
            $(
                $variant($op),
            )*
        }

        impl Command {
            pub async fn execute(
                &self,
                ctx: &crate::op::OpContext,
            ) -> Result<String, anyhow::Error> {
                match self {
                    $(
                        Command::$variant(op) => crate::op::Op::execute(op, ctx)
                            .await
                            .map(|output| output.to_string())
                            .map_err(anyhow::Error::new),
                    )*
                }
            }
        }
    };
}
pub(crate) use command_enum;
