use std::path::PathBuf;

use clap::Parser;

use crate::Command;

#[derive(Parser, Debug)]
#[command(
    name = "logdrop",
    version,
    about = "Fetch, decrypt, and unpack diagnostic-log bundles"
)]
pub struct Args {
    /// Directory bundles are downloaded to and extracted under
    #[arg(long, global = true, default_value = "logs")]
    pub logs_dir: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}
