// CLI modules
mod args;
mod http;
mod op;
mod ops;

use args::Args;
use clap::{Parser, Subcommand};
use op::command_enum;
use ops::{Fetch, Pack, Version};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

command_enum! {
    (Fetch, Fetch),
    (Pack, Pack),
    (Version, Version),
}

/// Diagnostics go to stderr so stdout stays parseable (the list of
/// extracted paths, or the bundle identifier).
fn init_logging() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::WARN.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(stderr_layer).init();
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logging();

    let ctx = match op::OpContext::new(args.logs_dir) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error: failed to create HTTP client: {}", e);
            std::process::exit(1);
        }
    };

    match args.command.execute(&ctx).await {
        Ok(output) => {
            println!("{}", output);
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
