use clap::Args;

#[derive(Args, Debug, Clone)]
pub struct Version {}

#[async_trait::async_trait]
impl crate::op::Op for Version {
    type Error = std::convert::Infallible;
    type Output = String;

    async fn execute(&self, _ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        Ok(format!(
            "logdrop {}\n\
             - repo: {}\n\
             - built: {} ({})\n\
             - rustc: {}",
            env!("CARGO_PKG_VERSION"),
            env!("REPO_VERSION"),
            env!("BUILD_TIMESTAMP"),
            env!("BUILD_PROFILE"),
            env!("RUST_VERSION"),
        ))
    }
}
