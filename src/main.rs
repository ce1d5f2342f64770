use anyhow::Result;
use smart_scheduler::cli;

#[tokio::main]
async fn main() -> Result<()> {
    cli::run().await
}
