use anyhow::Result;
use celotx::app::runner;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    runner::run().await
}
