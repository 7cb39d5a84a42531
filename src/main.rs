use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    labelpilot_cli::cli::app::run().await
}
