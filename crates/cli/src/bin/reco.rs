use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    reco_cli::main_entry().await
}
