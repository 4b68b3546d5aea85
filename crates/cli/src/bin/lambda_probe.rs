use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    probe_cli::main_entry().await
}
