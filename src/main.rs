#[tokio::main]
async fn main() -> anyhow::Result<()> {
    flash_gym::start().await
}
