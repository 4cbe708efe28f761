#[tokio::main]
async fn main() -> anyhow::Result<()> {
    intuneget::app::run().await
}
