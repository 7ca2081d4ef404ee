#[tokio::main]
async fn main() -> anyhow::Result<()> {
    price_scout::run().await
}
