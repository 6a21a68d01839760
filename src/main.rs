#[tokio::main]
async fn main() -> anyhow::Result<()> {
    carbot_dashboard::run().await
}
