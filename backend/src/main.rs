#[tokio::main]
async fn main() -> anyhow::Result<()> {
    intake::start_server().await
}
