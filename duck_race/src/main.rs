#[tokio::main]
async fn main() -> std::io::Result<()> {
    duck_race::run_with_config().await
}
