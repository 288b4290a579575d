#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = auction_api::run().await {
        eprintln!("auction-api fatal: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}
