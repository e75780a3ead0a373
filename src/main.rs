//! EMS Deck command line entry point

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    emsdeck::cli::run().await
}
