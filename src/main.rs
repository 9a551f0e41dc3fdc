//! Momentum Radar - early-move ranking for crypto markets
//!
//! Ranks crypto assets by a momentum score built from perpetual tickers,
//! trending coins and a broad market listing.

use anyhow::Result;

use momentum_radar::adapters::cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (API URL overrides go here)
    dotenvy::dotenv().ok();

    let app = cli::init();
    cli::execute(app).await
}
