#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

//! Check IMAP and SMTP connectivity of every GNOME Online Accounts
//! mail account that signs in with `OAuth2`.

use goa_mailcheck::{Config, driver, goa};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env()?;
    let accounts = goa::fetch_accounts().await?;

    let mut stdout = std::io::stdout().lock();
    driver::run(&accounts, &config, &mut stdout).await?;

    Ok(())
}
