//! Token mint demo against a local test validator.
//!
//! Usage: cargo run --bin token_demo -- [--config config/settings.json] <serve|balance|mint|status>

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use solana_sdk::pubkey::Pubkey;

use token_mint_demo::{
    api,
    config::settings::{Settings, DEFAULT_SETTINGS_PATH},
    rpc::Connection,
    workflow::{MintRecord, WalletController},
};

#[derive(Parser)]
#[command(name = "token_demo", about = "SOL + SPL token balances and demo minting on a local validator")]
struct Cli {
    /// Settings JSON; defaults are used when the file does not exist
    #[arg(long, default_value = DEFAULT_SETTINGS_PATH)]
    config: PathBuf,

    /// Override `rpc_url`
    #[arg(long)]
    rpc_url: Option<String>,

    /// Keypair file, or a bare address for read-only use
    #[arg(long)]
    wallet: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the browser UI and JSON API
    Serve {
        #[arg(long)]
        listen: Option<String>,
    },
    /// Print SOL and token balances for the configured wallet
    Balance {
        /// Token mint to look up instead of `known_mint`
        #[arg(long)]
        mint: Option<String>,
    },
    /// Create a fresh demo mint and mint tokens into the configured wallet
    Mint,
    /// Check that the validator answers
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut settings = Settings::load_or_default(&cli.config)?;
    if let Some(url) = cli.rpc_url {
        settings.rpc_url = url;
    }
    if let Some(wallet) = cli.wallet {
        if Path::new(&wallet).exists() {
            settings.wallet_keypair_path = Some(wallet);
        } else {
            settings.wallet_keypair_path = None;
            settings.wallets_file = None;
            settings.wallet_address = Some(wallet);
        }
    }
    if let Command::Balance { mint: Some(mint) } = &cli.command {
        settings.known_mint =
            Some(Pubkey::from_str(mint).with_context(|| format!("invalid mint `{mint}`"))?);
    }

    let connection = Connection::establish(&settings)?;
    let identity = settings.identity()?;
    let known_mint = settings
        .known_mint
        .map(|mint| MintRecord::new(mint, settings.demo_mint.decimals));
    let controller = WalletController::new(
        connection.clone(),
        settings.demo_mint.clone(),
        identity.clone(),
        known_mint,
    )
    .shared();

    match cli.command {
        Command::Status => {
            let slot = connection
                .get_connection()
                .get_slot()
                .await
                .with_context(|| format!("querying slot from {}", connection.endpoint()))?;
            println!("🔌 Endpoint: {}", connection.endpoint());
            println!("📏 Slot:     {}", slot);
            match &identity {
                Some(identity) => println!(
                    "👛 Wallet:   {} ({})",
                    identity.pubkey(),
                    if identity.can_sign() { "keypair" } else { "read-only" }
                ),
                None => println!("👛 Wallet:   (none configured)"),
            }
        }
        Command::Balance { .. } => {
            if identity.is_none() {
                return Err(anyhow!("no wallet configured (use --wallet or settings)"));
            }
            controller.refresh_balances().await?;
            print!("{}", controller.view().await.render_text());
        }
        Command::Mint => {
            let record = controller.mint_demo_token().await?;
            println!("🪙 New demo mint: {}", record.mint);
            print!("{}", controller.view().await.render_text());
        }
        Command::Serve { listen } => {
            if let Some(listen) = listen {
                settings.listen_addr = listen;
            }
            let addr = settings.listen_socket_addr()?;
            if identity.is_some() {
                if let Err(e) = controller.refresh_balances().await {
                    log::warn!("⚠️ [API] Initial refresh failed: {}", e);
                }
            }
            println!("🌐 Open http://{} in a browser", addr);
            api::serve(addr, controller).await?;
        }
    }

    Ok(())
}
