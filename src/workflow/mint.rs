//! Demo token mint: five dependent steps, each failure tagged with its step.
//!
//! Every run creates a throwaway authority and a brand new mint. This is only
//! acceptable against a disposable local test validator.

use std::fmt;

use anyhow::anyhow;
use log::{info, warn};
use solana_sdk::signature::{Keypair, Signer};

use crate::{
    config::settings::{DemoMintConfig, Settings},
    rpc::ChainClient,
    utils::units,
    wallet::WalletIdentity,
    workflow::MintRecord,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MintStep {
    GenerateAuthority,
    Airdrop,
    CreateMint,
    CreateTokenAccount,
    MintTokens,
}

impl MintStep {
    pub fn label(&self) -> &'static str {
        match self {
            MintStep::GenerateAuthority => "Authority generation",
            MintStep::Airdrop => "Airdrop",
            MintStep::CreateMint => "Mint creation",
            MintStep::CreateTokenAccount => "Token account creation",
            MintStep::MintTokens => "Minting tokens",
        }
    }
}

impl fmt::Display for MintStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("{step} failed: {source:#}")]
pub struct MintError {
    pub step: MintStep,
    #[source]
    pub source: anyhow::Error,
}

impl MintError {
    fn at(step: MintStep) -> impl FnOnce(anyhow::Error) -> MintError {
        move |source| MintError { step, source }
    }
}

/// Run the full sequence and return the new mint. Nothing is rolled back on
/// failure; a funded authority from an aborted run is simply abandoned.
pub async fn mint_demo_token(
    client: &dyn ChainClient,
    identity: &WalletIdentity,
    config: &DemoMintConfig,
) -> Result<MintRecord, MintError> {
    let owner = identity.pubkey();
    warn!("🧪 [MINT] Fresh mint + throwaway authority per run: local test validator only");

    /* -------- 1. ephemeral authority ------------------------------ */
    let authority = Keypair::new();
    info!("🔑 [MINT] Ephemeral authority {}", authority.pubkey());

    /* -------- 2. airdrop ------------------------------------------ */
    let lamports =
        Settings::sol_to_lamports(config.airdrop_sol).map_err(MintError::at(MintStep::Airdrop))?;
    let signature = client
        .request_airdrop(&authority.pubkey(), lamports)
        .await
        .map_err(MintError::at(MintStep::Airdrop))?;
    client
        .confirm_signature(&signature)
        .await
        .map_err(MintError::at(MintStep::Airdrop))?;
    let funded = client
        .get_balance(&authority.pubkey())
        .await
        .map_err(MintError::at(MintStep::Airdrop))?;
    if funded == 0 {
        return Err(MintError::at(MintStep::Airdrop)(anyhow!(
            "authority {} still has a zero balance after confirmed airdrop {}",
            authority.pubkey(),
            signature
        )));
    }
    info!(
        "🪂 [MINT] Airdrop confirmed, authority holds {} SOL",
        units::lamports_to_sol(funded)
    );

    /* -------- 3. mint --------------------------------------------- */
    let mint = client
        .create_mint(&authority, &authority.pubkey(), None, config.decimals)
        .await
        .map_err(MintError::at(MintStep::CreateMint))?;
    info!("🪙 [MINT] Created mint {} ({} decimals)", mint, config.decimals);

    /* -------- 4. connected wallet's token account ----------------- */
    let token_account = client
        .get_or_create_associated_token_account(&authority, &mint, &owner)
        .await
        .map_err(MintError::at(MintStep::CreateTokenAccount))?;
    info!("📦 [MINT] Token account {} for {}", token_account, owner);

    /* -------- 5. mint to ------------------------------------------ */
    let raw_amount = units::ui_to_raw(config.mint_amount, config.decimals)
        .map_err(MintError::at(MintStep::MintTokens))?;
    let signature = client
        .mint_to(&authority, &mint, &token_account, &authority, raw_amount)
        .await
        .map_err(MintError::at(MintStep::MintTokens))?;
    info!(
        "✅ [MINT] Minted {} tokens to {} ({})",
        config.mint_amount, token_account, signature
    );

    Ok(MintRecord::new(mint, config.decimals))
}
