//! Runtime configuration loader and common helpers.

use std::{fmt, fs, net::SocketAddr, path::Path, str::FromStr};

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use solana_sdk::{
    commitment_config::{CommitmentConfig, CommitmentLevel},
    native_token::LAMPORTS_PER_SOL,
    pubkey::Pubkey,
};

use crate::{utils::units, wallet::WalletIdentity};

pub const DEFAULT_SETTINGS_PATH: &str = "config/settings.json";
pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8899";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";

/// ------------------------------------------------------------------
/// Demo mint parameters
/// ------------------------------------------------------------------
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct DemoMintConfig {
    /// SOL airdropped to the throwaway authority before it pays for anything
    pub airdrop_sol: f64,
    pub decimals: u8,
    /// Display units minted into the connected wallet
    pub mint_amount: u64,
}

impl DemoMintConfig {
    /// Reject values the mint workflow or the balance display cannot carry.
    pub fn validate(&self) -> Result<()> {
        if self.decimals > units::MAX_TOKEN_DECIMALS {
            return Err(anyhow!(
                "demo_mint.decimals {} exceeds {}",
                self.decimals,
                units::MAX_TOKEN_DECIMALS
            ));
        }
        units::ui_to_raw(self.mint_amount, self.decimals).context("demo_mint.mint_amount")?;
        Settings::sol_to_lamports(self.airdrop_sol).context("demo_mint.airdrop_sol")?;
        Ok(())
    }
}

impl Default for DemoMintConfig {
    fn default() -> Self {
        Self {
            airdrop_sol: 1.0,
            decimals: 6,
            mint_amount: 1000,
        }
    }
}

/// ------------------------------------------------------------------
/// Main Settings object
/// ------------------------------------------------------------------
#[derive(Clone, PartialEq)]
pub struct Settings {
    /* -------- infrastructure ------------------------ */
    pub rpc_url: String,
    pub commitment: CommitmentLevel,
    pub confirm_timeout_secs: u64,
    pub listen_addr: String,

    /* -------- identity sources ---------------------- */
    pub wallet_keypair_path: Option<String>,
    pub wallets_file: Option<String>,
    pub active_wallet: Option<String>,
    pub wallet_address: Option<String>,

    /* -------- token --------------------------------- */
    pub known_mint: Option<Pubkey>,
    pub demo_mint: DemoMintConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            commitment: CommitmentLevel::Confirmed,
            confirm_timeout_secs: 30,
            listen_addr: DEFAULT_LISTEN_ADDR.to_string(),
            wallet_keypair_path: None,
            wallets_file: None,
            active_wallet: None,
            wallet_address: None,
            known_mint: None,
            demo_mint: DemoMintConfig::default(),
        }
    }
}

impl Settings {
    /// --------------------------------------------------------------
    /// Read `settings.json` from disk.
    /// --------------------------------------------------------------
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading settings file {:?}", path.as_ref()))?;
        Self::from_json_str(&raw)
            .with_context(|| format!("parsing settings file {:?}", path.as_ref()))
    }

    /// --------------------------------------------------------------
    /// Parse settings JSON; every key is optional.
    /// --------------------------------------------------------------
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let json: serde_json::Value = serde_json::from_str(raw)?;
        let opt_string = |key: &str| json[key].as_str().map(|s| s.to_string());

        /* -------- plain strings ---------------------------------- */
        let rpc_url = json["rpc_url"]
            .as_str()
            .unwrap_or(DEFAULT_RPC_URL)
            .to_string();
        let commitment_raw = json["commitment"].as_str().unwrap_or("confirmed");
        let commitment = CommitmentLevel::from_str(commitment_raw)
            .map_err(|_| anyhow!("unknown commitment level `{commitment_raw}`"))?;
        let listen_addr = json["listen_addr"]
            .as_str()
            .unwrap_or(DEFAULT_LISTEN_ADDR)
            .to_string();
        let confirm_timeout_secs = json["confirm_timeout_secs"].as_u64().unwrap_or(30);

        /* -------- identity sources ------------------------------- */
        let wallet_keypair_path = opt_string("wallet_keypair_path");
        let wallets_file = opt_string("wallets_file");
        let active_wallet = opt_string("active_wallet");
        let wallet_address = opt_string("wallet_address");

        /* -------- token ------------------------------------------ */
        let known_mint = match json["known_mint"].as_str() {
            Some(s) if !s.is_empty() => Some(
                Pubkey::from_str(s).with_context(|| format!("invalid known_mint `{s}`"))?,
            ),
            _ => None,
        };

        let demo_mint: DemoMintConfig = match json.get("demo_mint") {
            Some(value) => serde_json::from_value(value.clone()).context("parsing demo_mint")?,
            None => DemoMintConfig::default(),
        };
        demo_mint.validate()?;

        Ok(Self {
            rpc_url,
            commitment,
            confirm_timeout_secs,
            listen_addr,
            wallet_keypair_path,
            wallets_file,
            active_wallet,
            wallet_address,
            known_mint,
            demo_mint,
        })
    }

    /// --------------------------------------------------------------
    /// Load settings from default config/settings.json file.
    /// --------------------------------------------------------------
    pub fn load() -> Result<Self> {
        Self::load_from_file(DEFAULT_SETTINGS_PATH)
    }

    /// Like [`Settings::load_from_file`], but a missing file yields defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load_from_file(path)
        } else {
            log::info!(
                "⚙️ [CONFIG] {:?} not found, using local validator defaults",
                path.as_ref()
            );
            Ok(Self::default())
        }
    }

    /// --------------------------------------------------------------
    /// Save settings to a specific file path.
    /// --------------------------------------------------------------
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let settings_json = serde_json::json!({
            "rpc_url": self.rpc_url,
            "commitment": commitment_name(self.commitment),
            "confirm_timeout_secs": self.confirm_timeout_secs,
            "listen_addr": self.listen_addr,
            "wallet_keypair_path": self.wallet_keypair_path,
            "wallets_file": self.wallets_file,
            "active_wallet": self.active_wallet,
            "wallet_address": self.wallet_address,
            "known_mint": self.known_mint.map(|m| m.to_string()),
            "demo_mint": self.demo_mint,
        });

        let json_string = serde_json::to_string_pretty(&settings_json)?;
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&path, json_string)
            .with_context(|| format!("writing settings to {:?}", path.as_ref()))?;

        Ok(())
    }

    pub fn commitment_config(&self) -> CommitmentConfig {
        CommitmentConfig {
            commitment: self.commitment,
        }
    }

    pub fn listen_socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("invalid listen_addr `{}`", self.listen_addr))
    }

    /// --------------------------------------------------------------
    /// Helper: convert SOL → lamports and round to nearest integer.
    /// --------------------------------------------------------------
    pub fn sol_to_lamports(sol: f64) -> Result<u64> {
        if !sol.is_finite() || sol < 0.0 {
            return Err(anyhow!("invalid SOL amount {sol}"));
        }
        Ok((sol * LAMPORTS_PER_SOL as f64).round() as u64)
    }

    /// --------------------------------------------------------------
    /// Resolve the wallet identity from whichever source is configured.
    /// Keypair file wins over the wallets file, which wins over a bare address.
    /// --------------------------------------------------------------
    pub fn identity(&self) -> Result<Option<WalletIdentity>> {
        if let Some(path) = &self.wallet_keypair_path {
            return WalletIdentity::load_keypair_file(path).map(Some);
        }
        if let Some(file) = &self.wallets_file {
            let name = self
                .active_wallet
                .as_deref()
                .ok_or_else(|| anyhow!("wallets_file set without active_wallet"))?;
            return WalletIdentity::load_from_wallets_file(file, name).map(Some);
        }
        if let Some(address) = &self.wallet_address {
            return WalletIdentity::from_address(address).map(Some);
        }
        Ok(None)
    }
}

fn commitment_name(level: CommitmentLevel) -> &'static str {
    match level {
        CommitmentLevel::Processed => "processed",
        CommitmentLevel::Finalized => "finalized",
        _ => "confirmed",
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("rpc_url", &self.rpc_url)
            .field("commitment", &self.commitment)
            .field("listen_addr", &self.listen_addr)
            .field("known_mint", &self.known_mint)
            .field("demo_mint", &self.demo_mint)
            .finish_non_exhaustive()
    }
}
