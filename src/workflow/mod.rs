//! Wallet workflows: balance refresh and the demo mint sequence, plus the
//! controller that owns the state the display surface reads.

pub mod balance;
pub mod controller;
pub mod mint;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

pub use controller::{WalletController, WalletState, WorkflowError};
pub use mint::{MintError, MintStep};

/// Mint created by the last successful demo run (or seeded from config).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MintRecord {
    #[serde(with = "pubkey_string")]
    pub mint: Pubkey,
    pub decimals: u8,
    pub created_at: DateTime<Utc>,
}

impl MintRecord {
    pub fn new(mint: Pubkey, decimals: u8) -> Self {
        Self {
            mint,
            decimals,
            created_at: Utc::now(),
        }
    }
}

/// Result of one refresh. Replaced wholesale by the next one.
#[derive(Clone, Debug, PartialEq)]
pub struct BalanceSnapshot {
    pub owner: Pubkey,
    /// SOL
    pub native_balance: Decimal,
    /// Display units of `mint`; zero when no mint is known.
    pub token_balance: Option<Decimal>,
    pub mint: Option<Pubkey>,
    pub refreshed_at: DateTime<Utc>,
}

mod pubkey_string {
    use serde::Serializer;
    use solana_sdk::pubkey::Pubkey;

    pub fn serialize<S: Serializer>(pubkey: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(pubkey)
    }
}
