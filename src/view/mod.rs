//! What the display surface renders, already formatted.

use serde::Serialize;

use crate::{utils::units, workflow::WalletState};

pub const LOADING: &str = "Loading...";

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WalletView {
    pub connected: bool,
    pub address: Option<String>,
    /// SOL, 4 decimal places
    pub native_balance: String,
    /// Token, 2 decimal places
    pub token_balance: String,
    pub mint_address: Option<String>,
    pub refreshing: bool,
    pub minting: bool,
    pub error: Option<String>,
}

impl WalletView {
    pub fn from_state(state: &WalletState) -> Self {
        let snapshot = state.snapshot.as_ref();
        Self {
            connected: state.identity.is_some(),
            address: state.identity.as_ref().map(|i| i.pubkey().to_string()),
            native_balance: snapshot
                .map(|s| units::format_fixed(s.native_balance, 4))
                .unwrap_or_else(|| LOADING.to_string()),
            token_balance: snapshot
                .and_then(|s| s.token_balance)
                .map(|t| units::format_fixed(t, 2))
                .unwrap_or_else(|| LOADING.to_string()),
            mint_address: state.mint_record.as_ref().map(|r| r.mint.to_string()),
            refreshing: state.refreshing,
            minting: state.minting,
            error: state.last_error.clone(),
        }
    }

    /// Plain-text rendering for the CLI.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "Address:       {}\n",
            self.address.as_deref().unwrap_or("(not connected)")
        ));
        out.push_str(&format!("SOL balance:   {}\n", self.native_balance));
        out.push_str(&format!("Token balance: {}\n", self.token_balance));
        if let Some(mint) = &self.mint_address {
            out.push_str(&format!("Mint:          {}\n", mint));
        }
        if let Some(error) = &self.error {
            out.push_str(&format!("Error:         {}\n", error));
        }
        out
    }
}
