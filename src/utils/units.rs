//! Fixed power-of-ten conversions between raw on-chain amounts and display units.

use anyhow::{anyhow, Result};
use rust_decimal::{Decimal, RoundingStrategy};

/// Lamports are 10^-9 SOL.
pub const NATIVE_DECIMALS: u32 = 9;

/// Decimal precision of the demo token mint.
pub const DEMO_TOKEN_DECIMALS: u8 = 6;

/// Largest token precision accepted from configuration.
pub const MAX_TOKEN_DECIMALS: u8 = 9;

/// Raw integer amount → display decimal, exact. Fails when `decimals` is
/// beyond what `Decimal` can carry.
pub fn raw_to_ui(raw: u64, decimals: u32) -> Result<Decimal> {
    Decimal::try_from_i128_with_scale(raw as i128, decimals)
        .map_err(|e| anyhow!("{raw} with {decimals} decimals: {e}"))
}

pub fn lamports_to_sol(lamports: u64) -> Decimal {
    Decimal::from_i128_with_scale(lamports as i128, NATIVE_DECIMALS)
}

/// Whole display units → raw units (`amount × 10^decimals`).
pub fn ui_to_raw(amount: u64, decimals: u8) -> Result<u64> {
    10u64
        .checked_pow(decimals as u32)
        .and_then(|factor| amount.checked_mul(factor))
        .ok_or_else(|| anyhow!("{amount} with {decimals} decimals overflows u64"))
}

/// Render with exactly `places` fractional digits, rounding half away from zero.
pub fn format_fixed(value: Decimal, places: u32) -> String {
    let rounded = value.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.*}", places as usize, rounded)
}
