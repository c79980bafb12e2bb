//! Balance refresh.
//!
//! Native balance is a hard requirement: a transport failure aborts the
//! refresh. Token balance is best effort: a missing account or a failed
//! lookup reads as zero.

use anyhow::Result;
use chrono::Utc;
use log::{debug, info, warn};
use rust_decimal::Decimal;
use solana_sdk::pubkey::Pubkey;
use spl_associated_token_account::get_associated_token_address;

use crate::{
    rpc::ChainClient,
    utils::units,
    wallet::WalletIdentity,
    workflow::{BalanceSnapshot, MintRecord},
};

/// Refresh balances for `identity`. Returns `Ok(None)` when no wallet is connected.
pub async fn refresh_balances(
    client: &dyn ChainClient,
    identity: Option<&WalletIdentity>,
    known_mint: Option<&MintRecord>,
) -> Result<Option<BalanceSnapshot>> {
    let owner = match identity {
        Some(identity) => identity.pubkey(),
        None => {
            debug!("💤 [BALANCE] No wallet connected, skipping refresh");
            return Ok(None);
        }
    };

    let lamports = client.get_balance(&owner).await?;
    let native_balance = units::lamports_to_sol(lamports);

    let token_balance = match known_mint {
        Some(record) => token_balance(client, &owner, record).await,
        None => Decimal::ZERO,
    };

    info!(
        "💰 [BALANCE] {} → {} SOL, {} tokens",
        owner, native_balance, token_balance
    );

    Ok(Some(BalanceSnapshot {
        owner,
        native_balance,
        token_balance: Some(token_balance),
        mint: known_mint.map(|r| r.mint),
        refreshed_at: Utc::now(),
    }))
}

/// Never fails: every error path reads as an empty account.
async fn token_balance(client: &dyn ChainClient, owner: &Pubkey, record: &MintRecord) -> Decimal {
    let ata = get_associated_token_address(owner, &record.mint);
    match client.get_token_account_amount(&ata).await {
        Ok(Some(raw)) => units::raw_to_ui(raw, record.decimals as u32).unwrap_or_else(|e| {
            warn!("⚠️ [BALANCE] Token account {} unreadable: {:#}", ata, e);
            Decimal::ZERO
        }),
        Ok(None) => {
            debug!("📭 [BALANCE] Token account {} does not exist yet", ata);
            Decimal::ZERO
        }
        Err(e) => {
            warn!("⚠️ [BALANCE] Token balance lookup for {} failed: {:#}", ata, e);
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::mock::MockChain;

    fn record(mint: Pubkey) -> MintRecord {
        MintRecord::new(mint, units::DEMO_TOKEN_DECIMALS)
    }

    #[tokio::test]
    async fn no_identity_is_a_noop() {
        let chain = MockChain::new();
        let snapshot = refresh_balances(&chain, None, None).await.unwrap();
        assert!(snapshot.is_none());
        assert_eq!(MockChain::count(&chain.balance_calls), 0);
    }

    #[tokio::test]
    async fn without_mint_token_balance_is_zero_and_never_queried() {
        let owner = Pubkey::new_unique();
        let chain = MockChain::new().with_balance(owner, 2_500_000_000);
        let identity = WalletIdentity::from_pubkey(owner);

        let snapshot = refresh_balances(&chain, Some(&identity), None)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(units::format_fixed(snapshot.native_balance, 4), "2.5000");
        assert_eq!(snapshot.token_balance, Some(Decimal::ZERO));
        assert_eq!(snapshot.mint, None);
        assert_eq!(MockChain::count(&chain.token_lookups), 0);
    }

    #[tokio::test]
    async fn funded_token_account_divides_by_ten_to_the_six() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let chain = MockChain::new()
            .with_balance(owner, 1)
            .with_token_balance(&owner, &mint, 1_234_500_000);
        let identity = WalletIdentity::from_pubkey(owner);

        let snapshot = refresh_balances(&chain, Some(&identity), Some(&record(mint)))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.token_balance, Some(Decimal::new(12345, 1)));
        assert_eq!(snapshot.mint, Some(mint));
        assert_eq!(MockChain::count(&chain.token_lookups), 1);
    }

    #[tokio::test]
    async fn missing_or_failing_token_account_reads_as_zero() {
        let owner = Pubkey::new_unique();
        let chain = MockChain::new().with_balance(owner, 5);
        let identity = WalletIdentity::from_pubkey(owner);
        let mint = record(Pubkey::new_unique());

        let missing = refresh_balances(&chain, Some(&identity), Some(&mint))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(missing.token_balance, Some(Decimal::ZERO));

        chain.set_token_lookup_failure(true);
        let failing = refresh_balances(&chain, Some(&identity), Some(&mint))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(failing.token_balance, Some(Decimal::ZERO));
    }

    #[tokio::test]
    async fn unrepresentable_decimals_read_as_zero() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let chain = MockChain::new()
            .with_balance(owner, 1)
            .with_token_balance(&owner, &mint, 1_000);
        let identity = WalletIdentity::from_pubkey(owner);

        let snapshot = refresh_balances(&chain, Some(&identity), Some(&MintRecord::new(mint, 29)))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(snapshot.token_balance, Some(Decimal::ZERO));
        assert_eq!(MockChain::count(&chain.token_lookups), 1);
    }

    #[tokio::test]
    async fn native_failure_aborts_without_snapshot() {
        let owner = Pubkey::new_unique();
        let mint = Pubkey::new_unique();
        let chain = MockChain::new().with_token_balance(&owner, &mint, 10);
        chain.set_native_balance_failure(true);
        let identity = WalletIdentity::from_pubkey(owner);

        let err = refresh_balances(&chain, Some(&identity), Some(&record(mint)))
            .await
            .unwrap_err();

        assert_eq!(format!("{err:#}"), "connection refused");
        assert_eq!(MockChain::count(&chain.token_lookups), 0);
    }
}
