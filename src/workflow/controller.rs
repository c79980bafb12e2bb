//! Owns the connection, the connected identity, and everything the display
//! surface renders. Each action is guarded by its own busy flag: a second
//! trigger while one is in flight is rejected, never queued.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use log::{debug, error, info, warn};
use tokio::sync::RwLock;

use crate::{
    config::settings::DemoMintConfig,
    rpc::Connection,
    view::WalletView,
    wallet::WalletIdentity,
    workflow::{balance, mint, BalanceSnapshot, MintError, MintRecord},
};

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Wallet not connected")]
    WalletNotConnected,

    #[error("{0} already in progress")]
    Busy(&'static str),

    #[error(transparent)]
    Mint(#[from] MintError),

    #[error("{0:#}")]
    Balance(#[source] anyhow::Error),
}

/// Everything the display surface renders. Mutated only by the controller.
#[derive(Clone, Debug, Default)]
pub struct WalletState {
    pub identity: Option<WalletIdentity>,
    pub snapshot: Option<BalanceSnapshot>,
    pub mint_record: Option<MintRecord>,
    pub refreshing: bool,
    pub minting: bool,
    pub last_error: Option<String>,
}

impl WalletState {
    /// Store `snapshot` only if it was taken for the wallet and mint that are
    /// current now. A refresh that outlived a `connect` or a new mint is dropped.
    fn commit_snapshot(&mut self, snapshot: &BalanceSnapshot) {
        let owner = self.identity.as_ref().map(|identity| identity.pubkey());
        let mint = self.mint_record.as_ref().map(|record| record.mint);
        if owner != Some(snapshot.owner) || mint != snapshot.mint {
            debug!(
                "🗑️ [BALANCE] Dropping stale snapshot for {} (mint {:?})",
                snapshot.owner, snapshot.mint
            );
            return;
        }
        self.snapshot = Some(snapshot.clone());
    }
}

/// Clears the busy flag when the action finishes, however it finishes.
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool, action: &'static str) -> Result<Self, WorkflowError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| BusyGuard(flag))
            .map_err(|_| WorkflowError::Busy(action))
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct WalletController {
    connection: Connection,
    demo_mint: DemoMintConfig,
    state: RwLock<WalletState>,
    refreshing: AtomicBool,
    minting: AtomicBool,
}

impl WalletController {
    pub fn new(
        connection: Connection,
        demo_mint: DemoMintConfig,
        identity: Option<WalletIdentity>,
        known_mint: Option<MintRecord>,
    ) -> Self {
        Self {
            connection,
            demo_mint,
            state: RwLock::new(WalletState {
                identity,
                mint_record: known_mint,
                ..WalletState::default()
            }),
            refreshing: AtomicBool::new(false),
            minting: AtomicBool::new(false),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Swap in a new identity. Balances belong to the old wallet, so they go.
    pub async fn connect(&self, identity: WalletIdentity) {
        info!("🔗 [WALLET] Connected {}", identity.pubkey());
        let mut state = self.state.write().await;
        state.identity = Some(identity);
        state.snapshot = None;
        state.last_error = None;
    }

    pub async fn disconnect(&self) {
        let mut state = self.state.write().await;
        if let Some(identity) = state.identity.take() {
            info!("🔌 [WALLET] Disconnected {}", identity.pubkey());
        }
        state.snapshot = None;
        state.last_error = None;
    }

    pub async fn state(&self) -> WalletState {
        self.state.read().await.clone()
    }

    pub async fn view(&self) -> WalletView {
        WalletView::from_state(&*self.state.read().await)
    }

    /// Refresh balances for the connected wallet against the current mint.
    /// `Ok(None)` when no wallet is connected.
    pub async fn refresh_balances(&self) -> Result<Option<BalanceSnapshot>, WorkflowError> {
        let _busy = BusyGuard::acquire(&self.refreshing, "Balance refresh")?;

        let (identity, known_mint) = {
            let mut state = self.state.write().await;
            state.refreshing = true;
            state.last_error = None;
            (state.identity.clone(), state.mint_record.clone())
        };

        let result = self.refresh_inner(identity.as_ref(), known_mint.as_ref()).await;

        let mut state = self.state.write().await;
        state.refreshing = false;
        match result {
            Ok(snapshot) => {
                if let Some(snapshot) = &snapshot {
                    state.commit_snapshot(snapshot);
                }
                Ok(snapshot)
            }
            Err(e) => {
                error!(
                    "❌ [BALANCE] Refresh for {} failed: {}",
                    identity.as_ref().map(|i| i.pubkey().to_string()).unwrap_or_default(),
                    e
                );
                state.last_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Run the demo mint for the connected wallet, keep the new mint, and
    /// refresh balances against it.
    pub async fn mint_demo_token(&self) -> Result<MintRecord, WorkflowError> {
        let identity = self
            .state
            .read()
            .await
            .identity
            .clone()
            .ok_or(WorkflowError::WalletNotConnected)?;

        let _busy = BusyGuard::acquire(&self.minting, "Minting")?;
        {
            let mut state = self.state.write().await;
            state.minting = true;
            state.last_error = None;
        }

        let client = self.connection.get_connection();
        let result = mint::mint_demo_token(client.as_ref(), &identity, &self.demo_mint).await;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                error!("❌ [MINT] {}", e);
                let mut state = self.state.write().await;
                state.minting = false;
                state.last_error = Some(e.to_string());
                return Err(e.into());
            }
        };

        {
            let mut state = self.state.write().await;
            state.mint_record = Some(record.clone());
        }

        // The mint stands even if the follow-up refresh fails.
        let refreshed = self.refresh_inner(Some(&identity), Some(&record)).await;

        let mut state = self.state.write().await;
        state.minting = false;
        match refreshed {
            Ok(Some(snapshot)) => {
                state.commit_snapshot(&snapshot);
            }
            Ok(None) => {}
            Err(e) => {
                warn!("⚠️ [MINT] Minted {} but refresh failed: {}", record.mint, e);
                state.last_error = Some(e.to_string());
            }
        }
        Ok(record)
    }

    async fn refresh_inner(
        &self,
        identity: Option<&WalletIdentity>,
        known_mint: Option<&MintRecord>,
    ) -> Result<Option<BalanceSnapshot>, WorkflowError> {
        let client = self.connection.get_connection();
        balance::refresh_balances(client.as_ref(), identity, known_mint)
            .await
            .map_err(WorkflowError::Balance)
    }
}
