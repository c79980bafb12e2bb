//! In-memory `ChainClient` for workflow tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
};
use spl_associated_token_account::get_associated_token_address;
use tokio::sync::Semaphore;

use crate::rpc::iface::ChainClient;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailPoint {
    Airdrop,
    Confirm,
    CreateMint,
    CreateTokenAccount,
    MintTo,
}

pub struct MockChain {
    balances: Mutex<HashMap<Pubkey, u64>>,
    token_accounts: Mutex<HashMap<Pubkey, u64>>,
    ata_owners: Mutex<Vec<Pubkey>>,
    airdrop_credits: AtomicBool,
    fail_native_balance: AtomicBool,
    fail_token_lookup: AtomicBool,
    fail_point: Mutex<Option<FailPoint>>,
    /// When present, `get_balance` waits for a permit before answering.
    balance_gate: Option<Semaphore>,

    pub balance_calls: AtomicUsize,
    pub token_lookups: AtomicUsize,
    pub airdrop_calls: AtomicUsize,
    pub create_mint_calls: AtomicUsize,
    pub ata_calls: AtomicUsize,
    pub mint_to_calls: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            balances: Mutex::new(HashMap::new()),
            token_accounts: Mutex::new(HashMap::new()),
            ata_owners: Mutex::new(Vec::new()),
            airdrop_credits: AtomicBool::new(true),
            fail_native_balance: AtomicBool::new(false),
            fail_token_lookup: AtomicBool::new(false),
            fail_point: Mutex::new(None),
            balance_gate: None,
            balance_calls: AtomicUsize::new(0),
            token_lookups: AtomicUsize::new(0),
            airdrop_calls: AtomicUsize::new(0),
            create_mint_calls: AtomicUsize::new(0),
            ata_calls: AtomicUsize::new(0),
            mint_to_calls: AtomicUsize::new(0),
        }
    }

    pub fn gated() -> Self {
        Self {
            balance_gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub fn open_gate(&self, permits: usize) {
        if let Some(gate) = &self.balance_gate {
            gate.add_permits(permits);
        }
    }

    pub fn with_balance(self, address: Pubkey, lamports: u64) -> Self {
        self.balances.lock().unwrap().insert(address, lamports);
        self
    }

    /// Seed the owner's associated token account for `mint` with `raw` units.
    pub fn with_token_balance(self, owner: &Pubkey, mint: &Pubkey, raw: u64) -> Self {
        let ata = get_associated_token_address(owner, mint);
        self.token_accounts.lock().unwrap().insert(ata, raw);
        self
    }

    pub fn without_airdrop_credit(self) -> Self {
        self.airdrop_credits.store(false, Ordering::SeqCst);
        self
    }

    pub fn failing_at(self, point: FailPoint) -> Self {
        *self.fail_point.lock().unwrap() = Some(point);
        self
    }

    pub fn set_native_balance_failure(&self, fail: bool) {
        self.fail_native_balance.store(fail, Ordering::SeqCst);
    }

    pub fn set_token_lookup_failure(&self, fail: bool) {
        self.fail_token_lookup.store(fail, Ordering::SeqCst);
    }

    pub fn ata_owners(&self) -> Vec<Pubkey> {
        self.ata_owners.lock().unwrap().clone()
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn check(&self, point: FailPoint) -> Result<()> {
        if *self.fail_point.lock().unwrap() == Some(point) {
            return Err(anyhow!("injected failure at {point:?}"));
        }
        Ok(())
    }
}

#[async_trait]
impl ChainClient for MockChain {
    fn endpoint(&self) -> String {
        "mock://validator".to_string()
    }

    async fn get_slot(&self) -> Result<u64> {
        Ok(42)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.balance_gate {
            gate.acquire().await?.forget();
        }
        if self.fail_native_balance.load(Ordering::SeqCst) {
            return Err(anyhow!("connection refused"));
        }
        Ok(self.balances.lock().unwrap().get(address).copied().unwrap_or(0))
    }

    async fn get_token_account_amount(&self, token_account: &Pubkey) -> Result<Option<u64>> {
        self.token_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_token_lookup.load(Ordering::SeqCst) {
            return Err(anyhow!("token account lookup failed"));
        }
        Ok(self.token_accounts.lock().unwrap().get(token_account).copied())
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature> {
        self.airdrop_calls.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::Airdrop)?;
        if self.airdrop_credits.load(Ordering::SeqCst) {
            *self.balances.lock().unwrap().entry(*address).or_insert(0) += lamports;
        }
        Ok(Signature::new_unique())
    }

    async fn confirm_signature(&self, _signature: &Signature) -> Result<()> {
        self.check(FailPoint::Confirm)
    }

    async fn create_mint(
        &self,
        _payer: &Keypair,
        _mint_authority: &Pubkey,
        _freeze_authority: Option<&Pubkey>,
        _decimals: u8,
    ) -> Result<Pubkey> {
        self.create_mint_calls.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::CreateMint)?;
        Ok(Keypair::new().pubkey())
    }

    async fn get_or_create_associated_token_account(
        &self,
        _payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<Pubkey> {
        self.ata_calls.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::CreateTokenAccount)?;
        self.ata_owners.lock().unwrap().push(*owner);
        let ata = get_associated_token_address(owner, mint);
        self.token_accounts.lock().unwrap().entry(ata).or_insert(0);
        Ok(ata)
    }

    async fn mint_to(
        &self,
        _payer: &Keypair,
        _mint: &Pubkey,
        destination: &Pubkey,
        _authority: &Keypair,
        amount: u64,
    ) -> Result<Signature> {
        self.mint_to_calls.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::MintTo)?;
        let mut accounts = self.token_accounts.lock().unwrap();
        let balance = accounts
            .get_mut(destination)
            .ok_or_else(|| anyhow!("destination {destination} does not exist"))?;
        *balance += amount;
        Ok(Signature::new_unique())
    }
}
