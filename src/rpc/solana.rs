//! `ChainClient` backed by the nonblocking `solana-client` RPC client.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::{debug, info};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_program::program_pack::Pack;
use solana_sdk::{
    commitment_config::CommitmentConfig,
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    system_instruction,
    transaction::Transaction,
};
use spl_associated_token_account::{
    get_associated_token_address, instruction::create_associated_token_account_idempotent,
};
use spl_token::state::{Account as TokenAccount, Mint};

use crate::rpc::iface::ChainClient;

const CONFIRM_POLL_INTERVAL: Duration = Duration::from_millis(500);

pub struct SolanaChainClient {
    rpc: RpcClient,
    confirm_timeout: Duration,
}

impl SolanaChainClient {
    pub fn new(rpc_url: String, commitment: CommitmentConfig, confirm_timeout: Duration) -> Self {
        info!(
            "🔌 [RPC] Client for {} ({:?} commitment)",
            rpc_url, commitment.commitment
        );
        Self {
            rpc: RpcClient::new_with_commitment(rpc_url, commitment),
            confirm_timeout,
        }
    }

    async fn account_exists(&self, address: &Pubkey) -> Result<bool> {
        let response = self
            .rpc
            .get_account_with_commitment(address, self.rpc.commitment())
            .await?;
        Ok(response.value.is_some())
    }

    /// Sign with `payer` plus `extra` signers, send, and wait for the client commitment.
    async fn send_and_confirm(
        &self,
        instructions: &[Instruction],
        payer: &Keypair,
        extra: &[&Keypair],
    ) -> Result<Signature> {
        let blockhash = self
            .rpc
            .get_latest_blockhash()
            .await
            .context("fetching latest blockhash")?;

        let mut signers: Vec<&Keypair> = vec![payer];
        for signer in extra {
            if signer.pubkey() != payer.pubkey() {
                signers.push(signer);
            }
        }

        let tx = Transaction::new_signed_with_payer(
            instructions,
            Some(&payer.pubkey()),
            signers.as_slice(),
            blockhash,
        );
        let signature = self.rpc.send_and_confirm_transaction(&tx).await?;
        debug!("📨 [RPC] Confirmed transaction {}", signature);
        Ok(signature)
    }
}

#[async_trait]
impl ChainClient for SolanaChainClient {
    fn endpoint(&self) -> String {
        self.rpc.url()
    }

    async fn get_slot(&self) -> Result<u64> {
        Ok(self.rpc.get_slot().await?)
    }

    async fn get_balance(&self, address: &Pubkey) -> Result<u64> {
        Ok(self.rpc.get_balance(address).await?)
    }

    async fn get_token_account_amount(&self, token_account: &Pubkey) -> Result<Option<u64>> {
        let response = self
            .rpc
            .get_account_with_commitment(token_account, self.rpc.commitment())
            .await?;
        match response.value {
            Some(account) => {
                let state = TokenAccount::unpack(&account.data)
                    .map_err(|e| anyhow!("token account {token_account} unpack failed: {e}"))?;
                Ok(Some(state.amount))
            }
            None => Ok(None),
        }
    }

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64) -> Result<Signature> {
        Ok(self.rpc.request_airdrop(address, lamports).await?)
    }

    async fn confirm_signature(&self, signature: &Signature) -> Result<()> {
        let started = Instant::now();
        loop {
            let confirmed = self
                .rpc
                .confirm_transaction_with_commitment(signature, self.rpc.commitment())
                .await?
                .value;
            if confirmed {
                return Ok(());
            }
            if started.elapsed() >= self.confirm_timeout {
                return Err(anyhow!(
                    "transaction {signature} not confirmed after {}s",
                    self.confirm_timeout.as_secs()
                ));
            }
            tokio::time::sleep(CONFIRM_POLL_INTERVAL).await;
        }
    }

    async fn create_mint(
        &self,
        payer: &Keypair,
        mint_authority: &Pubkey,
        freeze_authority: Option<&Pubkey>,
        decimals: u8,
    ) -> Result<Pubkey> {
        let mint = Keypair::new();
        let rent = self
            .rpc
            .get_minimum_balance_for_rent_exemption(Mint::LEN)
            .await
            .context("fetching mint rent exemption")?;

        let instructions = vec![
            system_instruction::create_account(
                &payer.pubkey(),
                &mint.pubkey(),
                rent,
                Mint::LEN as u64,
                &spl_token::id(),
            ),
            spl_token::instruction::initialize_mint2(
                &spl_token::id(),
                &mint.pubkey(),
                mint_authority,
                freeze_authority,
                decimals,
            )?,
        ];

        self.send_and_confirm(&instructions, payer, &[&mint]).await?;
        Ok(mint.pubkey())
    }

    async fn get_or_create_associated_token_account(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> Result<Pubkey> {
        let ata = get_associated_token_address(owner, mint);
        if self.account_exists(&ata).await? {
            debug!("📦 [RPC] Token account {} already exists", ata);
            return Ok(ata);
        }

        let ix = create_associated_token_account_idempotent(
            &payer.pubkey(),
            owner,
            mint,
            &spl_token::id(),
        );
        self.send_and_confirm(&[ix], payer, &[]).await?;
        Ok(ata)
    }

    async fn mint_to(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Keypair,
        amount: u64,
    ) -> Result<Signature> {
        let ix = spl_token::instruction::mint_to(
            &spl_token::id(),
            mint,
            destination,
            &authority.pubkey(),
            &[],
            amount,
        )?;
        self.send_and_confirm(&[ix], payer, &[authority]).await
    }
}
