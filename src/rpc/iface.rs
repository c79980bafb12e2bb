use async_trait::async_trait;
use solana_sdk::{pubkey::Pubkey, signature::Keypair, signature::Signature};

/// Everything the balance and mint workflows need from the validator.
///
/// Methods that submit transactions return only once the transaction has
/// reached the client's commitment level.
#[async_trait]
pub trait ChainClient: Send + Sync + 'static {
    fn endpoint(&self) -> String;

    async fn get_slot(&self) -> anyhow::Result<u64>;

    /// Native balance in lamports.
    async fn get_balance(&self, address: &Pubkey) -> anyhow::Result<u64>;

    /// Raw amount held by an SPL token account, `None` if the account does not exist.
    async fn get_token_account_amount(&self, token_account: &Pubkey)
        -> anyhow::Result<Option<u64>>;

    async fn request_airdrop(&self, address: &Pubkey, lamports: u64)
        -> anyhow::Result<Signature>;

    /// Wait until `signature` is confirmed, or fail once the confirm timeout elapses.
    async fn confirm_signature(&self, signature: &Signature) -> anyhow::Result<()>;

    /// Create and initialize a new mint; returns its address.
    async fn create_mint(
        &self,
        payer: &Keypair,
        mint_authority: &Pubkey,
        freeze_authority: Option<&Pubkey>,
        decimals: u8,
    ) -> anyhow::Result<Pubkey>;

    /// Return the owner's associated token account for `mint`, creating it
    /// (paid by `payer`) when it does not exist yet.
    async fn get_or_create_associated_token_account(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        owner: &Pubkey,
    ) -> anyhow::Result<Pubkey>;

    async fn mint_to(
        &self,
        payer: &Keypair,
        mint: &Pubkey,
        destination: &Pubkey,
        authority: &Keypair,
        amount: u64,
    ) -> anyhow::Result<Signature>;
}
