//! Connected wallet identity.
//!
//! The workflows only ever read the public key. Key material is parsed to
//! derive the public key and then dropped; only a `can_sign` marker remains.

use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
};

/// One entry of a `wallets.json` file.
#[derive(Debug, Deserialize)]
pub struct WalletKeypairEntry {
    pub name: String,
    pub address: String,
    pub private_key_base58: String,
}

#[derive(Clone)]
pub struct WalletIdentity {
    pubkey: Pubkey,
    can_sign: bool,
}

impl WalletIdentity {
    /// Read-only identity from a base58 address.
    pub fn from_address(address: &str) -> Result<Self> {
        let pubkey = Pubkey::from_str(address.trim())
            .with_context(|| format!("invalid wallet address `{}`", address.trim()))?;
        Ok(Self::from_pubkey(pubkey))
    }

    pub fn from_pubkey(pubkey: Pubkey) -> Self {
        Self {
            pubkey,
            can_sign: false,
        }
    }

    pub fn from_keypair(keypair: Keypair) -> Self {
        Self {
            pubkey: keypair.pubkey(),
            can_sign: true,
        }
    }

    /// Load a keypair file. Accepts the Solana CLI JSON byte array
    /// (`[12, 34, ...]`) or a bare base58 secret key. A leading `~/` is
    /// resolved against `$HOME`.
    pub fn load_keypair_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = expand_home(path.as_ref());
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading keypair file {:?}", path))?;
        let keypair =
            parse_keypair(&raw).with_context(|| format!("parsing keypair file {:?}", path))?;
        Ok(Self::from_keypair(keypair))
    }

    /// Pick `name` out of a `wallets.json` list.
    pub fn load_from_wallets_file<P: AsRef<Path>>(path: P, name: &str) -> Result<Self> {
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading wallets file {:?}", path.as_ref()))?;
        let wallet_list: Vec<WalletKeypairEntry> =
            serde_json::from_str(&raw).context("parsing wallets file")?;

        let entry = wallet_list
            .iter()
            .find(|w| w.name == name)
            .ok_or_else(|| anyhow!("active wallet `{name}` not found"))?;

        let keypair = keypair_from_base58(&entry.private_key_base58)?;
        if keypair.pubkey().to_string() != entry.address {
            return Err(anyhow!(
                "wallet `{name}`: private key does not match address {}",
                entry.address
            ));
        }
        Ok(Self::from_keypair(keypair))
    }

    pub fn pubkey(&self) -> Pubkey {
        self.pubkey
    }

    pub fn can_sign(&self) -> bool {
        self.can_sign
    }
}

impl fmt::Debug for WalletIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletIdentity")
            .field("pubkey", &self.pubkey)
            .field("can_sign", &self.can_sign)
            .finish()
    }
}

fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), env::var_os("HOME")) {
        (Ok(rest), Some(home)) => PathBuf::from(home).join(rest),
        _ => path.to_path_buf(),
    }
}

fn parse_keypair(raw: &str) -> Result<Keypair> {
    let trimmed = raw.trim();
    if trimmed.starts_with('[') {
        let bytes: Vec<u8> = serde_json::from_str(trimmed).context("decoding JSON key bytes")?;
        Ok(Keypair::from_bytes(&bytes)?)
    } else {
        keypair_from_base58(trimmed)
    }
}

fn keypair_from_base58(encoded: &str) -> Result<Keypair> {
    let private_key_bytes = bs58::decode(encoded.trim())
        .into_vec()
        .context("decoding base58 key")?;
    Ok(Keypair::from_bytes(&private_key_bytes)?)
}
