/* --------------------------------------------------------------------- */
/*  Session / connection handle                                          */
/* --------------------------------------------------------------------- */

pub mod iface;
pub mod solana;

#[cfg(test)]
pub(crate) mod mock;

use std::{sync::Arc, time::Duration};

use anyhow::Result;

use crate::config::settings::Settings;
pub use iface::ChainClient;

/// The single RPC handle shared by every workflow for the life of the process.
///
/// Built once at startup; reachability is not checked here, so an unreachable
/// endpoint surfaces as a transport error on the first call that uses it.
#[derive(Clone)]
pub struct Connection {
    client: Arc<dyn ChainClient>,
}

impl Connection {
    pub fn establish(settings: &Settings) -> Result<Self> {
        let client = solana::SolanaChainClient::new(
            settings.rpc_url.clone(),
            settings.commitment_config(),
            Duration::from_secs(settings.confirm_timeout_secs),
        );
        Ok(Self::from_client(Arc::new(client)))
    }

    pub fn from_client(client: Arc<dyn ChainClient>) -> Self {
        Self { client }
    }

    pub fn get_connection(&self) -> Arc<dyn ChainClient> {
        Arc::clone(&self.client)
    }

    pub fn endpoint(&self) -> String {
        self.client.endpoint()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("endpoint", &self.client.endpoint())
            .finish()
    }
}
