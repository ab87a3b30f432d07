use std::fmt;

use alloy::network::{Ethereum, EthereumWallet};
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, RootProvider};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use reqwest::Client as HttpClient;
use serde_json::Value;
use url::Url;

use super::error::CeloError;
use crate::libs::lookup::save_log_to_file;

/// A connection to a Celo JSON-RPC node together with the local signing
/// account.
///
/// Typed calls (balances, gas, nonces, raw submission, receipts) go through
/// an alloy provider with no fillers attached, so every field of an outgoing
/// transaction is set explicitly by [`crate::libs::celo::transfer`]. Full
/// blocks are fetched as plain JSON through [`CeloClient::get_block_by_number`]
/// so that a single undecodable block can be skipped instead of failing the
/// whole call.
#[derive(Clone)]
pub struct CeloClient {
    rpc_url: Url,
    http: HttpClient,
    provider: DynProvider,
    wallet: EthereumWallet,
    /// Checksummed when displayed.
    pub address: Address,
    pub chain_id: u64,
}

impl fmt::Debug for CeloClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CeloClient")
            .field("rpc_url", &self.rpc_url.as_str())
            .field("address", &self.address)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl CeloClient {
    /// Parse the endpoint and key, then ask the node for its chain id so
    /// signed transactions carry EIP-155 replay protection.
    pub async fn connect(rpc_url: &str, private_key: &str) -> Result<Self, CeloError> {
        let url = Url::parse(rpc_url)
            .map_err(|e| CeloError::Config(format!("failed to parse CELO_PROVIDER_URL `{rpc_url}`: {e}")))?;

        let signer: PrivateKeySigner = private_key.trim().parse().map_err(|_| {
            CeloError::Config("CELO_DEPLOYER_PRIVATE_KEY did not contain a valid hex encoded secret".into())
        })?;

        let provider = RootProvider::<Ethereum>::new_http(url.clone()).erased();

        let chain_id = provider.get_chain_id().await?;
        let client = Self::from_parts(url, provider, signer, chain_id);
        save_log_to_file(&format!(
            "connected to {} chain_id={chain_id} as {}",
            client.rpc_url, client.address
        ));
        Ok(client)
    }

    /// Assemble a client from an already built provider. `signer` is bound
    /// to `chain_id` here; no RPC call is made.
    pub fn from_parts(
        rpc_url: Url,
        provider: DynProvider,
        signer: PrivateKeySigner,
        chain_id: u64,
    ) -> Self {
        let signer = signer.with_chain_id(Some(chain_id));
        let address = signer.address();
        Self {
            rpc_url,
            http: HttpClient::new(),
            provider,
            wallet: EthereumWallet::from(signer),
            address,
            chain_id,
        }
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn wallet(&self) -> &EthereumWallet {
        &self.wallet
    }

    pub fn rpc_url(&self) -> &Url {
        &self.rpc_url
    }

    pub async fn block_number(&self) -> Result<u64, CeloError> {
        Ok(self.provider.get_block_number().await?)
    }

    /// `eth_getBlockByNumber` as raw JSON. `Value::Null` means the node has
    /// no such block.
    pub async fn get_block_by_number(
        &self,
        number: u64,
        full_transactions: bool,
    ) -> Result<Value, CeloError> {
        self.rpc(
            "eth_getBlockByNumber",
            serde_json::json!([format!("{number:#x}"), full_transactions]),
        )
        .await
    }

    async fn rpc(&self, method: &str, params: Value) -> Result<Value, CeloError> {
        let body = serde_json::json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let res = self
            .http
            .post(self.rpc_url.as_str())
            .json(&body)
            .send()
            .await?;
        let status = res.status();
        let bytes = res.bytes().await?;
        let v: Value = match serde_json::from_slice(&bytes) {
            Ok(json) => json,
            Err(e) => {
                let sample: String = String::from_utf8_lossy(&bytes).chars().take(512).collect();
                return Err(CeloError::Rpc(format!(
                    "decode error ({status}) on {method}: {e}. {}\nEndpoint: {}\nSample: {}",
                    decode_hint(&sample),
                    self.rpc_url,
                    sample
                )));
            }
        };
        if let Some(err) = v.get("error") {
            return Err(CeloError::Rpc(format!("{method}: {err}")));
        }
        Ok(v.get("result").cloned().unwrap_or(Value::Null))
    }
}

/// Common provider misconfigurations, guessed from a non-JSON body.
fn decode_hint(sample: &str) -> &'static str {
    if sample.trim_start().starts_with('<') {
        "Response looks like HTML; CELO_PROVIDER_URL may point at a gateway page. Use an HTTPS JSON-RPC endpoint."
    } else if sample.trim().is_empty() {
        "Empty body from RPC. Endpoint may be down or require authentication."
    } else {
        "Non-JSON response from RPC."
    }
}

#[cfg(test)]
impl CeloClient {
    /// A client on Alfajores' chain id whose provider answers from `asserter`,
    /// signing with a fresh random key.
    pub(crate) fn mocked(asserter: &alloy::transports::mock::Asserter) -> Self {
        use alloy::providers::ProviderBuilder;

        let provider = ProviderBuilder::new()
            .connect_mocked_client(asserter.clone())
            .erased();
        let url = Url::parse("http://127.0.0.1:8545").unwrap();
        Self::from_parts(url, provider, PrivateKeySigner::random(), 44787)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hints_for_bad_bodies() {
        assert!(decode_hint("<html>").contains("HTML"));
        assert!(decode_hint("   ").contains("Empty body"));
        assert_eq!(decode_hint("garbage"), "Non-JSON response from RPC.");
    }

    #[test]
    fn from_parts_binds_signer_to_chain() {
        use alloy::network::NetworkWallet;
        use alloy::transports::mock::Asserter;

        let client = CeloClient::mocked(&Asserter::new());
        assert_eq!(client.chain_id, 44787);
        assert_eq!(
            NetworkWallet::<Ethereum>::default_signer_address(client.wallet()),
            client.address
        );
    }

    #[tokio::test]
    async fn connect_rejects_bad_url() {
        let err = CeloClient::connect("not a url", "0x01").await.unwrap_err();
        assert!(matches!(err, CeloError::Config(msg) if msg.contains("CELO_PROVIDER_URL")));
    }

    #[tokio::test]
    async fn connect_rejects_bad_key() {
        let err = CeloClient::connect("http://127.0.0.1:1", "zz-not-hex")
            .await
            .unwrap_err();
        assert!(matches!(err, CeloError::Config(msg) if msg.contains("PRIVATE_KEY")));
    }
}
