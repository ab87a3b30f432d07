//! Native and stable-token transfers.
//!
//! Every field of the outgoing transaction is filled here from values read
//! just before signing: gas from `eth_estimateGas`, gas price from
//! `eth_gasPrice` and nonce from the pending transaction count. The signed
//! envelope is submitted once as a raw transaction, and inclusion is
//! watched by polling for its receipt.
use std::future::Future;
use std::time::Duration;

use alloy::consensus::{Transaction as _, TxEnvelope, TxReceipt as _};
use alloy::eips::eip2718::Encodable2718;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, TxHash, U256};
use alloy::providers::{DynProvider, Provider};
use alloy::rpc::types::eth::{TransactionReceipt, TransactionRequest};
use alloy::sol_types::SolCall;
use stabletoken::abi::IStableToken;
use stabletoken::TokenAmount;

use super::client::CeloClient;
use super::error::CeloError;
use super::token::Token;
use crate::constants::{RECEIPT_POLL_MS, RECEIPT_TIMEOUT_SECS};
use crate::libs::lookup::{save_log_to_file, short_hash};
use crate::libs::writing::cc;
use crate::log;

/// What the node reported once a transaction was included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub hash: TxHash,
    pub block_number: Option<u64>,
    pub success: bool,
    pub gas_used: u64,
    pub effective_gas_price: u128,
}

impl Receipt {
    /// Fee paid by the sender in native base units.
    pub fn fee(&self) -> U256 {
        U256::from(self.gas_used) * U256::from(self.effective_gas_price)
    }
}

impl From<&TransactionReceipt> for Receipt {
    fn from(r: &TransactionReceipt) -> Self {
        Self {
            hash: r.transaction_hash,
            block_number: r.block_number,
            success: r.status(),
            gas_used: r.gas_used,
            effective_gas_price: r.effective_gas_price,
        }
    }
}

/// Unsigned request moving `amount` base units of `token` from `from` to
/// `to`. Native transfers carry the amount as value and no input; token
/// transfers call the contract's `transfer` with zero value.
pub fn build_request(from: Address, to: Address, amount: U256, token: Token) -> TransactionRequest {
    let req = TransactionRequest::default().with_from(from);
    match token {
        Token::Native => req.with_to(to).with_value(amount),
        Token::Erc20 { contract } => {
            let call = IStableToken::transferCall { to, value: amount };
            req.with_to(contract)
                .with_value(U256::ZERO)
                .with_input(call.abi_encode())
        }
    }
}

/// Pin gas, price, nonce and chain id onto a request. Setting a gas price
/// makes this a legacy (type 0) transaction.
pub fn fill_request(
    req: TransactionRequest,
    gas: u64,
    gas_price: u128,
    nonce: u64,
    chain_id: u64,
) -> TransactionRequest {
    req.with_gas_limit(gas)
        .with_gas_price(gas_price)
        .with_nonce(nonce)
        .with_chain_id(chain_id)
}

/// Estimate, price and nonce the transfer against the node, then sign it
/// locally. The nonce is the pending transaction count at this moment.
pub async fn sign_transfer(
    client: &CeloClient,
    to: Address,
    value: U256,
    token: Token,
) -> Result<TxEnvelope, CeloError> {
    let from = client.address;
    let provider = client.provider();

    let unsigned = build_request(from, to, value, token);
    let gas = provider.estimate_gas(unsigned.clone()).await?;
    let gas_price = provider.get_gas_price().await?;
    let nonce = provider.get_transaction_count(from).pending().await?;
    save_log_to_file(&format!(
        "{} transfer to {to}: value={value} gas={gas} gas_price={gas_price} nonce={nonce}",
        token.symbol()
    ));

    fill_request(unsigned, gas, gas_price, nonce, client.chain_id)
        .build(client.wallet())
        .await
        .map_err(|e| CeloError::Signing(e.to_string()))
}

/// Submit a signed envelope once as `eth_sendRawTransaction`. The returned
/// hash is the envelope's own.
pub async fn submit(client: &CeloClient, envelope: &TxEnvelope) -> Result<TxHash, CeloError> {
    let hash = *envelope.tx_hash();
    let pending = client
        .provider()
        .send_raw_transaction(&envelope.encoded_2718())
        .await?;
    if *pending.tx_hash() != hash {
        crate::warn!("node reported hash {} for submitted tx {hash}", pending.tx_hash());
        save_log_to_file(&format!("hash mismatch: node {} local {hash}", pending.tx_hash()));
    }
    Ok(hash)
}

/// Sign and submit a transfer of `amount` (human decimal) of `token` to
/// `to`, then wait up to `RECEIPT_TIMEOUT_SECS` for inclusion.
///
/// A timed-out wait only logs a warning: the transaction is already on the
/// network and the hash is returned either way. Node errors (insufficient
/// funds, nonce too low, ...) propagate as they are.
pub async fn send_funds(
    client: &CeloClient,
    to: Address,
    amount: &str,
    token: Token,
) -> Result<TxHash, CeloError> {
    let limit = Duration::from_secs(*RECEIPT_TIMEOUT_SECS);
    send_funds_within(client, to, amount, token, limit).await
}

/// [`send_funds`] with an explicit inclusion limit.
pub async fn send_funds_within(
    client: &CeloClient,
    to: Address,
    amount: &str,
    token: Token,
    limit: Duration,
) -> Result<TxHash, CeloError> {
    let value = TokenAmount::parse(amount, token.decimals())?;
    if value.is_zero() {
        return Err(CeloError::ZeroAmount);
    }

    let envelope = sign_transfer(client, to, value.raw, token).await?;
    let hash = submit(client, &envelope).await?;
    log!(
        cc::LIGHT_BLUE,
        "submitted {value} {} -> {to} (nonce {}, tx {})",
        token.symbol(),
        envelope.nonce(),
        short_hash(hash)
    );

    let wait = poll_receipt(client.provider(), hash);
    if let Some(receipt) = await_inclusion(hash, wait, limit).await? {
        log!(
            cc::LIGHT_GREEN,
            "tx {} included in block {:?} (success={})",
            short_hash(hash),
            receipt.block_number,
            receipt.success
        );
    }
    Ok(hash)
}

/// Bound an inclusion wait by `limit`. Running out of time yields
/// `Ok(None)` and a warning; errors from the wait itself propagate.
pub async fn await_inclusion<F, T, E>(hash: TxHash, wait: F, limit: Duration) -> Result<Option<T>, E>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, wait).await {
        Ok(res) => res.map(Some),
        Err(_) => {
            crate::warn!(
                "Transaction with hash {hash} was not mined within {}s.",
                limit.as_secs()
            );
            save_log_to_file(&format!("inclusion wait timed out for {hash}"));
            Ok(None)
        }
    }
}

/// Poll `eth_getTransactionReceipt` every `RECEIPT_POLL_MS` until the node
/// has one. Never returns on its own if the tx is never included.
async fn poll_receipt(provider: &DynProvider, hash: TxHash) -> Result<Receipt, CeloError> {
    let poll = Duration::from_millis(*RECEIPT_POLL_MS);
    loop {
        if let Some(r) = provider.get_transaction_receipt(hash).await? {
            return Ok(Receipt::from(&r));
        }
        tokio::time::sleep(poll).await;
    }
}

/// Wait for the receipt of `hash`. Unlike the wait inside [`send_funds`],
/// running out of time here is an error.
pub async fn wait_for_receipt(
    client: &CeloClient,
    hash: TxHash,
    timeout: Duration,
) -> Result<Receipt, CeloError> {
    match tokio::time::timeout(timeout, poll_receipt(client.provider(), hash)).await {
        Ok(res) => res,
        Err(_) => Err(CeloError::ReceiptTimeout {
            hash,
            secs: timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::consensus::Transaction as _;
    use alloy::primitives::{address, TxKind, U128, U64};
    use alloy::transports::mock::Asserter;
    use serde_json::Value;
    use stabletoken::{parse_units, UnitsError, CUSD_ALFAJORES, DEFAULT_RECEIVER};

    const SENDER: Address = address!("1111111111111111111111111111111111111111");

    #[test]
    fn native_request_has_value_and_no_input() {
        let amount = parse_units("0.01", 18).unwrap();
        let req = build_request(SENDER, DEFAULT_RECEIVER, amount, Token::Native);
        assert_eq!(req.from, Some(SENDER));
        assert_eq!(req.to, Some(TxKind::Call(DEFAULT_RECEIVER)));
        assert_eq!(req.value, Some(amount));
        assert!(req.input.input().is_none());
    }

    #[test]
    fn token_request_calls_transfer_with_zero_value() {
        let amount = parse_units("0.01", 18).unwrap();
        let token = Token::Erc20 {
            contract: CUSD_ALFAJORES,
        };
        let req = build_request(SENDER, DEFAULT_RECEIVER, amount, token);
        assert_eq!(req.to, Some(TxKind::Call(CUSD_ALFAJORES)));
        assert_eq!(req.value, Some(U256::ZERO));

        let input = req.input.input().expect("token transfer carries call data");
        let decoded = IStableToken::transferCall::abi_decode(input).unwrap();
        assert_eq!(decoded.to, DEFAULT_RECEIVER);
        assert_eq!(decoded.value, amount);
    }

    #[test]
    fn fill_pins_gas_price_and_chain() {
        let base = build_request(SENDER, DEFAULT_RECEIVER, U256::from(1u64), Token::Native);
        let req = fill_request(base, 21_000, 5_000_000_000, 7, 44787);
        assert_eq!(req.nonce, Some(7));
        assert_eq!(req.gas, Some(21_000));
        assert_eq!(req.gas_price, Some(5_000_000_000));
        assert_eq!(req.chain_id, Some(44787));
    }

    #[tokio::test]
    async fn signed_envelope_is_legacy_and_from_signer() {
        use alloy::network::EthereumWallet;
        use alloy::signers::local::PrivateKeySigner;

        let signer = PrivateKeySigner::random();
        let from = signer.address();
        let wallet = EthereumWallet::from(signer);
        let amount = parse_units("0.01", 18).unwrap();
        let req = fill_request(
            build_request(from, DEFAULT_RECEIVER, amount, Token::Native),
            21_000,
            1_000_000_000,
            3,
            44787,
        );
        let envelope = req.build(&wallet).await.unwrap();
        assert!(matches!(envelope, TxEnvelope::Legacy(_)));
        assert_eq!(envelope.nonce(), 3);
        assert_eq!(envelope.value(), amount);
        assert_eq!(envelope.chain_id(), Some(44787));
        assert!(!envelope.encoded_2718().is_empty());
    }

    #[tokio::test]
    async fn inclusion_timeout_returns_none() {
        let hash = TxHash::repeat_byte(0xab);
        let never = std::future::pending::<Result<u64, CeloError>>();
        let out = await_inclusion(hash, never, Duration::from_millis(20))
            .await
            .unwrap();
        assert_eq!(out, None);
    }

    #[tokio::test]
    async fn inclusion_passes_through_result_and_error() {
        let hash = TxHash::repeat_byte(0x01);
        let ok = await_inclusion(hash, async { Ok::<_, CeloError>(5u64) }, Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(ok, Some(5));

        let err = await_inclusion(
            hash,
            async { Err::<u64, _>(CeloError::Rpc("nonce too low".into())) },
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, CeloError::Rpc(m) if m == "nonce too low"));
    }

    #[test]
    fn receipt_fee_is_gas_times_price() {
        let r = Receipt {
            hash: TxHash::ZERO,
            block_number: Some(10),
            success: true,
            gas_used: 20_000,
            effective_gas_price: 10_000_000_000,
        };
        assert_eq!(stabletoken::format_units(r.fee(), 18), "0.0002");
    }

    /// Queue the three reads `sign_transfer` makes, in call order.
    fn push_sign_reads(asserter: &Asserter, gas: u64, gas_price: u64, nonce: u64) {
        asserter.push_success(&U64::from(gas)); // eth_estimateGas
        asserter.push_success(&U128::from(gas_price)); // eth_gasPrice
        asserter.push_success(&U64::from(nonce)); // eth_getTransactionCount(pending)
    }

    #[tokio::test]
    async fn signs_with_pending_count_from_node() {
        let asserter = Asserter::new();
        let client = CeloClient::mocked(&asserter);
        let value = parse_units("0.01", 18).unwrap();

        push_sign_reads(&asserter, 21_000, 5_000_000_000, 7);
        let first = sign_transfer(&client, DEFAULT_RECEIVER, value, Token::Native)
            .await
            .unwrap();
        assert_eq!(first.nonce(), 7);
        assert_eq!(first.gas_limit(), 21_000);
        assert_eq!(first.gas_price(), Some(5_000_000_000));
        assert_eq!(first.chain_id(), Some(44787));

        // the node counts the first one as pending now
        push_sign_reads(&asserter, 21_000, 5_000_000_000, 8);
        let second = sign_transfer(&client, DEFAULT_RECEIVER, value, Token::Native)
            .await
            .unwrap();
        assert_eq!(second.nonce(), 8);
        assert!(second.nonce() > first.nonce());
    }

    #[tokio::test]
    async fn send_funds_submits_one_raw_tx_at_observed_nonce() {
        let asserter = Asserter::new();
        let client = CeloClient::mocked(&asserter);
        let token = Token::Erc20 {
            contract: CUSD_ALFAJORES,
        };
        let value = parse_units("0.01", 18).unwrap();

        // the same transfer signed locally at nonce 7; signatures are
        // deterministic, so only this nonce reproduces the hash
        let expected = fill_request(
            build_request(client.address, DEFAULT_RECEIVER, value, token),
            60_000,
            5_000_000_000,
            7,
            client.chain_id,
        )
        .build(client.wallet())
        .await
        .unwrap();
        let expected_hash = *expected.tx_hash();

        push_sign_reads(&asserter, 60_000, 5_000_000_000, 7);
        asserter.push_success(&expected_hash); // eth_sendRawTransaction, once
        asserter.push_success(&Value::Null); // first receipt poll: not mined

        let hash = send_funds_within(
            &client,
            DEFAULT_RECEIVER,
            "0.01",
            token,
            Duration::from_millis(50),
        )
        .await
        .unwrap();
        assert_eq!(hash, expected_hash);
    }

    #[tokio::test]
    async fn rejected_amounts_make_no_rpc_call() {
        // an empty asserter fails any request, so these errors come first
        let client = CeloClient::mocked(&Asserter::new());
        let err = send_funds(&client, DEFAULT_RECEIVER, "0.0", Token::Native)
            .await
            .unwrap_err();
        assert!(matches!(err, CeloError::ZeroAmount));

        let err = send_funds(&client, DEFAULT_RECEIVER, "-1", Token::Native)
            .await
            .unwrap_err();
        assert!(matches!(err, CeloError::InvalidAmount(UnitsError::Negative(_))));
    }

    #[tokio::test]
    async fn wait_for_receipt_times_out_on_null_receipts() {
        let asserter = Asserter::new();
        let client = CeloClient::mocked(&asserter);
        for _ in 0..3 {
            asserter.push_success(&Value::Null);
        }

        let hash = TxHash::repeat_byte(0x42);
        let err = wait_for_receipt(&client, hash, Duration::from_millis(50))
            .await
            .unwrap_err();
        assert!(matches!(err, CeloError::ReceiptTimeout { hash: h, secs: 0 } if h == hash));
    }
}
