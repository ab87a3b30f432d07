//! Scan of the most recent blocks for transactions sent from or to an
//! address.
use std::future::Future;

use alloy::primitives::{Address, Bytes, TxHash, U256, U64};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::client::CeloClient;
use super::error::CeloError;
use crate::constants::HISTORY_DEPTH;
use crate::libs::lookup::{save_log_to_file, short_addr};
use crate::libs::writing::cc;
use crate::log;

/// A transaction as the node returned it inside a full block. The fields
/// the scan reads are typed; everything else the node sent (signature,
/// type, fee caps, ...) is kept as-is in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRecord {
    pub hash: TxHash,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    pub value: U256,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub nonce: U64,
    #[serde(default)]
    pub gas: U64,
    #[serde(default)]
    pub gas_price: Option<U256>,
    #[serde(default)]
    pub input: Bytes,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TxRecord {
    pub fn touches(&self, address: Address) -> bool {
        self.from == address || self.to == Some(address)
    }

    /// Every field of the record on one JSON line.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// The part of an `eth_getBlockByNumber(.., true)` body the scan reads.
/// `extraData` is decoded too, so a block whose extra data is not valid hex
/// fails here like any other malformed body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BlockBody {
    #[allow(dead_code)]
    number: U64,
    #[allow(dead_code)]
    #[serde(default)]
    extra_data: Bytes,
    #[serde(default)]
    transactions: Vec<TxRecord>,
}

/// Block numbers to visit, newest first: `head` down to
/// `head - (depth - 1)`, never below genesis.
pub fn scan_window(head: u64, depth: u64) -> impl Iterator<Item = u64> {
    let oldest = head.saturating_sub(depth.saturating_sub(1));
    let range = if depth == 0 { 1..=0 } else { oldest..=head };
    range.rev()
}

/// Walk [`scan_window`] fetching each block through `fetch` and keep the
/// transactions touching `address`, in block then in-block order.
///
/// A block that is missing (`null`) or whose body does not decode is skipped.
/// Errors from `fetch` itself end the scan.
pub async fn scan_blocks<F, Fut>(
    head: u64,
    depth: u64,
    address: Address,
    mut fetch: F,
) -> Result<Vec<TxRecord>, CeloError>
where
    F: FnMut(u64) -> Fut,
    Fut: Future<Output = Result<Value, CeloError>>,
{
    let total = depth.min(head.saturating_add(1));
    let mut found = Vec::new();
    let mut skipped = 0u64;

    for (i, number) in scan_window(head, depth).enumerate() {
        let raw = fetch(number).await?;
        match serde_json::from_value::<Option<BlockBody>>(raw) {
            Ok(Some(block)) => {
                found.extend(block.transactions.into_iter().filter(|tx| tx.touches(address)));
            }
            Ok(None) => {
                skipped += 1;
                save_log_to_file(&format!("history: block {number} not found"));
            }
            Err(e) => {
                skipped += 1;
                log!(cc::YELLOW, "skipping block {number}: undecodable body ({e})");
            }
        }

        let done = i as u64 + 1;
        if done % 10 == 0 || done == total {
            log!("history scan {done}/{total} blocks, {} matches", found.len());
        }
    }

    if skipped > 0 {
        save_log_to_file(&format!("history: skipped {skipped} of {total} blocks"));
    }
    Ok(found)
}

/// Transactions from or to `address` within the last `HISTORY_DEPTH`
/// blocks, newest block first. Each call rescans from the current head.
pub async fn get_transaction_history(
    client: &CeloClient,
    address: Address,
) -> Result<Vec<TxRecord>, CeloError> {
    let head = client.block_number().await?;
    let depth = *HISTORY_DEPTH;
    log!(
        cc::CYAN,
        "scanning blocks {head}..={} for {}",
        head.saturating_sub(depth.saturating_sub(1)),
        short_addr(address)
    );
    scan_blocks(head, depth, address, move |n| client.get_block_by_number(n, true)).await
}
