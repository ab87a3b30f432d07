use alloy::primitives::TxHash;
use alloy::transports::TransportError;
use stabletoken::UnitsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CeloError {
    #[error("invalid token type: {0}")]
    InvalidToken(String),
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] UnitsError),
    #[error("amount must be greater than zero")]
    ZeroAmount,
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Contract(#[from] alloy::contract::Error),
    #[error("failed to build or sign transaction: {0}")]
    Signing(String),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("rpc error: {0}")]
    Rpc(String),
    #[error("no receipt for {hash} after {secs}s")]
    ReceiptTimeout { hash: TxHash, secs: u64 },
}
