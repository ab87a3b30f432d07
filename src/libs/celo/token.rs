use alloy::primitives::Address;
use stabletoken::{CELO_DECIMALS, CUSD_DECIMALS};

use super::error::CeloError;
use crate::constants::{NATIVE_SYMBOL, STABLE_SYMBOL};

/// What a balance read or a transfer operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    /// CELO, moved as the transaction value.
    Native,
    /// An ERC20 stable token (cUSD), moved through `transfer`.
    Erc20 { contract: Address },
}

impl Token {
    /// Map a user-facing token name onto a variant. `contract` is only kept
    /// for the ERC20 case.
    pub fn parse_kind(kind: &str, contract: Address) -> Result<Self, CeloError> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "celo" | "native" => Ok(Token::Native),
            "cusd" | "erc20" | "token" => Ok(Token::Erc20 { contract }),
            other => Err(CeloError::InvalidToken(other.to_string())),
        }
    }

    pub fn decimals(&self) -> u8 {
        match self {
            Token::Native => CELO_DECIMALS,
            Token::Erc20 { .. } => CUSD_DECIMALS,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Token::Native => NATIVE_SYMBOL,
            Token::Erc20 { .. } => STABLE_SYMBOL,
        }
    }
}
