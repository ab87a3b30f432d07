//! Balance reads. Both paths return a [`TokenAmount`] scaled by the
//! token's decimals, so the result is never negative.
use alloy::primitives::Address;
use alloy::providers::Provider;
use stabletoken::abi::IStableToken;
use stabletoken::TokenAmount;

use super::client::CeloClient;
use super::error::CeloError;
use super::token::Token;

/// Read `address`'s balance of `token` at the latest block.
pub async fn get_balance(
    client: &CeloClient,
    address: Address,
    token: Token,
) -> Result<TokenAmount, CeloError> {
    let raw = match token {
        Token::Native => client.provider().get_balance(address).await?,
        Token::Erc20 { contract } => {
            IStableToken::new(contract, client.provider().clone())
                .balanceOf(address)
                .call()
                .await?
        }
    };
    Ok(TokenAmount::new(raw, token.decimals()))
}

/// Balance line as printed by the run, e.g. `CELO balance: 1.5 CELO`.
pub fn format_balance(token: Token, amount: &TokenAmount) -> String {
    format!("{} balance: {} {}", token.symbol(), amount, token.symbol())
}
