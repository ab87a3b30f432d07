//! The end-to-end run: balances, one transfer per configured token
//! (CELO then cUSD by default), history, receipts, balances again. Every step is awaited in order.
use {
    crate::constants::FINAL_RECEIPT_TIMEOUT_SECS,
    crate::libs::celo::{
        history::get_transaction_history,
        spells::{format_balance, get_balance},
        transfer::{send_funds, wait_for_receipt, Receipt},
        CeloClient, Token,
    },
    crate::libs::config::Config,
    crate::libs::writing::{cc, Colors},
    crate::log,
    alloy::primitives::Address,
    anyhow::{Context, Result},
    std::time::Duration,
};

pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    let tokens = config.tokens()?;
    let client = CeloClient::connect(&config.rpc_url, &config.private_key)
        .await
        .context("failed to connect to the Celo node")?;
    log!(cc::LIGHT_GRAY, "rpc {} chain_id {}", client.rpc_url(), client.chain_id);

    let stdout = std::io::stdout();
    let mut out = Colors::new(stdout.lock());
    out.cprint(
        &format!("Connected to Celo network. Address: {}", client.address),
        cc::BOLD,
    );

    print_balances(&mut out, &client, client.address, &tokens, "").await?;

    let mut sent = Vec::with_capacity(tokens.len());
    for &token in &tokens {
        let amount = config.amount_for(token);
        let hash = send_funds(&client, config.receiver, amount, token).await?;
        sent.push((token, amount, hash));
    }
    for (token, amount, hash) in &sent {
        out.cprint(
            &format!(
                "Sent {amount} {} to {}. Transaction hash: {hash}",
                token.symbol(),
                config.receiver,
            ),
            cc::GREEN,
        );
    }

    let history = get_transaction_history(&client, client.address).await?;
    out.plain("Transaction history:");
    for tx in &history {
        out.plain(&tx.to_json()?);
    }

    let limit = Duration::from_secs(*FINAL_RECEIPT_TIMEOUT_SECS);
    for (token, _, hash) in &sent {
        let receipt = wait_for_receipt(&client, *hash, limit).await?;
        out.cprint(&mined_line(*token, &receipt), cc::LIGHT_GREEN);
    }

    print_balances(&mut out, &client, client.address, &tokens, "Updated ").await?;
    Ok(())
}

async fn print_balances(
    out: &mut Colors<'_>,
    client: &CeloClient,
    address: Address,
    tokens: &[Token],
    prefix: &str,
) -> Result<()> {
    for &token in tokens {
        let amount = get_balance(client, address, token)
            .await
            .with_context(|| format!("failed to read {} balance", token.symbol()))?;
        out.plain(&format!("{prefix}{}", format_balance(token, &amount)));
    }
    Ok(())
}

fn mined_line(token: Token, receipt: &Receipt) -> String {
    let block = receipt
        .block_number
        .map(|b| b.to_string())
        .unwrap_or_else(|| "unknown".into());
    let status = if receipt.success { "" } else { " (reverted)" };
    format!(
        "{} transaction mined. Block number: {block}{status} fee: {} CELO",
        token.symbol(),
        stabletoken::format_units(receipt.fee(), stabletoken::CELO_DECIMALS)
    )
}
