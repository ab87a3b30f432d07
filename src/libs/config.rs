use {
    crate::libs::celo::Token,
    alloy::primitives::Address,
    anyhow::{Context, Result},
    dotenv::dotenv,
    stabletoken::{CUSD_ALFAJORES, DEFAULT_RECEIVER},
    std::{fmt::Debug, str::FromStr},
};

pub fn load_env() {
    dotenv().ok();
}

/// Everything the run needs, read once from the environment.
#[derive(Clone)]
pub struct Config {
    pub rpc_url: String,
    pub private_key: String,
    pub receiver: Address,
    pub stable_contract: Address,
    pub amount_native: String,
    pub amount_stable: String,
    /// Token names to report and send, in order (`TRANSFER_TOKENS`).
    pub token_kinds: Vec<String>,
}

impl Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("receiver", &self.receiver)
            .field("stable_contract", &self.stable_contract)
            .field("amount_native", &self.amount_native)
            .field("amount_stable", &self.amount_stable)
            .field("token_kinds", &self.token_kinds)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        load_env();
        let rpc_url =
            std::env::var("CELO_PROVIDER_URL").context("config.rs: CELO_PROVIDER_URL is not set")?;
        let private_key = std::env::var("CELO_DEPLOYER_PRIVATE_KEY")
            .context("config.rs: CELO_DEPLOYER_PRIVATE_KEY is not set")?;

        Ok(Self {
            rpc_url,
            private_key,
            receiver: Self::get_addr("RECEIVER_ADDRESS", DEFAULT_RECEIVER)?,
            stable_contract: Self::get_addr("CUSD_CONTRACT_ADDRESS", CUSD_ALFAJORES)?,
            amount_native: std::env::var("AMOUNT_CELO").unwrap_or_else(|_| "0.01".to_string()),
            amount_stable: std::env::var("AMOUNT_CUSD").unwrap_or_else(|_| "0.01".to_string()),
            token_kinds: split_kinds(
                &std::env::var("TRANSFER_TOKENS").unwrap_or_else(|_| "CELO,cUSD".to_string()),
            ),
        })
    }

    /// Resolve `token_kinds` against the configured contract. An unknown
    /// name fails here, before anything is sent.
    pub fn tokens(&self) -> Result<Vec<Token>> {
        self.token_kinds
            .iter()
            .map(|kind| {
                Token::parse_kind(kind, self.stable_contract)
                    .context("TRANSFER_TOKENS lists an unsupported token")
            })
            .collect()
    }

    /// Human amount configured for `token`.
    pub fn amount_for(&self, token: Token) -> &str {
        match token {
            Token::Native => &self.amount_native,
            Token::Erc20 { .. } => &self.amount_stable,
        }
    }

    /// Parse env var to T; fall back to typed default.
    pub fn get_var_t<T>(key: &str, default: T) -> T
    where
        T: FromStr,
        <T as FromStr>::Err: Debug,
    {
        std::env::var(key)
            .ok()
            .and_then(|s| s.parse::<T>().ok())
            .unwrap_or(default)
    }

    /// Unlike `get_var_t`, a present but malformed address is an error.
    fn get_addr(key: &str, default: Address) -> Result<Address> {
        match std::env::var(key) {
            Ok(s) if !s.trim().is_empty() => s
                .trim()
                .parse::<Address>()
                .with_context(|| format!("{key} is not a valid address: {s}")),
            _ => Ok(default),
        }
    }
}

fn split_kinds(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}
