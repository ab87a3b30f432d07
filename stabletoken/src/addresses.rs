use alloy::primitives::{address, Address};

/// cUSD stable token on the Alfajores testnet.
pub const CUSD_ALFAJORES: Address = address!("874069Fa1Eb16D44d622F2e0Ca25eeA172369bC1");

/// Default receiver used by the transfer run.
pub const DEFAULT_RECEIVER: Address = address!("cdd1151b2bC256103FA2565475e686346CeFd813");

/// CELO and cUSD both use 18 decimals.
pub const CELO_DECIMALS: u8 = 18;
pub const CUSD_DECIMALS: u8 = 18;
