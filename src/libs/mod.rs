pub mod celo;
pub mod config;
pub mod lookup;
pub mod writing;
