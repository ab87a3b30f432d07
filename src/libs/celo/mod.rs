//! Celo node access: the [`client::CeloClient`] connection handle plus
//! the balance, transfer and history operations built on top of it.
pub mod client;
pub mod error;
pub mod history;
pub mod spells;
pub mod token;
pub mod transfer;

pub use client::CeloClient;
pub use error::CeloError;
pub use token::Token;
